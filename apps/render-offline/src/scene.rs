use aperture::aperture_scene::Triangle;
use glam::Vec3;

/// Small mixed-material scene in front of the default camera.
pub fn demo_scene() -> Vec<Triangle> {
    vec![
        // Floor
        Triangle::diffuse(
            [
                Vec3::new(-8.0, -1.5, -1.0),
                Vec3::new(8.0, -1.5, -1.0),
                Vec3::new(0.0, -1.5, -20.0),
            ],
            Vec3::new(0.7, 0.7, 0.7),
        ),
        // Back wall
        Triangle::diffuse(
            [
                Vec3::new(-8.0, -1.5, -12.0),
                Vec3::new(8.0, -1.5, -12.0),
                Vec3::new(0.0, 8.0, -12.0),
            ],
            Vec3::new(0.6, 0.3, 0.3),
        ),
        // Brushed metal panel
        Triangle::metal(
            [
                Vec3::new(-3.0, -1.5, -6.0),
                Vec3::new(-1.0, -1.5, -6.0),
                Vec3::new(-2.0, 1.0, -6.5),
            ],
            Vec3::new(0.9, 0.85, 0.7),
            0.15,
        ),
        // Glass shard
        Triangle::dielectric(
            [
                Vec3::new(1.0, -1.5, -5.0),
                Vec3::new(3.0, -1.5, -5.0),
                Vec3::new(2.0, 1.0, -5.5),
            ],
            Vec3::new(0.95, 0.95, 1.0),
        ),
        // Area light overhead
        Triangle::light(
            [
                Vec3::new(-2.0, 4.0, -4.0),
                Vec3::new(2.0, 4.0, -4.0),
                Vec3::new(0.0, 4.0, -9.0),
            ],
            Vec3::new(1.0, 0.95, 0.9),
            5.0,
        ),
    ]
}
