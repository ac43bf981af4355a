mod scene;

use std::path::PathBuf;

use anyhow::Context;
use aperture::aperture_camera::LensParams;
use aperture::aperture_tracer::{AccumulatorConfig, TileRenderer};
use aperture::Aperture;
use clap::Parser;
use glam::UVec2;

#[derive(Parser, Debug)]
#[command(about = "Progressive tile path tracer, offline frontend")]
struct Args {
    #[arg(long, default_value_t = 1280)]
    width: u32,
    #[arg(long, default_value_t = 720)]
    height: u32,
    /// Accumulation frames to run before resolving the image.
    #[arg(long, default_value_t = 16)]
    frames: u32,
    #[arg(long, default_value_t = 4)]
    samples_per_frame: u32,
    /// Lens aperture radius in world units. Zero gives a pinhole camera.
    #[arg(long, default_value_t = 0.0)]
    lens_radius: f32,
    #[arg(long, default_value_t = 6.0)]
    focal_distance: f32,
    /// Spherical aberration coefficient.
    #[arg(long, default_value_t = 0.0)]
    spherical: f32,
    /// Cylindrical aberration coefficient.
    #[arg(long, default_value_t = 0.0)]
    cylindrical: f32,
    /// Cylinder axis in radians.
    #[arg(long, default_value_t = 0.0)]
    axis: f32,
    #[arg(long, default_value = "render.png")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let _aperture = Aperture::new("Render Offline");
    let args = Args::parse();

    let resolution = UVec2::new(args.width, args.height);
    let config = AccumulatorConfig {
        samples_per_frame: args.samples_per_frame,
        ..AccumulatorConfig::default()
    };

    let mut renderer = TileRenderer::new(resolution, config)?;
    renderer.load_scene(scene::demo_scene())?;
    renderer.set_lens(LensParams {
        radius: args.lens_radius,
        focal_distance: args.focal_distance,
        spherical: args.spherical,
        cylindrical: args.cylindrical,
        axis: args.axis,
    })?;

    for _ in 0..args.frames {
        let report = renderer.render_frame();
        log::info!(
            "frame {}: {} tiles traced, {} culled, {} at cap, {} samples merged",
            report.frame_index,
            report.tiles_traced,
            report.tiles_culled,
            report.tiles_at_cap,
            report.samples_merged
        );
    }

    let pixels = renderer.resolve_rgba8();
    let image = image::RgbaImage::from_raw(resolution.x, resolution.y, pixels)
        .context("resolved pixel buffer does not match the framebuffer size")?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}
