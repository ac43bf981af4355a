#![doc(html_no_source)]

mod aperture;
pub use aperture::Aperture;

// Reexport all crates
pub use aperture_camera;
pub use aperture_layout;
pub use aperture_scene;
pub use aperture_tracer;
