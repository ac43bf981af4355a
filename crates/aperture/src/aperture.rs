pub struct Aperture {}

static APERTURE_STATIC: std::sync::OnceLock<ApertureStatic> = std::sync::OnceLock::new();

struct ApertureStatic {}

impl ApertureStatic {
    fn init(_app_name: &str) -> &'static Self {
        APERTURE_STATIC.get_or_init(|| {
            env_logger::builder()
                .filter_level(log::LevelFilter::Info)
                .parse_default_env()
                .init();

            Self {}
        })
    }
}

impl Aperture {
    pub fn new(app_name: &str) -> Self {
        ApertureStatic::init(app_name);

        Self {}
    }
}
