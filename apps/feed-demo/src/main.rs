mod app;

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "logging")]
    let _ = env_logger::try_init();
    let settings = app::DemoSettings::from_env()?;
    app::run(settings)
}
