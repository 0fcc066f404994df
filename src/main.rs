use std::path::Path;

use anyhow::Result;
use clap::Parser;

use folio_engine::cli::Cli;
use folio_engine::config;
use folio_engine::graphics::driver::DriverRegistry;
use folio_engine::graphics::session::{GraphicsSession, SessionCallbacks};
use folio_engine::platform::DesktopPlatform;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut options = config::load_config(cli.config.as_deref().map(Path::new))?;
    cli.merge_into_options(&mut options)?;
    let mut game = cli.game_descriptor()?;

    let registry = DriverRegistry::with_default_backends();
    let mut platform = DesktopPlatform::new();
    let mut session = GraphicsSession::default();

    session.init(
        &mut game,
        &options,
        &mut platform,
        &registry,
        SessionCallbacks::default(),
    )?;

    if let Some(resolution) = session.resolution() {
        println!(
            "Negotiated {} ({}-bit) via driver '{}', filter '{}' in {} attempt(s)",
            resolution.size(),
            resolution.color_depth,
            session.driver().map_or("?", |driver| driver.driver_id()),
            session.filter_id().unwrap_or("None"),
            session.attempts().len()
        );
    }

    session.shutdown(&mut platform);
    Ok(())
}
