//! Desktop showcase viewer.
//!
//! Usage: `vitrine_viewer [settings.json]`
//!
//! Without a settings file the stock toucan scene and environment under
//! `assets/model/` are loaded.

use anyhow::Context;
use vitrine::{App, ViewerSettings};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => ViewerSettings::load(&path)
            .with_context(|| format!("Failed to read settings from {path}"))?,
        None => ViewerSettings::default(),
    };

    log::info!(
        "Showing '{}' under '{}'",
        settings.assets.scene.display(),
        settings.assets.environment.display()
    );

    App::new().with_settings(settings).run()?;
    Ok(())
}
