use std::sync::Arc;

use crate::app::controller::AppController;
use crate::cli::{Cli, Commands};
use crate::config::load_or_builtin;
use crate::directory::{refresh_snapshot, Directory};
use crate::error::Result;
use crate::fetch::FmpClient;

/// Entry point used by `main`: load configuration, then either run the offline
/// directory refresh or load the snapshot once and hand over to the controller.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_or_builtin(cli.config.as_deref())?;

    if let Commands::RefreshDirectory = cli.command {
        let client = FmpClient::from_config(&config)?;
        let written = refresh_snapshot(&client, &config.directory.snapshot).await?;
        println!(
            "Wrote {} instruments to {}",
            written,
            config.directory.snapshot.display()
        );
        return Ok(());
    }

    let directory = Arc::new(Directory::load(&config.directory.snapshot)?);
    let controller = AppController::new(config, directory);
    controller.execute(cli.command).await
}
