use clap::Parser;
use env_logger::Env;

use market_dash::app;
use market_dash::cli::Cli;

fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() {
    init_logger();
    let cli = Cli::parse();

    if let Err(err) = app::run(cli).await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
