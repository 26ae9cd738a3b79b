use anyhow::Result;
use clap::Parser;

use concierge_agents::cli::{self, Cli, FAREWELL};
use concierge_agents::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    tokio::select! {
        result = cli::run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\n{FAREWELL}");
            // A pending stdin read would otherwise hold the runtime open.
            std::process::exit(0);
        }
    }
}
