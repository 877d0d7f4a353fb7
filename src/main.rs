use clap::Parser;
use signalrouter::cli::{run_cli, Cli};
use signalrouter::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    let cli = Cli::parse();
    run_cli(cli, &mut std::io::stdout().lock())
}
