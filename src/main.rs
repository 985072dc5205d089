use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod accumulator;
mod cli;
mod frame;
mod inspect;
mod port;
mod proto;
mod run;
mod stats;
mod test;
mod transport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rfid_hammer=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    match args.cmd {
        cli::Cmd::Run(opts) => run::run(opts).await,
        cli::Cmd::Encode(opts) => inspect::encode(opts),
        cli::Cmd::Scan(opts) => inspect::scan(opts),
    }
}
