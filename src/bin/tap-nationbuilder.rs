use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tap_nationbuilder::singer::state::load_state;
use tap_nationbuilder::singer::{Catalog, MessageWriter};
use tap_nationbuilder::utils::config_loader;
use tap_nationbuilder::utils::logging;
use tap_nationbuilder::utils::logging::LogLevel;
use tap_nationbuilder::Tap;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file; rewritten whenever the access token is refreshed
    #[arg(short, long, env = "TAP_NATIONBUILDER_CONFIG")]
    config: PathBuf,
    /// print the catalog and exit
    #[arg(short, long)]
    discover: bool,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(short, long)]
    state: Option<PathBuf>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load JSON config
    // -------------------------------

    let store = config_loader::run(&args.config)?;
    let settings = store.settings()?;
    logging::run(settings.logging.as_ref(), args.log_level);
    info!("config loaded from {}", store.path().display());

    // -------------------------------
    // 2. Run discovery or sync
    // -------------------------------

    run(args, Arc::new(store)).await.inspect_err(|err| {
        error!("{:#}", err);
    })
}

async fn run(args: Args, store: Arc<tap_nationbuilder::ConfigStore>) -> Result<()> {
    let mut tap = Tap::new(store)?;

    if args.discover {
        let catalog = tap.discover().await?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        info!("discovery finished, {} stream(s)", catalog.streams.len());
        return Ok(());
    }

    let catalog = args.catalog.as_deref().map(Catalog::load).transpose()?;
    let state = args.state.as_deref().map(load_state).transpose()?;

    let mut writer = MessageWriter::new(BufWriter::new(io::stdout()));
    info!("sync starting...");
    tap.sync(catalog.as_ref(), state, &mut writer).await?;
    Ok(())
}
