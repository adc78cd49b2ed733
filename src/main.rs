use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use relmap::{app, server, sync};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Primary API base, e.g. http://127.0.0.1:8787
    #[arg(long)]
    api: Option<String>,

    /// Additional API bases to try when the primary is unreachable.
    #[arg(long = "alt-api")]
    alt_api: Vec<String>,

    /// Bearer token presented to the persistence service.
    #[arg(long, env = "RELMAP_TOKEN", default_value = "dev-token")]
    token: String,

    /// Seconds between background snapshot polls.
    #[arg(long, default_value_t = 12)]
    poll_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP persistence service instead of the desktop client.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        listen: SocketAddr,

        /// JSON document the graph is persisted to.
        #[arg(long, default_value = "relmap-graph.json")]
        data: PathBuf,

        #[arg(long, env = "RELMAP_TOKEN", default_value = "dev-token")]
        token: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    if let Some(Command::Serve {
        listen,
        data,
        token,
    }) = args.command
    {
        let runtime = tokio::runtime::Runtime::new().context("cannot start tokio runtime")?;
        return runtime.block_on(server::run(server::ServeConfig {
            listen,
            data_path: data,
            token,
        }));
    }

    let config = sync::SyncConfig {
        primary: args.api,
        alternates: args.alt_api,
        token: args.token,
        poll_interval: Duration::from_secs(args.poll_secs.max(1)),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "relmap",
        options,
        Box::new(move |cc| Ok(Box::new(app::RelMapApp::new(cc, config)))),
    )
    .map_err(|error| anyhow::anyhow!("ui failed: {error}"))
}
