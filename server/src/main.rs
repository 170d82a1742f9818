use anyhow::{Context, Result};
use clap::Parser;
use fluxdocs_server::build_app_with_token;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "fluxdocs-server", about = "Serve BM25 search over a fluxdocs index snapshot")]
struct Args {
    /// Index directory written by `fluxdocs-indexer build`
    #[arg(long, default_value = "./index")]
    index: String,
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Token required by POST /index/reload; reload is disabled without one
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
}

impl Args {
    fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    if args.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, /index/reload will reject every request");
    }
    let app = build_app_with_token(args.index.clone(), args.admin_token.clone())
        .with_context(|| format!("loading index from {}", args.index))?;

    let addr = args.addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index = %args.index, reload = args.admin_token.is_some(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
