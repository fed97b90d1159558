//! Demo upstream service for trying out the gateway's proxy and cache
//! stages. Pair it with `demos/devgate.toml`.

use axum::http::Uri;
use axum::routing::any;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "demo-upstream")]
#[command(about = "Demo upstream server for the devgate gateway", long_about = None)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 3001)]
    port: u16,
}

async fn api(uri: Uri) -> String {
    format!("api, {}", uri.path())
}

async fn mock(uri: Uri) -> String {
    format!("mock, {}", uri.path())
}

async fn banner() -> &'static str {
    "I'm a demo server, you can try /api or /mock"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let app = Router::new()
        .route("/api", any(api))
        .route("/api/{*rest}", any(api))
        .route("/mock", any(mock))
        .route("/mock/{*rest}", any(mock))
        .fallback(banner);

    let listener = TcpListener::bind(("127.0.0.1", cli.port)).await?;
    println!("You can visit http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
