use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "moviematch-server")]
#[command(about = "Room and matchmaking server for two-player movie picking", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "moviematch.yaml")]
    config: String,
    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "moviematch=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = moviematch::run(&args.config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
