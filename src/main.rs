use tracing::error;
use whatidid::cli::run_cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!("Error running cli {e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
