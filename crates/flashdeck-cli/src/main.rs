//! `flashdeck` binary entrypoint.

#[tokio::main]
async fn main() {
    std::process::exit(flashdeck_cli::run().await);
}
