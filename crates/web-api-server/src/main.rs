use calendar_core::telemetry::init_telemetry;
use clap::Parser;
use web_api_server::{run, server::config::CliArgs};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let telemetry = init_telemetry("web-api-server")?;
    let result = run(args).await;
    telemetry.shutdown();
    if result.is_err() {
        // Already logged by `run`.
        std::process::exit(1);
    }
    Ok(())
}
