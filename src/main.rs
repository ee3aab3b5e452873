use clap::Parser;
use dotenv::dotenv;

use yield_keeper::app::bootstrap;
use yield_keeper::app_config::log::setup_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 设置日志
    setup_logging()?;

    let args = bootstrap::CliArgs::parse();
    bootstrap::run(&args).await
}
