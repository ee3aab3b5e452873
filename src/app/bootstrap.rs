use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tracing::{error, info};

use crate::app_config::env::{env_is_true, env_or_default, env_u64_or_default};
use crate::keeper::audit::TracingAuditLogger;
use crate::keeper::back_test::price_path::PricePathGenerator;
use crate::keeper::back_test::BackTestSimulator;
use crate::keeper::model::vault::VaultGoal;
use crate::keeper::strategy::strategy_config::StrategyConfig;
use crate::keeper::task::keeper_job::KeeperJob;
use crate::keeper::task::snapshot_job::{gather_snapshots, SimulatedSource};

/// 无市场数据时keeper周期使用的参考价兜底值（USD）
const FALLBACK_REFERENCE_PRICE: f64 = 0.08;

#[derive(Parser, Debug, Clone)]
#[command(name = "yield_keeper", about = "借贷/收益金库keeper：规则梯子决策与回测")]
pub struct CliArgs {
    /// 回测天数（上限90，越界钳制）
    #[arg(long, default_value_t = 30)]
    pub days: u32,

    /// 回测初始投资额USD（100-100000，越界钳制）
    #[arg(long, default_value_t = 1000.0)]
    pub investment: f64,

    /// 合成价格路径种子
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// 运行基于环境变量控制的各个模式（回测 / keeper周期）
pub async fn run_modes(args: &CliArgs) -> anyhow::Result<()> {
    // 1) 回测模式：跑一遍模拟并输出汇总
    if env_is_true("IS_RUN_BACK_TEST", false) {
        info!("IS_RUN_BACK_TEST 已启用");
        let simulator = BackTestSimulator::with_path(
            StrategyConfig::default(),
            PricePathGenerator::new(args.seed),
        )?;
        let result = simulator.run(args.days, args.investment)?;
        info!("回测汇总: {}", json!(result.summary));
    }

    // 2) keeper周期模式：周期性采集快照并决策
    if env_is_true("IS_RUN_KEEPER_JOB", false) {
        info!("IS_RUN_KEEPER_JOB 已启用");
        run_keeper_loop(args).await?;
    }

    Ok(())
}

/// keeper主循环：固定间隔执行周期，Ctrl+C平滑退出
async fn run_keeper_loop(args: &CliArgs) -> anyhow::Result<()> {
    let interval_secs = env_u64_or_default("KEEPER_INTERVAL_SECS", 300);
    let goal = match env_or_default("KEEPER_VAULT_GOAL", "balanced").as_str() {
        "safe-yield" => VaultGoal::SafeYield,
        "max-yield" => VaultGoal::MaxYield,
        _ => VaultGoal::Balanced,
    };
    let source = SimulatedSource::new(args.seed);
    let job = KeeperJob::new(StrategyConfig::default(), goal)?;
    let audit = TracingAuditLogger::new();

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    info!("keeper周期启动，间隔 {} 秒", interval_secs);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshots =
                    gather_snapshots(&source, &source, &source, FALLBACK_REFERENCE_PRICE).await;
                if let Err(e) = job.run_cycle(&snapshots, &audit).await {
                    error!("keeper周期执行失败: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("收到退出信号，停止keeper周期");
                break;
            }
        }
    }
    Ok(())
}

/// 应用入口编排
pub async fn run(args: &CliArgs) -> anyhow::Result<()> {
    run_modes(args).await
}
