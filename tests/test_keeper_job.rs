use async_trait::async_trait;

use yield_keeper::keeper::audit::{AuditLogger, TracingAuditLogger};
use yield_keeper::keeper::model::market::MarketSnapshot;
use yield_keeper::keeper::model::vault::VaultGoal;
use yield_keeper::keeper::strategy::strategy_config::StrategyConfig;
use yield_keeper::keeper::task::keeper_job::KeeperJob;
use yield_keeper::keeper::task::snapshot_job::{
    gather_snapshots, MarketDataSource, SimulatedSource,
};

/// 模拟一个总是失败的市场数据上游
struct BrokenMarketSource;

#[async_trait]
impl MarketDataSource for BrokenMarketSource {
    async fn fetch_market(&self) -> anyhow::Result<MarketSnapshot> {
        anyhow::bail!("sentiment oracle timed out")
    }
}

#[tokio::test]
async fn test_failed_source_degrades_to_neutral_snapshot() {
    let simulated = SimulatedSource::new(7);
    let snapshots =
        gather_snapshots(&BrokenMarketSource, &simulated, &simulated, 0.08).await;

    // 失败的上游被替换为中性快照，周期不被阻塞
    assert_eq!(snapshots.market.sentiment_score, 0.0);
    assert_eq!(snapshots.market.confidence, 0.0);
    assert_eq!(snapshots.market.volatility, 0.0);
    assert_eq!(snapshots.market.reference_price, 0.08);
    // 其余上游正常返回
    assert!(!snapshots.portfolio.positions.is_empty());
    assert!(!snapshots.vaults.candidates.is_empty());
}

#[tokio::test]
async fn test_cycle_produces_both_decisions_and_audit_receipt() {
    let simulated = SimulatedSource::new(7);
    let snapshots = gather_snapshots(&simulated, &simulated, &simulated, 0.08).await;

    let job = KeeperJob::new(StrategyConfig::default(), VaultGoal::Balanced).unwrap();
    let audit = TracingAuditLogger::new();

    let (decision, vault_decision) = job.run_cycle(&snapshots, &audit).await.unwrap();
    assert!(!decision.reason.is_empty());
    assert!((0.0..=1.0).contains(&decision.confidence));
    assert!(!vault_decision.reasoning.is_empty());

    // 两个引擎互相独立：同样的快照重跑，动作不变
    let (decision2, vault_decision2) = job.run_cycle(&snapshots, &audit).await.unwrap();
    assert_eq!(decision.action, decision2.action);
    assert_eq!(vault_decision.action, vault_decision2.action);
}

#[tokio::test]
async fn test_audit_sequence_numbers_are_monotonic() {
    let simulated = SimulatedSource::new(7);
    let snapshots = gather_snapshots(&simulated, &simulated, &simulated, 0.08).await;
    let job = KeeperJob::new(StrategyConfig::default(), VaultGoal::Balanced).unwrap();

    let audit = TracingAuditLogger::new();
    let (decision, _) = job.run_cycle(&snapshots, &audit).await.unwrap();

    let first = audit.publish(&decision).await.unwrap();
    let second = audit.publish(&decision).await.unwrap();
    assert!(second.sequence_number > first.sequence_number);
}

#[tokio::test]
async fn test_invalid_config_rejected_at_job_construction() {
    let mut config = StrategyConfig::default();
    config.confidence_minimum = 2.0;
    assert!(KeeperJob::new(config, VaultGoal::Balanced).is_err());
}
