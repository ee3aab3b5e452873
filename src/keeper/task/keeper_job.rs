use tracing::{info, warn};
use uuid::Uuid;

use crate::error::KeeperError;
use crate::keeper::audit::AuditLogger;
use crate::keeper::model::decision::{Decision, VaultDecision};
use crate::keeper::model::vault::{VaultGoal, VaultKeeperContext};
use crate::keeper::strategy::strategy_config::StrategyConfig;
use crate::keeper::strategy::{lend_engine, vault_engine};
use crate::keeper::task::snapshot_job::CycleSnapshots;

/// keeper周期任务：采集好的快照 -> 两个引擎独立决策 -> 决策交付审计端
///
/// 借贷与金库两条策略互不调和，动作冲突（如同时出现REPAY_DEBT与
/// REBALANCE）留给调用方处理
pub struct KeeperJob {
    config: StrategyConfig,
    goal: VaultGoal,
}

impl KeeperJob {
    pub fn new(config: StrategyConfig, goal: VaultGoal) -> Result<Self, KeeperError> {
        config.validate()?;
        Ok(Self { config, goal })
    }

    /// 执行一个周期
    pub async fn run_cycle(
        &self,
        snapshots: &CycleSnapshots,
        audit: &dyn AuditLogger,
    ) -> Result<(Decision, VaultDecision), KeeperError> {
        let cycle_id = Uuid::new_v4();

        let decision = lend_engine::decide(&self.config, &snapshots.market, &snapshots.portfolio)?;
        info!(
            "cycle={} 借贷决策: {} (置信度 {:.2}) - {}",
            cycle_id,
            decision.action.as_str(),
            decision.confidence,
            decision.reason
        );

        let vault_ctx = VaultKeeperContext {
            config: self.config.clone(),
            goal: self.goal,
            candidates: snapshots.vaults.candidates.clone(),
            sentiment_score: snapshots.market.sentiment_score,
            volatility: snapshots.market.volatility,
            user_balance_usd: snapshots.vaults.user_balance_usd,
            current_position: snapshots.vaults.current_position.clone(),
        };
        let vault_decision = vault_engine::decide(&vault_ctx)?;
        info!(
            "cycle={} 金库决策: {} (得分 {:.3}) - {}",
            cycle_id,
            vault_decision.action.as_str(),
            vault_decision.score,
            vault_decision.reasoning
        );

        // 决策原样交付审计端；发布失败只告警，核心不重试
        match audit.publish(&decision).await {
            Ok(receipt) => info!(
                "cycle={} 审计回执: seq={} ts={}",
                cycle_id, receipt.sequence_number, receipt.consensus_timestamp
            ),
            Err(e) => warn!("cycle={} 审计发布失败（不重试）: {}", cycle_id, e),
        }

        Ok((decision, vault_decision))
    }
}
