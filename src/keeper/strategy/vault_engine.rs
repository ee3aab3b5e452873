use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::KeeperError;
use crate::keeper::field_usable;
use crate::keeper::model::decision::{KeeperAction, VaultDecision};
use crate::keeper::model::vault::{RiskLevel, VaultGoal, VaultKeeperContext, VaultState};

/// 当前金库待收获奖励达到该金额（USD）才值得发起收获
pub const HARVEST_MIN_REWARDS_USD: f64 = 1.0;
/// 最优金库得分需要领先当前金库多少才触发迁移
pub const REBALANCE_MIN_SCORE_GAP: f64 = 0.05;

/// 排名表中的单行：同一评分函数，完整排序，仅用于展示对比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultScore {
    pub vault_id: String,
    pub apy: f64,
    pub risk_level: RiskLevel,
    pub score: f64,
}

/// 目标权重 (APY权重, 风险权重)
fn goal_weights(goal: VaultGoal) -> (f64, f64) {
    match goal {
        VaultGoal::SafeYield => (0.35, 0.65),
        VaultGoal::MaxYield => (0.8, 0.2),
        VaultGoal::Balanced => (0.6, 0.4),
    }
}

/// 单个金库评分：归一化APY与反向风险乘数按目标加权，再做市场调整
///
/// 波动率超过高波动阈值时按超出比例折价，情绪强烈看涨时加成；
/// safe-yield目标下高风险候选直接清零
fn score_vault(ctx: &VaultKeeperContext, vault: &VaultState, max_apy: f64) -> f64 {
    if ctx.goal == VaultGoal::SafeYield && vault.risk_level == RiskLevel::High {
        return 0.0;
    }

    let apy_norm = if max_apy > 0.0 && field_usable(vault.apy) {
        (vault.apy / max_apy).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (apy_weight, risk_weight) = goal_weights(ctx.goal);
    let mut score = apy_weight * apy_norm + risk_weight * vault.risk_level.multiplier();

    let vol_threshold = ctx.config.high_volatility_threshold;
    if field_usable(ctx.volatility) && vol_threshold > 0.0 && ctx.volatility > vol_threshold {
        let excess = ((ctx.volatility - vol_threshold) / vol_threshold).min(1.0);
        score *= 1.0 - 0.5 * excess;
    }
    if field_usable(ctx.sentiment_score) && ctx.sentiment_score >= ctx.config.bullish_threshold {
        score *= 1.1;
    }
    score
}

/// 对比全部候选金库：过滤暂停金库后按得分降序输出完整排名
pub fn compare_vaults(ctx: &VaultKeeperContext) -> Vec<VaultScore> {
    let max_apy = ctx
        .candidates
        .iter()
        .filter(|v| !v.is_paused && field_usable(v.apy))
        .map(|v| v.apy)
        .fold(0.0, f64::max);

    let mut ranking: Vec<VaultScore> = ctx
        .candidates
        .iter()
        .filter(|v| !v.is_paused)
        .map(|v| VaultScore {
            vault_id: v.id.clone(),
            apy: v.apy,
            risk_level: v.risk_level,
            score: score_vault(ctx, v, max_apy),
        })
        .collect();

    // 得分相同按id排序，保证排名确定性
    ranking.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.vault_id.cmp(&b.vault_id))
    });
    ranking
}

/// 金库策略决策：收获 > 迁移 > 持有
pub fn decide(ctx: &VaultKeeperContext) -> Result<VaultDecision, KeeperError> {
    ctx.config.validate()?;

    let ranking = compare_vaults(ctx);
    debug!("金库候选排名: {} 个未暂停候选", ranking.len());

    // 当前金库奖励达到收获阈值且仍是有效候选时优先收获
    if let Some(position) = &ctx.current_position {
        if position.pending_rewards_usd >= HARVEST_MIN_REWARDS_USD {
            if let Some(current) = ranking.iter().find(|s| s.vault_id == position.vault_id) {
                return Ok(VaultDecision {
                    vault_id: Some(current.vault_id.clone()),
                    action: KeeperAction::Harvest,
                    score: current.score,
                    reasoning: format!(
                        "pending rewards {:.2} USD above harvest threshold {:.2} USD on vault {}",
                        position.pending_rewards_usd, HARVEST_MIN_REWARDS_USD, position.vault_id
                    ),
                });
            }
        }
    }

    let best = match ranking.first() {
        Some(best) => best,
        None => {
            return Ok(VaultDecision {
                vault_id: None,
                action: KeeperAction::Hold,
                score: 0.0,
                reasoning: "no eligible vault candidates (all paused or empty)".to_string(),
            });
        }
    };

    let current_id = ctx.current_position.as_ref().map(|p| p.vault_id.as_str());
    let current_score = current_id
        .and_then(|id| ranking.iter().find(|s| s.vault_id == id))
        .map(|s| s.score)
        .unwrap_or(0.0);

    // 没有仓位也没有可投入余额时无事可做
    if ctx.current_position.is_none() && ctx.user_balance_usd <= 0.0 {
        return Ok(VaultDecision {
            vault_id: None,
            action: KeeperAction::Hold,
            score: best.score,
            reasoning: "no active position and no balance to deploy".to_string(),
        });
    }

    if Some(best.vault_id.as_str()) != current_id
        && best.score - current_score > REBALANCE_MIN_SCORE_GAP
    {
        return Ok(VaultDecision {
            vault_id: Some(best.vault_id.clone()),
            action: KeeperAction::Rebalance,
            score: best.score,
            reasoning: format!(
                "vault {} scores {:.3}, ahead of current {:.3} by more than minimum gap {:.2}",
                best.vault_id, best.score, current_score, REBALANCE_MIN_SCORE_GAP
            ),
        });
    }

    Ok(VaultDecision {
        vault_id: None,
        action: KeeperAction::Hold,
        score: current_score.max(best.score),
        reasoning: format!(
            "best candidate {} does not beat current allocation by the minimum score gap",
            best.vault_id
        ),
    })
}
