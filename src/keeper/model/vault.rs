use serde::{Deserialize, Serialize};

use crate::keeper::strategy::strategy_config::StrategyConfig;

/// 金库策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaultStrategyKind {
    SingleAssetDex,
    DualAssetDex,
    LeveragedLst,
}

/// 金库风险等级，乘数越低折价越重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// 反向风险乘数：low=1.0, medium=0.7, high=0.4
    pub fn multiplier(&self) -> f64 {
        match self {
            RiskLevel::Low => 1.0,
            RiskLevel::Medium => 0.7,
            RiskLevel::High => 0.4,
        }
    }
}

/// 单个收益金库的当前状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultState {
    pub id: String,
    pub strategy_kind: VaultStrategyKind,
    /// 年化收益率（百分比），>= 0
    pub apy: f64,
    /// 锁仓量（USD），>= 0
    pub tvl: f64,
    pub risk_level: RiskLevel,
    /// 暂停中的金库不参与候选选择
    pub is_paused: bool,
    /// 每份额价格，> 0
    pub price_per_share: f64,
}

/// 金库策略目标，重新加权APY与风险两项得分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaultGoal {
    /// 高风险候选直接清零，而不仅是折价
    SafeYield,
    MaxYield,
    Balanced,
}

/// 用户当前的金库仓位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVaultPosition {
    pub vault_id: String,
    pub staked_usd: f64,
    /// 待收获奖励（USD）
    pub pending_rewards_usd: f64,
}

/// 金库决策引擎的输入：候选集合、市场读数、用户余额与当前仓位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultKeeperContext {
    pub config: StrategyConfig,
    pub goal: VaultGoal,
    pub candidates: Vec<VaultState>,
    /// 情绪分 [-100, 100]，缺失时为NaN
    pub sentiment_score: f64,
    /// 波动率 >= 0，缺失时为NaN
    pub volatility: f64,
    pub user_balance_usd: f64,
    pub current_position: Option<UserVaultPosition>,
}
