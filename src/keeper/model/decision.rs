use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// keeper动作枚举，顺序与规则梯子的优先级无关，仅用于稳定的序列化排序
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeeperAction {
    Hold,
    Harvest,
    RepayDebt,
    ExitToStable,
    Rebalance,
    IncreasePosition,
}

impl KeeperAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeeperAction::Hold => "HOLD",
            KeeperAction::Harvest => "HARVEST",
            KeeperAction::RepayDebt => "REPAY_DEBT",
            KeeperAction::ExitToStable => "EXIT_TO_STABLE",
            KeeperAction::Rebalance => "REBALANCE",
            KeeperAction::IncreasePosition => "INCREASE_POSITION",
        }
    }
}

/// 输入回显，供审计端独立校验决策依据；缺失字段不序列化
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_signal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fear_greed_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hbar_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hbar_change24h: Option<f64>,
}

/// 借贷策略决策，每次调用产出且仅产出一个动作
///
/// reason是嵌入了触发阈值与观测值的模板化文本，不是静态标签，
/// 审计端据此可以独立复核决策依据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: KeeperAction,
    pub reason: String,
    /// [0, 1]
    pub confidence: f64,
    pub params: BTreeMap<String, serde_json::Value>,
    /// ISO8601
    pub timestamp: String,
    pub context: DecisionContext,
}

/// 金库策略决策
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDecision {
    /// 目标金库，必须指向未暂停候选；无动作时为None
    pub vault_id: Option<String>,
    pub action: KeeperAction,
    pub score: f64,
    pub reasoning: String,
}
