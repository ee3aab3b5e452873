use serde::{Deserialize, Serialize};

use crate::keeper::field_usable;

/// 单个借贷仓位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingPosition {
    pub asset: String,
    pub supplied_usd: f64,
    pub borrowed_usd: f64,
    /// 存款年化收益率（百分比）
    pub supply_apy: f64,
    /// 借款年化利率（百分比）
    pub borrow_apy: f64,
    pub collateral_enabled: bool,
}

/// 单个周期内的仓位快照，构造之后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub positions: Vec<LendingPosition>,
    /// 健康因子 >= 0；0是"无负债/未知"哨兵值，不是除零失败
    pub health_factor: f64,
    /// 当前贷款价值比 [0, 1]
    pub current_ltv: f64,
}

impl PortfolioSnapshot {
    /// 无仓位的空快照（上游降级时的替代值）
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            health_factor: 0.0,
            current_ltv: 0.0,
        }
    }

    /// 当前主仓位（supplied_usd最大且有效）的存款APY
    pub fn dominant_supply_apy(&self) -> Option<f64> {
        self.positions
            .iter()
            .filter(|p| field_usable(p.supply_apy) && field_usable(p.supplied_usd) && p.supplied_usd > 0.0)
            .max_by(|a, b| a.supplied_usd.total_cmp(&b.supplied_usd))
            .map(|p| p.supply_apy)
    }

    /// 所有仓位中最高的有效存款APY
    pub fn best_supply_apy(&self) -> Option<f64> {
        self.positions
            .iter()
            .map(|p| p.supply_apy)
            .filter(|apy| field_usable(*apy))
            .max_by(|a, b| a.total_cmp(b))
    }
}
