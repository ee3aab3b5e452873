use serde::{Deserialize, Serialize};

/// 单个周期内的市场快照，由协作方采集一次，构造之后不可变
///
/// 缺失的字段用NaN表示，决策引擎会跳过依赖该字段的规则，
/// 不会因为单个上游降级而中断整个规则梯子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// 情绪分 [-100, 100]
    pub sentiment_score: f64,
    /// 情绪置信度 [0, 1]
    pub confidence: f64,
    /// 波动率 >= 0
    pub volatility: f64,
    /// 恐惧贪婪指数 [0, 100]
    pub fear_greed_index: f64,
    /// 参考资产价格（USD），> 0
    pub reference_price: f64,
    /// 24小时涨跌幅（百分比），上游缺失时为NaN
    #[serde(default = "nan")]
    pub change_24h: f64,
}

fn nan() -> f64 {
    f64::NAN
}

impl MarketSnapshot {
    /// 上游数据源不可用时的中性快照：置信度0、波动率0，不会触发任何市场规则
    pub fn neutral(reference_price: f64) -> Self {
        Self {
            sentiment_score: 0.0,
            confidence: 0.0,
            volatility: 0.0,
            fear_greed_index: 50.0,
            reference_price,
            change_24h: f64::NAN,
        }
    }
}
