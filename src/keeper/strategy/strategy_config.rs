use serde::{Deserialize, Serialize};

use crate::error::KeeperError;

/// 策略阈值配置，控制规则梯子的触发灵敏度
///
/// 所有字段都有文档化默认值；局部覆盖通过serde(default)与默认值合并，
/// 越界字段一律拒绝而不是静默钳制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyConfig {
    /// 看跌情绪阈值，<= 0
    pub bearish_threshold: f64,
    /// 看涨情绪阈值，>= 0，且必须大于bearish_threshold
    pub bullish_threshold: f64,
    /// 市场规则生效所需的最低置信度 [0, 1]
    pub confidence_minimum: f64,
    /// 健康因子危险线，> 1.0
    pub health_factor_danger: f64,
    /// 健康因子目标值，必须大于危险线
    pub health_factor_target: f64,
    /// 高波动阈值，>= 0
    pub high_volatility_threshold: f64,
    /// 触发收益率再平衡的最小APY差（百分比），>= 0
    pub min_yield_differential: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            bearish_threshold: -30.0,
            bullish_threshold: 50.0,
            confidence_minimum: 0.6,
            health_factor_danger: 1.3,
            health_factor_target: 1.8,
            high_volatility_threshold: 80.0,
            min_yield_differential: 2.0,
        }
    }
}

impl StrategyConfig {
    /// 从局部JSON覆盖构造：缺失字段取默认值，越界字段直接拒绝
    pub fn from_partial(value: &serde_json::Value) -> Result<Self, KeeperError> {
        let config: StrategyConfig = serde_json::from_value(value.clone())
            .map_err(|e| KeeperError::Config(format!("策略配置解析失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验全部不变量；任何一项失败都在规则求值之前返回错误
    pub fn validate(&self) -> Result<(), KeeperError> {
        if !self.bearish_threshold.is_finite() || self.bearish_threshold > 0.0 {
            return Err(KeeperError::Config(format!(
                "bearishThreshold {} 必须为有限值且 <= 0",
                self.bearish_threshold
            )));
        }
        if !self.bullish_threshold.is_finite() || self.bullish_threshold < 0.0 {
            return Err(KeeperError::Config(format!(
                "bullishThreshold {} 必须为有限值且 >= 0",
                self.bullish_threshold
            )));
        }
        if self.bullish_threshold <= self.bearish_threshold {
            return Err(KeeperError::Config(format!(
                "bullishThreshold {} 必须大于 bearishThreshold {}",
                self.bullish_threshold, self.bearish_threshold
            )));
        }
        if !self.confidence_minimum.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_minimum)
        {
            return Err(KeeperError::Config(format!(
                "confidenceMinimum {} 必须在 [0, 1] 区间内",
                self.confidence_minimum
            )));
        }
        if !self.health_factor_danger.is_finite() || self.health_factor_danger <= 1.0 {
            return Err(KeeperError::Config(format!(
                "healthFactorDanger {} 必须 > 1.0",
                self.health_factor_danger
            )));
        }
        if !self.health_factor_target.is_finite()
            || self.health_factor_target <= self.health_factor_danger
        {
            return Err(KeeperError::Config(format!(
                "healthFactorTarget {} 必须大于 healthFactorDanger {}",
                self.health_factor_target, self.health_factor_danger
            )));
        }
        if !self.high_volatility_threshold.is_finite() || self.high_volatility_threshold < 0.0 {
            return Err(KeeperError::Config(format!(
                "highVolatilityThreshold {} 必须 >= 0",
                self.high_volatility_threshold
            )));
        }
        if !self.min_yield_differential.is_finite() || self.min_yield_differential < 0.0 {
            return Err(KeeperError::Config(format!(
                "minYieldDifferential {} 必须 >= 0",
                self.min_yield_differential
            )));
        }
        Ok(())
    }
}
