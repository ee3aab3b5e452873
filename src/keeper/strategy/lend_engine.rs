use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::KeeperError;
use crate::keeper::field_usable;
use crate::keeper::model::decision::{Decision, DecisionContext, KeeperAction};
use crate::keeper::model::market::MarketSnapshot;
use crate::keeper::model::portfolio::PortfolioSnapshot;
use crate::keeper::strategy::strategy_config::StrategyConfig;
use crate::time_util;

/// 单条规则命中时的产出
pub struct RuleFire {
    pub confidence: f64,
    pub reason: String,
    pub params: BTreeMap<String, serde_json::Value>,
}

/// 规则 = 动作 + 判定函数
///
/// 梯子按固定顺序求值，先命中者生效，后续规则不再求值。
/// 依赖降级字段（NaN）的规则视为不命中，继续向下求值
pub struct PolicyRule {
    pub name: &'static str,
    pub action: KeeperAction,
    pub evaluate: fn(&StrategyConfig, &MarketSnapshot, &PortfolioSnapshot) -> Option<RuleFire>,
}

/// 规则梯子，顺序即优先级，编码安全优先的设计原则：
/// 债务风险 > 看跌离场 > 波动离场 > 看涨加仓 > 收益率套利 > 持有
/// 该顺序不可调整
pub const POLICY_LADDER: [PolicyRule; 5] = [
    PolicyRule {
        name: "repay_debt",
        action: KeeperAction::RepayDebt,
        evaluate: rule_repay_debt,
    },
    PolicyRule {
        name: "harvest",
        action: KeeperAction::Harvest,
        evaluate: rule_harvest,
    },
    PolicyRule {
        name: "exit_to_stable",
        action: KeeperAction::ExitToStable,
        evaluate: rule_exit_to_stable,
    },
    PolicyRule {
        name: "increase_position",
        action: KeeperAction::IncreasePosition,
        evaluate: rule_increase_position,
    },
    PolicyRule {
        name: "rebalance",
        action: KeeperAction::Rebalance,
        evaluate: rule_rebalance,
    },
];

/// 借贷策略决策：确定性、全函数、无副作用
///
/// 配置不合法时在任何规则求值之前返回错误；快照字段降级只会
/// 使相关规则不命中，梯子最终总能落到HOLD
pub fn decide(
    config: &StrategyConfig,
    market: &MarketSnapshot,
    portfolio: &PortfolioSnapshot,
) -> Result<Decision, KeeperError> {
    config.validate()?;

    let degraded = degraded_fields(market, portfolio);
    if !degraded.is_empty() {
        warn!("快照字段降级，相关规则按不命中处理: {:?}", degraded);
    }

    for rule in POLICY_LADDER.iter() {
        if let Some(fire) = (rule.evaluate)(config, market, portfolio) {
            debug!("规则命中: {} -> {}", rule.name, rule.action.as_str());
            return Ok(build_decision(rule.action, fire, config, market));
        }
    }

    Ok(build_decision(
        KeeperAction::Hold,
        hold_fire(config, market),
        config,
        market,
    ))
}

/// 规则1：健康因子跌破危险线，资金风险压倒一切市场观点
/// 安全规则置信度固定为1.0；健康因子0是无负债哨兵值，不触发
fn rule_repay_debt(
    config: &StrategyConfig,
    _market: &MarketSnapshot,
    portfolio: &PortfolioSnapshot,
) -> Option<RuleFire> {
    let hf = portfolio.health_factor;
    if !field_usable(hf) {
        return None;
    }
    if hf > 0.0 && hf < config.health_factor_danger {
        return Some(RuleFire {
            confidence: 1.0,
            reason: format!(
                "health factor {:.2} below danger threshold {:.2}, repay toward target {:.2}",
                hf, config.health_factor_danger, config.health_factor_target
            ),
            params: rule_params(&[
                ("healthFactor", json!(hf)),
                ("dangerThreshold", json!(config.health_factor_danger)),
                ("targetHealthFactor", json!(config.health_factor_target)),
            ]),
        });
    }
    None
}

/// 规则2：情绪跌破看跌阈值且置信度达标，先落袋收益
fn rule_harvest(
    config: &StrategyConfig,
    market: &MarketSnapshot,
    _portfolio: &PortfolioSnapshot,
) -> Option<RuleFire> {
    let sentiment = market.sentiment_score;
    let confidence = market.confidence;
    if !field_usable(sentiment) || !field_usable(confidence) {
        return None;
    }
    if sentiment <= config.bearish_threshold && confidence >= config.confidence_minimum {
        return Some(RuleFire {
            confidence,
            reason: format!(
                "sentiment {:.0} at or below bearish threshold {:.0} with confidence {:.2}",
                sentiment, config.bearish_threshold, confidence
            ),
            params: rule_params(&[
                ("sentimentScore", json!(sentiment)),
                ("bearishThreshold", json!(config.bearish_threshold)),
            ]),
        });
    }
    None
}

/// 规则3：波动率达到高波动阈值，离场到稳定资产
/// 置信度随超出幅度上升，钳制在 [confidenceMinimum, 1.0]
fn rule_exit_to_stable(
    config: &StrategyConfig,
    market: &MarketSnapshot,
    _portfolio: &PortfolioSnapshot,
) -> Option<RuleFire> {
    let vol = market.volatility;
    if !field_usable(vol) {
        return None;
    }
    if vol >= config.high_volatility_threshold {
        let threshold = config.high_volatility_threshold;
        let excess = if threshold > 0.0 {
            ((vol - threshold) / threshold).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let confidence =
            config.confidence_minimum + (1.0 - config.confidence_minimum) * excess;
        return Some(RuleFire {
            confidence,
            reason: format!(
                "volatility {:.1} at or above high volatility threshold {:.1}",
                vol, threshold
            ),
            params: rule_params(&[
                ("volatility", json!(vol)),
                ("highVolatilityThreshold", json!(threshold)),
            ]),
        });
    }
    None
}

/// 规则4：情绪突破看涨阈值且置信度达标，加仓
fn rule_increase_position(
    config: &StrategyConfig,
    market: &MarketSnapshot,
    _portfolio: &PortfolioSnapshot,
) -> Option<RuleFire> {
    let sentiment = market.sentiment_score;
    let confidence = market.confidence;
    if !field_usable(sentiment) || !field_usable(confidence) {
        return None;
    }
    if sentiment >= config.bullish_threshold && confidence >= config.confidence_minimum {
        return Some(RuleFire {
            confidence,
            reason: format!(
                "sentiment {:.0} at or above bullish threshold {:.0} with confidence {:.2}",
                sentiment, config.bullish_threshold, confidence
            ),
            params: rule_params(&[
                ("sentimentScore", json!(sentiment)),
                ("bullishThreshold", json!(config.bullish_threshold)),
            ]),
        });
    }
    None
}

/// 规则5：最优存款APY与当前主仓位APY的差值超过最小收益差，做收益率再平衡
/// 置信度 = spread / (spread + threshold)，天然落在 [0, 1]
fn rule_rebalance(
    config: &StrategyConfig,
    _market: &MarketSnapshot,
    portfolio: &PortfolioSnapshot,
) -> Option<RuleFire> {
    let best = portfolio.best_supply_apy()?;
    let current = portfolio.dominant_supply_apy()?;
    let spread = best - current;
    if spread > config.min_yield_differential {
        let confidence = spread / (spread + config.min_yield_differential);
        return Some(RuleFire {
            confidence: confidence.clamp(0.0, 1.0),
            reason: format!(
                "best supply APY {:.2}% exceeds current {:.2}% by {:.2}% (min differential {:.2}%)",
                best, current, spread, config.min_yield_differential
            ),
            params: rule_params(&[
                ("bestSupplyApy", json!(best)),
                ("currentSupplyApy", json!(current)),
                ("spread", json!(spread)),
                ("minYieldDifferential", json!(config.min_yield_differential)),
            ]),
        });
    }
    None
}

/// 终态：没有任何规则命中
/// 置信度 = 1 - 归一化不确定度；信号越弱，"什么都不做"的把握越高
fn hold_fire(config: &StrategyConfig, market: &MarketSnapshot) -> RuleFire {
    let uncertainty = hold_uncertainty(config, market);
    RuleFire {
        confidence: (1.0 - uncertainty).clamp(0.0, 1.0),
        reason: format!(
            "no rule fired; strongest signal at {:.0}% of its threshold",
            uncertainty * 100.0
        ),
        params: rule_params(&[("signalStrength", json!(uncertainty))]),
    }
}

/// 归一化不确定度：各未命中信号朝阈值推进比例的最大值，降级字段计0
fn hold_uncertainty(config: &StrategyConfig, market: &MarketSnapshot) -> f64 {
    let mut ratios: Vec<f64> = Vec::with_capacity(3);

    if field_usable(market.sentiment_score) {
        let s = market.sentiment_score;
        if s > 0.0 && config.bullish_threshold > 0.0 {
            ratios.push(s / config.bullish_threshold);
        }
        if s < 0.0 && config.bearish_threshold < 0.0 {
            ratios.push(s / config.bearish_threshold);
        }
    }
    if field_usable(market.volatility) && config.high_volatility_threshold > 0.0 {
        ratios.push(market.volatility / config.high_volatility_threshold);
    }

    ratios
        .into_iter()
        .map(|r| r.clamp(0.0, 1.0))
        .fold(0.0, f64::max)
}

fn build_decision(
    action: KeeperAction,
    fire: RuleFire,
    config: &StrategyConfig,
    market: &MarketSnapshot,
) -> Decision {
    Decision {
        action,
        reason: fire.reason,
        confidence: fire.confidence.clamp(0.0, 1.0),
        params: fire.params,
        timestamp: time_util::now_rfc3339(),
        context: decision_context(config, market),
    }
}

/// 输入回显：仅包含采样有效的字段
fn decision_context(config: &StrategyConfig, market: &MarketSnapshot) -> DecisionContext {
    let opt = |v: f64| field_usable(v).then_some(v);
    DecisionContext {
        sentiment_score: opt(market.sentiment_score),
        sentiment_signal: sentiment_signal(config, market),
        volatility: opt(market.volatility),
        fear_greed_index: opt(market.fear_greed_index),
        hbar_price: opt(market.reference_price),
        hbar_change24h: opt(market.change_24h),
    }
}

fn sentiment_signal(config: &StrategyConfig, market: &MarketSnapshot) -> Option<String> {
    if !field_usable(market.sentiment_score) {
        return None;
    }
    let signal = if market.sentiment_score <= config.bearish_threshold {
        "bearish"
    } else if market.sentiment_score >= config.bullish_threshold {
        "bullish"
    } else {
        "neutral"
    };
    Some(signal.to_string())
}

fn rule_params(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// 列出降级（NaN）的快照字段，用于告警日志
fn degraded_fields(market: &MarketSnapshot, portfolio: &PortfolioSnapshot) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if !field_usable(market.sentiment_score) {
        fields.push("sentimentScore");
    }
    if !field_usable(market.confidence) {
        fields.push("confidence");
    }
    if !field_usable(market.volatility) {
        fields.push("volatility");
    }
    if !field_usable(market.fear_greed_index) {
        fields.push("fearGreedIndex");
    }
    if !field_usable(portfolio.health_factor) {
        fields.push("healthFactor");
    }
    fields
}
