pub mod price_path;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::KeeperError;
use crate::keeper::model::decision::{Decision, KeeperAction};
use crate::keeper::model::market::MarketSnapshot;
use crate::keeper::model::portfolio::{LendingPosition, PortfolioSnapshot};
use crate::keeper::strategy::lend_engine;
use crate::keeper::strategy::strategy_config::StrategyConfig;
use crate::time_util;
use self::price_path::{PathPoint, PricePathGenerator};

/// 回测天数上限（用户可调旋钮，越界钳制而不是拒绝）
pub const MAX_BACK_TEST_DAYS: u32 = 90;
/// 初始投资额下限（USD）
pub const MIN_INVESTMENT_USD: f64 = 100.0;
/// 初始投资额上限（USD）
pub const MAX_INVESTMENT_USD: f64 = 100_000.0;

/// 默认路径种子
const DEFAULT_SEED: u64 = 42;
/// 模拟起始日（2025-01-01 UTC），保证数据点时间戳可复现
const SIM_EPOCH_MS: i64 = 1_735_689_600_000;
/// 模拟组合的基础存款年化收益率（百分比）
const BASE_SUPPLY_APY: f64 = 6.5;

/// 单个模拟日的账本记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackTestDataPoint {
    pub timestamp: String,
    pub reference_price: f64,
    pub passive_value: f64,
    pub active_value: f64,
    /// 仅在动作不为HOLD时记录，保持时间线稀疏可读
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

/// 回测汇总：收益只由首末值计算，中途波动不参与
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackTestSummary {
    pub initial_investment: f64,
    pub passive_final_value: f64,
    pub active_final_value: f64,
    /// 被动收益率（百分比）
    pub passive_return: f64,
    /// 主动收益率（百分比）
    pub active_return: f64,
    /// activeReturn - passiveReturn
    pub outperformance: f64,
    pub action_counts: BTreeMap<KeeperAction, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackTestResult {
    pub data_points: Vec<BackTestDataPoint>,
    pub summary: BackTestSummary,
}

/// 回测模拟器：在种子化的合成价格路径上反复驱动借贷决策引擎，
/// 与买入持有基线对比
pub struct BackTestSimulator {
    config: StrategyConfig,
    path: PricePathGenerator,
}

impl BackTestSimulator {
    pub fn new(config: StrategyConfig) -> Result<Self, KeeperError> {
        Self::with_path(config, PricePathGenerator::new(DEFAULT_SEED))
    }

    pub fn with_path(
        config: StrategyConfig,
        path: PricePathGenerator,
    ) -> Result<Self, KeeperError> {
        config.validate()?;
        Ok(Self { config, path })
    }

    /// 运行回测
    ///
    /// days与investment是面向用户的旋钮：越界时钳制到文档化区间；
    /// 非正值钳制也救不回来，直接返回SimulationError
    pub fn run(&self, days: u32, initial_investment: f64) -> Result<BackTestResult, KeeperError> {
        if days == 0 {
            return Err(KeeperError::Simulation("回测天数必须为正".to_string()));
        }
        if !(initial_investment > 0.0) {
            return Err(KeeperError::Simulation(format!(
                "初始投资额 {} 必须为正",
                initial_investment
            )));
        }
        let days = days.min(MAX_BACK_TEST_DAYS);
        let investment = initial_investment.clamp(MIN_INVESTMENT_USD, MAX_INVESTMENT_USD);

        let points = self.path.generate(days);
        let start_price = points[0].price;

        // 被动基线：初始资金全部买入并持有
        let passive_units = investment / start_price;

        // 主动策略账本
        let mut token_units = investment / start_price;
        let mut stable_usd = 0.0_f64; // EXIT_TO_STABLE之后冻结的部分
        let mut pending_yield_usd = 0.0_f64; // 未复投的累计收益

        let mut data_points: Vec<BackTestDataPoint> = Vec::with_capacity(points.len());
        let mut action_counts: BTreeMap<KeeperAction, u32> = BTreeMap::new();

        for point in &points {
            let market = market_for(point);
            let active_before = token_units * point.price + stable_usd + pending_yield_usd;
            let portfolio = portfolio_for(active_before);
            let decision = lend_engine::decide(&self.config, &market, &portfolio)?;

            // 仅场内部分计提当日收益
            pending_yield_usd += token_units * point.price * (BASE_SUPPLY_APY / 100.0 / 365.0);

            match decision.action {
                KeeperAction::Harvest => {
                    // 收益复投进仓位
                    if point.price > 0.0 {
                        token_units += pending_yield_usd / point.price;
                        pending_yield_usd = 0.0;
                    }
                }
                KeeperAction::IncreasePosition => {
                    // 全部场外资金重新入场
                    if point.price > 0.0 {
                        token_units += (stable_usd + pending_yield_usd) / point.price;
                        stable_usd = 0.0;
                        pending_yield_usd = 0.0;
                    }
                }
                KeeperAction::ExitToStable => {
                    // 市值冻结，后续价格下跌不再影响，直到下一次加仓
                    stable_usd += token_units * point.price;
                    token_units = 0.0;
                }
                // 价值原样结转，收益继续计提
                KeeperAction::Rebalance | KeeperAction::RepayDebt | KeeperAction::Hold => {}
            }

            *action_counts.entry(decision.action).or_insert(0) += 1;

            let timestamp = sim_timestamp(point.day)?;
            let passive_value = passive_units * point.price;
            let active_value = token_units * point.price + stable_usd + pending_yield_usd;

            data_points.push(BackTestDataPoint {
                timestamp: timestamp.clone(),
                reference_price: point.price,
                passive_value,
                active_value,
                // 时间戳替换为模拟日，保证重跑结果逐字节一致
                decision: (decision.action != KeeperAction::Hold).then(|| Decision {
                    timestamp,
                    ..decision
                }),
            });
        }

        // 汇总只取首末值，避免重复计入已经反映在账面上的复利效应
        let first = data_points.first().expect("days >= 1");
        let last = data_points.last().expect("days >= 1");
        let passive_return = (last.passive_value / investment - 1.0) * 100.0;
        let active_return = (last.active_value / investment - 1.0) * 100.0;

        let summary = BackTestSummary {
            initial_investment: investment,
            passive_final_value: last.passive_value,
            active_final_value: last.active_value,
            passive_return,
            active_return,
            outperformance: active_return - passive_return,
            action_counts,
        };
        info!(
            "回测完成: {}天, 被动 {:.2}% vs 主动 {:.2}% (首日 {} -> 末日 {})",
            days, summary.passive_return, summary.active_return, first.timestamp, last.timestamp
        );

        Ok(BackTestResult {
            data_points,
            summary,
        })
    }
}

/// 由路径点构造当日市场快照，纯函数
fn market_for(point: &PathPoint) -> MarketSnapshot {
    MarketSnapshot {
        sentiment_score: point.sentiment_score,
        confidence: 0.8,
        volatility: point.volatility,
        fear_greed_index: point.fear_greed_index,
        reference_price: point.price,
        change_24h: point.daily_return * 100.0,
    }
}

/// 由主动策略当前持仓重建仓位快照；模拟组合无负债，健康因子取哨兵值0
fn portfolio_for(active_value: f64) -> PortfolioSnapshot {
    PortfolioSnapshot {
        positions: vec![LendingPosition {
            asset: "HBAR".to_string(),
            supplied_usd: active_value,
            borrowed_usd: 0.0,
            supply_apy: BASE_SUPPLY_APY,
            borrow_apy: 0.0,
            collateral_enabled: true,
        }],
        health_factor: 0.0,
        current_ltv: 0.0,
    }
}

fn sim_timestamp(day: u32) -> Result<String, KeeperError> {
    time_util::mill_time_to_rfc3339(SIM_EPOCH_MS + day as i64 * 86_400_000)
        .map_err(KeeperError::Simulation)
}
