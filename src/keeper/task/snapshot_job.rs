use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::keeper::model::market::MarketSnapshot;
use crate::keeper::model::portfolio::{LendingPosition, PortfolioSnapshot};
use crate::keeper::model::vault::{
    RiskLevel, UserVaultPosition, VaultState, VaultStrategyKind,
};

/// 金库侧一次性采集的快照：候选集合、用户仓位与可投入余额
#[derive(Debug, Clone, PartialEq)]
pub struct VaultSnapshot {
    pub candidates: Vec<VaultState>,
    pub current_position: Option<UserVaultPosition>,
    pub user_balance_usd: f64,
}

impl VaultSnapshot {
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            current_position: None,
            user_balance_usd: 0.0,
        }
    }
}

/// 市场数据上游
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_market(&self) -> anyhow::Result<MarketSnapshot>;
}

/// 借贷仓位上游
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn fetch_portfolio(&self) -> anyhow::Result<PortfolioSnapshot>;
}

/// 金库状态上游
#[async_trait]
pub trait VaultSource: Send + Sync {
    async fn fetch_vaults(&self) -> anyhow::Result<VaultSnapshot>;
}

/// 一次周期采集到的全部快照
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSnapshots {
    pub market: MarketSnapshot,
    pub portfolio: PortfolioSnapshot,
    pub vaults: VaultSnapshot,
}

/// 并行采集三类快照，逐源失败软降级
///
/// 任何一个上游不可用时替换为中性/空快照并告警，绝不阻塞决策周期；
/// 重试（如果需要）属于上游自身，不在这里做
pub async fn gather_snapshots(
    market_source: &dyn MarketDataSource,
    portfolio_source: &dyn PortfolioSource,
    vault_source: &dyn VaultSource,
    fallback_price: f64,
) -> CycleSnapshots {
    let (market, portfolio, vaults) = tokio::join!(
        market_source.fetch_market(),
        portfolio_source.fetch_portfolio(),
        vault_source.fetch_vaults(),
    );

    let market = market.unwrap_or_else(|e| {
        warn!("市场数据源不可用，使用中性快照: {}", e);
        MarketSnapshot::neutral(fallback_price)
    });
    let portfolio = portfolio.unwrap_or_else(|e| {
        warn!("仓位数据源不可用，使用空快照: {}", e);
        PortfolioSnapshot::empty()
    });
    let vaults = vaults.unwrap_or_else(|e| {
        warn!("金库数据源不可用，使用空候选集: {}", e);
        VaultSnapshot::empty()
    });

    CycleSnapshots {
        market,
        portfolio,
        vaults,
    }
}

/// 本地演示用的确定性模拟数据源，无任何网络IO
///
/// 同一seed每个周期产出相同读数，方便本地复现keeper行为
pub struct SimulatedSource {
    seed: u64,
}

impl SimulatedSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }
}

#[async_trait]
impl MarketDataSource for SimulatedSource {
    async fn fetch_market(&self) -> anyhow::Result<MarketSnapshot> {
        let mut rng = self.rng();
        let sentiment_score: f64 = rng.gen_range(-60.0..60.0);
        let volatility: f64 = rng.gen_range(20.0..90.0);
        Ok(MarketSnapshot {
            sentiment_score,
            confidence: rng.gen_range(0.5..0.95),
            volatility,
            fear_greed_index: (50.0 + sentiment_score / 2.0).clamp(0.0, 100.0),
            reference_price: rng.gen_range(0.05..0.12),
            change_24h: rng.gen_range(-8.0..8.0),
        })
    }
}

#[async_trait]
impl PortfolioSource for SimulatedSource {
    async fn fetch_portfolio(&self) -> anyhow::Result<PortfolioSnapshot> {
        let mut rng = self.rng();
        let supplied: f64 = rng.gen_range(500.0..5000.0);
        let borrowed = supplied * rng.gen_range(0.0..0.5);
        let health_factor = if borrowed > 0.0 {
            rng.gen_range(1.1..3.0)
        } else {
            0.0
        };
        Ok(PortfolioSnapshot {
            positions: vec![
                LendingPosition {
                    asset: "HBAR".to_string(),
                    supplied_usd: supplied,
                    borrowed_usd: borrowed,
                    supply_apy: rng.gen_range(2.0..8.0),
                    borrow_apy: rng.gen_range(4.0..12.0),
                    collateral_enabled: true,
                },
                LendingPosition {
                    asset: "USDC".to_string(),
                    supplied_usd: rng.gen_range(100.0..1000.0),
                    borrowed_usd: 0.0,
                    supply_apy: rng.gen_range(3.0..10.0),
                    borrow_apy: 0.0,
                    collateral_enabled: false,
                },
            ],
            health_factor,
            current_ltv: (borrowed / supplied).clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl VaultSource for SimulatedSource {
    async fn fetch_vaults(&self) -> anyhow::Result<VaultSnapshot> {
        let mut rng = self.rng();
        let candidates = vec![
            VaultState {
                id: "vault-hbar-usdc".to_string(),
                strategy_kind: VaultStrategyKind::DualAssetDex,
                apy: rng.gen_range(8.0..20.0),
                tvl: rng.gen_range(100_000.0..2_000_000.0),
                risk_level: RiskLevel::Medium,
                is_paused: false,
                price_per_share: rng.gen_range(1.0..1.4),
            },
            VaultState {
                id: "vault-hbar-single".to_string(),
                strategy_kind: VaultStrategyKind::SingleAssetDex,
                apy: rng.gen_range(4.0..9.0),
                tvl: rng.gen_range(500_000.0..5_000_000.0),
                risk_level: RiskLevel::Low,
                is_paused: false,
                price_per_share: rng.gen_range(1.0..1.2),
            },
            VaultState {
                id: "vault-lst-leveraged".to_string(),
                strategy_kind: VaultStrategyKind::LeveragedLst,
                apy: rng.gen_range(15.0..40.0),
                tvl: rng.gen_range(50_000.0..500_000.0),
                risk_level: RiskLevel::High,
                is_paused: rng.gen_bool(0.2),
                price_per_share: rng.gen_range(1.0..1.8),
            },
        ];
        Ok(VaultSnapshot {
            candidates,
            current_position: Some(UserVaultPosition {
                vault_id: "vault-hbar-single".to_string(),
                staked_usd: rng.gen_range(200.0..2000.0),
                pending_rewards_usd: rng.gen_range(0.0..5.0),
            }),
            user_balance_usd: rng.gen_range(0.0..1000.0),
        })
    }
}
