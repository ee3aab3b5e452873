use approx::assert_relative_eq;

use yield_keeper::keeper::model::decision::KeeperAction;
use yield_keeper::keeper::model::vault::{
    RiskLevel, UserVaultPosition, VaultGoal, VaultKeeperContext, VaultState, VaultStrategyKind,
};
use yield_keeper::keeper::strategy::strategy_config::StrategyConfig;
use yield_keeper::keeper::strategy::vault_engine;

fn vault(id: &str, apy: f64, risk_level: RiskLevel, is_paused: bool) -> VaultState {
    VaultState {
        id: id.to_string(),
        strategy_kind: VaultStrategyKind::SingleAssetDex,
        apy,
        tvl: 1_000_000.0,
        risk_level,
        is_paused,
        price_per_share: 1.05,
    }
}

fn ctx(candidates: Vec<VaultState>, goal: VaultGoal) -> VaultKeeperContext {
    VaultKeeperContext {
        config: StrategyConfig::default(),
        goal,
        candidates,
        sentiment_score: 0.0,
        volatility: 30.0,
        user_balance_usd: 500.0,
        current_position: None,
    }
}

#[test]
fn test_paused_vault_never_selected() {
    // 暂停金库的原始APY更高，也绝不能被选中
    let context = ctx(
        vec![
            vault("paused-high-apy", 50.0, RiskLevel::Low, true),
            vault("active-low-apy", 10.0, RiskLevel::Low, false),
        ],
        VaultGoal::Balanced,
    );

    let ranking = vault_engine::compare_vaults(&context);
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].vault_id, "active-low-apy");

    let decision = vault_engine::decide(&context).unwrap();
    assert_eq!(decision.vault_id.as_deref(), Some("active-low-apy"));
    assert_eq!(decision.action, KeeperAction::Rebalance);
}

#[test]
fn test_all_paused_means_hold_with_null_vault() {
    let context = ctx(
        vec![vault("a", 20.0, RiskLevel::Low, true)],
        VaultGoal::Balanced,
    );
    let decision = vault_engine::decide(&context).unwrap();
    assert_eq!(decision.action, KeeperAction::Hold);
    assert!(decision.vault_id.is_none());
}

#[test]
fn test_safe_yield_zeroes_high_risk() {
    let context = ctx(
        vec![
            vault("degen", 40.0, RiskLevel::High, false),
            vault("steady", 5.0, RiskLevel::Low, false),
        ],
        VaultGoal::SafeYield,
    );
    let ranking = vault_engine::compare_vaults(&context);
    assert_eq!(ranking[0].vault_id, "steady");
    let degen = ranking.iter().find(|s| s.vault_id == "degen").unwrap();
    assert_eq!(degen.score, 0.0);
}

#[test]
fn test_max_yield_prefers_high_apy() {
    let context = ctx(
        vec![
            vault("degen", 40.0, RiskLevel::High, false),
            vault("steady", 5.0, RiskLevel::Low, false),
        ],
        VaultGoal::MaxYield,
    );
    // max-yield: degen = 0.8*1.0 + 0.2*0.4 = 0.88, steady = 0.8*0.125 + 0.2*1.0 = 0.3
    let ranking = vault_engine::compare_vaults(&context);
    assert_eq!(ranking[0].vault_id, "degen");
    assert_relative_eq!(ranking[0].score, 0.88, epsilon = 1e-12);
}

#[test]
fn test_volatility_discounts_scores() {
    let calm = ctx(
        vec![vault("a", 10.0, RiskLevel::Low, false)],
        VaultGoal::Balanced,
    );
    let mut turbulent = calm.clone();
    turbulent.volatility = 160.0; // 超出阈值100%，折价一半

    let calm_score = vault_engine::compare_vaults(&calm)[0].score;
    let turbulent_score = vault_engine::compare_vaults(&turbulent)[0].score;
    assert_relative_eq!(turbulent_score, calm_score * 0.5, epsilon = 1e-12);
}

#[test]
fn test_strong_bullish_sentiment_boosts_scores() {
    let neutral = ctx(
        vec![vault("a", 10.0, RiskLevel::Low, false)],
        VaultGoal::Balanced,
    );
    let mut bullish = neutral.clone();
    bullish.sentiment_score = 60.0;

    let neutral_score = vault_engine::compare_vaults(&neutral)[0].score;
    let bullish_score = vault_engine::compare_vaults(&bullish)[0].score;
    assert_relative_eq!(bullish_score, neutral_score * 1.1, epsilon = 1e-12);
}

#[test]
fn test_pending_rewards_trigger_harvest_on_current_vault() {
    let mut context = ctx(
        vec![
            vault("mine", 8.0, RiskLevel::Low, false),
            vault("other", 9.0, RiskLevel::Low, false),
        ],
        VaultGoal::Balanced,
    );
    context.current_position = Some(UserVaultPosition {
        vault_id: "mine".to_string(),
        staked_usd: 800.0,
        pending_rewards_usd: 2.5,
    });

    let decision = vault_engine::decide(&context).unwrap();
    assert_eq!(decision.action, KeeperAction::Harvest);
    assert_eq!(decision.vault_id.as_deref(), Some("mine"));
    assert!(decision.reasoning.contains("2.50"));
}

#[test]
fn test_small_score_gap_holds() {
    let mut context = ctx(
        vec![
            vault("mine", 10.0, RiskLevel::Low, false),
            vault("other", 10.5, RiskLevel::Low, false),
        ],
        VaultGoal::Balanced,
    );
    context.current_position = Some(UserVaultPosition {
        vault_id: "mine".to_string(),
        staked_usd: 800.0,
        pending_rewards_usd: 0.1,
    });

    let decision = vault_engine::decide(&context).unwrap();
    assert_eq!(decision.action, KeeperAction::Hold);
    assert!(decision.vault_id.is_none());
}

#[test]
fn test_no_position_and_no_balance_holds() {
    let mut context = ctx(
        vec![vault("a", 10.0, RiskLevel::Low, false)],
        VaultGoal::Balanced,
    );
    context.user_balance_usd = 0.0;
    let decision = vault_engine::decide(&context).unwrap();
    assert_eq!(decision.action, KeeperAction::Hold);
    assert!(decision.vault_id.is_none());
}

#[test]
fn test_ranking_is_descending_and_deterministic() {
    let context = ctx(
        vec![
            vault("c", 12.0, RiskLevel::Medium, false),
            vault("a", 6.0, RiskLevel::Low, false),
            vault("b", 20.0, RiskLevel::High, false),
        ],
        VaultGoal::Balanced,
    );
    let ranking = vault_engine::compare_vaults(&context);
    assert_eq!(ranking.len(), 3);
    for pair in ranking.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // 同样的输入重跑得到同样的排序
    assert_eq!(ranking, vault_engine::compare_vaults(&context));
}
