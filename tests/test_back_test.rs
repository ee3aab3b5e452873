use approx::assert_relative_eq;
use float_cmp::approx_eq;

use yield_keeper::error::KeeperError;
use yield_keeper::keeper::back_test::price_path::PricePathGenerator;
use yield_keeper::keeper::back_test::BackTestSimulator;
use yield_keeper::keeper::model::decision::KeeperAction;
use yield_keeper::keeper::strategy::strategy_config::StrategyConfig;

#[test]
fn test_back_test_is_deterministic() {
    let a = BackTestSimulator::new(StrategyConfig::default())
        .unwrap()
        .run(30, 1000.0)
        .unwrap();
    let b = BackTestSimulator::new(StrategyConfig::default())
        .unwrap()
        .run(30, 1000.0)
        .unwrap();
    assert_eq!(a.data_points, b.data_points);
    assert_eq!(a.summary, b.summary);
}

#[test]
fn test_different_seeds_diverge() {
    let config = StrategyConfig::default();
    let a = BackTestSimulator::with_path(config.clone(), PricePathGenerator::new(1))
        .unwrap()
        .run(30, 1000.0)
        .unwrap();
    let b = BackTestSimulator::with_path(config, PricePathGenerator::new(2))
        .unwrap()
        .run(30, 1000.0)
        .unwrap();
    assert_ne!(a.data_points, b.data_points);
}

#[test]
fn test_user_knobs_are_clamped() {
    let simulator = BackTestSimulator::new(StrategyConfig::default()).unwrap();
    let clamped = simulator.run(365, 50.0).unwrap();
    let explicit = simulator.run(90, 100.0).unwrap();
    assert_eq!(clamped.summary.initial_investment, 100.0);
    assert_eq!(clamped.data_points.len(), 90);
    assert_eq!(clamped.data_points, explicit.data_points);
    assert_eq!(clamped.summary, explicit.summary);
}

#[test]
fn test_non_positive_knobs_are_simulation_errors() {
    let simulator = BackTestSimulator::new(StrategyConfig::default()).unwrap();
    assert!(matches!(
        simulator.run(0, 1000.0).unwrap_err(),
        KeeperError::Simulation(_)
    ));
    assert!(matches!(
        simulator.run(30, 0.0).unwrap_err(),
        KeeperError::Simulation(_)
    ));
    assert!(matches!(
        simulator.run(30, -500.0).unwrap_err(),
        KeeperError::Simulation(_)
    ));
    assert!(matches!(
        simulator.run(30, f64::NAN).unwrap_err(),
        KeeperError::Simulation(_)
    ));
}

#[test]
fn test_rising_path_yields_positive_returns() {
    // 单调上涨路径：日漂移1%，无噪声
    let simulator = BackTestSimulator::with_path(
        StrategyConfig::default(),
        PricePathGenerator::with_params(7, 0.08, 0.01, 0.0),
    )
    .unwrap();
    let result = simulator.run(30, 1000.0).unwrap();

    assert!(result.summary.passive_return > 0.0);
    assert!(result.summary.active_return > 0.0);
    assert!(result.summary.outperformance.is_finite());

    // 收益率只由首末值计算
    let last = result.data_points.last().unwrap();
    let expected_passive = (last.passive_value / 1000.0 - 1.0) * 100.0;
    let expected_active = (last.active_value / 1000.0 - 1.0) * 100.0;
    assert!(approx_eq!(
        f64,
        result.summary.passive_return,
        expected_passive,
        ulps = 4
    ));
    assert!(approx_eq!(
        f64,
        result.summary.active_return,
        expected_active,
        ulps = 4
    ));
    assert_relative_eq!(
        result.summary.outperformance,
        expected_active - expected_passive,
        epsilon = 1e-9
    );
}

#[test]
fn test_passive_and_active_start_from_same_investment() {
    let simulator = BackTestSimulator::new(StrategyConfig::default()).unwrap();
    let result = simulator.run(30, 1000.0).unwrap();
    let first = result.data_points.first().unwrap();
    // 首日两条账本都等于初始投资（主动侧最多差一天的收益计提）
    assert_relative_eq!(first.passive_value, 1000.0, epsilon = 1.0);
    assert_relative_eq!(first.active_value, 1000.0, epsilon = 1.0);
}

#[test]
fn test_timeline_is_sparse() {
    let simulator = BackTestSimulator::new(StrategyConfig::default()).unwrap();
    let result = simulator.run(60, 1000.0).unwrap();
    assert_eq!(result.data_points.len(), 60);

    let mut recorded = 0u32;
    for point in &result.data_points {
        if let Some(decision) = &point.decision {
            // 仅记录非HOLD动作
            assert_ne!(decision.action, KeeperAction::Hold);
            assert!(!decision.reason.is_empty());
            recorded += 1;
        }
    }
    // 动作计数与账本一致：HOLD天数 + 记录天数 = 总天数
    let holds = result
        .summary
        .action_counts
        .get(&KeeperAction::Hold)
        .copied()
        .unwrap_or(0);
    let total: u32 = result.summary.action_counts.values().sum();
    assert_eq!(total, 60);
    assert_eq!(total - holds, recorded);
}

#[test]
fn test_frozen_value_ignores_downside() {
    // 恒定高波动+下跌路径：第一天起就离场，之后价值冻结
    let simulator = BackTestSimulator::with_path(
        StrategyConfig::from_partial(&serde_json::json!({"highVolatilityThreshold": 0.0}))
            .unwrap(),
        PricePathGenerator::with_params(9, 0.10, -0.01, 0.0),
    )
    .unwrap();
    let result = simulator.run(30, 1000.0).unwrap();

    // 被动账本跟随价格下跌，主动账本离场后冻结
    assert!(result.summary.passive_return < 0.0);
    assert!(result.summary.active_return > result.summary.passive_return);
    assert!(result.summary.outperformance > 0.0);
    assert!(result
        .summary
        .action_counts
        .contains_key(&KeeperAction::ExitToStable));
}
