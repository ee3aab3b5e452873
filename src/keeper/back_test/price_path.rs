use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// 情绪/波动率读数的动量窗口（天）
const SIGNAL_WINDOW: usize = 7;
/// 日收益到情绪分/波动率读数的放大系数
const SIGNAL_SCALE: f64 = 3000.0;

/// 合成价格路径上的单日数据，由种子与日索引唯一确定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub day: u32,
    pub price: f64,
    pub sentiment_score: f64,
    pub volatility: f64,
    pub fear_greed_index: f64,
    /// 当日收益率（比例）
    pub daily_return: f64,
}

/// 种子化合成价格路径生成器
///
/// 同一seed与days生成完全一致的路径，这是回测可复现性的前提；
/// 生成过程不做任何IO
#[derive(Debug, Clone)]
pub struct PricePathGenerator {
    seed: u64,
    start_price: f64,
    /// 日漂移（比例）
    drift: f64,
    /// 日波动幅度（比例）
    daily_vol: f64,
}

impl PricePathGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 0.08,
            drift: 0.001,
            daily_vol: 0.03,
        }
    }

    /// 自定义路径参数；daily_vol为0时得到单调路径
    pub fn with_params(seed: u64, start_price: f64, drift: f64, daily_vol: f64) -> Self {
        Self {
            seed,
            start_price,
            drift,
            daily_vol,
        }
    }

    /// 生成整条路径
    pub fn generate(&self, days: u32) -> Vec<PathPoint> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut price = self.start_price;
        let mut returns: Vec<f64> = Vec::with_capacity(days as usize);
        let mut points: Vec<PathPoint> = Vec::with_capacity(days as usize);

        for day in 0..days {
            let daily_return = if day == 0 {
                0.0
            } else {
                let noise: f64 = rng.gen_range(-1.0..1.0);
                let ret = self.drift + self.daily_vol * noise;
                price *= 1.0 + ret;
                ret
            };
            returns.push(daily_return);

            let window_start = returns.len().saturating_sub(SIGNAL_WINDOW);
            let window = &returns[window_start..];

            // 情绪分来自窗口内动量，波动率来自窗口内收益标准差
            let momentum = mean(window);
            let sentiment_score = (momentum * SIGNAL_SCALE).clamp(-100.0, 100.0);
            let volatility = (std_dev(window) * SIGNAL_SCALE).clamp(0.0, 150.0);
            let fear_greed_index = (50.0 + sentiment_score / 2.0).clamp(0.0, 100.0);

            points.push(PathPoint {
                day,
                price,
                sentiment_score,
                volatility,
                fear_greed_index,
                daily_return,
            });
        }
        points
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
