pub mod audit;
pub mod back_test;
pub mod model;
pub mod strategy;
pub mod task;

/// 快照字段是否可用：NaN/无穷大视为上游降级字段
pub fn field_usable(v: f64) -> bool {
    v.is_finite()
}
