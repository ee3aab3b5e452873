use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum KeeperError {
    /// 策略配置违反不变量，在读取任何快照之前直接失败
    #[error("配置错误: {0}")]
    Config(String),

    /// 回测参数钳制之后仍然越界
    #[error("回测参数错误: {0}")]
    Simulation(String),

    /// 未知错误
    #[error("未知错误: {0}")]
    Unknown(String),
}
