use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::keeper::model::decision::Decision;
use crate::time_util;

/// 审计回执：外部追加式存储返回的不透明序号引用
///
/// 调用方可以把回执挂回决策对象用于后续关联，核心从不依赖它存在
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReceipt {
    pub sequence_number: u64,
    pub consensus_timestamp: String,
}

/// 审计日志协作方：决策对象原样交付
///
/// 发布失败由调用方决定如何处理，核心不重试也不管理存储
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn publish(&self, decision: &Decision) -> anyhow::Result<AuditReceipt>;
}

/// 默认实现：决策序列化后通过tracing落盘，进程内单调递增序号
pub struct TracingAuditLogger {
    sequence: AtomicU64,
}

impl TracingAuditLogger {
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }
}

impl Default for TracingAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn publish(&self, decision: &Decision) -> anyhow::Result<AuditReceipt> {
        let sequence_number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = serde_json::to_string(decision)?;
        info!("审计决策 seq={} payload={}", sequence_number, payload);
        Ok(AuditReceipt {
            sequence_number,
            consensus_timestamp: time_util::now_rfc3339(),
        })
    }
}
