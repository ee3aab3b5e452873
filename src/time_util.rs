use chrono::{SecondsFormat, TimeZone, Utc};

/// 当前UTC时间的ISO8601字符串，所有决策时间戳统一使用该格式
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 毫秒级时间戳转ISO8601字符串
pub fn mill_time_to_rfc3339(timestamp_ms: i64) -> Result<String, String> {
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => {
            Ok(datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        chrono::LocalResult::None => Err("Invalid timestamp: None".to_string()),
        chrono::LocalResult::Ambiguous(_, _) => Err("Invalid timestamp: Ambiguous".to_string()),
    }
}
