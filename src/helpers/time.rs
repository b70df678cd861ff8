use chrono::{DateTime, SecondsFormat, Utc};

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 with microseconds, the shape Singer targets expect in `time_extracted`.
pub fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
