use crate::access_log::RequestLog;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

const LOGGED_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// `[31/Dec/2019:12:40:15 +0000]`
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("[%d/%b/%Y:%H:%M:%S +0000]").to_string()
}

/// Render one request in Common Log Format, followed by the response time.
///
/// Missing values are written as `-`.
pub fn common_log_line(entry: &RequestLog) -> String {
    let path = utf8_percent_encode(&entry.path, LOGGED_PATH);
    let query = entry
        .query_string
        .as_deref()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    let size = entry
        .response_size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} - {} {} \"{} {}{} {}\" {} {} {} {} - [{} ms]",
        dash(entry.ip.as_deref()),
        dash(entry.user.as_deref()),
        format_time(&entry.request_time),
        entry.method,
        path,
        query,
        entry.protocol,
        entry.status_code,
        size,
        quoted(entry.referer.as_deref()),
        quoted(entry.user_agent.as_deref()),
        entry.duration_ms(),
    )
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn quoted(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{v}\""),
        None => "-".to_string(),
    }
}
