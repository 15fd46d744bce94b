//! Tracing setup: human console output plus a JSON lines file
//!
//! File lines have the shape `{timestamp, level, message, event?, target, data?}`.
//! A `data` field holding serialized JSON is written back out as a nested value.

use chrono::{FixedOffset, Local, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Zone used for log timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTimezone {
    Local,
    Fixed(FixedOffset),
}

impl LogTimezone {
    /// Accepts `local`, `UTC`/`Z`, or an offset `+HH:MM`, `-HH:MM`, `+HHMM`, `+HH`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("local") {
            return Some(Self::Local);
        }
        if raw.eq_ignore_ascii_case("utc") || raw == "Z" {
            return FixedOffset::east_opt(0).map(Self::Fixed);
        }

        let (sign, rest) = match raw.as_bytes().first()? {
            b'+' => (1, &raw[1..]),
            b'-' => (-1, &raw[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let (hours, minutes) = match digits.len() {
            2 => (digits.parse::<i32>().ok()?, 0),
            4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
            _ => return None,
        };
        if hours > 14 || minutes > 59 {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Self::Fixed)
    }

    pub fn now_rfc3339(&self) -> String {
        match self {
            Self::Local => Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            Self::Fixed(offset) => Utc::now()
                .with_timezone(offset)
                .to_rfc3339_opts(SecondsFormat::Millis, false),
        }
    }
}

/// RFC 3339 timestamps in the configured zone
#[derive(Debug, Clone, Copy)]
pub struct Rfc3339Timer {
    timezone: LogTimezone,
}

impl Rfc3339Timer {
    pub fn new(timezone: LogTimezone) -> Self {
        Self { timezone }
    }
}

impl FormatTime for Rfc3339Timer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", self.timezone.now_rfc3339())
    }
}

#[derive(Debug, Default)]
struct JsonFields {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonFields {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let number = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.insert(field, number);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}

fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

fn json_line(timestamp: String, level: &Level, target: &str, visited: JsonFields) -> Value {
    let JsonFields { message, mut fields } = visited;
    let mut line = Map::new();
    line.insert("timestamp".into(), Value::String(timestamp));
    line.insert("level".into(), Value::String(level_label(level).into()));
    line.insert("message".into(), Value::String(message.unwrap_or_default()));
    line.insert("target".into(), Value::String(target.into()));

    let data = fields.remove("data").map(|value| match value {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    });
    line.extend(fields);
    if let Some(data) = data {
        line.insert("data".into(), data);
    }
    Value::Object(line)
}

/// One JSON object per event for the log file
#[derive(Debug, Clone, Copy)]
pub struct JsonLineFormat {
    timezone: LogTimezone,
}

impl JsonLineFormat {
    pub fn new(timezone: LogTimezone) -> Self {
        Self { timezone }
    }
}

impl<S, N> FormatEvent<S, N> for JsonLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visited = JsonFields::default();
        event.record(&mut visited);
        let meta = event.metadata();
        let line = json_line(self.timezone.now_rfc3339(), meta.level(), meta.target(), visited);
        writeln!(writer, "{}", line)
    }
}

/// Directory and file name for the JSON log, `None` when file output is off
pub fn log_file_location(file: &str) -> Option<(PathBuf, String)> {
    let file = file.trim();
    if file.is_empty() {
        return None;
    }
    let path = Path::new(file);
    let name = path.file_name()?.to_string_lossy().into_owned();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, name))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive until exit.
pub fn init_logging(cfg: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let timezone = LogTimezone::parse(&cfg.timezone).unwrap_or(LogTimezone::Local);

    let mut guard = None;
    let file_layer = log_file_location(&cfg.file).and_then(|(dir, name)| {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                dir.display(),
                e
            );
            return None;
        }
        // `rolling::never` panics if the file cannot be opened, so check first
        if let Err(e) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&name))
        {
            eprintln!(
                "Warning: Could not open log file {} ({}), file logging disabled",
                dir.join(&name).display(),
                e
            );
            return None;
        }

        let appender = tracing_appender::rolling::never(&dir, &name);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);

        Some(
            tracing_subscriber::fmt::layer()
                .event_format(JsonLineFormat::new(timezone))
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    let console_layer = cfg.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_timer(Rfc3339Timer::new(timezone))
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{EventSink, ExecutionEvent, TracingEventSink};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn ist() -> LogTimezone {
        LogTimezone::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
    }

    #[test]
    fn test_log_file_location() {
        assert_eq!(
            log_file_location("bot.log"),
            Some((PathBuf::from("."), "bot.log".to_string()))
        );
        assert_eq!(
            log_file_location("logs/run/bot.log"),
            Some((PathBuf::from("logs/run"), "bot.log".to_string()))
        );
        assert_eq!(log_file_location("  "), None);
    }

    #[test]
    fn test_timer_writes_rfc3339() {
        let mut out = String::new();
        Rfc3339Timer::new(LogTimezone::Local)
            .format_time(&mut Writer::new(&mut out))
            .unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok(), "{out}");
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(LogTimezone::parse("local"), Some(LogTimezone::Local));
        assert_eq!(
            LogTimezone::parse("UTC"),
            Some(LogTimezone::Fixed(FixedOffset::east_opt(0).unwrap()))
        );
        assert_eq!(LogTimezone::parse("+05:30"), Some(ist()));
        assert_eq!(LogTimezone::parse("+0530"), Some(ist()));
        assert_eq!(
            LogTimezone::parse("-08"),
            Some(LogTimezone::Fixed(FixedOffset::west_opt(8 * 3600).unwrap()))
        );
        for bad in ["Asia/Kolkata", "+5:3", "+25:00", "05:30", ""] {
            assert_eq!(LogTimezone::parse(bad), None, "{bad}");
        }
    }

    #[test]
    fn test_fixed_offset_timestamp() {
        let stamp = ist().now_rfc3339();
        assert!(stamp.ends_with("+05:30"), "{stamp}");
    }

    #[test]
    fn test_file_lines_nest_event_data() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .event_format(JsonLineFormat::new(ist()))
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingEventSink.emit(&ExecutionEvent::ConnectionEstablished { server_time: 42 });
            tracing::warn!(attempt = 2, "plain warning");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2, "{output}");

        let first = &lines[0];
        assert_eq!(first["level"], "INFO");
        assert_eq!(first["message"], "Connected to exchange");
        assert_eq!(first["event"], "connection_established");
        assert!(first["data"].is_object(), "{first}");
        assert_eq!(first["data"]["server_time"], 42);
        assert!(first["timestamp"].as_str().unwrap().ends_with("+05:30"));

        let second = &lines[1];
        assert_eq!(second["level"], "WARNING");
        assert_eq!(second["attempt"], 2);
        assert!(second.get("data").is_none());
    }
}
