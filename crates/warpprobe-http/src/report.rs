//! Line-oriented probe status output.
//!
//! Lines are `key=value` pairs behind a caller-chosen prefix, meant for
//! whatever is scraping the probe's stdout.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::engine::ProbeSummary;

/// One attempt, as reported in an `http.probe.call` line.
#[derive(Debug, Clone)]
pub struct CallReport<'a> {
    /// Response status, or 0 when no response arrived.
    pub status: u16,
    pub method: &'a str,
    pub target: &'a str,
    /// 1-based attempt number within the combination.
    pub attempt: u32,
    pub error: Option<String>,
    pub time: DateTime<Utc>,
}

impl fmt::Display for CallReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "info=http.probe.call status={} method={} target={} attempt={} error={} time={}",
            self.status,
            self.method,
            self.target,
            self.attempt,
            self.error.as_deref().unwrap_or("none"),
            self.time.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}

/// Warning tag for the final `http.probe.done` line.
pub fn summary_warning(summary: &ProbeSummary) -> Option<&'static str> {
    if summary.calls == 0 {
        Some("no.calls")
    } else if summary.successes == 0 {
        Some("no.successful.calls")
    } else {
        None
    }
}

/// Prints status lines to stdout when enabled.
#[derive(Debug, Clone, Default)]
pub struct StatusPrinter {
    enabled: bool,
    prefix: String,
}

impl StatusPrinter {
    pub fn new(enabled: bool, prefix: &str) -> Self {
        Self {
            enabled,
            prefix: prefix.to_string(),
        }
    }

    fn line(&self, body: impl fmt::Display) -> String {
        if self.prefix.is_empty() {
            body.to_string()
        } else {
            format!("{} {}", self.prefix, body)
        }
    }

    pub fn starting_line(&self) -> String {
        self.line("state=http.probe.starting")
    }

    pub fn call_line(&self, call: &CallReport<'_>) -> String {
        self.line(call)
    }

    pub fn summary_line(&self, summary: &ProbeSummary) -> String {
        self.line(format_args!(
            "info=http.probe.summary total={} failures={} successful={}",
            summary.calls, summary.failures, summary.successes
        ))
    }

    pub fn done_line(&self, summary: &ProbeSummary) -> String {
        match summary_warning(summary) {
            Some(warning) => self.line(format_args!("state=http.probe.done warning={warning}")),
            None => self.line("state=http.probe.done"),
        }
    }

    fn emit(&self, line: String) {
        if self.enabled {
            println!("{line}");
        }
    }

    pub fn starting(&self) {
        self.emit(self.starting_line());
    }

    pub fn call(&self, call: &CallReport<'_>) {
        self.emit(self.call_line(call));
    }

    pub fn done(&self, summary: &ProbeSummary) {
        self.emit(self.summary_line(summary));
        self.emit(self.done_line(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(calls: u64, failures: u64, successes: u64) -> ProbeSummary {
        ProbeSummary {
            calls,
            failures,
            successes,
        }
    }

    #[test]
    fn call_line_format() {
        let printer = StatusPrinter::new(true, "cmd=probe");
        let call = CallReport {
            status: 200,
            method: "GET",
            target: "http://127.0.0.1:8080/",
            attempt: 1,
            error: None,
            time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };
        assert_eq!(
            printer.call_line(&call),
            "cmd=probe info=http.probe.call status=200 method=GET \
             target=http://127.0.0.1:8080/ attempt=1 error=none time=2024-05-01T12:30:00Z"
        );
    }

    #[test]
    fn call_line_with_error() {
        let printer = StatusPrinter::new(true, "");
        let call = CallReport {
            status: 0,
            method: "POST",
            target: "https://h:1/x",
            attempt: 3,
            error: Some("connection refused".to_string()),
            time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let line = printer.call_line(&call);
        assert!(line.starts_with("info=http.probe.call status=0 method=POST"));
        assert!(line.contains("attempt=3 error=connection refused time=2024-01-02T03:04:05Z"));
    }

    #[test]
    fn summary_and_done_lines() {
        let printer = StatusPrinter::new(true, "p");
        let s = summary(4, 1, 3);
        assert_eq!(
            printer.summary_line(&s),
            "p info=http.probe.summary total=4 failures=1 successful=3"
        );
        assert_eq!(printer.done_line(&s), "p state=http.probe.done");
    }

    #[test]
    fn warnings() {
        assert_eq!(summary_warning(&summary(0, 0, 0)), Some("no.calls"));
        assert_eq!(summary_warning(&summary(4, 4, 0)), Some("no.successful.calls"));
        assert_eq!(summary_warning(&summary(4, 3, 1)), None);

        let printer = StatusPrinter::new(true, "p");
        assert_eq!(
            printer.done_line(&summary(0, 0, 0)),
            "p state=http.probe.done warning=no.calls"
        );
    }

    #[test]
    fn starting_line() {
        assert_eq!(
            StatusPrinter::new(false, "x").starting_line(),
            "x state=http.probe.starting"
        );
    }
}
