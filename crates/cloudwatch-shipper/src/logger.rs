// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log line formatting for the shipper's own diagnostics.
//!
//! The shipper writes to the function's own log group, next to whatever the
//! Lambda platform prints, so every line is prefixed to be easy to filter:
//!
//! ```text
//! CW_SHIPPER | INFO | LOGS | Wrote 3 of 3 logs to the listener (1 platform logs skipped)
//! CW_SHIPPER | WARN | invocation{request_id=8f5}: LOGS | Failed to send log, trying again in 2s
//! ```

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const PREFIX: &str = "CW_SHIPPER";

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "{PREFIX} | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Lowercased level name, or `None` if `raw` is not one of
/// [`VALID_LOG_LEVELS`].
#[must_use]
pub fn parse_level(raw: &str) -> Option<String> {
    let level = raw.trim().to_lowercase();
    VALID_LOG_LEVELS
        .contains(&level.as_str())
        .then_some(level)
}

/// Filter used by the shipper: noisy HTTP internals off, everything else at
/// `log_level`. Unknown or empty levels resolve to [`DEFAULT_LOG_LEVEL`].
#[must_use]
pub fn env_filter(log_level: &str) -> EnvFilter {
    let level = parse_level(log_level).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    EnvFilter::new(format!("h2=off,hyper=off,rustls=off,{level}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .event_format(Formatter)
            .with_writer(buffer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn capture_filtered(log_level: &str, f: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter(log_level))
            .event_format(Formatter)
            .with_writer(buffer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn emit_all_levels() {
        tracing::debug!("debug line");
        tracing::info!("info line");
        tracing::error!("error line");
    }

    #[test]
    fn test_prefix_and_level() {
        let output = capture(|| tracing::info!("shipper started"));
        assert_eq!(output, "CW_SHIPPER | INFO | shipper started\n");
    }

    #[test]
    fn test_span_context() {
        let output = capture(|| {
            let span = tracing::info_span!("invocation", request_id = "8f5");
            let _guard = span.enter();
            tracing::warn!("retrying");
        });
        assert!(output.starts_with("CW_SHIPPER | WARN | invocation{"));
        assert!(output.contains("8f5"));
        assert!(output.ends_with("}: retrying\n"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").as_deref(), Some("debug"));
        assert_eq!(parse_level(" warn ").as_deref(), Some("warn"));
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_env_filter_applies_level() {
        let output = capture_filtered("debug", emit_all_levels);
        assert!(output.contains("debug line"));
        assert!(output.contains("error line"));
    }

    #[test]
    fn test_env_filter_unknown_level_is_info() {
        for level in ["verbose", "", "shipper=loud"] {
            let output = capture_filtered(level, emit_all_levels);
            assert!(!output.contains("debug line"), "level {level:?}: {output}");
            assert!(output.contains("info line"), "level {level:?}: {output}");
            assert!(output.contains("error line"), "level {level:?}: {output}");
        }
    }
}
