use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

const TARGET_PREFIX: &str = "batch";

/// Installs the global subscriber. Events from this workspace pass at the
/// level held in the returned state; everything else only at WARN and above.
pub(crate) fn setup_tracing() -> Arc<AtomicU8> {
    let log_level_state = Arc::new(AtomicU8::new(level_filter_to_u8(LevelFilter::INFO)));
    let filter_state = log_level_state.clone();
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        let Some(level) = u8_to_level(filter_state.load(Ordering::Relaxed)) else {
            return false;
        };
        let effective_level = if metadata.target().starts_with(TARGET_PREFIX) {
            level
        } else {
            Level::WARN.min(level)
        };
        metadata.level() <= &effective_level
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();

    log_level_state
}

pub(crate) fn set_level(state: &AtomicU8, level: LevelFilter) {
    state.store(level_filter_to_u8(level), Ordering::Relaxed);
}

pub(crate) fn parse_level(value: &str) -> Result<LevelFilter, String> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        other => Err(format!("unknown log level {other:?}")),
    }
}

pub(crate) fn level_filter_to_u8(level: LevelFilter) -> u8 {
    match level {
        LevelFilter::OFF => 0,
        LevelFilter::ERROR => 1,
        LevelFilter::WARN => 2,
        LevelFilter::INFO => 3,
        LevelFilter::DEBUG => 4,
        LevelFilter::TRACE => 5,
    }
}

fn u8_to_level(value: u8) -> Option<Level> {
    match value {
        0 => None,
        1 => Some(Level::ERROR),
        2 => Some(Level::WARN),
        3 => Some(Level::INFO),
        4 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::WARN);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn stored_level_round_trips() {
        let state = AtomicU8::new(0);
        set_level(&state, LevelFilter::DEBUG);
        assert_eq!(u8_to_level(state.load(Ordering::Relaxed)), Some(Level::DEBUG));
        set_level(&state, LevelFilter::OFF);
        assert_eq!(u8_to_level(state.load(Ordering::Relaxed)), None);
    }
}
