//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the level follows the `-v`/`-q` count.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default level for a verbosity count (`-q` = -1, none = 0, `-v` = 1, `-vv` = 2+)
pub fn level_for(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global fmt subscriber
///
/// Calling it twice is harmless: the second install is ignored.
pub fn init_logging(verbosity: i8) {
    let level = level_for(verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        ["amf_simulator_core", "amf_simulator_cli", "amf_sim", "amf_batch"]
            .iter()
            .map(|target| format!("{target}={level}"))
            .chain(std::iter::once("warn".to_string()))
            .collect::<Vec<_>>()
            .join(",")
            .into()
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(-3), "warn");
        assert_eq!(level_for(0), "info");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(4), "trace");
    }
}
