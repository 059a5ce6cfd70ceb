use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ConfigBuilder};

/// Dependencies whose logs are hidden unless the level is Trace. The WebSocket
/// stack logs every frame at debug, which drowns out the connection lifecycle.
const QUIET_DEPENDENCIES: &[&str] = &[
    "tokio_tungstenite",
    "tungstenite",
    "hyper",
    "hyper_util",
    "axum",
    "tower",
    "tower_http",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// Fails if a logger was already installed for this process.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;

        simplelog::TermLogger::init(
            Self::to_simplelog(level),
            Self::build_log_config(Self::hides_dependencies(level)),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    fn to_simplelog(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn hides_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn build_log_config(hide_dependencies: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        builder.set_target_level(simplelog::LevelFilter::Error);

        if hide_dependencies {
            for module in QUIET_DEPENDENCIES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_stack_is_quiet_by_default() {
        for module in ["tungstenite", "tokio_tungstenite", "axum", "hyper"] {
            assert!(
                QUIET_DEPENDENCIES.contains(&module),
                "{module} should be hidden below Trace"
            );
        }
        assert!(!QUIET_DEPENDENCIES.contains(&"ws"));
        assert!(!QUIET_DEPENDENCIES.contains(&"web"));
    }

    #[test]
    fn test_only_trace_shows_dependency_logs() {
        assert!(!Logger::hides_dependencies(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(Logger::hides_dependencies(level), "{level} should hide");
        }
    }

    #[test]
    fn test_to_simplelog_preserves_order() {
        let levels = [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
            LevelFilter::Trace,
        ];
        let converted: Vec<_> = levels.iter().map(|l| Logger::to_simplelog(*l)).collect();
        assert!(converted.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(converted[3], simplelog::LevelFilter::Info);
    }

    #[test]
    fn test_build_log_config_both_ways() {
        let _hidden = Logger::build_log_config(true);
        let _shown = Logger::build_log_config(false);
    }
}
