use std::sync::Once;

use crate::engine::config::ViewerConfig;

/// Filter used when neither the config nor the environment names one.
pub const DEFAULT_FILTER: &str = "scene_viewer=info,cube_grid=info,winit=warn,glutin=warn";

const FILTER_VAR: &str = "RUST_LOG";

static INIT: Once = Once::new();

/// Chooses the `env_logger` filter string. A non-blank `log_filter` from the
/// config wins over `RUST_LOG`, which wins over [`DEFAULT_FILTER`].
pub fn resolve_filter(configured: Option<&str>, environment: Option<&str>) -> String {
    fn non_blank(filter: Option<&str>) -> Option<&str> {
        filter.map(str::trim).filter(|f| !f.is_empty())
    }
    non_blank(configured)
        .or_else(|| non_blank(environment))
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Installs the global logger for a viewer run. `None` is used before a
/// config could be read. Only the first call has any effect.
pub fn init_logging(config: Option<&ViewerConfig>) {
    let configured = config.and_then(|config| config.log_filter.as_deref());
    let environment = std::env::var(FILTER_VAR).ok();
    let filter = resolve_filter(configured, environment.as_deref());

    INIT.call_once(|| {
        env_logger::Builder::new()
            .parse_filters(&filter)
            .format_timestamp_millis()
            .init();

        log::debug!("logger filter: {}", filter);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_filter_beats_environment() {
        assert_eq!(resolve_filter(Some("scene_viewer=debug"), Some("warn")), "scene_viewer=debug");
    }

    #[test]
    fn environment_is_used_without_config_filter() {
        assert_eq!(resolve_filter(None, Some("trace")), "trace");
    }

    #[test]
    fn blank_filters_fall_back_to_default() {
        assert_eq!(resolve_filter(None, None), DEFAULT_FILTER);
        assert_eq!(resolve_filter(Some("  "), None), DEFAULT_FILTER);
        assert_eq!(resolve_filter(None, Some("")), DEFAULT_FILTER);
    }

    #[test]
    fn blank_config_filter_defers_to_environment() {
        assert_eq!(resolve_filter(Some(""), Some("debug")), "debug");
    }
}
