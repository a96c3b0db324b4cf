//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on item deliveries per run. Exceeding it aborts the run.
    pub max_steps: Option<u64>,

    /// Emit a `trace!` event for every delivered item.
    pub trace_items: bool,

    /// Log a metrics summary when the run completes.
    pub emit_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            trace_items: false,
            emit_metrics: false,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LAZYPIPE_MAX_STEPS`: step cap (unparseable values are ignored)
    /// - `LAZYPIPE_TRACE_ITEMS`: `1`/`true` enables per-item tracing
    /// - `LAZYPIPE_EMIT_METRICS`: `1`/`true` enables the metrics summary
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`EngineConfig::from_env`] over an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("LAZYPIPE_MAX_STEPS") {
            if let Ok(v) = s.trim().parse::<u64>() {
                cfg.max_steps = Some(v);
            }
        }

        if let Some(s) = lookup("LAZYPIPE_TRACE_ITEMS") {
            if let Some(v) = parse_flag(&s) {
                cfg.trace_items = v;
            }
        }

        if let Some(s) = lookup("LAZYPIPE_EMIT_METRICS") {
            if let Some(v) = parse_flag(&s) {
                cfg.emit_metrics = v;
            }
        }

        cfg
    }

    /// Overlay explicitly-set fields of `overrides` on top of `self`.
    pub fn overlay(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.max_steps {
            self.max_steps = Some(v);
        }
        if let Some(v) = overrides.trace_items {
            self.trace_items = v;
        }
        if let Some(v) = overrides.emit_metrics {
            self.emit_metrics = v;
        }
    }
}

/// Partial configuration, as written in a pipeline document or passed on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub max_steps: Option<u64>,
    pub trace_items: Option<bool>,
    pub emit_metrics: Option<bool>,
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
