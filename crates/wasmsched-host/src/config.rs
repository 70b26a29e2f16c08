//! HostConfig — engine and store settings derived from a `PluginConfig`.

use wasmsched_core::PluginConfig;

use crate::limiter::{DEFAULT_MEMORY_LIMIT, DEFAULT_TABLE_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Enable fuel metering so calls can be given a fuel budget.
    pub consume_fuel: bool,
    /// Enable epoch interruption so calls can be given a deadline.
    pub epoch_interruption: bool,
    /// Link WASI preview1 into the linker.
    pub wasi: bool,
    /// Forward guest stdout/stderr when WASI is linked.
    pub inherit_stdio: bool,
    /// Linear memory cap per instance, in bytes.
    pub memory_limit: usize,
    /// Table element cap per instance.
    pub table_limit: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            consume_fuel: false,
            epoch_interruption: false,
            wasi: false,
            inherit_stdio: false,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            table_limit: DEFAULT_TABLE_LIMIT,
        }
    }
}

impl HostConfig {
    pub fn from_plugin_config(config: &PluginConfig) -> anyhow::Result<Self> {
        Ok(Self {
            consume_fuel: config.limits.fuel.is_some(),
            epoch_interruption: config.timeout()?.is_some(),
            wasi: config.wasi.enabled,
            inherit_stdio: config.wasi.inherit_stdio,
            memory_limit: config.memory_limit_bytes()?,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_metering() {
        let config = HostConfig::default();
        assert!(!config.consume_fuel);
        assert!(!config.epoch_interruption);
        assert!(!config.wasi);
    }

    #[test]
    fn limits_enable_metering() {
        let plugin = PluginConfig::from_toml(
            r#"
guest_path = "g.wasm"
[pool]
memory_limit = "8Mi"
[limits]
timeout = "100ms"
fuel = 1000
[wasi]
enabled = true
"#,
        )
        .unwrap();
        let config = HostConfig::from_plugin_config(&plugin).unwrap();
        assert!(config.consume_fuel);
        assert!(config.epoch_interruption);
        assert!(config.wasi);
        assert_eq!(config.memory_limit, 8 * 1024 * 1024);
    }
}
