//! Plugin configuration parser.
//!
//! ```toml
//! guest_path = "filter.wasm"
//!
//! [pool]
//! min_instances = 1
//! max_instances = 8
//! memory_limit = "64Mi"
//!
//! [limits]
//! timeout = "500ms"
//! fuel = 100000000
//!
//! [wasi]
//! enabled = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Path to the guest `.wasm` binary. Relative paths resolve against the
    /// directory of the config file when loaded with [`PluginConfig::from_file`].
    pub guest_path: PathBuf,
    #[serde(default)]
    pub pool: PoolSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub wasi: WasiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSection {
    #[serde(default = "default_min_instances")]
    pub min_instances: u32,
    #[serde(default = "default_max_instances")]
    pub max_instances: u32,
    /// Linear memory cap per instance, e.g. "64Mi", "512Ki", "1048576".
    #[serde(default = "default_memory_limit")]
    pub memory_limit: String,
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            min_instances: default_min_instances(),
            max_instances: default_max_instances(),
            memory_limit: default_memory_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsSection {
    /// Wall-clock budget per decision, e.g. "500ms", "2s".
    pub timeout: Option<String>,
    /// Fuel units per decision.
    pub fuel: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WasiSection {
    /// Link WASI preview1 so guests built for `wasm32-wasip1` can load.
    #[serde(default)]
    pub enabled: bool,
    /// Forward guest stdout/stderr to the host process.
    #[serde(default)]
    pub inherit_stdio: bool,
}

fn default_min_instances() -> u32 {
    1
}

fn default_max_instances() -> u32 {
    8
}

fn default_memory_limit() -> String {
    "64Mi".to_string()
}

impl PluginConfig {
    /// Minimal config pointing at a guest binary, all other settings default.
    pub fn for_guest(guest_path: impl Into<PathBuf>) -> Self {
        Self {
            guest_path: guest_path.into(),
            pool: PoolSection::default(),
            limits: LimitsSection::default(),
            wasi: WasiSection::default(),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading plugin config {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("parsing plugin config {}", path.display()))?;
        if config.guest_path.is_relative()
            && let Some(dir) = path.parent()
        {
            config.guest_path = dir.join(&config.guest_path);
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: PluginConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.pool.max_instances == 0 {
            bail!("pool.max_instances must be at least 1");
        }
        if self.pool.min_instances > self.pool.max_instances {
            bail!(
                "pool.min_instances ({}) exceeds pool.max_instances ({})",
                self.pool.min_instances,
                self.pool.max_instances
            );
        }
        self.memory_limit_bytes()?;
        self.timeout()?;
        Ok(())
    }

    /// Parsed `pool.memory_limit` in bytes.
    pub fn memory_limit_bytes(&self) -> anyhow::Result<usize> {
        parse_memory(&self.pool.memory_limit)
            .with_context(|| format!("invalid pool.memory_limit {:?}", self.pool.memory_limit))
    }

    /// Parsed `limits.timeout`.
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        match &self.limits.timeout {
            None => Ok(None),
            Some(raw) => parse_duration(raw)
                .map(Some)
                .with_context(|| format!("invalid limits.timeout {raw:?}")),
        }
    }
}

/// Parse a memory size like "64Mi", "512Ki", "1Gi" or a plain byte count.
pub fn parse_memory(s: &str) -> anyhow::Result<usize> {
    let s = s.trim();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("Gi") {
        (n, 1usize << 30)
    } else if let Some(n) = s.strip_suffix("Mi") {
        (n, 1 << 20)
    } else if let Some(n) = s.strip_suffix("Ki") {
        (n, 1 << 10)
    } else {
        (s, 1)
    };
    let value: usize = digits.trim().parse()?;
    value
        .checked_mul(multiplier)
        .context("memory size overflows usize")
}

/// Parse a duration like "5s", "500ms", "1m", or plain seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let duration = if let Some(ms) = s.strip_suffix("ms") {
        Duration::from_millis(ms.parse()?)
    } else if let Some(secs) = s.strip_suffix('s') {
        Duration::from_secs(secs.parse()?)
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.parse()?;
        Duration::from_secs(mins.checked_mul(60).context("duration overflows")?)
    } else {
        Duration::from_secs(s.parse()?)
    };
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_defaults() {
        let config = PluginConfig::from_toml(r#"guest_path = "filter.wasm""#).unwrap();
        assert_eq!(config.guest_path, PathBuf::from("filter.wasm"));
        assert_eq!(config.pool.min_instances, 1);
        assert_eq!(config.pool.max_instances, 8);
        assert_eq!(config.memory_limit_bytes().unwrap(), 64 * 1024 * 1024);
        assert_eq!(config.timeout().unwrap(), None);
        assert!(config.limits.fuel.is_none());
        assert!(!config.wasi.enabled);
    }

    #[test]
    fn full_config_parses() {
        let config = PluginConfig::from_toml(
            r#"
guest_path = "/opt/guests/nodefit.wasm"

[pool]
min_instances = 2
max_instances = 4
memory_limit = "16Mi"

[limits]
timeout = "250ms"
fuel = 5000000

[wasi]
enabled = true
inherit_stdio = true
"#,
        )
        .unwrap();
        assert_eq!(config.pool.max_instances, 4);
        assert_eq!(config.memory_limit_bytes().unwrap(), 16 * 1024 * 1024);
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_millis(250)));
        assert_eq!(config.limits.fuel, Some(5_000_000));
        assert!(config.wasi.enabled && config.wasi.inherit_stdio);
    }

    #[test]
    fn min_above_max_is_rejected() {
        let err = PluginConfig::from_toml(
            r#"
guest_path = "g.wasm"
[pool]
min_instances = 5
max_instances = 2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = PluginConfig::from_toml(
            r#"
guest_path = "g.wasm"
[limits]
timeout = "soon"
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("limits.timeout"));
    }

    #[test]
    fn memory_suffixes() {
        assert_eq!(parse_memory("512Ki").unwrap(), 512 * 1024);
        assert_eq!(parse_memory("1Gi").unwrap(), 1 << 30);
        assert_eq!(parse_memory("4096").unwrap(), 4096);
        assert!(parse_memory("lots").is_err());
    }

    #[test]
    fn duration_suffixes() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn from_file_resolves_relative_guest_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wasmsched.toml");
        std::fs::write(&path, r#"guest_path = "guests/filter.wasm""#).unwrap();

        let config = PluginConfig::from_file(&path).unwrap();
        assert_eq!(config.guest_path, dir.path().join("guests/filter.wasm"));
    }

    #[test]
    fn minutes_overflow_is_an_error() {
        let err = parse_duration("999999999999999999m").unwrap_err();
        assert!(err.to_string().contains("overflows"));

        let text = r#"
            guest_path = "filter.wasm"

            [limits]
            timeout = "999999999999999999m"
        "#;
        assert!(PluginConfig::from_toml(text).is_err());
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = PluginConfig::for_guest("filter.wasm");
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("filter.wasm"));
        assert!(text.contains("[pool]"));
    }
}
