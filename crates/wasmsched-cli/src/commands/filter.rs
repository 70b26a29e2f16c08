use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;

use wasmsched_core::{Node, PluginConfig, Pod};
use wasmsched_host::CallStats;
use wasmsched_plugin::FilterPlugin;

pub async fn run(
    config: &Path,
    workload: &Path,
    target: Option<&Path>,
    profile: bool,
    format: &str,
) -> anyhow::Result<()> {
    let config = PluginConfig::from_file(config)?;
    let workload: Pod = read_json(workload)?;
    let target: Option<Node> = target.map(read_json).transpose()?;

    let stats = Arc::new(CallStats::new());
    let mut plugin = FilterPlugin::new(&config).await?;
    if profile {
        plugin = plugin.with_observer(stats.clone());
    }

    let result = plugin
        .filter(target.map(Arc::new), Arc::new(workload))
        .await;
    if profile {
        let snap = stats.snapshot();
        eprintln!(
            "calls={} host_calls={} traps={} guest_time={:?} idle_instances={}",
            snap.calls,
            snap.host_calls,
            snap.traps,
            snap.elapsed,
            plugin.pool().idle_count().await,
        );
    }

    let status = result?.into_status();
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => println!("{status}"),
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
