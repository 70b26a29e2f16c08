//! Integration tests against a guest built from Rust source.
//!
//! The guest is built from `tests/fixtures/node-fit-guest/` with the
//! `wasmsched-guest` SDK and loaded through `FilterPlugin` like any
//! production guest. Run with `cargo test -p wasmsched-plugin --features
//! integration`; needs the `wasm32-unknown-unknown` target installed.

#![cfg(feature = "integration")]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, OnceLock};

use wasmsched_core::{Code, Node, PluginConfig, Pod, Resources, Taint, TaintEffect, Toleration};
use wasmsched_plugin::FilterPlugin;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

static GUEST_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Build the fixture guest once per test run.
fn build_guest() -> &'static Path {
    GUEST_PATH.get_or_init(|| {
        let guest_dir = workspace_root().join("tests/fixtures/node-fit-guest");
        let status = Command::new("cargo")
            .args(["build", "--target", "wasm32-unknown-unknown", "--release"])
            .current_dir(&guest_dir)
            .status()
            .expect("failed to run cargo build for guest fixture");
        assert!(
            status.success(),
            "guest fixture build failed with exit code {:?}",
            status.code()
        );
        guest_dir.join("target/wasm32-unknown-unknown/release/node_fit_guest.wasm")
    })
}

async fn plugin() -> FilterPlugin {
    let mut config = PluginConfig::for_guest(build_guest());
    config.pool.max_instances = 4;
    config.limits.fuel = Some(50_000_000);
    FilterPlugin::new(&config).await.expect("fixture guest loads")
}

fn node() -> Node {
    Node {
        name: "node-a".to_string(),
        labels: BTreeMap::from([("zone".to_string(), "eu-1".to_string())]),
        allocatable: Resources {
            cpu_millis: 2000,
            memory_bytes: 4 << 30,
            pods: 110,
        },
        ..Node::default()
    }
}

fn pod() -> Pod {
    Pod {
        name: "web-0".to_string(),
        namespace: "default".to_string(),
        node_selector: BTreeMap::from([("zone".to_string(), "eu-1".to_string())]),
        requests: Resources {
            cpu_millis: 500,
            memory_bytes: 256 << 20,
            pods: 1,
        },
        ..Pod::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fitting_pod_is_accepted() {
    let plugin = plugin().await;
    let decision = plugin
        .filter(Some(Arc::new(node())), Arc::new(pod()))
        .await
        .unwrap();
    assert_eq!(decision.code, Code::Success);
    assert!(decision.message.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_target_is_guest_error() {
    let plugin = plugin().await;
    let decision = plugin.filter(None, Arc::new(pod())).await.unwrap();
    assert_eq!(decision.code, Code::Error);
    assert_eq!(decision.message, "no target node");
}

#[tokio::test(flavor = "multi_thread")]
async fn selector_mismatch_is_rejected() {
    let plugin = plugin().await;
    let mut workload = pod();
    workload
        .node_selector
        .insert("zone".to_string(), "us-2".to_string());

    let decision = plugin
        .filter(Some(Arc::new(node())), Arc::new(workload))
        .await
        .unwrap();
    assert_eq!(decision.code, Code::Rejected);
    assert_eq!(decision.guest_code, 3);
    assert!(decision.message.contains("zone=us-2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn taints_need_tolerations() {
    let plugin = plugin().await;
    let mut target = node();
    target.taints.push(Taint {
        key: "dedicated".to_string(),
        value: Some("gpu".to_string()),
        effect: TaintEffect::NoSchedule,
    });
    let target = Arc::new(target);

    let decision = plugin
        .filter(Some(target.clone()), Arc::new(pod()))
        .await
        .unwrap();
    assert_eq!(decision.code, Code::Rejected);
    assert_eq!(decision.message, "untolerated taint dedicated");

    let mut tolerant = pod();
    tolerant.tolerations.push(Toleration {
        key: "dedicated".to_string(),
        operator: Default::default(),
        value: Some("gpu".to_string()),
        effect: None,
    });
    let decision = plugin
        .filter(Some(target), Arc::new(tolerant))
        .await
        .unwrap();
    assert_eq!(decision.code, Code::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_request_is_rejected() {
    let plugin = plugin().await;
    let mut workload = pod();
    workload.requests.cpu_millis = 4000;

    let decision = plugin
        .filter(Some(Arc::new(node())), Arc::new(workload))
        .await
        .unwrap();
    assert_eq!(decision.code, Code::Rejected);
    assert_eq!(decision.message, "insufficient cpu");
}

#[tokio::test(flavor = "multi_thread")]
async fn large_payloads_take_the_probe_path() {
    let plugin = plugin().await;
    let mut target = node();
    for i in 0..200 {
        target
            .labels
            .insert(format!("label-{i:03}"), "x".repeat(16));
    }

    let decision = plugin
        .filter(Some(Arc::new(target)), Arc::new(pod()))
        .await
        .unwrap();
    assert_eq!(decision.code, Code::Success);
}
