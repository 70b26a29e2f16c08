//! Schema types exchanged across the host/guest boundary.
//!
//! All maps are `BTreeMap` so that encoding order never depends on hashing.
//! Field order is part of the payload schema: reordering fields changes the
//! bytes and requires a `SCHEMA_VERSION` bump.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schedulable resource quantities. Missing fields are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
    pub pods: u32,
}

/// Effect a taint has on workloads that do not tolerate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: Option<String>,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TolerationOperator {
    #[default]
    Equal,
    Exists,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toleration {
    /// Empty key with `Exists` tolerates every taint.
    pub key: String,
    #[serde(default)]
    pub operator: TolerationOperator,
    pub value: Option<String>,
    /// `None` matches every effect.
    pub effect: Option<TaintEffect>,
}

impl Toleration {
    /// Whether this toleration covers the given taint.
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if let Some(effect) = self.effect {
            if effect != taint.effect {
                return false;
            }
        }
        match self.operator {
            TolerationOperator::Exists => self.key.is_empty() || self.key == taint.key,
            TolerationOperator::Equal => self.key == taint.key && self.value == taint.value,
        }
    }
}

/// A candidate placement target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub allocatable: Resources,
    #[serde(default)]
    pub unschedulable: bool,
}

/// A unit of work being placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub requests: Resources,
    #[serde(default)]
    pub node_name: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Pod {
    /// `namespace/name`, used in log fields.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taint(key: &str, value: Option<&str>, effect: TaintEffect) -> Taint {
        Taint {
            key: key.to_string(),
            value: value.map(str::to_string),
            effect,
        }
    }

    #[test]
    fn equal_toleration_requires_matching_value() {
        let toleration = Toleration {
            key: "dedicated".to_string(),
            operator: TolerationOperator::Equal,
            value: Some("gpu".to_string()),
            effect: None,
        };
        assert!(toleration.tolerates(&taint("dedicated", Some("gpu"), TaintEffect::NoSchedule)));
        assert!(!toleration.tolerates(&taint("dedicated", Some("cpu"), TaintEffect::NoSchedule)));
    }

    #[test]
    fn empty_key_exists_tolerates_everything() {
        let toleration = Toleration {
            key: String::new(),
            operator: TolerationOperator::Exists,
            value: None,
            effect: None,
        };
        assert!(toleration.tolerates(&taint("anything", None, TaintEffect::NoExecute)));
    }

    #[test]
    fn effect_must_match_when_set() {
        let toleration = Toleration {
            key: "zone".to_string(),
            operator: TolerationOperator::Exists,
            value: None,
            effect: Some(TaintEffect::NoExecute),
        };
        assert!(!toleration.tolerates(&taint("zone", None, TaintEffect::NoSchedule)));
    }

    #[test]
    fn pod_namespace_defaults_when_missing() {
        let pod: Pod = serde_json::from_str(r#"{"name":"web-0"}"#).unwrap();
        assert_eq!(pod.namespace, "default");
        assert_eq!(pod.key(), "default/web-0");
    }
}
