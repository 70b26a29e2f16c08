//! Test guest: rejects workloads that do not fit a node.
//!
//! Checks, in order: the node is cordoned, the node selector matches the
//! node's labels, every hard taint is tolerated, and the requests fit the
//! node's allocatable resources.

use wasmsched_guest::{Node, Pod, Verdict, export_filter};

fn filter(target: Option<&Node>, workload: &Pod) -> Verdict {
    let Some(node) = target else {
        return Verdict::error("no target node");
    };

    if node.unschedulable {
        return Verdict::unschedulable(format!("node {} is cordoned", node.name));
    }

    for (key, value) in &workload.node_selector {
        if node.labels.get(key) != Some(value) {
            return Verdict::unresolvable(format!("node {} does not match {key}={value}", node.name));
        }
    }

    for taint in &node.taints {
        if taint.effect == wasmsched_guest::TaintEffect::PreferNoSchedule {
            continue;
        }
        if !workload.tolerations.iter().any(|t| t.tolerates(taint)) {
            return Verdict::unschedulable(format!("untolerated taint {}", taint.key));
        }
    }

    let free = &node.allocatable;
    let want = &workload.requests;
    if want.cpu_millis > free.cpu_millis {
        return Verdict::unschedulable("insufficient cpu");
    }
    if want.memory_bytes > free.memory_bytes {
        return Verdict::unschedulable("insufficient memory");
    }
    if want.pods > free.pods {
        return Verdict::unschedulable("too many pods");
    }

    Verdict::success()
}

export_filter!(filter);
