//! Diagnostics the container emits through tracing

use tracing::Level;
use weave_di::{Container, Extension, Value};
use weave_integration_tests::{GraphSpec, LogCapture};

#[test]
fn test_frozen_override_logs_warning() {
    let (logs, _guard) = LogCapture::install();
    let container = Container::new();
    container.set("config", Value::data("a")).unwrap();
    container.get("config").unwrap();

    assert!(container.set("config", Value::data("b")).is_err());
    assert!(logs.contains(Level::WARN, "Rejected override of frozen service config"));
}

#[test]
fn test_frozen_extend_logs_warning() {
    let (logs, _guard) = LogCapture::install();
    let container = Container::new();
    container.set("list", Value::data(vec![1])).unwrap();
    container.get("list").unwrap();

    assert!(container.extend("list", Extension::new(|_, _| Ok(None))).is_err());
    assert!(logs.contains(Level::WARN, "Rejected extension of frozen service list"));
}

#[test]
fn test_cycle_logs_full_chain() {
    let (logs, _guard) = LogCapture::install();
    let container = GraphSpec::ring(2, vec![]).container().unwrap();

    assert!(container.get("Node0").is_err());
    assert!(logs.contains(Level::WARN, "Node0 -> Node1 -> Node0"));
}

#[test]
fn test_build_and_warm_up_log_summaries() {
    let (logs, _guard) = LogCapture::install();
    let spec = GraphSpec::acyclic(vec![vec![0], vec![]], vec![]);
    let container = spec.container().unwrap();
    container.warm_up(&["Node0", "Missing"]).unwrap();

    assert!(logs.contains(Level::INFO, "Built container with 2 types"));
    assert!(logs.contains(Level::INFO, "Warmed up 1 of 2 types"));
}

#[test]
fn test_successful_reads_log_no_warnings() {
    let (logs, _guard) = LogCapture::install();
    let container = Container::new();
    container.set("name", Value::data("weave")).unwrap();
    container.get("name").unwrap();

    assert!(logs.lines().iter().all(|line| !line.starts_with("[WARN]")));
}
