#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use vitals_agent::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
agent:
  name: "billing-api"
  report_intervall_ms: 500 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
agent:
  name: "billing-api"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.agent.name, "billing-api");
    assert_eq!(cfg.agent.report_interval_ms, 1000);
    assert_eq!(cfg.agent.server_name, None);
    assert!(cfg.profiling.heapdump);
    assert!(cfg.profiling.cpu);
}

#[test]
fn reject_out_of_range_interval() {
    let bad = r#"
version: 1
agent:
  name: "billing-api"
  report_interval_ms: 10
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn reject_unknown_version() {
    let bad = r#"
version: 2
agent:
  name: "billing-api"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED");
}

#[test]
fn in_code_config_is_valid() {
    let cfg = config::AgentConfig::new("worker");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.profiling.max_timeout_ms, 300000);
}
