use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use tempfile::TempDir;

use netbox_monitor::agent::{data_source_line, script_lines};
use netbox_monitor::api::models::{DataSource, Job, JobData};
use netbox_monitor::checks::counters::TestResult;
use netbox_monitor::checks::data_source::parse_data_source_lines;
use netbox_monitor::checks::levels::Levels;
use netbox_monitor::checks::script::parse_script_lines;
use netbox_monitor::checks::timestamp::normalize;
use netbox_monitor::checks::{CheckParams, State};
use netbox_monitor::error::ConfigError;
use netbox_monitor::host::PluginHost;
use netbox_monitor::params::{load_params, ParamStore};
use netbox_monitor::records::StatusChoice;
use netbox_monitor::section::{parse_agent_output, Section};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 2)
        .unwrap()
        .and_hms_opt(6, 55, 0)
        .unwrap()
}

fn completed() -> StatusChoice {
    StatusChoice {
        value: "completed".to_string(),
        label: "Completed".to_string(),
    }
}

fn script_job(completed_at: &str, tests: &[(&str, TestResult)]) -> Job {
    Job {
        id: 11,
        object_type: Some("extras.script".to_string()),
        status: completed(),
        completed: Some(completed_at.to_string()),
        data: Some(JobData {
            tests: tests
                .iter()
                .map(|(n, r)| (n.to_string(), *r))
                .collect::<BTreeMap<_, _>>(),
        }),
    }
}

fn agent_output() -> String {
    let mut scripts = Section::with_separator("netbox_script", ',');
    let job = script_job(
        "2024-07-02T06:00:00+02:00",
        &[
            ("test_cables", TestResult::new(0, 10, 0, 0)),
            ("test_power", TestResult::new(1, 5, 2, 1)),
        ],
    );
    for line in script_lines("CableReport", Some(&job)) {
        scripts.append_fields(line);
    }
    for line in script_lines("NeverRun", None) {
        scripts.append_fields(line);
    }

    let mut sources = Section::json_lines("netbox_data_source");
    let source = DataSource {
        id: 1,
        name: "config-repo".to_string(),
        description: "Git".to_string(),
        enabled: true,
        status: StatusChoice {
            value: "failed".to_string(),
            label: "Failed".to_string(),
        },
        last_synced: Some("2024-07-02T05:55:00+02:00".to_string()),
        file_count: 12,
    };
    sources.append_json(&data_source_line(source, None)).unwrap();

    format!("{}{}", scripts, sources)
}

#[test]
fn test_script_lines_roundtrip_through_parser() {
    let job = script_job(
        "2024-07-01T06:00:02.842382+02:00",
        &[
            ("test_a", TestResult::new(0, 76, 0, 0)),
            ("test_b", TestResult::new(3, 0, 1, 9)),
        ],
    );
    let mut section = Section::with_separator("netbox_script", ',');
    for line in script_lines("S", Some(&job)) {
        section.append_fields(line);
    }

    let tables = parse_agent_output(&section.to_string());
    let outcome = parse_script_lines(&tables["netbox_script"]);
    assert!(outcome.errors.is_empty());

    let script = &outcome.section["S"];
    assert_eq!(script.state.as_deref(), Some("completed"));
    assert_eq!(
        script.last_run,
        Some(normalize("2024-07-01T06:00:02.842382+02:00").unwrap())
    );
    let expected: BTreeMap<String, TestResult> = job.tests().map(|(n, r)| (n.clone(), *r)).collect();
    assert_eq!(script.tests, expected);
}

#[test]
fn test_data_source_line_roundtrip_through_parser() {
    let tables = parse_agent_output(&agent_output());
    let outcome = parse_data_source_lines(&tables["netbox_data_source"]);
    assert!(outcome.errors.is_empty());

    let record = &outcome.section["config-repo"];
    assert_eq!(record.description, "Git");
    assert!(record.enabled);
    assert_eq!(record.status.label, "Failed");
    assert_eq!(record.file_count, 12);
    assert_eq!(
        record.last_synced,
        NaiveDate::from_ymd_opt(2024, 7, 2).unwrap().and_hms_opt(5, 55, 0)
    );
}

#[test]
fn test_host_evaluates_all_sections_with_defaults() {
    let host = PluginHost::with_netbox_plugins(ParamStore::default());
    let reports = host.evaluate(&parse_agent_output(&agent_output()), now());

    let lines: Vec<String> = reports.iter().map(|r| r.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "CRIT Netbox DataSource config-repo - Status is Failed(!!), Last Sync: 60 minutes 0 seconds | file=12",
            "WARN Netbox Script CableReport - Last Run: 55 minutes 0 seconds, test_power Warning: 2(!), test_power Failure: 1(!) | test_info=1 test_success=15 test_warning=2 test_failure=1",
            "UNKNOWN Netbox Script NeverRun - Report \"NeverRun\" not yet executed(?)",
        ]
    );
}

#[test]
fn test_host_uses_configured_params() {
    let mut params = ParamStore::default();
    params.insert("netbox_script", CheckParams::with_maxage(Levels::fixed(600.0, 1800.0)));
    let host = PluginHost::with_netbox_plugins(params);
    let reports = host.evaluate(&parse_agent_output(&agent_output()), now());

    let cable = reports
        .iter()
        .find(|r| r.item == "CableReport")
        .expect("CableReport discovered");
    assert_eq!(cable.state, State::Crit);
    assert!(cable
        .summary()
        .starts_with("Last Run: 55 minutes 0 seconds (warn/crit at 10 minutes 0 seconds/30 minutes 0 seconds)(!!)"));
}

const STALE_SCRIPT: &str = "<<<netbox_script:sep(44)>>>\nS,,completed,2020-01-01T00:00:00+00:00\n";

#[test]
fn test_rule_without_maxage_keeps_default_levels() {
    let params = ParamStore::from_json(r#"{"netbox_script": {}}"#, "inline").unwrap();
    let host = PluginHost::with_netbox_plugins(params);
    let reports = host.evaluate(&parse_agent_output(STALE_SCRIPT), now());

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].state, State::Crit);
    assert!(reports[0]
        .summary()
        .contains("(warn/crit at 2 days 0 hours/7 days 0 hours)"));
}

#[test]
fn test_explicit_no_levels_disables_age_alerting() {
    let params =
        ParamStore::from_json(r#"{"netbox_script": {"maxage": ["no_levels", null]}}"#, "inline")
            .unwrap();
    let host = PluginHost::with_netbox_plugins(params);
    let reports = host.evaluate(&parse_agent_output(STALE_SCRIPT), now());

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].state, State::Ok);
}

#[test]
fn test_host_with_empty_output_has_no_services() {
    let host = PluginHost::with_netbox_plugins(ParamStore::default());
    assert!(host.evaluate(&parse_agent_output(""), now()).is_empty());
    assert!(host
        .evaluate(&parse_agent_output("<<<netbox_script:sep(44)>>>\n"), now())
        .is_empty());
}

#[test]
fn test_load_params_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("params.json");
    std::fs::write(
        &path,
        r#"{
            "netbox_script": {"maxage": ["fixed", [1800, 3600]]},
            "netbox_data_source": {"maxage": ["no_levels", null]},
            "netbox_reports": {}
        }"#,
    )
    .unwrap();

    let store = load_params(&path).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(
        store.get("netbox_script").unwrap().maxage,
        Some(Levels::fixed(1800.0, 3600.0))
    );
    assert_eq!(store.get("netbox_data_source").unwrap().maxage, Some(Levels::NoLevels));
    assert_eq!(store.get("netbox_reports").unwrap().maxage, None);
    assert!(store.get("other").is_none());
}

#[test]
fn test_load_params_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = load_params(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_load_params_invalid_levels() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"netbox_script": {"maxage": ["predictive", [1, 2]]}}"#).unwrap();
    let err = load_params(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Json { .. }));
}
