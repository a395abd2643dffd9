use chrono::{NaiveDate, NaiveDateTime};

use netbox_monitor::checks::data_source::DataSourcePlugin;
use netbox_monitor::checks::levels::Levels;
use netbox_monitor::checks::script::ScriptPlugin;
use netbox_monitor::checks::{CheckOutput, CheckParams, CheckPlugin, CheckResult, Metric, Service, State};
use netbox_monitor::section::{parse_agent_output, StringTable};

const DATA_SOURCE_LINE: &str = r#"{"name": "test", "description": "test", "enabled": true, "status": {"value": "completed", "label": "Completed"}, "last_synced": "2023-05-03T13:13:29.965921+02:00", "file_count": 1}"#;

fn data_source_table() -> StringTable {
    vec![vec![DATA_SOURCE_LINE.to_string()]]
}

fn script_table() -> StringTable {
    vec![
        ["DeviceConnectionsReport", "", "completed", "2024-07-01T06:00:02.842382+02:00"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        [
            "DeviceConnectionsReport",
            "test_power_connections",
            "completed",
            "2024-07-01T06:00:02.842382+02:00",
            "0",
            "76",
            "0",
            "0",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    ]
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn two_and_seven_hours() -> CheckParams {
    CheckParams::with_maxage(Levels::fixed(2.0 * 3600.0, 7.0 * 3600.0))
}

// --- data source ---

#[test]
fn test_data_source_empty_table() {
    let section = DataSourcePlugin.parse(&Vec::new());
    assert!(section.is_empty());
    assert!(DataSourcePlugin.discover(&section).is_empty());
}

#[test]
fn test_data_source_discovery() {
    let section = DataSourcePlugin.parse(&data_source_table());
    assert_eq!(DataSourcePlugin.discover(&section), vec![Service::new("test")]);
}

#[test]
fn test_data_source_without_levels() {
    let section = DataSourcePlugin.parse(&data_source_table());
    let out = DataSourcePlugin.check("test", &CheckParams::default(), &section, at(2023, 5, 4, 6, 55));

    let expected: Vec<CheckOutput> = vec![
        CheckResult::new(State::Ok, "Last Sync: 17 hours 41 minutes").into(),
        Metric::new("file", 1.0).into(),
    ];
    assert_eq!(out, expected);
}

#[test]
fn test_data_source_with_levels_is_critical() {
    let section = DataSourcePlugin.parse(&data_source_table());
    let out = DataSourcePlugin.check("test", &two_and_seven_hours(), &section, at(2023, 5, 4, 6, 55));

    let expected: Vec<CheckOutput> = vec![
        CheckResult::new(
            State::Crit,
            "Last Sync: 17 hours 41 minutes (warn/crit at 2 hours 0 minutes/7 hours 0 minutes)",
        )
        .into(),
        Metric::new("file", 1.0).into(),
    ];
    assert_eq!(out, expected);
}

// --- script ---

#[test]
fn test_script_parse() {
    let section = ScriptPlugin.parse(&script_table());
    let script = &section["DeviceConnectionsReport"];
    assert_eq!(script.name, "DeviceConnectionsReport");
    assert_eq!(script.state.as_deref(), Some("completed"));
    assert_eq!(
        script.last_run,
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_micro_opt(6, 0, 2, 842382)
    );
    assert_eq!(script.tests.len(), 1);
    assert_eq!(script.tests["test_power_connections"].success, 76);
}

#[test]
fn test_script_discovery() {
    let section = ScriptPlugin.parse(&script_table());
    assert_eq!(
        ScriptPlugin.discover(&section),
        vec![Service::new("DeviceConnectionsReport")]
    );
    assert!(ScriptPlugin.discover(&ScriptPlugin.parse(&Vec::new())).is_empty());
}

#[test]
fn test_script_without_levels() {
    let section = ScriptPlugin.parse(&script_table());
    let out = ScriptPlugin.check(
        "DeviceConnectionsReport",
        &CheckParams::default(),
        &section,
        at(2024, 7, 2, 6, 55),
    );

    let expected: Vec<CheckOutput> = vec![
        CheckResult::new(State::Ok, "Last Run: 1 day 0 hours").into(),
        Metric::new("test_info", 0.0).into(),
        Metric::new("test_success", 76.0).into(),
        Metric::new("test_warning", 0.0).into(),
        Metric::new("test_failure", 0.0).into(),
    ];
    assert_eq!(out, expected);
}

#[test]
fn test_script_with_levels_is_critical() {
    let section = ScriptPlugin.parse(&script_table());
    let out = ScriptPlugin.check(
        "DeviceConnectionsReport",
        &two_and_seven_hours(),
        &section,
        at(2024, 7, 2, 6, 55),
    );

    assert_eq!(
        out[0],
        CheckOutput::Result(CheckResult::new(
            State::Crit,
            "Last Run: 1 day 0 hours (warn/crit at 2 hours 0 minutes/7 hours 0 minutes)",
        ))
    );
    assert_eq!(out.len(), 5);
}

#[test]
fn test_script_missing_item_yields_nothing() {
    let section = ScriptPlugin.parse(&script_table());
    assert!(ScriptPlugin
        .check("Gone", &CheckParams::default(), &section, at(2024, 7, 2, 6, 55))
        .is_empty());
}

// --- through the section framing ---

#[test]
fn test_agent_output_to_string_tables() {
    let output = format!(
        "<<<netbox_script:sep(44)>>>\n\
         DeviceConnectionsReport,,completed,2024-07-01T06:00:02.842382+02:00\n\
         DeviceConnectionsReport,test_power_connections,completed,2024-07-01T06:00:02.842382+02:00,0,76,0,0\n\
         <<<netbox_data_source:sep(0)>>>\n\
         {}\n",
        DATA_SOURCE_LINE
    );
    let tables = parse_agent_output(&output);
    assert_eq!(tables["netbox_script"], script_table());
    assert_eq!(tables["netbox_data_source"], data_source_table());
}
