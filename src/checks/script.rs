//! `netbox_script`: last run and test results of NetBox custom scripts.
//!
//! ```text
//! <<<netbox_script:sep(44)>>>
//! NeverRunScript
//! DeviceConnectionsReport,,completed,2024-07-01T06:00:02.842382+02:00
//! DeviceConnectionsReport,test_power_connections,completed,2024-07-01T06:00:02.842382+02:00,0,76,0,0
//! ```

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::counters::{aggregate, alerts, TestResult};
use super::levels::{evaluate_last_run, AgeLabel, Levels};
use super::timestamp::normalize;
use super::{
    discover_keys, CheckOutput, CheckParams, CheckPlugin, CheckResult, KeyedSection, Metric,
    ParseOutcome, Service, State,
};
use crate::config::{
    DEFAULT_MAXAGE_CRIT_SECS, DEFAULT_MAXAGE_WARN_SECS, JOB_STATUS_FAILED, SECTION_SCRIPT,
};
use crate::error::ParseError;
use crate::records::script_fields as f;
use crate::section::StringTable;

/// Metric names of the aggregated counters.
pub const METRIC_TEST_INFO: &str = "test_info";
pub const METRIC_TEST_SUCCESS: &str = "test_success";
pub const METRIC_TEST_WARNING: &str = "test_warning";
pub const METRIC_TEST_FAILURE: &str = "test_failure";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptRecord {
    pub name: String,
    /// Status value of the last completed job.
    pub state: Option<String>,
    pub last_run: Option<NaiveDateTime>,
    pub tests: BTreeMap<String, TestResult>,
}

pub type ScriptSection = KeyedSection<ScriptRecord>;

struct ScriptLine {
    name: String,
    run: Option<(String, NaiveDateTime)>,
    test: Option<(String, TestResult)>,
}

fn parse_line(row: &[String]) -> Result<ScriptLine, ParseError> {
    let name = row
        .get(f::NAME)
        .filter(|n| !n.is_empty())
        .ok_or(ParseError::TooFewFields {
            expected: 1,
            found: 0,
        })?
        .clone();

    let run = if row.len() >= f::MIN_RUN_FIELDS {
        Some((row[f::STATE].clone(), normalize(&row[f::COMPLETED])?))
    } else {
        None
    };

    let test = if row.len() >= f::FULL_FIELDS {
        let result = TestResult::from_fields(&row[f::COUNTERS..f::FULL_FIELDS])?;
        Some((row[f::TEST].clone(), result))
    } else {
        None
    };

    Ok(ScriptLine { name, run, test })
}

pub fn parse_script_lines(table: &StringTable) -> ParseOutcome<ScriptSection> {
    let mut section = ScriptSection::new();
    let mut errors = Vec::new();

    for (idx, row) in table.iter().enumerate() {
        let line = match parse_line(row) {
            Ok(line) => line,
            Err(e) => {
                errors.push((idx, e));
                continue;
            }
        };

        let script = section
            .entry(line.name.clone())
            .or_insert_with(|| ScriptRecord {
                name: line.name,
                ..Default::default()
            });
        if let Some((state, last_run)) = line.run {
            script.state = Some(state);
            script.last_run = Some(last_run);
        }
        if let Some((test_name, result)) = line.test {
            script.tests.insert(test_name, result);
        }
    }

    ParseOutcome { section, errors }
}

pub struct ScriptPlugin;

impl CheckPlugin for ScriptPlugin {
    type Section = ScriptSection;

    fn section_name(&self) -> &'static str {
        SECTION_SCRIPT
    }

    fn service_name(&self) -> &'static str {
        "Netbox Script %s"
    }

    fn default_params(&self) -> CheckParams {
        CheckParams::with_maxage(Levels::fixed(
            DEFAULT_MAXAGE_WARN_SECS,
            DEFAULT_MAXAGE_CRIT_SECS,
        ))
    }

    fn parse(&self, table: &StringTable) -> ScriptSection {
        parse_script_lines(table).into_logged(SECTION_SCRIPT)
    }

    fn discover(&self, section: &ScriptSection) -> Vec<Service> {
        discover_keys(section)
    }

    fn check(
        &self,
        item: &str,
        params: &CheckParams,
        section: &ScriptSection,
        now: NaiveDateTime,
    ) -> Vec<CheckOutput> {
        let Some(script) = section.get(item) else {
            return Vec::new();
        };
        let mut out: Vec<CheckOutput> = Vec::new();

        if let Some(state) = script
            .state
            .as_deref()
            .filter(|s| JOB_STATUS_FAILED.contains(s))
        {
            out.push(CheckResult::new(State::Crit, format!("Last job {}", state)).into());
        }

        out.push(
            evaluate_last_run(
                script.last_run,
                now,
                params.maxage.as_ref(),
                AgeLabel::LastRun,
                || format!("Report \"{}\" not yet executed", item),
            )
            .into(),
        );

        if script.tests.is_empty() {
            return out;
        }

        for (test_name, result) in &script.tests {
            out.extend(alerts(test_name, result, true).into_iter().map(CheckOutput::from));
        }

        let total = aggregate(&script.tests);
        for (name, value) in [
            (METRIC_TEST_INFO, total.info),
            (METRIC_TEST_SUCCESS, total.success),
            (METRIC_TEST_WARNING, total.warning),
            (METRIC_TEST_FAILURE, total.failure),
        ] {
            out.push(Metric::new(name, value as f64).into());
        }
        out
    }
}
