//! `netbox_reports`: legacy report results (NetBox before scripts absorbed
//! reports).
//!
//! ```text
//! <<<netbox_reports:sep(44)>>>
//! dellos6.DellOS6Report,DellOS6Report,test_device
//! dhcp.DhcpReport,DhcpReport,test_pool_is_in_prefix,2023-01-04T08:00:01.134531+01:00,0,0,41,0
//! ```

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::counters::{alerts, TestResult};
use super::levels::{evaluate_last_run, AgeLabel, Levels};
use super::timestamp::normalize;
use super::{
    discover_keys, CheckOutput, CheckParams, CheckPlugin, CheckResult, KeyedSection, Metric,
    ParseOutcome, Service, State,
};
use crate::config::{DEFAULT_MAXAGE_CRIT_SECS, DEFAULT_MAXAGE_WARN_SECS, SECTION_REPORTS};
use crate::error::ParseError;
use crate::records::report_fields as f;
use crate::section::StringTable;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportRecord {
    pub name: String,
    pub last_run: Option<NaiveDateTime>,
    /// Declared tests; `None` for a test that has no result yet.
    pub tests: BTreeMap<String, Option<TestResult>>,
}

pub type ReportSection = KeyedSection<ReportRecord>;

fn parse_line(row: &[String]) -> Result<(String, String, Option<(NaiveDateTime, TestResult)>), ParseError> {
    if row.len() < f::DECLARED_ONLY {
        return Err(ParseError::TooFewFields {
            expected: f::DECLARED_ONLY,
            found: row.len(),
        });
    }
    let key = row[f::KEY].clone();
    let test = row[f::TEST].clone();
    if row.len() == f::DECLARED_ONLY {
        return Ok((key, test, None));
    }
    if row.len() < f::FULL_FIELDS {
        return Err(ParseError::TooFewFields {
            expected: f::FULL_FIELDS,
            found: row.len(),
        });
    }

    let last_run = normalize(&row[f::COMPLETED])?;
    let result = TestResult::from_fields(&row[f::COUNTERS..f::FULL_FIELDS])?;
    Ok((key, test, Some((last_run, result))))
}

pub fn parse_report_lines(table: &StringTable) -> ParseOutcome<ReportSection> {
    let mut section = ReportSection::new();
    let mut errors = Vec::new();

    for (idx, row) in table.iter().enumerate() {
        let (key, test, run) = match parse_line(row) {
            Ok(parsed) => parsed,
            Err(e) => {
                errors.push((idx, e));
                continue;
            }
        };

        let report = section.entry(key.clone()).or_insert_with(|| ReportRecord {
            name: key,
            ..Default::default()
        });
        match run {
            Some((last_run, result)) => {
                report.last_run = Some(last_run);
                report.tests.insert(test, Some(result));
            }
            None => {
                report.tests.entry(test).or_insert(None);
            }
        }
    }

    ParseOutcome { section, errors }
}

pub struct ReportsPlugin;

impl CheckPlugin for ReportsPlugin {
    type Section = ReportSection;

    fn section_name(&self) -> &'static str {
        SECTION_REPORTS
    }

    fn service_name(&self) -> &'static str {
        "Netbox Reports %s"
    }

    fn default_params(&self) -> CheckParams {
        CheckParams::with_maxage(Levels::fixed(
            DEFAULT_MAXAGE_WARN_SECS,
            DEFAULT_MAXAGE_CRIT_SECS,
        ))
    }

    fn parse(&self, table: &StringTable) -> ReportSection {
        parse_report_lines(table).into_logged(SECTION_REPORTS)
    }

    fn discover(&self, section: &ReportSection) -> Vec<Service> {
        discover_keys(section)
    }

    fn check(
        &self,
        item: &str,
        params: &CheckParams,
        section: &ReportSection,
        now: NaiveDateTime,
    ) -> Vec<CheckOutput> {
        let Some(report) = section.get(item) else {
            return Vec::new();
        };

        let age = evaluate_last_run(
            report.last_run,
            now,
            params.maxage.as_ref(),
            AgeLabel::LastRun,
            || format!("Report \"{}\" not yet executed", item),
        );
        let never_run = report.last_run.is_none();
        let mut out: Vec<CheckOutput> = vec![age.into()];
        if never_run {
            return out;
        }

        for (test_name, result) in &report.tests {
            let Some(result) = result else {
                out.push(
                    CheckResult::new(State::Ok, test_name.as_str())
                        .with_details(format!("{}: no result", test_name))
                        .into(),
                );
                continue;
            };

            out.push(
                CheckResult::new(State::Ok, test_name.as_str())
                    .with_details(format!("{}: {}", test_name, result))
                    .into(),
            );
            out.extend(alerts(test_name, result, false).into_iter().map(CheckOutput::from));
            for (key, value) in result.fields() {
                out.push(Metric::new(format!("{}_{}", test_name, key), value as f64).into());
            }
        }
        out
    }
}
