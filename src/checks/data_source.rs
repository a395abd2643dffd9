//! `netbox_data_source`: sync state of NetBox data sources.
//!
//! ```text
//! <<<netbox_data_source:sep(0)>>>
//! {"name": "test", "description": "test", "enabled": true, "status": {"value": "completed", "label": "Completed"}, "last_synced": "2023-05-03T13:13:29.965921+02:00", "file_count": 1}
//! ```

use chrono::NaiveDateTime;

use super::levels::{evaluate_last_run, AgeLabel, Levels};
use super::timestamp::normalize;
use super::{
    discover_keys, CheckOutput, CheckParams, CheckPlugin, CheckResult, KeyedSection, Metric,
    ParseOutcome, Service, State,
};
use crate::config::{
    DATA_SOURCE_STATUS_FAILED, DEFAULT_MAXAGE_CRIT_SECS, DEFAULT_MAXAGE_WARN_SECS,
    SECTION_DATA_SOURCE,
};
use crate::error::ParseError;
use crate::records::{DataSourceLine, StatusChoice};
use crate::section::StringTable;

#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceRecord {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub status: StatusChoice,
    pub last_synced: Option<NaiveDateTime>,
    pub file_count: u64,
}

impl TryFrom<DataSourceLine> for DataSourceRecord {
    type Error = ParseError;

    fn try_from(line: DataSourceLine) -> Result<Self, Self::Error> {
        let last_synced = line.last_synced.as_deref().map(normalize).transpose()?;
        Ok(DataSourceRecord {
            name: line.name,
            description: line.description,
            enabled: line.enabled,
            status: line.status,
            last_synced,
            file_count: line.file_count,
        })
    }
}

pub type DataSourceSection = KeyedSection<DataSourceRecord>;

pub fn parse_data_source_lines(table: &StringTable) -> ParseOutcome<DataSourceSection> {
    let mut section = DataSourceSection::new();
    let mut errors = Vec::new();

    for (idx, row) in table.iter().enumerate() {
        let Some(raw) = row.first() else {
            continue;
        };
        let record = serde_json::from_str::<DataSourceLine>(raw)
            .map_err(ParseError::from)
            .and_then(DataSourceRecord::try_from);
        match record {
            Ok(record) => {
                section.insert(record.name.clone(), record);
            }
            Err(e) => errors.push((idx, e)),
        }
    }

    ParseOutcome { section, errors }
}

pub struct DataSourcePlugin;

impl CheckPlugin for DataSourcePlugin {
    type Section = DataSourceSection;

    fn section_name(&self) -> &'static str {
        SECTION_DATA_SOURCE
    }

    fn service_name(&self) -> &'static str {
        "Netbox DataSource %s"
    }

    fn default_params(&self) -> CheckParams {
        CheckParams::with_maxage(Levels::fixed(
            DEFAULT_MAXAGE_WARN_SECS,
            DEFAULT_MAXAGE_CRIT_SECS,
        ))
    }

    fn parse(&self, table: &StringTable) -> DataSourceSection {
        parse_data_source_lines(table).into_logged(SECTION_DATA_SOURCE)
    }

    fn discover(&self, section: &DataSourceSection) -> Vec<Service> {
        discover_keys(section)
    }

    fn check(
        &self,
        item: &str,
        params: &CheckParams,
        section: &DataSourceSection,
        now: NaiveDateTime,
    ) -> Vec<CheckOutput> {
        let Some(data_source) = section.get(item) else {
            return Vec::new();
        };
        let mut out = Vec::new();

        // Reported ahead of, and independent from, the sync age.
        if data_source.status.value == DATA_SOURCE_STATUS_FAILED {
            out.push(
                CheckResult::new(
                    State::Crit,
                    format!("Status is {}", data_source.status.label),
                )
                .into(),
            );
        }

        out.push(
            evaluate_last_run(
                data_source.last_synced,
                now,
                params.maxage.as_ref(),
                AgeLabel::LastSync,
                || format!("Data source \"{}\" never synced", item),
            )
            .into(),
        );

        out.push(Metric::new("file", data_source.file_count as f64).into());
        out
    }
}
