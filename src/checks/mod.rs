//! Parser, discovery and check functions for the NetBox sections.
//!
//! Each check family implements [`CheckPlugin`]; the plugin host only ever
//! sees these three function contracts plus the plugin's names and default
//! parameters.

pub mod counters;
pub mod data_source;
pub mod levels;
pub mod render;
pub mod reports;
pub mod script;
pub mod timestamp;

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParseError;
use crate::section::StringTable;
use levels::Levels;

/// Monitoring state of a single result or a whole service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Ok = 0,
    Warn = 1,
    Crit = 2,
    Unknown = 3,
}

impl State {
    /// Worse of two states. CRIT outranks UNKNOWN, which outranks WARN.
    pub fn worst(self, other: State) -> State {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }

    fn severity(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Unknown => 2,
            State::Crit => 3,
        }
    }

    /// Marker appended to non-OK summaries in a service line.
    pub fn marker(self) -> &'static str {
        match self {
            State::Ok => "",
            State::Warn => "(!)",
            State::Crit => "(!!)",
            State::Unknown => "(?)",
        }
    }

    pub fn exit_code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Ok => "OK",
            State::Warn => "WARN",
            State::Crit => "CRIT",
            State::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub state: State,
    pub summary: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn new(state: State, summary: impl Into<String>) -> Self {
        CheckResult {
            state,
            summary: summary.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Metric {
            name: name.into(),
            value,
        }
    }
}

/// One item yielded by a check function.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutput {
    Result(CheckResult),
    Metric(Metric),
}

impl From<CheckResult> for CheckOutput {
    fn from(r: CheckResult) -> Self {
        CheckOutput::Result(r)
    }
}

impl From<Metric> for CheckOutput {
    fn from(m: Metric) -> Self {
        CheckOutput::Metric(m)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub item: String,
}

impl Service {
    pub fn new(item: impl Into<String>) -> Self {
        Service { item: item.into() }
    }
}

/// Rule parameters shared by all three check families. An unset key means
/// "not configured"; levels are switched off with an explicit `NoLevels`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckParams {
    #[serde(default)]
    pub maxage: Option<Levels>,
}

impl CheckParams {
    pub fn with_maxage(levels: Levels) -> Self {
        CheckParams {
            maxage: Some(levels),
        }
    }

    /// Keys set in `self` win; unset keys fall back to `defaults`.
    pub fn merged_over(self, defaults: CheckParams) -> CheckParams {
        CheckParams {
            maxage: self.maxage.or(defaults.maxage),
        }
    }
}

/// Section parsed into records keyed by item name.
pub type KeyedSection<R> = BTreeMap<String, R>;

/// Result of parsing one string table: the records that parsed plus the
/// lines that did not, by zero-based line index.
#[derive(Debug)]
pub struct ParseOutcome<S> {
    pub section: S,
    pub errors: Vec<(usize, ParseError)>,
}

impl<S> ParseOutcome<S> {
    /// Log every rejected line and hand back the section.
    pub fn into_logged(self, section_name: &str) -> S {
        for (line, err) in &self.errors {
            if err.is_contract_violation() {
                tracing::error!(
                    section = section_name,
                    line,
                    "record shape changed upstream, skipping line: {}",
                    err
                );
            } else {
                tracing::warn!(section = section_name, line, "skipping malformed line: {}", err);
            }
        }
        self.section
    }
}

/// The capability interface the plugin host drives: parse a section,
/// discover services from it, check one service.
pub trait CheckPlugin {
    type Section;

    /// Name of the agent section this plugin consumes.
    fn section_name(&self) -> &'static str;

    /// Service description template; `%s` is replaced by the item.
    fn service_name(&self) -> &'static str;

    fn default_params(&self) -> CheckParams;

    fn parse(&self, table: &StringTable) -> Self::Section;

    fn discover(&self, section: &Self::Section) -> Vec<Service>;

    fn check(
        &self,
        item: &str,
        params: &CheckParams,
        section: &Self::Section,
        now: NaiveDateTime,
    ) -> Vec<CheckOutput>;
}

/// One service per key, in key order.
pub fn discover_keys<R>(section: &KeyedSection<R>) -> Vec<Service> {
    section.keys().map(Service::new).collect()
}
