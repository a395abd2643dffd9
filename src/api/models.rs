use serde::Deserialize;
use std::collections::BTreeMap;

use crate::checks::counters::TestResult;
use crate::records::StatusChoice;

/// One page of a NetBox list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    pub next: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub object_type: Option<String>,
    pub status: StatusChoice,
    #[serde(default)]
    pub completed: Option<String>,
    #[serde(default)]
    pub data: Option<JobData>,
}

impl Job {
    /// Per-test counters of the job output; empty for jobs without tests.
    pub fn tests(&self) -> impl Iterator<Item = (&String, &TestResult)> {
        self.data.iter().flat_map(|d| d.tests.iter())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobData {
    #[serde(default)]
    pub tests: BTreeMap<String, TestResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSource {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub enabled: bool,
    pub status: StatusChoice,
    #[serde(default)]
    pub last_synced: Option<String>,
    #[serde(default)]
    pub file_count: u64,
}
