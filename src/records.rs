//! Record shapes shared by the agent (writer) and the parsers (reader).

use serde::{Deserialize, Serialize};

/// NetBox choice field, e.g. `{"value": "completed", "label": "Completed"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChoice {
    pub value: String,
    pub label: String,
}

/// One line of the `netbox_data_source` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceLine {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub status: StatusChoice,
    #[serde(default, alias = "last_updated")]
    pub last_synced: Option<String>,
    pub file_count: u64,
}

/// Field positions of a `netbox_script` line.
pub mod script_fields {
    pub const NAME: usize = 0;
    pub const TEST: usize = 1;
    pub const STATE: usize = 2;
    pub const COMPLETED: usize = 3;
    pub const COUNTERS: usize = 4;
    /// Lines with at least this many fields carry a run timestamp.
    pub const MIN_RUN_FIELDS: usize = 4;
    pub const FULL_FIELDS: usize = 8;
}

/// Field positions of a legacy `netbox_reports` line.
pub mod report_fields {
    pub const KEY: usize = 0;
    pub const TEST: usize = 2;
    pub const COMPLETED: usize = 3;
    pub const COUNTERS: usize = 4;
    /// A line with exactly this many fields declares a test that never ran.
    pub const DECLARED_ONLY: usize = 3;
    pub const FULL_FIELDS: usize = 8;
}
