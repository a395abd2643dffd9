use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;

/// Checkmk special agent for NetBox.
#[derive(Parser, Debug, Clone)]
#[command(name = "agent_netbox", version)]
pub struct AgentArgs {
    /// REST API URL of the NetBox (example: https://netbox.example.com/api)
    #[arg(short = 'U', long = "url")]
    pub url: String,

    /// NetBox API token
    #[arg(short = 'T', long = "token")]
    pub token: String,

    /// HTTP connection timeout in seconds
    #[arg(short = 't', long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Do not verify the TLS certificate of the REST endpoint
    #[arg(long = "ignore-cert")]
    pub ignore_cert: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Fail on the first per-item fetch error instead of skipping the item
    #[arg(long = "debug")]
    pub debug: bool,

    /// Also write logs to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

/// Evaluates saved agent output with the NetBox check plugins.
#[derive(Parser, Debug, Clone)]
#[command(name = "netbox-check", version)]
pub struct CheckArgs {
    /// Agent output to evaluate (defaults to stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// JSON file with check parameters keyed by plugin name
    #[arg(short = 'p', long = "params")]
    pub params: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub struct AgentConfig {
    pub base_url: Url,
    pub token: String,
    pub timeout: Duration,
    pub verify_cert: bool,
    pub fail_fast: bool,
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Section names
pub const SECTION_SCRIPT: &str = "netbox_script";
pub const SECTION_DATA_SOURCE: &str = "netbox_data_source";
pub const SECTION_REPORTS: &str = "netbox_reports";

// API paths, relative to the configured base URL
pub const SCRIPTS_PATH: &str = "extras/scripts/";
pub const JOBS_PATH: &str = "core/jobs/";
pub const DATA_SOURCES_PATH: &str = "core/data-sources/";

/// Only jobs finished after this date count as a run.
pub const JOBS_COMPLETED_AFTER: &str = "1970-01-01";
pub const DATA_SOURCE_OBJECT_TYPE: &str = "core.datasource";

// NetBox status enumerations
pub const DATA_SOURCE_STATUS_FAILED: &str = "failed";
pub const JOB_STATUS_FAILED: &[&str] = &["errored", "failed"];

// Default maxage levels of every check family
pub const DEFAULT_MAXAGE_WARN_SECS: f64 = 2.0 * 24.0 * 3600.0;
pub const DEFAULT_MAXAGE_CRIT_SECS: f64 = 7.0 * 24.0 * 3600.0;

impl AgentConfig {
    pub fn from_args(args: &AgentArgs) -> Result<Self, FetchError> {
        // A trailing slash makes Url::join append instead of replacing the
        // last path segment ("/api" + "core/jobs/").
        let raw = format!("{}/", args.url.trim_end_matches('/'));
        let base_url = Url::parse(&raw).map_err(|source| FetchError::InvalidUrl {
            url: args.url.clone(),
            source,
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme {
                scheme: base_url.scheme().to_string(),
            });
        }

        Ok(AgentConfig {
            base_url,
            token: args.token.clone(),
            timeout: Duration::from_secs(args.timeout),
            verify_cert: !args.ignore_cert,
            fail_fast: args.debug,
        })
    }

    /// Absolute URL of an API endpoint below the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|source| FetchError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                source,
            })
    }
}

/// Log filter used when RUST_LOG is not set.
pub fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "netbox_monitor=info,agent_netbox=info,netbox_check=info",
        1 => "netbox_monitor=debug,agent_netbox=debug,netbox_check=debug",
        _ => "netbox_monitor=trace,agent_netbox=trace,netbox_check=trace,reqwest=debug",
    }
}
