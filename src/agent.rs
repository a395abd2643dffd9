//! Builds the agent sections from the NetBox API.

use tracing::{debug, error, info, warn};

use crate::api::models::{DataSource, Job, Script};
use crate::api::NetboxClient;
use crate::config::{SECTION_DATA_SOURCE, SECTION_SCRIPT};
use crate::error::FetchError;
use crate::records::DataSourceLine;
use crate::section::Section;

/// An item whose detail lookup failed; it is left out of its section.
#[derive(Debug)]
pub struct ItemFailure {
    pub section: &'static str,
    pub item: String,
    pub error: FetchError,
}

#[derive(Debug, Default)]
pub struct AgentReport {
    /// Sections whose listing call succeeded, in output order.
    pub sections: Vec<Section>,
    pub item_failures: Vec<ItemFailure>,
    /// Sections dropped entirely because their listing call failed.
    pub section_failures: Vec<(&'static str, FetchError)>,
}

impl AgentReport {
    pub fn render(&self) -> String {
        self.sections.iter().map(Section::to_string).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.section_failures.is_empty()
    }
}

/// `netbox_script` lines for one script and its latest job.
pub fn script_lines(name: &str, job: Option<&Job>) -> Vec<Vec<String>> {
    let Some((job, completed)) = job.and_then(|j| j.completed.as_deref().map(|c| (j, c))) else {
        return vec![vec![name.to_string()]];
    };
    let status = job.status.value.as_str();

    let mut lines = vec![vec![
        name.to_string(),
        String::new(),
        status.to_string(),
        completed.to_string(),
    ]];
    for (test_name, result) in job.tests() {
        let mut fields = vec![
            name.to_string(),
            test_name.clone(),
            status.to_string(),
            completed.to_string(),
        ];
        fields.extend(result.fields().iter().map(|(_, v)| v.to_string()));
        lines.push(fields);
    }
    lines
}

/// `netbox_data_source` record; `last_synced` falls back to the completion
/// time of the latest sync job.
pub fn data_source_line(source: DataSource, sync_job: Option<&Job>) -> DataSourceLine {
    let last_synced = source
        .last_synced
        .or_else(|| sync_job.and_then(|j| j.completed.clone()));
    DataSourceLine {
        name: source.name,
        description: source.description,
        enabled: source.enabled,
        status: source.status,
        last_synced,
        file_count: source.file_count,
    }
}

async fn fetch_script(client: &NetboxClient, script: &Script) -> Result<Vec<Vec<String>>, FetchError> {
    let job = client.latest_job(script.id).await?;
    if job.is_none() {
        debug!("Script {} has no completed job", script.name);
    }
    Ok(script_lines(&script.name, job.as_ref()))
}

async fn fetch_data_source(
    client: &NetboxClient,
    source: DataSource,
) -> Result<DataSourceLine, FetchError> {
    if source.last_synced.is_some() {
        return Ok(data_source_line(source, None));
    }
    let job = client.latest_data_source_job(source.id).await?;
    if job.is_none() {
        debug!("Data source {} has never been synced", source.name);
    }
    Ok(data_source_line(source, job.as_ref()))
}

fn append_data_source(
    section: &mut Section,
    name: &str,
    line: &DataSourceLine,
) -> Result<(), FetchError> {
    section
        .append_json(line)
        .map_err(|source| FetchError::Encode {
            item: name.to_string(),
            source,
        })
}

fn record_failure(
    report: &mut AgentReport,
    fail_fast: bool,
    section: &'static str,
    item: String,
    error: FetchError,
) -> Result<(), FetchError> {
    if fail_fast {
        return Err(error);
    }
    warn!(section, item = %item, "Skipping item: {}", error);
    report.item_failures.push(ItemFailure {
        section,
        item,
        error,
    });
    Ok(())
}

async fn section_scripts(client: &NetboxClient, report: &mut AgentReport) -> Result<(), FetchError> {
    let fail_fast = client.config().fail_fast;
    let scripts = match client.scripts().await {
        Ok(scripts) => scripts,
        Err(e) if fail_fast => return Err(e),
        Err(e) => {
            error!("Cannot list scripts, dropping section {}: {}", SECTION_SCRIPT, e);
            report.section_failures.push((SECTION_SCRIPT, e));
            return Ok(());
        }
    };

    let mut section = Section::with_separator(SECTION_SCRIPT, ',');
    for script in &scripts {
        match fetch_script(client, script).await {
            Ok(lines) => lines.into_iter().for_each(|l| section.append_fields(l)),
            Err(e) => record_failure(report, fail_fast, SECTION_SCRIPT, script.name.clone(), e)?,
        }
    }
    info!(
        "Section {}: {} script(s), {} line(s)",
        SECTION_SCRIPT,
        scripts.len(),
        section.lines().len()
    );
    report.sections.push(section);
    Ok(())
}

async fn section_data_sources(
    client: &NetboxClient,
    report: &mut AgentReport,
) -> Result<(), FetchError> {
    let fail_fast = client.config().fail_fast;
    let sources = match client.data_sources().await {
        Ok(sources) => sources,
        Err(e) if fail_fast => return Err(e),
        Err(e) => {
            error!("Cannot list data sources, dropping section {}: {}", SECTION_DATA_SOURCE, e);
            report.section_failures.push((SECTION_DATA_SOURCE, e));
            return Ok(());
        }
    };

    let count = sources.len();
    let mut section = Section::json_lines(SECTION_DATA_SOURCE);
    for source in sources {
        let name = source.name.clone();
        let appended = fetch_data_source(client, source)
            .await
            .and_then(|line| append_data_source(&mut section, &name, &line));
        if let Err(e) = appended {
            record_failure(report, fail_fast, SECTION_DATA_SOURCE, name, e)?;
        }
    }
    info!(
        "Section {}: {} data source(s), {} line(s)",
        SECTION_DATA_SOURCE,
        count,
        section.lines().len()
    );
    report.sections.push(section);
    Ok(())
}

/// Run one poll cycle. Only returns `Err` when the client is configured to
/// fail fast; otherwise failures are collected in the report.
pub async fn run(client: &NetboxClient) -> Result<AgentReport, FetchError> {
    let mut report = AgentReport::default();
    section_scripts(client, &mut report).await?;
    section_data_sources(client, &mut report).await?;
    Ok(report)
}
