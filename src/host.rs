//! Minimal plugin host: feeds agent sections through the registered check
//! plugins and rolls results up into one state per service.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::checks::data_source::DataSourcePlugin;
use crate::checks::reports::ReportsPlugin;
use crate::checks::script::ScriptPlugin;
use crate::checks::{CheckOutput, CheckParams, CheckPlugin, State};
use crate::params::ParamStore;
use crate::section::StringTable;

/// Object-safe view of a [`CheckPlugin`] for the registry.
pub trait SectionPlugin: Send + Sync {
    fn section_name(&self) -> &'static str;

    fn default_params(&self) -> CheckParams;

    /// Parse `table`, discover its services and check each of them.
    fn evaluate(
        &self,
        table: &StringTable,
        params: &CheckParams,
        now: NaiveDateTime,
    ) -> Vec<ServiceReport>;
}

impl<P> SectionPlugin for P
where
    P: CheckPlugin + Send + Sync,
{
    fn section_name(&self) -> &'static str {
        CheckPlugin::section_name(self)
    }

    fn default_params(&self) -> CheckParams {
        CheckPlugin::default_params(self)
    }

    fn evaluate(
        &self,
        table: &StringTable,
        params: &CheckParams,
        now: NaiveDateTime,
    ) -> Vec<ServiceReport> {
        let section = self.parse(table);
        self.discover(&section)
            .into_iter()
            .map(|service| {
                let outputs = self.check(&service.item, params, &section, now);
                let description = self.service_name().replace("%s", &service.item);
                ServiceReport::from_outputs(description, service.item, outputs)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReport {
    pub description: String,
    pub item: String,
    pub state: State,
    pub outputs: Vec<CheckOutput>,
}

impl ServiceReport {
    /// The service state is the worst state among the results. A check that
    /// yields nothing means the item vanished from the section.
    pub fn from_outputs(description: String, item: String, outputs: Vec<CheckOutput>) -> Self {
        let state = worst_state(&outputs).unwrap_or(State::Unknown);
        ServiceReport {
            description,
            item,
            state,
            outputs,
        }
    }

    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .outputs
            .iter()
            .filter_map(|o| match o {
                CheckOutput::Result(r) => Some(format!("{}{}", r.summary, r.state.marker())),
                CheckOutput::Metric(_) => None,
            })
            .collect();
        if parts.is_empty() {
            return "Item not found in monitoring data".to_string();
        }
        parts.join(", ")
    }

    pub fn perfdata(&self) -> String {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                CheckOutput::Metric(m) => Some(format!("{}={}", m.name, m.value)),
                CheckOutput::Result(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ServiceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {}", self.state, self.description, self.summary())?;
        let perf = self.perfdata();
        if !perf.is_empty() {
            write!(f, " | {}", perf)?;
        }
        Ok(())
    }
}

/// Worst state over all results; `None` when there are no results at all.
pub fn worst_state(outputs: &[CheckOutput]) -> Option<State> {
    outputs
        .iter()
        .filter_map(|o| match o {
            CheckOutput::Result(r) => Some(r.state),
            CheckOutput::Metric(_) => None,
        })
        .reduce(State::worst)
}

pub struct PluginHost {
    plugins: Vec<Box<dyn SectionPlugin>>,
    params: ParamStore,
}

impl PluginHost {
    pub fn new(params: ParamStore) -> Self {
        PluginHost {
            plugins: Vec::new(),
            params,
        }
    }

    /// Host with the data source, script and legacy report plugins.
    pub fn with_netbox_plugins(params: ParamStore) -> Self {
        let mut host = Self::new(params);
        host.register(DataSourcePlugin);
        host.register(ScriptPlugin);
        host.register(ReportsPlugin);
        host
    }

    pub fn register<P: SectionPlugin + 'static>(&mut self, plugin: P) {
        debug!("Registered check plugin for section {}", plugin.section_name());
        self.plugins.push(Box::new(plugin));
    }

    /// Evaluate every registered plugin whose section is present.
    pub fn evaluate(
        &self,
        tables: &BTreeMap<String, StringTable>,
        now: NaiveDateTime,
    ) -> Vec<ServiceReport> {
        let mut reports = Vec::new();
        for plugin in &self.plugins {
            let name = plugin.section_name();
            let Some(table) = tables.get(name) else {
                debug!("Section {} not in agent output", name);
                continue;
            };
            let defaults = plugin.default_params();
            let params = match self.params.get(name) {
                Some(rule) => rule.clone().merged_over(defaults),
                None => defaults,
            };
            let services = plugin.evaluate(table, &params, now);
            info!("Section {}: {} service(s)", name, services.len());
            reports.extend(services);
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckResult, Metric};

    fn result(state: State) -> CheckOutput {
        CheckResult::new(state, format!("{}", state)).into()
    }

    #[test]
    fn test_worst_state_ordering() {
        assert_eq!(worst_state(&[result(State::Ok), result(State::Warn)]), Some(State::Warn));
        assert_eq!(
            worst_state(&[result(State::Warn), result(State::Unknown)]),
            Some(State::Unknown)
        );
        assert_eq!(
            worst_state(&[result(State::Crit), result(State::Unknown)]),
            Some(State::Crit)
        );
        assert_eq!(worst_state(&[Metric::new("m", 1.0).into()]), None);
    }

    #[test]
    fn test_per_test_warn_rolls_up_into_service_state() {
        let outputs: Vec<CheckOutput> = vec![
            CheckResult::new(State::Ok, "Last Run: 1 hour 0 minutes").into(),
            CheckResult::new(State::Warn, "test_a Failure: 1").into(),
            Metric::new("test_failure", 1.0).into(),
        ];
        let report = ServiceReport::from_outputs("Netbox Script S".into(), "S".into(), outputs);
        assert_eq!(report.state, State::Warn);
        assert_eq!(
            report.to_string(),
            "WARN Netbox Script S - Last Run: 1 hour 0 minutes, test_a Failure: 1(!) | test_failure=1"
        );
    }

    #[test]
    fn test_no_outputs_is_unknown() {
        let report = ServiceReport::from_outputs("X".into(), "x".into(), Vec::new());
        assert_eq!(report.state, State::Unknown);
        assert_eq!(report.summary(), "Item not found in monitoring data");
    }
}
