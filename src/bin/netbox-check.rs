use anyhow::Context;
use chrono::Local;
use clap::Parser;
use std::io::Read;
use tracing::{debug, info};

use netbox_monitor::checks::State;
use netbox_monitor::config::CheckArgs;
use netbox_monitor::host::PluginHost;
use netbox_monitor::params::{load_params, ParamStore};
use netbox_monitor::section::parse_agent_output;
use netbox_monitor::logging;

fn main() -> anyhow::Result<()> {
    let args = CheckArgs::parse();
    let _log_guard = logging::init(args.verbose, None)?;

    let output = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read agent output {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read agent output from stdin")?;
            buf
        }
    };

    let params = match &args.params {
        Some(path) => load_params(path)?,
        None => ParamStore::default(),
    };
    if params.is_empty() {
        debug!("No check parameters configured, using plugin defaults");
    }

    let tables = parse_agent_output(&output);
    info!("Agent output contains {} section(s)", tables.len());

    let host = PluginHost::with_netbox_plugins(params);
    let reports = host.evaluate(&tables, Local::now().naive_local());

    let mut worst = State::Ok;
    for report in &reports {
        println!("{}", report);
        worst = worst.worst(report.state);
    }

    std::process::exit(worst.exit_code());
}
