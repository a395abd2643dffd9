use clap::Parser;
use std::io::Write;
use tracing::{error, info, warn};

use netbox_monitor::agent;
use netbox_monitor::api::NetboxClient;
use netbox_monitor::config::{AgentArgs, AgentConfig};
use netbox_monitor::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = AgentArgs::parse();
    let _log_guard = logging::init(args.verbose, args.log_file.as_deref())?;

    info!("Starting agent_netbox v{}", env!("CARGO_PKG_VERSION"));
    info!("API: {}", args.url);
    info!("Timeout: {}s", args.timeout);

    let config = AgentConfig::from_args(&args)?;
    let client = NetboxClient::new(config)?;

    let report = match agent::run(&client).await {
        Ok(report) => report,
        Err(e) => {
            error!("Aborting poll: {}", e);
            return Err(e.into());
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.render().as_bytes())?;
    stdout.flush()?;

    if !report.item_failures.is_empty() {
        warn!("{} item(s) skipped because of fetch errors", report.item_failures.len());
    }
    if !report.is_complete() {
        let dropped: Vec<&str> = report.section_failures.iter().map(|(s, _)| *s).collect();
        anyhow::bail!("incomplete poll, missing section(s): {}", dropped.join(", "));
    }

    Ok(())
}
