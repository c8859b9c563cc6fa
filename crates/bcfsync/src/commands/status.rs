//! `status`: reachability and mastership of every controller in the profile.

use futures_util::future::join_all;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct ControllerStatus {
    device: String,
    host: String,
    reachable: bool,
    master: bool,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Reachable")]
    reachable: String,
    #[tabled(rename = "Master")]
    master: String,
    #[tabled(rename = "Healthy")]
    healthy: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&ControllerStatus> for StatusRow {
    fn from(s: &ControllerStatus) -> Self {
        Self {
            device: s.device.clone(),
            host: s.host.clone(),
            reachable: output::yes_no(s.reachable),
            master: output::yes_no(s.master),
            healthy: output::yes_no(s.healthy),
            error: s.error.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let agents = util::agents(config::endpoints(&cfg, global)?, |_| String::new())?;

    let statuses = join_all(agents.into_iter().map(|(device, agent)| async move {
        let host = agent.host().to_owned();
        match agent.ping().await {
            Ok(status) => ControllerStatus {
                device,
                host,
                reachable: true,
                master: agent.session().await.is_master,
                healthy: status.status,
                error: None,
            },
            Err(e) => ControllerStatus {
                device,
                host,
                reachable: false,
                master: false,
                healthy: false,
                error: Some(e.to_string()),
            },
        }
    }))
    .await;

    let out = output::render_list(global.output, &statuses, |s| StatusRow::from(s))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
