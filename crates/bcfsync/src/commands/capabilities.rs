//! `capabilities`: what each controller advertises.

use futures_util::future::join_all;
use serde::Serialize;
use tabled::Tabled;

use bcfsync_api::{BcfClient, SessionState};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ControllerCapabilities {
    host: String,
    capabilities: Vec<String>,
    nat: bool,
}

#[derive(Tabled)]
struct CapabilitiesRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "NAT")]
    nat: String,
    #[tabled(rename = "Capabilities")]
    capabilities: String,
}

impl From<&ControllerCapabilities> for CapabilitiesRow {
    fn from(c: &ControllerCapabilities) -> Self {
        Self {
            host: c.host.clone(),
            nat: output::yes_no(c.nat),
            capabilities: c.capabilities.join(", "),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let clients = config::endpoints(&cfg, global)?
        .into_iter()
        .map(|(_, endpoint)| BcfClient::new(endpoint))
        .collect::<Result<Vec<_>, _>>()?;

    let results = join_all(clients.iter().map(|client| async move {
        let mut session = SessionState::default();
        client.get_capabilities(&mut session).await
    }))
    .await;

    let mut rows = Vec::with_capacity(results.len());
    for (client, result) in clients.iter().zip(results) {
        let caps = result?;
        rows.push(ControllerCapabilities {
            host: client.host().to_owned(),
            nat: caps.supports_nat(),
            capabilities: caps.0,
        });
    }

    let out = output::render_list(global.output, &rows, |c| CapabilitiesRow::from(c))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
