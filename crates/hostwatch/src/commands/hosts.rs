//! Host command handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use hostwatch_core::view;
use hostwatch_core::{HostId, HostRecord, HostRegistration, StateController, StatusFilter};

use crate::cli::{GlobalOpts, HostsArgs, HostsCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct HostRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Response")]
    response: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl HostRow {
    pub(crate) fn new(host: &Arc<HostRecord>, now: DateTime<Utc>) -> Self {
        Self {
            id: host.id.get(),
            hostname: host.hostname.clone(),
            ip: host.ip_address.clone(),
            mac: host.mac_address.clone(),
            status: host.status.to_string(),
            response: view::format_response_time(host.response_time_ms),
            last_seen: view::format_last_seen(host.last_seen, now),
        }
    }
}

fn detail(host: &Arc<HostRecord>, color: bool, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("ID:        {}", host.id),
        format!("Hostname:  {}", host.hostname),
        format!("IP:        {}", host.ip_address),
        format!("MAC:       {}", host.mac_address),
        format!("Status:    {}", output::paint_status(host.status, color)),
        format!(
            "Response:  {}",
            view::format_response_time(host.response_time_ms)
        ),
        format!("Last Seen: {}", view::format_last_seen(host.last_seen, now)),
    ];
    if !host.metadata.is_empty() {
        lines.push(format!(
            "Metadata:  {}",
            serde_json::Value::Object(host.metadata.clone())
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &StateController,
    args: HostsArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        HostsCommand::List { status } => {
            controller.load_snapshot(StatusFilter::from(status)).await?;
            let hosts = controller.hosts_snapshot();
            let now = Utc::now();
            let out = output::render_list(
                session.output,
                hosts.as_slice(),
                |h| HostRow::new(h, now),
                |h| h.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HostsCommand::Delete { id } => {
            let id = HostId::new(id);
            if !util::confirm(
                &format!("Delete host {id} from the registry?"),
                "hosts delete",
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_host(id).await?;
            if !global.quiet {
                eprintln!("Host {id} deleted");
            }
            Ok(())
        }

        HostsCommand::Register {
            ip,
            hostname,
            mac,
            metadata,
        } => {
            let metadata = metadata.as_deref().map(util::parse_metadata).transpose()?;
            let host = controller
                .register_host(HostRegistration {
                    ip_address: ip,
                    hostname,
                    mac_address: mac,
                    metadata,
                })
                .await?;
            let color = output::should_color(session.color);
            let now = Utc::now();
            let out = output::render_single(
                session.output,
                &host,
                |h| detail(h, color, now),
                |h| h.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
