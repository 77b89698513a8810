//! Maintenance window command handlers.

use serde::Serialize;
use tabled::Tabled;

use kumly_core::{Maintenance, Session};

use crate::cli::{GlobalOpts, MaintenancesArgs, MaintenancesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct MaintenanceRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&Maintenance> for MaintenanceRow {
    fn from(m: &Maintenance) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            strategy: m.strategy.clone(),
            status: m.status.clone().unwrap_or_default(),
            active: util::yes_no(m.active),
        }
    }
}

/// A window together with the monitors it covers.
#[derive(Serialize)]
struct MaintenanceDetail {
    #[serde(flatten)]
    maintenance: Maintenance,
    monitors: Vec<i64>,
}

fn detail(d: &MaintenanceDetail) -> String {
    let m = &d.maintenance;
    let monitors = d
        .monitors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    output::detail_lines(&[
        ("ID", m.id.to_string()),
        ("Title", m.title.clone()),
        ("Description", m.description.clone()),
        ("Strategy", m.strategy.clone()),
        ("Status", m.status.clone().unwrap_or_default()),
        ("Active", util::yes_no(m.active)),
        ("Monitors", monitors),
    ])
}

pub async fn handle(
    session: &Session,
    args: MaintenancesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ctx = util::call_context(global);

    match args.command {
        MaintenancesCommand::List => {
            let windows = session.cache().maintenances();
            let out = output::render_list(
                &global.output,
                &windows,
                |m| MaintenanceRow::from(m),
                |m| m.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MaintenancesCommand::Get { id } => {
            let maintenance = session.get_maintenance(&ctx, id).await?;
            let monitors = session.monitor_maintenance(&ctx, id).await?;
            let view = MaintenanceDetail {
                maintenance,
                monitors,
            };
            let out = output::render_single(&global.output, &view, detail, |d| {
                d.maintenance.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MaintenancesCommand::Add { title, monitors } => {
            let id = session
                .add_maintenance(&ctx, &Maintenance::manual(title))
                .await?;
            if !monitors.is_empty() {
                session.set_monitor_maintenance(&ctx, id, &monitors).await?;
            }
            util::notice(global, &format!("Maintenance created (id {id})"));
            Ok(())
        }

        MaintenancesCommand::Pause { id } => {
            session.pause_maintenance(&ctx, id).await?;
            util::notice(global, &format!("Maintenance {id} paused"));
            Ok(())
        }

        MaintenancesCommand::Resume { id } => {
            session.resume_maintenance(&ctx, id).await?;
            util::notice(global, &format!("Maintenance {id} resumed"));
            Ok(())
        }

        MaintenancesCommand::Delete { id } => {
            let maintenance = session.cache().maintenance(id)?;
            if !util::confirm(
                &format!("Delete maintenance '{}' ({id})?", maintenance.title),
                global,
                "maintenances delete",
            )? {
                return Ok(());
            }
            session.delete_maintenance(&ctx, id).await?;
            util::notice(global, &format!("Maintenance {id} deleted"));
            Ok(())
        }
    }
}
