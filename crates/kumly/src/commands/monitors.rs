//! Monitor command handlers.

use serde_json::Value;
use tabled::Tabled;

use kumly_core::{Heartbeat, Monitor, MonitorKind, Session};

use crate::cli::{GlobalOpts, MonitorsArgs, MonitorsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct MonitorRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

#[derive(Tabled)]
struct HeartbeatRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ping")]
    ping: String,
    #[tabled(rename = "Message")]
    msg: String,
}

fn monitor_row(session: &Session, monitor: &Monitor, color: bool) -> MonitorRow {
    let status = session
        .cache()
        .latest_heartbeat(monitor.id)
        .map(|beat| beat.status);
    MonitorRow {
        id: monitor.id,
        name: monitor.name.clone(),
        kind: monitor.kind.to_string(),
        target: monitor.target().unwrap_or_default(),
        status: if monitor.active {
            output::status_label(status, color)
        } else {
            "paused".into()
        },
        active: util::yes_no(monitor.active),
        tags: tag_list(monitor),
    }
}

fn heartbeat_row(beat: &Heartbeat, color: bool) -> HeartbeatRow {
    HeartbeatRow {
        time: beat.time.clone(),
        status: output::status_label(Some(beat.status), color),
        ping: beat.ping.map(|ms| format!("{ms:.0} ms")).unwrap_or_default(),
        msg: beat.msg.clone(),
    }
}

fn tag_list(monitor: &Monitor) -> String {
    monitor
        .tags
        .iter()
        .map(|t| match t.value.as_deref() {
            Some(value) if !value.is_empty() => format!("{}:{value}", t.name),
            _ => t.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn detail(session: &Session, monitor: &Monitor, color: bool) -> String {
    let status = session
        .cache()
        .latest_heartbeat(monitor.id)
        .map(|beat| beat.status);
    output::detail_lines(&[
        ("ID", monitor.id.to_string()),
        ("Name", monitor.name.clone()),
        ("Type", monitor.kind.to_string()),
        ("Target", monitor.target().unwrap_or_default()),
        ("Status", output::status_label(status, color)),
        ("Active", util::yes_no(monitor.active)),
        ("Interval", format!("{}s", monitor.interval)),
        ("Retries", monitor.max_retries.to_string()),
        (
            "Description",
            monitor.description.clone().unwrap_or_default(),
        ),
        ("Tags", tag_list(monitor)),
    ])
}

/// Whether `filter` names one of the monitor's tags, by name or id.
fn has_tag(monitor: &Monitor, filter: &str) -> bool {
    monitor
        .tags
        .iter()
        .any(|t| t.name.eq_ignore_ascii_case(filter) || t.tag_id.to_string() == filter)
}

/// Overlay `patch` onto the monitor's current fields.
fn merge(current: &Monitor, patch: Value) -> Result<Monitor, CliError> {
    let Value::Object(patch) = patch else {
        return Err(CliError::Validation {
            field: "from-file".into(),
            reason: "expected a JSON object".into(),
        });
    };
    let mut base = serde_json::to_value(current)?;
    if let Value::Object(ref mut fields) = base {
        fields.extend(patch);
    }
    let mut monitor: Monitor = util::decode(base, "monitor")?;
    monitor.id = current.id;
    Ok(monitor)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: MonitorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let ctx = util::call_context(global);

    match args.command {
        MonitorsCommand::List { tag } => {
            let mut monitors = session.cache().monitors();
            if let Some(ref filter) = tag {
                monitors.retain(|m| has_tag(m, filter));
            }
            let out = output::render_list(
                &global.output,
                &monitors,
                |m| monitor_row(session, m, color),
                |m| m.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MonitorsCommand::Get { id } => {
            let monitor = session.cache().monitor(id)?;
            let out = output::render_single(
                &global.output,
                &monitor,
                |m| detail(session, m, color),
                |m| m.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MonitorsCommand::Add {
            name,
            url,
            interval,
            from_file,
        } => {
            let mut monitor = match (from_file, url) {
                (Some(path), _) => util::decode(util::read_json_file(&path)?, "monitor")?,
                (None, Some(url)) => {
                    let name = name.unwrap_or_else(|| url.clone());
                    Monitor::new(name, MonitorKind::http(url))
                }
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "url".into(),
                        reason: "pass --url or --from-file".into(),
                    });
                }
            };
            if let Some(interval) = interval {
                monitor.interval = interval;
            }
            let id = session.add_monitor(&ctx, &monitor).await?;
            util::notice(global, &format!("Monitor created (id {id})"));
            let created = session.cache().monitor(id)?;
            let out = output::render_single(
                &global.output,
                &created,
                |m| detail(session, m, color),
                |m| m.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MonitorsCommand::Edit { id, from_file } => {
            let current = session.cache().monitor(id)?;
            let monitor = merge(&current, util::read_json_file(&from_file)?)?;
            session.edit_monitor(&ctx, &monitor).await?;
            util::notice(global, &format!("Monitor {id} updated"));
            Ok(())
        }

        MonitorsCommand::Delete { id } => {
            let monitor = session.cache().monitor(id)?;
            if !util::confirm(
                &format!("Delete monitor '{}' ({id}) and its history?", monitor.name),
                global,
                "monitors delete",
            )? {
                return Ok(());
            }
            session.delete_monitor(&ctx, id).await?;
            util::notice(global, &format!("Monitor {id} deleted"));
            Ok(())
        }

        MonitorsCommand::Pause { id } => {
            session.pause_monitor(&ctx, id).await?;
            util::notice(global, &format!("Monitor {id} paused"));
            Ok(())
        }

        MonitorsCommand::Resume { id } => {
            session.resume_monitor(&ctx, id).await?;
            util::notice(global, &format!("Monitor {id} resumed"));
            Ok(())
        }

        MonitorsCommand::Heartbeats { id, limit } => {
            // Fails with not-found for unknown ids rather than printing nothing.
            session.cache().monitor(id)?;
            let beats: Vec<Heartbeat> = session
                .cache()
                .heartbeats(id)
                .into_iter()
                .rev()
                .take(limit)
                .collect();
            let out = output::render_list(
                &global.output,
                &beats,
                |b| heartbeat_row(b, color),
                |b| b.status.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
