//! Notification channel command handlers.

use tabled::Tabled;

use kumly_core::{Notification, Session};

use crate::cli::{GlobalOpts, NotificationsArgs, NotificationsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Default")]
    default: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            name: n.name.clone(),
            provider: n.provider.clone(),
            active: util::yes_no(n.active),
            default: util::yes_no(n.is_default),
        }
    }
}

fn detail(n: &Notification) -> String {
    let mut keys: Vec<&String> = n.settings.keys().collect();
    keys.sort();
    let settings = keys
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    output::detail_lines(&[
        ("ID", n.id.to_string()),
        ("Name", n.name.clone()),
        ("Provider", n.provider.clone()),
        ("Active", util::yes_no(n.active)),
        ("Default", util::yes_no(n.is_default)),
        ("Settings", settings),
    ])
}

pub async fn handle(
    session: &Session,
    args: NotificationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ctx = util::call_context(global);

    match args.command {
        NotificationsCommand::List => {
            let notifications = session.cache().notifications();
            let out = output::render_list(
                &global.output,
                &notifications,
                |n| NotificationRow::from(n),
                |n| n.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NotificationsCommand::Get { id } => {
            let notification = session.cache().notification(id)?;
            let out =
                output::render_single(&global.output, &notification, detail, |n| n.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NotificationsCommand::Add { from_file } => {
            let notification: Notification =
                util::decode(util::read_json_file(&from_file)?, "notification")?;
            if notification.provider.is_empty() {
                return Err(CliError::Validation {
                    field: "notification".into(),
                    reason: "missing provider `type`".into(),
                });
            }
            let id = session.add_notification(&ctx, &notification).await?;
            util::notice(global, &format!("Notification created (id {id})"));
            Ok(())
        }

        NotificationsCommand::Delete { id } => {
            let notification = session.cache().notification(id)?;
            if !util::confirm(
                &format!("Delete notification '{}' ({id})?", notification.name),
                global,
                "notifications delete",
            )? {
                return Ok(());
            }
            session.delete_notification(&ctx, id).await?;
            util::notice(global, &format!("Notification {id} deleted"));
            Ok(())
        }
    }
}
