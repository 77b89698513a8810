//! Tag command handlers.

use tabled::Tabled;

use kumly_core::{Session, Tag};

use crate::cli::{GlobalOpts, TagsArgs, TagsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Monitors")]
    monitors: usize,
}

pub async fn handle(session: &Session, args: TagsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = util::call_context(global);

    match args.command {
        TagsCommand::List => {
            // Tags are not pushed on login; fetch them.
            let tags = session.get_tags(&ctx).await?;
            let monitors = session.cache().monitors();
            let out = output::render_list(
                &global.output,
                &tags,
                |t| TagRow {
                    id: t.id,
                    name: t.name.clone(),
                    color: t.color.clone(),
                    monitors: monitors.iter().filter(|m| m.has_tag(t.id)).count(),
                },
                |t| t.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TagsCommand::Add { name, color } => {
            let tag = session.add_tag(&ctx, &Tag::new(name, color)).await?;
            util::notice(global, &format!("Tag '{}' created (id {})", tag.name, tag.id));
            Ok(())
        }

        TagsCommand::Delete { id } => {
            let tag = session
                .get_tags(&ctx)
                .await?
                .into_iter()
                .find(|t| t.id == id)
                .ok_or_else(|| CliError::not_found("tag", id, "tags list"))?;
            if !util::confirm(
                &format!("Delete tag '{}' from every monitor?", tag.name),
                global,
                "tags delete",
            )? {
                return Ok(());
            }
            session.delete_tag(&ctx, id).await?;
            util::notice(global, &format!("Tag {id} deleted"));
            Ok(())
        }

        TagsCommand::Attach {
            tag,
            monitor,
            value,
        } => {
            session.add_monitor_tag(&ctx, tag, monitor, &value).await?;
            util::notice(global, &format!("Tag {tag} attached to monitor {monitor}"));
            Ok(())
        }

        TagsCommand::Detach {
            tag,
            monitor,
            value,
        } => {
            session
                .delete_monitor_tag(&ctx, tag, monitor, &value)
                .await?;
            util::notice(global, &format!("Tag {tag} detached from monitor {monitor}"));
            Ok(())
        }
    }
}
