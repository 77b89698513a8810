//! Status page command handlers.

use tabled::Tabled;

use kumly_core::{Session, StatusPage};

use crate::cli::{GlobalOpts, StatusPagesArgs, StatusPagesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct StatusPageRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Published")]
    published: String,
}

impl From<&StatusPage> for StatusPageRow {
    fn from(p: &StatusPage) -> Self {
        Self {
            id: p.id,
            slug: p.slug.clone(),
            title: p.title.clone(),
            published: util::yes_no(p.published),
        }
    }
}

fn detail(p: &StatusPage) -> String {
    output::detail_lines(&[
        ("ID", p.id.to_string()),
        ("Slug", p.slug.clone()),
        ("Title", p.title.clone()),
        ("Description", p.description.clone().unwrap_or_default()),
        ("Published", util::yes_no(p.published)),
        ("Theme", p.theme.clone().unwrap_or_default()),
        ("Domains", p.domain_name_list.join(", ")),
    ])
}

/// Slugs the server accepts: lowercase letters, digits and dashes.
fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub async fn handle(
    session: &Session,
    args: StatusPagesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ctx = util::call_context(global);

    match args.command {
        StatusPagesCommand::List => {
            let pages = session.cache().status_pages();
            let out = output::render_list(
                &global.output,
                &pages,
                |p| StatusPageRow::from(p),
                |p| p.slug.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StatusPagesCommand::Get { slug } => {
            let page = session.get_status_page(&ctx, &slug).await?;
            let out = output::render_single(&global.output, &page, detail, |p| p.slug.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StatusPagesCommand::Add { title, slug } => {
            if !valid_slug(&slug) {
                return Err(CliError::Validation {
                    field: "slug".into(),
                    reason: format!("'{slug}' may only contain a-z, 0-9 and '-'"),
                });
            }
            let page = session.add_status_page(&ctx, &title, &slug).await?;
            util::notice(global, &format!("Status page '{}' created", page.slug));
            Ok(())
        }

        StatusPagesCommand::Delete { slug } => {
            session.cache().status_page(&slug)?;
            if !util::confirm(
                &format!("Delete status page '{slug}'?"),
                global,
                "status-pages delete",
            )? {
                return Ok(());
            }
            session.delete_status_page(&ctx, &slug).await?;
            util::notice(global, &format!("Status page '{slug}' deleted"));
            Ok(())
        }
    }
}
