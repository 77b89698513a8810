//! Docker host command handlers.

use tabled::Tabled;

use kumly_core::{DockerHost, Session};

use crate::cli::{DockerHostsArgs, DockerHostsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DockerHostRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Daemon")]
    daemon: String,
}

impl From<&DockerHost> for DockerHostRow {
    fn from(h: &DockerHost) -> Self {
        Self {
            id: h.id,
            name: h.name.clone(),
            connection: h.docker_type.to_string(),
            daemon: h.docker_daemon.clone(),
        }
    }
}

pub async fn handle(
    session: &Session,
    args: DockerHostsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DockerHostsCommand::List => {
            let hosts = session.cache().docker_hosts();
            let out = output::render_list(&global.output, &hosts, |h| DockerHostRow::from(h), |h| {
                h.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DockerHostsCommand::Delete { id } => {
            let host = session.cache().docker_host(id)?;
            if !util::confirm(
                &format!("Delete Docker host '{}' ({id})?", host.name),
                global,
                "docker-hosts delete",
            )? {
                return Ok(());
            }
            session
                .delete_docker_host(&util::call_context(global), id)
                .await?;
            util::notice(global, &format!("Docker host {id} deleted"));
            Ok(())
        }
    }
}
