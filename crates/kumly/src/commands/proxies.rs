//! Proxy command handlers.

use tabled::Tabled;

use kumly_core::{Proxy, Session};

use crate::cli::{GlobalOpts, ProxiesArgs, ProxiesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ProxyRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Default")]
    default: String,
}

impl From<&Proxy> for ProxyRow {
    fn from(p: &Proxy) -> Self {
        Self {
            id: p.id,
            address: p.address(),
            auth: util::yes_no(p.auth),
            default: util::yes_no(p.default),
        }
    }
}

pub async fn handle(
    session: &Session,
    args: ProxiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ctx = util::call_context(global);

    match args.command {
        ProxiesCommand::List => {
            let proxies = session.cache().proxies();
            let out = output::render_list(&global.output, &proxies, |p| ProxyRow::from(p), |p| {
                p.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProxiesCommand::Add {
            protocol,
            host,
            port,
        } => {
            let id = session
                .add_proxy(&ctx, &Proxy::new(protocol, host, port))
                .await?;
            util::notice(global, &format!("Proxy created (id {id})"));
            Ok(())
        }

        ProxiesCommand::Delete { id } => {
            let proxy = session.cache().proxy(id)?;
            if !util::confirm(
                &format!("Delete proxy {} ({id})?", proxy.address()),
                global,
                "proxies delete",
            )? {
                return Ok(());
            }
            session.delete_proxy(&ctx, id).await?;
            util::notice(global, &format!("Proxy {id} deleted"));
            Ok(())
        }
    }
}
