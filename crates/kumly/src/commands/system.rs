//! Server info handler.

use serde::Serialize;

use kumly_core::{ServerInfo, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct InfoView {
    url: String,
    #[serde(flatten)]
    info: ServerInfo,
    monitors: usize,
    two_factor: bool,
}

fn detail(v: &InfoView) -> String {
    let version = match (&v.info.version, &v.info.latest_version) {
        (Some(current), Some(latest)) if current != latest => {
            format!("{current} (latest {latest})")
        }
        (Some(current), _) => current.clone(),
        (None, _) => "unknown".into(),
    };
    output::detail_lines(&[
        ("Server", v.url.clone()),
        ("Version", version),
        ("Timezone", v.info.server_timezone.clone().unwrap_or_default()),
        ("Base URL", v.info.primary_base_url.clone().unwrap_or_default()),
        ("Monitors", v.monitors.to_string()),
        ("2FA", if v.two_factor { "enabled" } else { "disabled" }.into()),
    ])
}

pub async fn info(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let two_factor = session.two_factor_status(&util::call_context(global)).await?;
    let view = InfoView {
        url: session.config().url.to_string(),
        info: session.cache().server_info().unwrap_or_default(),
        monitors: session.cache().monitor_count(),
        two_factor,
    };
    let out = output::render_single(&global.output, &view, detail, |v| {
        v.info.version.clone().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
