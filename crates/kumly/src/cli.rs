//! Clap derive structures for the `kumly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kumly -- command-line client for Uptime Kuma
#[derive(Debug, Parser)]
#[command(
    name = "kumly",
    version,
    about = "Manage Uptime Kuma monitors from the command line",
    long_about = "Talks to an Uptime Kuma server over its Socket.IO interface.\n\n\
        Every command logs in, waits for the server's initial state push,\n\
        runs against that state, then disconnects.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "KUMLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'u', env = "KUMLY_URL", global = true)]
    pub url: Option<String>,

    /// Login username (overrides profile)
    #[arg(long, env = "KUMLY_USERNAME", global = true, hide_env = true)]
    pub username: Option<String>,

    /// Login password (overrides profile)
    #[arg(long, env = "KUMLY_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Login token from an earlier session (overrides profile)
    #[arg(long, env = "KUMLY_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KUMLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "KUMLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Connect and request timeout in seconds
    #[arg(long, env = "KUMLY_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage monitors
    #[command(alias = "mon", alias = "m")]
    Monitors(MonitorsArgs),

    /// Manage notification channels
    #[command(alias = "notif")]
    Notifications(NotificationsArgs),

    /// Manage outbound proxies
    Proxies(ProxiesArgs),

    /// Manage Docker hosts
    DockerHosts(DockerHostsArgs),

    /// Manage maintenance windows
    #[command(alias = "maint")]
    Maintenances(MaintenancesArgs),

    /// Manage status pages
    #[command(alias = "sp")]
    StatusPages(StatusPagesArgs),

    /// Manage tags and monitor tag associations
    Tags(TagsArgs),

    /// Show server version and settings
    Info,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Monitors ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MonitorsArgs {
    #[command(subcommand)]
    pub command: MonitorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MonitorsCommand {
    /// List monitors with their latest status
    #[command(alias = "ls")]
    List {
        /// Only monitors carrying this tag (name or id)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show a single monitor
    Get {
        /// Monitor id
        id: i64,
    },

    /// Create a monitor
    #[command(group = clap::ArgGroup::new("source").required(true).args(["url", "from_file"]))]
    Add {
        /// Display name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,

        /// URL to check with an HTTP monitor
        #[arg(long)]
        url: Option<String>,

        /// Check interval in seconds
        #[arg(long)]
        interval: Option<u32>,

        /// Full monitor definition as JSON
        #[arg(long, conflicts_with_all = ["name", "url"])]
        from_file: Option<PathBuf>,
    },

    /// Update a monitor from a JSON definition
    Edit {
        /// Monitor id
        id: i64,

        /// Fields to change, as JSON
        #[arg(long)]
        from_file: PathBuf,
    },

    /// Delete a monitor
    #[command(alias = "rm")]
    Delete {
        /// Monitor id
        id: i64,
    },

    /// Stop checking a monitor
    Pause {
        /// Monitor id
        id: i64,
    },

    /// Resume checking a paused monitor
    Resume {
        /// Monitor id
        id: i64,
    },

    /// Show recent heartbeats for a monitor
    Heartbeats {
        /// Monitor id
        id: i64,

        /// Max heartbeats to show (newest first)
        #[arg(long, short = 'l', default_value = "20")]
        limit: usize,
    },
}

// ── Notifications ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// List notification channels
    #[command(alias = "ls")]
    List,

    /// Show a notification channel
    Get {
        /// Notification id
        id: i64,
    },

    /// Create a notification channel from a JSON definition
    Add {
        /// Channel definition as JSON (name, type and provider settings)
        #[arg(long)]
        from_file: PathBuf,
    },

    /// Delete a notification channel
    #[command(alias = "rm")]
    Delete {
        /// Notification id
        id: i64,
    },
}

// ── Proxies ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProxiesArgs {
    #[command(subcommand)]
    pub command: ProxiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProxiesCommand {
    /// List proxies
    #[command(alias = "ls")]
    List,

    /// Create a proxy
    Add {
        /// Proxy protocol (http, https, socks, socks5, socks5h, socks4)
        #[arg(long, default_value = "http")]
        protocol: String,

        /// Proxy host
        #[arg(long)]
        host: String,

        /// Proxy port
        #[arg(long)]
        port: u16,
    },

    /// Delete a proxy
    #[command(alias = "rm")]
    Delete {
        /// Proxy id
        id: i64,
    },
}

// ── Docker hosts ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DockerHostsArgs {
    #[command(subcommand)]
    pub command: DockerHostsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DockerHostsCommand {
    /// List Docker hosts
    #[command(alias = "ls")]
    List,

    /// Delete a Docker host
    #[command(alias = "rm")]
    Delete {
        /// Docker host id
        id: i64,
    },
}

// ── Maintenances ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MaintenancesArgs {
    #[command(subcommand)]
    pub command: MaintenancesCommand,
}

#[derive(Debug, Subcommand)]
pub enum MaintenancesCommand {
    /// List maintenance windows
    #[command(alias = "ls")]
    List,

    /// Show a maintenance window and its monitors
    Get {
        /// Maintenance id
        id: i64,
    },

    /// Create a manually toggled maintenance window
    Add {
        /// Window title
        #[arg(long)]
        title: String,

        /// Monitors covered by the window
        #[arg(long = "monitor", value_delimiter = ',')]
        monitors: Vec<i64>,
    },

    /// Deactivate a maintenance window
    Pause {
        /// Maintenance id
        id: i64,
    },

    /// Reactivate a maintenance window
    Resume {
        /// Maintenance id
        id: i64,
    },

    /// Delete a maintenance window
    #[command(alias = "rm")]
    Delete {
        /// Maintenance id
        id: i64,
    },
}

// ── Status pages ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusPagesArgs {
    #[command(subcommand)]
    pub command: StatusPagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatusPagesCommand {
    /// List status pages
    #[command(alias = "ls")]
    List,

    /// Show a status page
    Get {
        /// Page slug
        slug: String,
    },

    /// Create a status page
    Add {
        /// Page title
        #[arg(long)]
        title: String,

        /// URL slug (lowercase letters, digits and dashes)
        #[arg(long)]
        slug: String,
    },

    /// Delete a status page
    #[command(alias = "rm")]
    Delete {
        /// Page slug
        slug: String,
    },
}

// ── Tags ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List tags
    #[command(alias = "ls")]
    List,

    /// Create a tag
    Add {
        /// Tag name
        #[arg(long)]
        name: String,

        /// CSS colour
        #[arg(long, default_value = "#4B5563")]
        color: String,
    },

    /// Delete a tag (removes it from every monitor)
    #[command(alias = "rm")]
    Delete {
        /// Tag id
        id: i64,
    },

    /// Attach a tag to a monitor
    Attach {
        /// Tag id
        tag: i64,

        /// Monitor id
        monitor: i64,

        /// Optional value shown next to the tag
        #[arg(long, default_value = "")]
        value: String,
    },

    /// Detach a tag from a monitor
    Detach {
        /// Tag id
        tag: i64,

        /// Monitor id
        monitor: i64,

        /// Value of the association to remove
        #[arg(long, default_value = "")]
        value: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup for a server profile
    Init,

    /// Show the resolved configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Key, e.g. `url`, `username`, `auth_mode`, `insecure`, `timeout`
        key: String,

        /// New value
        value: String,
    },

    /// List profiles
    Profiles,

    /// Switch the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the profile password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
