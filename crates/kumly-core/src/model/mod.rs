// ── Domain model ──
//
// Typed records for every collection the server broadcasts. The cache and
// the session only rely on `Entity::id`; the rest is for consumers.

pub mod common;

pub mod docker_host;
pub mod heartbeat;
pub mod maintenance;
pub mod monitor;
pub mod notification;
pub mod proxy;
pub mod status_page;
pub mod tag;

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::Entity;
pub use docker_host::{DockerConnection, DockerHost};
pub use heartbeat::{Heartbeat, HeartbeatStatus, ServerInfo};
pub use maintenance::Maintenance;
pub use monitor::{Monitor, MonitorKind, MonitorTag};
pub use notification::Notification;
pub use proxy::Proxy;
pub use status_page::{PublicGroup, PublicMonitor, StatusPage};
pub use tag::Tag;
