// kumly-core: Session, state cache and update-coupled commands for Uptime Kuma.

pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
mod readiness;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bus::{CacheUpdate, EventBus, Subscription, UpdateKind};
pub use cache::StateCache;
pub use config::{AuthCredentials, DEFAULT_REQUIRED_SNAPSHOTS, SessionConfig, TlsVerification};
pub use error::CoreError;
pub use session::{ConnectionState, Session, UpdateMatch};

// The call context is part of every blocking signature.
pub use kumly_api::{CallContext, DoneReason, Response};

pub use model::{
    DockerConnection, DockerHost, Entity, Heartbeat, HeartbeatStatus, Maintenance, Monitor,
    MonitorKind, MonitorTag, Notification, Proxy, PublicGroup, PublicMonitor, ServerInfo,
    StatusPage, Tag,
};
