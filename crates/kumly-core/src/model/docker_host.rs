use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::common::{Entity, is_zero};

/// How the server reaches the Docker daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DockerConnection {
    Socket,
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerHost {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    pub name: String,
    /// Socket path or `tcp://host:port`.
    #[serde(rename = "dockerDaemon")]
    pub docker_daemon: String,
    #[serde(rename = "dockerType")]
    pub docker_type: DockerConnection,
}

impl DockerHost {
    pub fn new(name: impl Into<String>, daemon: impl Into<String>, docker_type: DockerConnection) -> Self {
        Self {
            id: 0,
            name: name.into(),
            docker_daemon: daemon.into(),
            docker_type,
        }
    }
}

impl Entity for DockerHost {
    fn id(&self) -> i64 {
        self.id
    }
}
