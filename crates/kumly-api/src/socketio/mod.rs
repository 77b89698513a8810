// Socket.IO v5 / Engine.IO v4 WebSocket transport.

mod client;
pub mod packet;

pub use client::{SocketIoClient, socket_url};
pub use packet::{EnginePacket, OpenPayload, SocketPacket};
