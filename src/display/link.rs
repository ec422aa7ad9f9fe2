//! Display Link — trait-based abstraction over the command channel.
//!
//! The controller only ever talks to the display through `RemoteLink`, so
//! tests can swap in a recording link and the WebSocket details stay here.

use super::protocol::{CommandResponse, DisplayCommand};
use crate::error::LinkError;
use async_trait::async_trait;

/// Request/response channel to the Hime Display process.
///
/// Implementations connect lazily: `send` on a disconnected link makes one
/// connect attempt first and reports a failed attempt as an `Err`, never a
/// panic. Round-trips are serialized, so a response always belongs to the
/// command that produced it.
#[async_trait]
pub trait RemoteLink: Send + Sync {
    /// Establish the connection, consuming the display's greeting message.
    async fn connect(&self) -> Result<(), LinkError>;

    /// Send one command and wait for its acknowledgment.
    async fn send(&self, command: DisplayCommand) -> Result<CommandResponse, LinkError>;

    /// Whether the link currently holds an open connection.
    fn is_connected(&self) -> bool;

    /// Close the connection. Later sends reconnect.
    async fn close(&self) -> Result<(), LinkError>;
}
