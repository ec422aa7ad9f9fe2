pub mod link;
pub mod protocol;
pub mod websocket;

pub use link::RemoteLink;
pub use protocol::{CommandResponse, DisplayCommand, ParameterValue};
pub use websocket::WebSocketLink;
