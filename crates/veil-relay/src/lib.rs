pub mod dispatcher;
pub mod transport;

pub use dispatcher::RelayDispatcher;
pub use transport::{ChatTransport, MessageRef, TransportError};
