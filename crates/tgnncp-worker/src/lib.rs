mod error;
mod events;
mod submit;
mod worker;

pub use error::WorkerError;
pub use events::{RelayEvent, TickReport};
pub use submit::Submitter;
pub use worker::{DEFAULT_INTERVAL, RelayConfig, RelayWorker};

pub use tgnncp_core::{Message, MessageStatus, NewMessage};
pub use tgnncp_db::QueueDb;
pub use tgnncp_transport::{NncpFile, Transport, TransportConfig};
