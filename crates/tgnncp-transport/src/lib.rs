mod error;
mod nncp;
mod process;

pub use error::{Result, TransportError};
pub use nncp::{NncpFile, TransportConfig, DEFAULT_BINARY, DEFAULT_TIMEOUT};

use async_trait::async_trait;

/// Hands one payload to the store-and-forward network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, payload: &[u8], destination: &str) -> Result<()>;
}
