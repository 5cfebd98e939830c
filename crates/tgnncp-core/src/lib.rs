mod address;
mod message;

pub use address::*;
pub use message::*;
