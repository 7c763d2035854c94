mod client;
mod error;
pub mod rendezvous;
pub mod response;

pub use gemini_live_types as types;
pub use client::{Backend, Config, ConfigBuilder, Session, Turn, connect_with_config};
pub use error::{ConnectError, SendError};
pub use rendezvous::{Rendezvous, WaitOutcome};
pub use response::{Fragment, MediaChunk, ParsedFrame, ReleasePolicy, Response};
