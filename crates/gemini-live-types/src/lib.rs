//now people using the types library can use these types
pub mod content;
pub mod events;
pub mod setup;

//re-export types for easier access
pub use content::{Blob, Content, Part, Role};
pub use events::{ClientMessage, ServerMessage};
pub use setup::{GenerationConfig, Modality, Setup};

/// Media data encoded as base64
pub type Base64EncodedBytes = String;
