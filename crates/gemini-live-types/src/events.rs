pub mod client;
pub mod server;

pub use client::{ClientContent, ClientMessage, RealtimeInput};
pub use server::{InlineData, ModelTurn, ServerContent, ServerMessage, ServerPart, SetupComplete};
