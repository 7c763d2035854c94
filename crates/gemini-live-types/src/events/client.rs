use crate::content::{Blob, Content};
use crate::setup::Setup;

/// Every frame the client writes to the live socket.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    /// `setup` message, always the first frame of a session
    Setup(Setup),
    /// `client_content` message carrying complete conversation turns
    ClientContent(ClientContent),
    /// `realtime_input` message carrying media chunks
    RealtimeInput(RealtimeInput),
}

impl ClientMessage {
    /// A single user text turn that asks the model to respond.
    pub fn user_text(text: &str) -> Self {
        Self::ClientContent(ClientContent::new(vec![
            Content::builder().with_text(text).build(),
        ]))
    }

    /// A single media chunk; `data` is already base64 encoded.
    pub fn media(mime_type: &str, data: String) -> Self {
        Self::RealtimeInput(RealtimeInput::new(vec![Blob::new(mime_type, data)]))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClientContent {
    turns: Vec<Content>,

    /// Tells the server the turn is over and generation should start
    turn_complete: bool,
}

impl ClientContent {
    pub fn new(turns: Vec<Content>) -> Self {
        Self {
            turns,
            turn_complete: true,
        }
    }

    pub fn turns(&self) -> &[Content] {
        &self.turns
    }

    pub fn turn_complete(&self) -> bool {
        self.turn_complete
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RealtimeInput {
    media_chunks: Vec<Blob>,
}

impl RealtimeInput {
    pub fn new(media_chunks: Vec<Blob>) -> Self {
        Self { media_chunks }
    }

    pub fn media_chunks(&self) -> &[Blob] {
        &self.media_chunks
    }
}
