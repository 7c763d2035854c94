use crate::rendezvous::WaitOutcome;
use crate::types::{Modality, ServerMessage};
use native_utils::media::decode_base64;

/// An inbound frame after parsing.
///
/// Frames that are not a JSON object are kept as `RawText` instead of being
/// dropped, so the caller still sees what the server said.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFrame {
    Structured(ServerMessage),
    RawText(String),
}

impl ParsedFrame {
    pub fn parse(payload: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(payload) {
            Ok(value @ serde_json::Value::Object(_)) => {
                match serde_json::from_value::<ServerMessage>(value) {
                    Ok(message) => ParsedFrame::Structured(message),
                    Err(e) => {
                        tracing::warn!("failed to deserialize server message: {}", e);
                        ParsedFrame::RawText(String::from_utf8_lossy(payload).into_owned())
                    }
                }
            }
            Ok(_) => ParsedFrame::RawText(String::from_utf8_lossy(payload).into_owned()),
            Err(e) => {
                tracing::warn!("received non-JSON payload: {}", e);
                ParsedFrame::RawText(String::from_utf8_lossy(payload).into_owned())
            }
        }
    }

    pub fn is_setup_complete(&self) -> bool {
        matches!(self, ParsedFrame::Structured(message) if message.is_setup_complete())
    }

    pub fn is_turn_complete(&self) -> bool {
        matches!(self, ParsedFrame::Structured(message) if message.is_turn_complete())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// One piece of a model response that satisfied the session's modality policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Media(MediaChunk),
}

/// When the reader releases a waiting turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReleasePolicy {
    /// Release on the first fragment that matches a response modality.
    #[default]
    FirstFragment,
    /// Gather streamed fragments and release when the server marks the turn complete.
    TurnComplete,
}

/// Decides which parts of an inbound frame count as response fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePolicy {
    text: bool,
    media: bool,
    release: ReleasePolicy,
}

impl ResponsePolicy {
    pub fn new(modalities: &[Modality], release: ReleasePolicy) -> Self {
        Self {
            text: modalities.is_empty() || modalities.contains(&Modality::Text),
            media: modalities.contains(&Modality::Audio),
            release,
        }
    }

    pub fn accepts_text(&self) -> bool {
        self.text
    }

    pub fn accepts_media(&self) -> bool {
        self.media
    }

    /// Extracts the fragments this policy cares about. Media payloads that fail
    /// base64 decoding are logged and skipped.
    pub fn fragments(&self, frame: &ParsedFrame) -> Vec<Fragment> {
        match frame {
            ParsedFrame::RawText(text) if self.text => vec![Fragment::Text(text.clone())],
            ParsedFrame::RawText(_) => Vec::new(),
            ParsedFrame::Structured(message) => message
                .parts()
                .iter()
                .filter_map(|part| {
                    if let (true, Some(text)) = (self.text, part.text.as_ref()) {
                        return Some(Fragment::Text(text.clone()));
                    }
                    let inline = part.inline_data.as_ref().filter(|_| self.media)?;
                    match decode_base64(&inline.data) {
                        Ok(data) => Some(Fragment::Media(MediaChunk {
                            mime_type: inline.mime_type.clone(),
                            data,
                        })),
                        Err(e) => {
                            tracing::error!("failed to decode inline data: {}", e);
                            None
                        }
                    }
                })
                .collect(),
        }
    }

    /// Whether this frame should release the waiting turn once its fragments are stored.
    pub fn releases(&self, frame: &ParsedFrame, fragments: &[Fragment]) -> bool {
        match self.release {
            ReleasePolicy::FirstFragment => !fragments.is_empty(),
            ReleasePolicy::TurnComplete => {
                frame.is_turn_complete()
                    || (matches!(frame, ParsedFrame::RawText(_)) && !fragments.is_empty())
            }
        }
    }
}

/// What a caller gets back from waiting on a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    outcome: WaitOutcome,
    fragments: Vec<Fragment>,
}

impl Response {
    pub fn new(outcome: WaitOutcome, fragments: Vec<Fragment>) -> Self {
        Self { outcome, fragments }
    }

    pub fn outcome(&self) -> WaitOutcome {
        self.outcome
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_timeout(&self) -> bool {
        self.outcome == WaitOutcome::TimedOut
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All text fragments joined in arrival order.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .filter_map(|fragment| match fragment {
                Fragment::Text(text) => Some(text.as_str()),
                Fragment::Media(_) => None,
            })
            .collect()
    }

    /// Total bytes of media received for this turn.
    pub fn media_len(&self) -> usize {
        self.fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Media(chunk) => chunk.data.len(),
                Fragment::Text(_) => 0,
            })
            .sum()
    }
}
