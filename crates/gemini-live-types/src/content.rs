use crate::Base64EncodedBytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of conversation content.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Content {
    /// The role of the turn author: "user" or "model"
    role: Role,

    /// The parts making up the turn
    parts: Vec<Part>,
}

impl Content {
    pub fn builder() -> ContentBuilder {
        ContentBuilder::new()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }
}

pub struct ContentBuilder {
    content: Content,
}

impl Default for ContentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self {
            content: Content {
                role: Role::User,
                parts: Vec::new(),
            },
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.content.parts.push(Part::text(text));
        self
    }

    pub fn build(self) -> Content {
        self.content
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Part {
    text: String,
}

impl Part {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }
}

/// A chunk of binary media sent as realtime input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Blob {
    /// ex: "image/jpeg", "audio/pcm"
    mime_type: String,

    data: Base64EncodedBytes,
}

impl Blob {
    pub fn new(mime_type: &str, data: Base64EncodedBytes) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}
