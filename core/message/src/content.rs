//! Content part types for multi-modal message content.

use serde::Deserialize;
use serde::Serialize;

/// One piece of a multi-part message body.
///
/// A message's content is either a plain string or an ordered sequence of
/// these tagged parts, matching the shapes a model provider actually
/// accepts in a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// An image referenced by URL or data URI.
    ImageUrl {
        /// The image URL (may be a `data:` URI).
        url: String,
        /// Optional rendering detail hint.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// An attached file.
    File {
        /// Identifier for a previously uploaded file.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        /// Display filename.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        /// Base64-encoded file data.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_data: Option<String>,
    },
    /// Embedded audio input.
    InputAudio {
        /// Base64-encoded audio data.
        data: String,
        /// Audio encoding, e.g. `"wav"`.
        format: String,
    },
    /// Embedded video input.
    InputVideo {
        /// Base64-encoded video data.
        data: String,
        /// Video encoding, e.g. `"mp4"`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Extract the text of this part, if it is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A message's content: either a plain string or a sequence of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// A single string, the common case for text-only messages.
    Text(String),
    /// An ordered sequence of content parts.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Build a text content value.
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text(text.into())
    }

    /// Whether this content carries no text and no parts.
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(s) => s.is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }

    /// Approximate character length, used for cheap token estimation.
    pub fn char_len(&self) -> usize {
        match self {
            MessageContent::Text(s) => s.len(),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => text.len(),
                    ContentPart::File { file_data, .. } => {
                        file_data.as_ref().map_or(0, String::len)
                    }
                    _ => 0,
                })
                .sum(),
        }
    }

    /// Render this content as a plain string, concatenating text parts.
    pub fn to_plain_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(ContentPart::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

#[cfg(test)]
#[path = "content.test.rs"]
mod tests;
