use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::embeds::{MessageTemplate, ModalTemplate};

/// Address of a previously sent message, persisted in marker slots as
/// `channel_id:message_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

impl MessageRef {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self { channel_id: channel_id.into(), message_id: message_id.into() }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (channel_id, message_id) = raw.split_once(':')?;
        if channel_id.is_empty() || message_id.is_empty() {
            return None;
        }
        Some(Self::new(channel_id, message_id))
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_id, self.message_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryMessage {
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivateChannelRequest {
    pub name: String,
    pub requester_user_id: String,
    pub visible_roles: Vec<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("platform object not found: {0}")]
    NotFound(String),
    #[error("platform call failed: {0}")]
    Unavailable(String),
}

/// The external chat platform's client surface, kept behind a trait so every
/// flow runs (and tests) without a live connection.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<MessageRef, ApiError>;

    /// Fails with `NotFound` when the referenced message no longer resolves.
    async fn edit_message(
        &self,
        reference: &MessageRef,
        message: &MessageTemplate,
    ) -> Result<(), ApiError>;

    async fn open_modal(&self, interaction_id: &str, modal: &ModalTemplate)
        -> Result<(), ApiError>;

    async fn create_private_channel(
        &self,
        request: &PrivateChannelRequest,
    ) -> Result<String, ApiError>;

    async fn delete_channel(&self, channel_id: &str) -> Result<(), ApiError>;

    /// Most recent messages first, capped at `limit`.
    async fn channel_history(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, ApiError>;

    async fn upload_transcript(
        &self,
        channel_id: &str,
        file_name: &str,
        content: &str,
        note: &str,
    ) -> Result<(), ApiError>;
}

/// Accepts everything and reaches nothing; the default wiring until a real
/// client is attached, and the base for test doubles.
#[derive(Default)]
pub struct NoopChatApi;

#[async_trait]
impl ChatApi for NoopChatApi {
    async fn send_message(
        &self,
        channel_id: &str,
        _message: &MessageTemplate,
    ) -> Result<MessageRef, ApiError> {
        Ok(MessageRef::new(channel_id, "noop"))
    }

    async fn edit_message(
        &self,
        _reference: &MessageRef,
        _message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn open_modal(
        &self,
        _interaction_id: &str,
        _modal: &ModalTemplate,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn create_private_channel(
        &self,
        request: &PrivateChannelRequest,
    ) -> Result<String, ApiError> {
        Ok(format!("noop-{}", request.name))
    }

    async fn delete_channel(&self, _channel_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn channel_history(
        &self,
        _channel_id: &str,
        _limit: usize,
    ) -> Result<Vec<HistoryMessage>, ApiError> {
        Ok(Vec::new())
    }

    async fn upload_transcript(
        &self,
        _channel_id: &str,
        _file_name: &str,
        _content: &str,
        _note: &str,
    ) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MessageRef;

    #[test]
    fn message_ref_round_trips_through_its_text_form() {
        let reference = MessageRef::new("C100", "M200");
        let parsed = MessageRef::parse(&reference.to_string()).expect("parse");
        assert_eq!(parsed, reference);
    }

    #[test]
    fn malformed_refs_do_not_parse() {
        assert_eq!(MessageRef::parse("no-separator"), None);
        assert_eq!(MessageRef::parse(":M200"), None);
        assert_eq!(MessageRef::parse("C100:"), None);
    }
}
