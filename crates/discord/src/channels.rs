use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use quartermaster_core::errors::{ApplicationError, DomainError};

use crate::api::{ChatApi, HistoryMessage, PrivateChannelRequest};
use crate::embeds;

pub const TRANSCRIPT_FETCH_LIMIT: usize = 100;

/// The three ephemeral private-channel tracks offered by the role picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Ticket,
    Application,
    Embassy,
}

impl ChannelKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Application => "application",
            Self::Embassy => "embassy",
        }
    }

    /// Staff roles that can see the channel besides the requester.
    pub fn staff_roles(&self) -> &'static [&'static str] {
        match self {
            Self::Ticket | Self::Embassy => &["Administrator", "Moderator"],
            Self::Application => &["Administrator", "Recruiter"],
        }
    }
}

/// Opens and closes the private discussion channels, transcribing a channel
/// to the log channel before it is deleted.
pub struct ChannelFlows {
    api: Arc<dyn ChatApi>,
}

impl ChannelFlows {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    pub async fn open(
        &self,
        kind: ChannelKind,
        user_id: &str,
        username: &str,
    ) -> Result<String, ApplicationError> {
        let request = PrivateChannelRequest {
            name: channel_name(kind, username),
            requester_user_id: user_id.to_owned(),
            visible_roles: kind.staff_roles().iter().map(|role| (*role).to_owned()).collect(),
        };

        let channel_id = self
            .api
            .create_private_channel(&request)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        self.api
            .send_message(&channel_id, &embeds::close_channel_prompt(user_id))
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        info!(
            event_name = "channels.private.opened",
            kind = kind.prefix(),
            channel_id = %channel_id,
            user_id,
            "private channel opened"
        );
        Ok(channel_id)
    }

    /// Role check happens at the caller; `authorized` carries the verdict.
    /// The transcript is best-effort: a log-channel failure is logged and the
    /// deletion still goes ahead.
    pub async fn close(
        &self,
        channel_id: &str,
        channel_name: &str,
        closed_by: &str,
        authorized: bool,
        log_channel: Option<&str>,
    ) -> Result<(), ApplicationError> {
        if !authorized {
            return Err(DomainError::Unauthorized.into());
        }

        if let Some(log_channel) = log_channel {
            match self.api.channel_history(channel_id, TRANSCRIPT_FETCH_LIMIT).await {
                Ok(history) => {
                    let content = render_transcript(&history);
                    let file_name = format!("{channel_name}-{}.txt", Utc::now().timestamp());
                    let note = format!("📄 Channel closed by {closed_by}: **{channel_name}**");
                    if let Err(error) =
                        self.api.upload_transcript(log_channel, &file_name, &content, &note).await
                    {
                        warn!(
                            event_name = "channels.transcript.upload_failed",
                            channel_id,
                            error = %error,
                            "transcript upload failed; deleting channel anyway"
                        );
                    }
                }
                Err(error) => {
                    warn!(
                        event_name = "channels.transcript.fetch_failed",
                        channel_id,
                        error = %error,
                        "could not fetch history for transcript"
                    );
                }
            }
        }

        self.api
            .delete_channel(channel_id)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        info!(
            event_name = "channels.private.closed",
            channel_id,
            closed_by,
            "private channel closed"
        );
        Ok(())
    }
}

fn channel_name(kind: ChannelKind, username: &str) -> String {
    let slug: String = username
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '-' })
        .collect();
    format!("{}-{}", kind.prefix(), slug.trim_matches('-'))
}

/// Oldest-first `[timestamp] author: content` lines; platform history
/// arrives newest-first.
fn render_transcript(history: &[HistoryMessage]) -> String {
    if history.is_empty() {
        return "No messages in this channel.".to_owned();
    }
    history
        .iter()
        .rev()
        .map(|message| {
            format!("[{}] {}: {}", message.timestamp.to_rfc3339(), message.author, message.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
