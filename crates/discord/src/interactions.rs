use std::collections::HashMap;

use thiserror::Error;

use quartermaster_core::errors::DomainError;

use crate::channels::ChannelKind;

pub mod action_ids {
    pub const OPEN_DONATION_MODAL: &str = "bank.donate.v1";
    pub const SUBMIT_DONATION: &str = "bank.donate.submit.v1";
    pub const REFRESH_EVENTS: &str = "events.refresh.v1";
    pub const JOIN_EVENT: &str = "event.join.v1";
    pub const DECLINE_EVENT: &str = "event.decline.v1";
    pub const OPEN_TICKET: &str = "channel.open.ticket.v1";
    pub const OPEN_APPLICATION: &str = "channel.open.application.v1";
    pub const OPEN_EMBASSY: &str = "channel.open.embassy.v1";
    pub const CLOSE_CHANNEL: &str = "channel.close.v1";
}

/// Button presses decoded once at the boundary into a closed set of actions.
/// Event-scoped buttons carry the event's stable id in their value payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionAction {
    OpenDonationModal,
    RefreshEvents,
    JoinEvent { event_id: u64 },
    DeclineEvent { event_id: u64 },
    OpenChannel { kind: ChannelKind },
    CloseChannel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionDecodeError {
    #[error("unknown action id `{0}`")]
    UnknownActionId(String),
    #[error("action `{action_id}` is missing its value payload")]
    MissingValue { action_id: String },
    #[error("action `{action_id}` carries a non-numeric event id `{value}`")]
    InvalidEventId { action_id: String, value: String },
}

pub fn decode_action(
    action_id: &str,
    value: Option<&str>,
) -> Result<InteractionAction, ActionDecodeError> {
    match action_id {
        action_ids::OPEN_DONATION_MODAL => Ok(InteractionAction::OpenDonationModal),
        action_ids::REFRESH_EVENTS => Ok(InteractionAction::RefreshEvents),
        action_ids::JOIN_EVENT => {
            Ok(InteractionAction::JoinEvent { event_id: decode_event_id(action_id, value)? })
        }
        action_ids::DECLINE_EVENT => {
            Ok(InteractionAction::DeclineEvent { event_id: decode_event_id(action_id, value)? })
        }
        action_ids::OPEN_TICKET => Ok(InteractionAction::OpenChannel { kind: ChannelKind::Ticket }),
        action_ids::OPEN_APPLICATION => {
            Ok(InteractionAction::OpenChannel { kind: ChannelKind::Application })
        }
        action_ids::OPEN_EMBASSY => {
            Ok(InteractionAction::OpenChannel { kind: ChannelKind::Embassy })
        }
        action_ids::CLOSE_CHANNEL => Ok(InteractionAction::CloseChannel),
        other => Err(ActionDecodeError::UnknownActionId(other.to_owned())),
    }
}

fn decode_event_id(action_id: &str, value: Option<&str>) -> Result<u64, ActionDecodeError> {
    let raw = value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ActionDecodeError::MissingValue { action_id: action_id.to_owned() })?;
    raw.parse::<u64>().map_err(|_| ActionDecodeError::InvalidEventId {
        action_id: action_id.to_owned(),
        value: raw.to_owned(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DonationSubmission {
    pub amount: u64,
    pub attachment_url: Option<String>,
}

/// Decode the donation modal's field map. Anything that does not parse as a
/// positive whole number is the user's problem, reported as `InvalidAmount`.
pub fn parse_donation_submission(
    fields: &HashMap<String, String>,
) -> Result<DonationSubmission, DomainError> {
    let raw_amount = fields.get("amount").map(String::as_str).unwrap_or_default();
    let normalized: String =
        raw_amount.chars().filter(|ch| !matches!(ch, ',' | '_' | ' ')).collect();
    let amount = normalized.parse::<u64>().map_err(|_| DomainError::InvalidAmount)?;
    if amount == 0 {
        return Err(DomainError::InvalidAmount);
    }

    let attachment_url = fields
        .get("attachment_url")
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(str::to_owned);

    Ok(DonationSubmission { amount, attachment_url })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quartermaster_core::errors::DomainError;

    use super::{
        action_ids, decode_action, parse_donation_submission, ActionDecodeError, InteractionAction,
    };
    use crate::channels::ChannelKind;

    #[test]
    fn every_action_id_decodes_to_its_variant() {
        assert_eq!(
            decode_action(action_ids::OPEN_DONATION_MODAL, None),
            Ok(InteractionAction::OpenDonationModal)
        );
        assert_eq!(
            decode_action(action_ids::REFRESH_EVENTS, None),
            Ok(InteractionAction::RefreshEvents)
        );
        assert_eq!(
            decode_action(action_ids::JOIN_EVENT, Some("12")),
            Ok(InteractionAction::JoinEvent { event_id: 12 })
        );
        assert_eq!(
            decode_action(action_ids::DECLINE_EVENT, Some("3")),
            Ok(InteractionAction::DeclineEvent { event_id: 3 })
        );
        assert_eq!(
            decode_action(action_ids::OPEN_TICKET, None),
            Ok(InteractionAction::OpenChannel { kind: ChannelKind::Ticket })
        );
        assert_eq!(
            decode_action(action_ids::OPEN_APPLICATION, None),
            Ok(InteractionAction::OpenChannel { kind: ChannelKind::Application })
        );
        assert_eq!(
            decode_action(action_ids::OPEN_EMBASSY, None),
            Ok(InteractionAction::OpenChannel { kind: ChannelKind::Embassy })
        );
        assert_eq!(decode_action(action_ids::CLOSE_CHANNEL, None), Ok(InteractionAction::CloseChannel));
    }

    #[test]
    fn unknown_and_malformed_actions_are_rejected() {
        assert!(matches!(
            decode_action("bank.nonsense.v1", None),
            Err(ActionDecodeError::UnknownActionId(_))
        ));
        assert!(matches!(
            decode_action(action_ids::JOIN_EVENT, None),
            Err(ActionDecodeError::MissingValue { .. })
        ));
        assert!(matches!(
            decode_action(action_ids::JOIN_EVENT, Some("first")),
            Err(ActionDecodeError::InvalidEventId { .. })
        ));
    }

    #[test]
    fn donation_submission_parses_amount_and_optional_attachment() {
        let mut fields = HashMap::new();
        fields.insert("amount".to_owned(), "50,000".to_owned());
        fields.insert("attachment_url".to_owned(), " https://proof.example/shot.png ".to_owned());

        let submission = parse_donation_submission(&fields).expect("parse");

        assert_eq!(submission.amount, 50_000);
        assert_eq!(submission.attachment_url.as_deref(), Some("https://proof.example/shot.png"));
    }

    #[test]
    fn donation_submission_rejects_missing_zero_or_textual_amounts() {
        for raw in ["", "0", "-100", "lots"] {
            let mut fields = HashMap::new();
            fields.insert("amount".to_owned(), raw.to_owned());
            assert_eq!(
                parse_donation_submission(&fields).err(),
                Some(DomainError::InvalidAmount),
                "amount `{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn blank_attachment_field_reads_as_none() {
        let mut fields = HashMap::new();
        fields.insert("amount".to_owned(), "100".to_owned());
        fields.insert("attachment_url".to_owned(), "   ".to_owned());

        let submission = parse_donation_submission(&fields).expect("parse");
        assert_eq!(submission.attachment_url, None);
    }
}
