use serde::Serialize;

use quartermaster_core::status::StatusPayload;

pub const COLOR_BANK: u32 = 0x2ECC71;
pub const COLOR_EVENTS: u32 = 0x3498DB;
pub const COLOR_WELCOME: u32 = 0x00AE86;
pub const COLOR_UPDATE: u32 = 0xFFA500;
pub const COLOR_RANKING: u32 = 0xF1C40F;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmbedTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl EmbedTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Button {
    pub action_id: String,
    pub label: String,
    pub style: ButtonStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Button {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            label: label.into(),
            style: ButtonStyle::Secondary,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    pub buttons: Vec<Button>,
}

impl ActionRow {
    pub fn of(buttons: Vec<Button>) -> Self {
        Self { buttons }
    }
}

/// A renderable outbound message: plain content, rich embeds, button rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<EmbedTemplate>,
    pub components: Vec<ActionRow>,
}

impl MessageTemplate {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn embed(embed: EmbedTemplate) -> Self {
        Self { embeds: vec![embed], ..Self::default() }
    }

    pub fn with_row(mut self, row: ActionRow) -> Self {
        self.components.push(row);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextInput {
    pub field_id: String,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalTemplate {
    pub modal_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

/// The standing bank-status message: rendered payload plus the donate button.
pub fn bank_status_message(payload: &StatusPayload) -> MessageTemplate {
    MessageTemplate::embed(
        EmbedTemplate::new()
            .title(payload.title.clone())
            .description(payload.body.clone())
            .color(COLOR_BANK),
    )
    .with_row(ActionRow::of(vec![Button::new(
        crate::interactions::action_ids::OPEN_DONATION_MODAL,
        "💸 Donate",
    )
    .style(ButtonStyle::Primary)]))
}

pub fn donor_ranking_message(payload: &StatusPayload) -> MessageTemplate {
    MessageTemplate::embed(
        EmbedTemplate::new()
            .title(payload.title.clone())
            .description(payload.body.clone())
            .color(COLOR_RANKING),
    )
}

/// The standing events message: one refresh row plus a join/decline row per
/// event, each button carrying the event's stable id.
pub fn events_status_message(payload: &StatusPayload, event_ids: &[u64]) -> MessageTemplate {
    let mut message = MessageTemplate::embed(
        EmbedTemplate::new()
            .title(payload.title.clone())
            .description(payload.body.clone())
            .color(COLOR_EVENTS),
    )
    .with_row(ActionRow::of(vec![Button::new(
        crate::interactions::action_ids::REFRESH_EVENTS,
        "🔄 Refresh",
    )]));

    for event_id in event_ids {
        message = message.with_row(ActionRow::of(vec![
            Button::new(crate::interactions::action_ids::JOIN_EVENT, format!("✅ Join [{event_id}]"))
                .style(ButtonStyle::Success)
                .value(event_id.to_string()),
            Button::new(
                crate::interactions::action_ids::DECLINE_EVENT,
                format!("🙅 Decline [{event_id}]"),
            )
            .style(ButtonStyle::Danger)
            .value(event_id.to_string()),
        ]));
    }
    message
}

/// The role-picker standing message with the private-channel entry buttons.
pub fn role_picker_message() -> MessageTemplate {
    MessageTemplate::embed(
        EmbedTemplate::new()
            .title("🎭 Pick your track")
            .description("Press a button below to open a private channel with the right team")
            .color(COLOR_EVENTS),
    )
    .with_row(ActionRow::of(vec![
        Button::new(crate::interactions::action_ids::OPEN_TICKET, "🎫 Ticket")
            .style(ButtonStyle::Primary),
        Button::new(crate::interactions::action_ids::OPEN_APPLICATION, "📄 Application")
            .style(ButtonStyle::Success),
        Button::new(crate::interactions::action_ids::OPEN_EMBASSY, "🤝 Embassy"),
    ]))
}

pub fn close_channel_prompt(user_id: &str) -> MessageTemplate {
    let mut message = MessageTemplate::text(format!("<@{user_id}>"));
    message.components.push(ActionRow::of(vec![Button::new(
        crate::interactions::action_ids::CLOSE_CHANNEL,
        "🗑️ Close this channel",
    )
    .style(ButtonStyle::Danger)]));
    message
}

pub fn welcome_message(username: &str, guild_name: &str) -> MessageTemplate {
    MessageTemplate::embed(
        EmbedTemplate::new()
            .title(format!("👋 Welcome, {username}!"))
            .description(format!("Welcome to **{guild_name}**! Make sure to read the rules."))
            .color(COLOR_WELCOME),
    )
}

pub fn update_announcement(version: &str, changelog: &str) -> MessageTemplate {
    MessageTemplate::embed(
        EmbedTemplate::new()
            .title(format!("🔄 Bot update: v{version}"))
            .description(changelog.to_owned())
            .color(COLOR_UPDATE),
    )
}

pub fn donation_modal() -> ModalTemplate {
    ModalTemplate {
        modal_id: crate::interactions::action_ids::SUBMIT_DONATION.to_owned(),
        title: "Make a donation".to_owned(),
        inputs: vec![
            TextInput {
                field_id: "amount".to_owned(),
                label: "Amount (aUEC)".to_owned(),
                required: true,
                placeholder: Some("e.g. 50000".to_owned()),
            },
            TextInput {
                field_id: "attachment_url".to_owned(),
                label: "Proof screenshot URL (optional)".to_owned(),
                required: false,
                placeholder: None,
            },
        ],
    }
}
