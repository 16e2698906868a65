use async_trait::async_trait;
use thiserror::Error;

use crate::embeds::MessageTemplate;

/// A `!`-prefixed message as delivered by the gateway, prefix already
/// stripped by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageCommandEvent {
    pub channel_id: String,
    pub user_id: String,
    pub username: String,
    pub member_roles: Vec<String>,
    pub text: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventFields {
    pub title: String,
    pub date: String,
    pub description: String,
}

/// Every text command the bot understands, decoded once. Amounts and
/// positions that fail to parse surface as `None` so the service can answer
/// with the precise rejection instead of the parser guessing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    BankStatus,
    BankAdd { amount: Option<u64> },
    BankRemove { amount: Option<u64> },
    BankTop,
    BankLog,
    EventsList,
    EventsAdd { fields: Option<EventFields> },
    EventsRemove { position: Option<usize> },
    SendRoles,
    Help,
    Ping,
    Unknown { input: String },
}

pub fn parse_bot_command(text: &str) -> BotCommand {
    let trimmed = text.trim();
    let mut parts = trimmed.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let rest = trimmed[verb.len().min(trimmed.len())..].trim();

    match verb.as_str() {
        "bank" => parse_bank_command(rest),
        "events" | "event" => parse_events_command(rest),
        "sendroles" => BotCommand::SendRoles,
        "help" => BotCommand::Help,
        "ping" => BotCommand::Ping,
        _ => BotCommand::Unknown { input: trimmed.to_owned() },
    }
}

fn parse_bank_command(rest: &str) -> BotCommand {
    let mut parts = rest.split_whitespace();
    let sub = parts.next().unwrap_or_default().to_ascii_lowercase();
    match sub.as_str() {
        "" | "status" | "total" => BotCommand::BankStatus,
        "add" => BotCommand::BankAdd { amount: parse_amount(parts.next()) },
        "remove" => BotCommand::BankRemove { amount: parse_amount(parts.next()) },
        "top" => BotCommand::BankTop,
        "log" => BotCommand::BankLog,
        _ => BotCommand::Unknown { input: format!("bank {rest}") },
    }
}

fn parse_events_command(rest: &str) -> BotCommand {
    let mut parts = rest.split_whitespace();
    let sub = parts.next().unwrap_or_default().to_ascii_lowercase();
    match sub.as_str() {
        "" | "list" => BotCommand::EventsList,
        "add" => {
            let spec = rest[sub.len()..].trim();
            BotCommand::EventsAdd { fields: parse_event_fields(spec) }
        }
        "remove" => {
            BotCommand::EventsRemove { position: parts.next().and_then(|raw| raw.parse().ok()) }
        }
        _ => BotCommand::Unknown { input: format!("events {rest}") },
    }
}

/// `Title | Date | Description`: three pipe-separated non-empty fields.
fn parse_event_fields(spec: &str) -> Option<EventFields> {
    let mut fields = spec.splitn(3, '|').map(str::trim);
    let title = fields.next().filter(|field| !field.is_empty())?;
    let date = fields.next().filter(|field| !field.is_empty())?;
    let description = fields.next().filter(|field| !field.is_empty())?;
    Some(EventFields {
        title: title.to_owned(),
        date: date.to_owned(),
        description: description.to_owned(),
    })
}

fn parse_amount(token: Option<&str>) -> Option<u64> {
    let raw = token?;
    let normalized: String = raw.chars().filter(|ch| !matches!(ch, ',' | '_')).collect();
    normalized.parse::<u64>().ok().filter(|amount| *amount > 0)
}

/// What a handled command sends back to the invoking user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Message(MessageTemplate),
    None,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

#[async_trait]
pub trait CommandService: Send + Sync {
    async fn bank_status(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError>;
    async fn bank_add(
        &self,
        amount: Option<u64>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError>;
    async fn bank_remove(
        &self,
        amount: Option<u64>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError>;
    async fn bank_top(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError>;
    async fn bank_log(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError>;
    async fn events_list(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError>;
    async fn events_add(
        &self,
        fields: Option<EventFields>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError>;
    async fn events_remove(
        &self,
        position: Option<usize>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError>;
    async fn send_roles(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError>;
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: CommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn route(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        match parse_bot_command(&event.text) {
            BotCommand::BankStatus => self.service.bank_status(event).await,
            BotCommand::BankAdd { amount } => self.service.bank_add(amount, event).await,
            BotCommand::BankRemove { amount } => self.service.bank_remove(amount, event).await,
            BotCommand::BankTop => self.service.bank_top(event).await,
            BotCommand::BankLog => self.service.bank_log(event).await,
            BotCommand::EventsList => self.service.events_list(event).await,
            BotCommand::EventsAdd { fields } => self.service.events_add(fields, event).await,
            BotCommand::EventsRemove { position } => {
                self.service.events_remove(position, event).await
            }
            BotCommand::SendRoles => self.service.send_roles(event).await,
            BotCommand::Help => Ok(Reply::Text(help_text())),
            BotCommand::Ping => Ok(Reply::Text("🏓 Pong!".to_owned())),
            BotCommand::Unknown { input } => Ok(Reply::Text(format!(
                "Unknown command `{input}`. Try `help` for the list of commands."
            ))),
        }
    }
}

pub fn help_text() -> String {
    [
        "📖 Available commands:",
        "**bank** — show the bank status",
        "**bank add <amount>** — donate to the bank",
        "**bank remove <amount>** — withdraw funds (managers only)",
        "**bank top** — full donor ranking",
        "**bank log** — recent transactions",
        "**events** — show the event roster",
        "**events add Title | Date | Description** — schedule an event (managers only)",
        "**events remove <position>** — remove an event (managers only)",
        "**sendroles** — publish the channel-picker buttons",
        "**ping** — latency check",
    ]
    .join("\n")
}

/// Answers every command with a canned line; keeps routing testable without
/// a store or platform client.
#[derive(Default)]
pub struct NoopCommandService;

#[async_trait]
impl CommandService for NoopCommandService {
    async fn bank_status(&self, _event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text("bank status".to_owned()))
    }

    async fn bank_add(
        &self,
        amount: Option<u64>,
        _event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text(format!("bank add {amount:?}")))
    }

    async fn bank_remove(
        &self,
        amount: Option<u64>,
        _event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text(format!("bank remove {amount:?}")))
    }

    async fn bank_top(&self, _event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text("bank top".to_owned()))
    }

    async fn bank_log(&self, _event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text("bank log".to_owned()))
    }

    async fn events_list(&self, _event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text("events list".to_owned()))
    }

    async fn events_add(
        &self,
        fields: Option<EventFields>,
        _event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text(format!("events add {}", fields.map(|f| f.title).unwrap_or_default())))
    }

    async fn events_remove(
        &self,
        position: Option<usize>,
        _event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text(format!("events remove {position:?}")))
    }

    async fn send_roles(&self, _event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        Ok(Reply::Text("roles sent".to_owned()))
    }
}
