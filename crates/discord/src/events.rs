use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::commands::{
    CommandRouteError, CommandRouter, CommandService, MessageCommandEvent, NoopCommandService,
    Reply,
};
use crate::interactions::{decode_action, InteractionAction};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayEnvelope {
    pub envelope_id: String,
    pub event: GatewayEvent,
}

/// Everything the gateway can hand us, decoded once into a closed enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    MessageCommand(MessageCommandEvent),
    ButtonClick(ButtonClickEvent),
    ModalSubmit(ModalSubmitEvent),
    MemberJoined(MemberJoinedEvent),
    Unsupported { event_type: String },
}

impl GatewayEvent {
    pub fn event_type(&self) -> GatewayEventType {
        match self {
            Self::MessageCommand(_) => GatewayEventType::MessageCommand,
            Self::ButtonClick(_) => GatewayEventType::ButtonClick,
            Self::ModalSubmit(_) => GatewayEventType::ModalSubmit,
            Self::MemberJoined(_) => GatewayEventType::MemberJoined,
            Self::Unsupported { .. } => GatewayEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    MessageCommand,
    ButtonClick,
    ModalSubmit,
    MemberJoined,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonClickEvent {
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub username: String,
    pub member_roles: Vec<String>,
    pub action_id: String,
    pub value: Option<String>,
    pub interaction_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalSubmitEvent {
    pub channel_id: String,
    pub user_id: String,
    pub username: String,
    pub member_roles: Vec<String>,
    pub modal_id: String,
    pub fields: HashMap<String, String>,
    pub interaction_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberJoinedEvent {
    pub guild_name: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Reply),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error("interaction handler failure: {0}")]
    Interaction(String),
    #[error("member handler failure: {0}")]
    Member(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> GatewayEventType;
    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<GatewayEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageCommandHandler::new(NoopCommandService));
    dispatcher.register(ButtonClickHandler::new(NoopInteractionService));
    dispatcher.register(ModalSubmitHandler::new(NoopInteractionService));
    dispatcher.register(MemberJoinedHandler::new(NoopMemberService));
    dispatcher
}

pub struct MessageCommandHandler<S> {
    router: CommandRouter<S>,
}

impl<S> MessageCommandHandler<S>
where
    S: CommandService,
{
    pub fn new(service: S) -> Self {
        Self { router: CommandRouter::new(service) }
    }
}

#[async_trait]
impl<S> EventHandler for MessageCommandHandler<S>
where
    S: CommandService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::MessageCommand
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::MessageCommand(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let reply = self.router.route(event).await?;
        Ok(HandlerResult::Responded(reply))
    }
}

/// Buttons and modal submissions share one service: both are UI actions on
/// the same records.
#[async_trait]
pub trait InteractionService: Send + Sync {
    async fn handle_button(
        &self,
        action: InteractionAction,
        event: &ButtonClickEvent,
        ctx: &EventContext,
    ) -> Result<Reply, EventHandlerError>;

    async fn handle_donation_submit(
        &self,
        event: &ModalSubmitEvent,
        ctx: &EventContext,
    ) -> Result<Reply, EventHandlerError>;
}

pub struct ButtonClickHandler<S> {
    service: S,
}

impl<S> ButtonClickHandler<S>
where
    S: InteractionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for ButtonClickHandler<S>
where
    S: InteractionService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::ButtonClick
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::ButtonClick(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let action = match decode_action(&event.action_id, event.value.as_deref()) {
            Ok(action) => action,
            Err(error) => {
                // Stale or foreign buttons answer politely instead of erroring.
                tracing::debug!(
                    event_name = "ingress.button.undecodable",
                    action_id = %event.action_id,
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "button action could not be decoded"
                );
                return Ok(HandlerResult::Responded(Reply::Text(
                    "That button is no longer active.".to_owned(),
                )));
            }
        };

        let reply = self.service.handle_button(action, event, ctx).await?;
        Ok(HandlerResult::Responded(reply))
    }
}

pub struct ModalSubmitHandler<S> {
    service: S,
}

impl<S> ModalSubmitHandler<S>
where
    S: InteractionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for ModalSubmitHandler<S>
where
    S: InteractionService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::ModalSubmit
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::ModalSubmit(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if event.modal_id != crate::interactions::action_ids::SUBMIT_DONATION {
            return Ok(HandlerResult::Processed);
        }

        let reply = self.service.handle_donation_submit(event, ctx).await?;
        Ok(HandlerResult::Responded(reply))
    }
}

#[async_trait]
pub trait MemberService: Send + Sync {
    async fn handle_member_joined(
        &self,
        event: &MemberJoinedEvent,
        ctx: &EventContext,
    ) -> Result<(), EventHandlerError>;
}

pub struct MemberJoinedHandler<S> {
    service: S,
}

impl<S> MemberJoinedHandler<S>
where
    S: MemberService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MemberJoinedHandler<S>
where
    S: MemberService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::MemberJoined
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::MemberJoined(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        self.service.handle_member_joined(event, ctx).await?;
        Ok(HandlerResult::Processed)
    }
}

#[derive(Default)]
pub struct NoopInteractionService;

#[async_trait]
impl InteractionService for NoopInteractionService {
    async fn handle_button(
        &self,
        action: InteractionAction,
        _event: &ButtonClickEvent,
        _ctx: &EventContext,
    ) -> Result<Reply, EventHandlerError> {
        Ok(Reply::Text(format!("button action {action:?} received")))
    }

    async fn handle_donation_submit(
        &self,
        event: &ModalSubmitEvent,
        _ctx: &EventContext,
    ) -> Result<Reply, EventHandlerError> {
        Ok(Reply::Text(format!("donation form with {} fields received", event.fields.len())))
    }
}

#[derive(Default)]
pub struct NoopMemberService;

#[async_trait]
impl MemberService for NoopMemberService {
    async fn handle_member_joined(
        &self,
        _event: &MemberJoinedEvent,
        _ctx: &EventContext,
    ) -> Result<(), EventHandlerError> {
        Ok(())
    }
}
