use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use quartermaster_core::config::AppConfig;
use quartermaster_core::errors::{ApplicationError, DomainError};
use quartermaster_core::ledger::{Ledger, TransactionKind};
use quartermaster_core::roster::EventRoster;
use quartermaster_core::status::{
    format_auec, render_bank_status, render_donor_ranking, render_events_status,
};
use quartermaster_discord::api::ChatApi;
use quartermaster_discord::channels::ChannelFlows;
use quartermaster_discord::commands::{
    CommandRouteError, CommandService, EventFields, MessageCommandEvent, Reply,
};
use quartermaster_discord::embeds;
use quartermaster_discord::events::{
    ButtonClickEvent, EventContext, EventDispatcher, EventHandlerError, InteractionService,
    MemberJoinedEvent, MemberService, MessageCommandHandler, ModalSubmitEvent,
    ButtonClickHandler, MemberJoinedHandler, ModalSubmitHandler,
};
use quartermaster_discord::interactions::{
    parse_donation_submission, InteractionAction,
};
use quartermaster_discord::publisher::StatusPublisher;
use quartermaster_store::{MarkerSlot, RecordStore, StoreError};

/// The concrete services behind every command, button, and form: load the
/// record, apply the mutation under the store's lock, republish the standing
/// message, acknowledge the user with one line.
#[derive(Clone)]
pub struct BotServices {
    inner: Arc<Inner>,
}

struct Inner {
    config: Arc<AppConfig>,
    store: Arc<RecordStore>,
    publisher: Arc<StatusPublisher>,
    channels: ChannelFlows,
    api: Arc<dyn ChatApi>,
}

#[derive(Debug, thiserror::Error)]
enum FlowError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BotServices {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<RecordStore>,
        publisher: Arc<StatusPublisher>,
        api: Arc<dyn ChatApi>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                publisher,
                channels: ChannelFlows::new(api.clone()),
                api,
            }),
        }
    }

    /// Wire these services into a dispatcher covering all four event types.
    pub fn into_dispatcher(self) -> EventDispatcher {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(MessageCommandHandler::new(self.clone()));
        dispatcher.register(ButtonClickHandler::new(self.clone()));
        dispatcher.register(ModalSubmitHandler::new(self.clone()));
        dispatcher.register(MemberJoinedHandler::new(self));
        dispatcher
    }

    fn is_manager(&self, member_roles: &[String]) -> bool {
        self.inner.config.is_manager(member_roles)
    }

    /// Generic reply for non-domain faults; the specifics stay in the log.
    fn failure_reply(&self, error: ApplicationError, correlation_id: &str) -> Reply {
        let interface = error.into_interface(correlation_id);
        warn!(
            event_name = "handlers.flow.failed",
            correlation_id,
            error = %interface,
            "flow failed with a non-domain error"
        );
        Reply::Text(interface.user_message())
    }

    fn flow_reply(&self, error: FlowError, correlation_id: &str) -> Reply {
        match error {
            FlowError::Domain(domain) => Reply::Text(domain.user_message()),
            FlowError::Store(store) => self
                .failure_reply(ApplicationError::Persistence(store.to_string()), correlation_id),
        }
    }

    /// Standing-message refresh after a successful mutation. The mutation is
    /// already on disk, so a platform failure here only logs.
    async fn republish_bank(&self, ledger: &Ledger, fallback_channel: &str) {
        let message = embeds::bank_status_message(&render_bank_status(ledger));
        if let Err(error) =
            self.inner.publisher.publish(MarkerSlot::BankStatus, fallback_channel, &message).await
        {
            warn!(
                event_name = "handlers.bank.republish_failed",
                error = %error,
                "bank status republish failed after a persisted mutation"
            );
        }
    }

    async fn republish_events(&self, roster: &EventRoster, fallback_channel: &str) {
        let event_ids: Vec<u64> = roster.events.iter().map(|event| event.id).collect();
        let message =
            embeds::events_status_message(&render_events_status(&roster.events), &event_ids);
        if let Err(error) =
            self.inner.publisher.publish(MarkerSlot::EventsStatus, fallback_channel, &message).await
        {
            warn!(
                event_name = "handlers.events.republish_failed",
                error = %error,
                "events status republish failed after a persisted mutation"
            );
        }
    }

    async fn credit_and_ack(
        &self,
        user_id: &str,
        username: &str,
        amount: u64,
        attachment: Option<String>,
        channel_id: &str,
        correlation_id: &str,
    ) -> Reply {
        let result = self
            .inner
            .store
            .with_ledger(|ledger| {
                ledger.credit(user_id, username, amount, attachment).map_err(FlowError::from)?;
                Ok::<_, FlowError>(ledger.clone())
            })
            .await;

        match result {
            Ok(ledger) => {
                info!(
                    event_name = "handlers.bank.credited",
                    user_id,
                    amount,
                    total = ledger.total,
                    correlation_id,
                    "donation recorded"
                );
                self.republish_bank(&ledger, channel_id).await;
                Reply::Text(format!(
                    "✅ Added **{}** to the bank. New total: **{}**.",
                    format_auec(amount),
                    format_auec(ledger.total)
                ))
            }
            Err(error) => self.flow_reply(error, correlation_id),
        }
    }
}

#[async_trait]
impl CommandService for BotServices {
    async fn bank_status(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        match self.inner.store.load_ledger().await {
            Ok(ledger) => {
                self.republish_bank(&ledger, &event.channel_id).await;
                Ok(Reply::None)
            }
            Err(error) => Ok(self.failure_reply(
                ApplicationError::Persistence(error.to_string()),
                &event.request_id,
            )),
        }
    }

    async fn bank_add(
        &self,
        amount: Option<u64>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        let Some(amount) = amount else {
            return Ok(Reply::Text(format!(
                "{} Usage: `bank add <amount>`.",
                DomainError::InvalidAmount.user_message()
            )));
        };

        Ok(self
            .credit_and_ack(
                &event.user_id,
                &event.username,
                amount,
                None,
                &event.channel_id,
                &event.request_id,
            )
            .await)
    }

    async fn bank_remove(
        &self,
        amount: Option<u64>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        let authorized = self.is_manager(&event.member_roles);
        let Some(amount) = amount else {
            return Ok(Reply::Text(format!(
                "{} Usage: `bank remove <amount>`.",
                DomainError::InvalidAmount.user_message()
            )));
        };

        let result = self
            .inner
            .store
            .with_ledger(|ledger| {
                ledger
                    .debit(&event.user_id, &event.username, amount, authorized)
                    .map_err(FlowError::from)?;
                Ok::<_, FlowError>(ledger.clone())
            })
            .await;

        Ok(match result {
            Ok(ledger) => {
                info!(
                    event_name = "handlers.bank.debited",
                    user_id = %event.user_id,
                    amount,
                    total = ledger.total,
                    correlation_id = %event.request_id,
                    "withdrawal recorded"
                );
                self.republish_bank(&ledger, &event.channel_id).await;
                Reply::Text(format!(
                    "💸 Withdrew **{}** from the bank. New total: **{}**.",
                    format_auec(amount),
                    format_auec(ledger.total)
                ))
            }
            Err(error) => self.flow_reply(error, &event.request_id),
        })
    }

    async fn bank_top(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        Ok(match self.inner.store.load_ledger().await {
            Ok(ledger) => {
                Reply::Message(embeds::donor_ranking_message(&render_donor_ranking(&ledger)))
            }
            Err(error) => self.failure_reply(
                ApplicationError::Persistence(error.to_string()),
                &event.request_id,
            ),
        })
    }

    async fn bank_log(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        let ledger = match self.inner.store.load_ledger().await {
            Ok(ledger) => ledger,
            Err(error) => {
                return Ok(self.failure_reply(
                    ApplicationError::Persistence(error.to_string()),
                    &event.request_id,
                ))
            }
        };

        if ledger.transactions.is_empty() {
            return Ok(Reply::Text("📭 The ledger is empty.".to_owned()));
        }

        let lines: Vec<String> = ledger
            .recent_transactions(10)
            .map(|tx| {
                let sign = match tx.kind {
                    TransactionKind::Credit => "+",
                    TransactionKind::Debit => "−",
                };
                format!(
                    "🕒 {} — **{}** {sign}{}",
                    tx.timestamp.format("%Y-%m-%d %H:%M"),
                    tx.username,
                    format_auec(tx.amount)
                )
            })
            .collect();

        Ok(Reply::Message(embeds::MessageTemplate::embed(
            embeds::EmbedTemplate::new()
                .title("📜 Recent transactions")
                .description(lines.join("\n"))
                .color(0x2F3136),
        )))
    }

    async fn events_list(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        match self.inner.store.load_events().await {
            Ok(roster) => {
                self.republish_events(&roster, &event.channel_id).await;
                Ok(Reply::None)
            }
            Err(error) => Ok(self.failure_reply(
                ApplicationError::Persistence(error.to_string()),
                &event.request_id,
            )),
        }
    }

    async fn events_add(
        &self,
        fields: Option<EventFields>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        let authorized = self.is_manager(&event.member_roles);
        let Some(fields) = fields else {
            return Ok(Reply::Text(
                "Invalid format. Usage: `events add Title | Date | Description`.".to_owned(),
            ));
        };

        let result = self
            .inner
            .store
            .with_events(|roster| {
                roster
                    .create(&fields.title, &fields.date, &fields.description, authorized)
                    .map_err(FlowError::from)?;
                Ok::<_, FlowError>(roster.clone())
            })
            .await;

        Ok(match result {
            Ok(roster) => {
                self.republish_events(&roster, &event.channel_id).await;
                Reply::Text(format!("📢 Event **{}** scheduled!", fields.title))
            }
            Err(error) => self.flow_reply(error, &event.request_id),
        })
    }

    async fn events_remove(
        &self,
        position: Option<usize>,
        event: &MessageCommandEvent,
    ) -> Result<Reply, CommandRouteError> {
        let authorized = self.is_manager(&event.member_roles);
        let Some(position) = position else {
            return Ok(Reply::Text("Usage: `events remove <position>`.".to_owned()));
        };

        let result = self
            .inner
            .store
            .with_events(|roster| {
                let removed = roster.remove_at(position, authorized).map_err(FlowError::from)?;
                Ok::<_, FlowError>((removed, roster.clone()))
            })
            .await;

        Ok(match result {
            Ok((removed, roster)) => {
                self.republish_events(&roster, &event.channel_id).await;
                Reply::Text(format!("🗑️ Event **{}** removed.", removed.title))
            }
            Err(error) => self.flow_reply(error, &event.request_id),
        })
    }

    async fn send_roles(&self, event: &MessageCommandEvent) -> Result<Reply, CommandRouteError> {
        let config = &self.inner.config;
        let channel = config.channels.role_picker.as_deref().unwrap_or(&event.channel_id);

        match self
            .inner
            .publisher
            .publish(MarkerSlot::RolePicker, channel, &embeds::role_picker_message())
            .await
        {
            Ok(_) => Ok(Reply::Text("✅ Channel-picker buttons published.".to_owned())),
            Err(error) => Ok(self.failure_reply(error, &event.request_id)),
        }
    }
}

#[async_trait]
impl InteractionService for BotServices {
    async fn handle_button(
        &self,
        action: InteractionAction,
        event: &ButtonClickEvent,
        ctx: &EventContext,
    ) -> Result<Reply, EventHandlerError> {
        match action {
            InteractionAction::OpenDonationModal => {
                match self.inner.api.open_modal(&event.interaction_id, &embeds::donation_modal()).await
                {
                    Ok(()) => Ok(Reply::None),
                    Err(error) => Ok(self.failure_reply(
                        ApplicationError::Integration(error.to_string()),
                        &ctx.correlation_id,
                    )),
                }
            }
            InteractionAction::RefreshEvents => match self.inner.store.load_events().await {
                Ok(roster) => {
                    self.republish_events(&roster, &event.channel_id).await;
                    Ok(Reply::Text("🔄 Events list refreshed.".to_owned()))
                }
                Err(error) => Ok(self.failure_reply(
                    ApplicationError::Persistence(error.to_string()),
                    &ctx.correlation_id,
                )),
            },
            InteractionAction::JoinEvent { event_id } => {
                let user_id = event.user_id.clone();
                let result = self
                    .inner
                    .store
                    .with_events(move |roster| {
                        roster.join(event_id, &user_id).map_err(FlowError::from)?;
                        let title = roster
                            .event_by_id(event_id)
                            .map(|found| found.title.clone())
                            .unwrap_or_default();
                        Ok::<_, FlowError>((title, roster.clone()))
                    })
                    .await;

                Ok(match result {
                    Ok((title, roster)) => {
                        self.republish_events(&roster, &event.channel_id).await;
                        Reply::Text(format!("✅ You're in for **{title}**."))
                    }
                    Err(error) => self.flow_reply(error, &ctx.correlation_id),
                })
            }
            InteractionAction::DeclineEvent { event_id } => {
                let user_id = event.user_id.clone();
                let result = self
                    .inner
                    .store
                    .with_events(move |roster| {
                        roster.decline(event_id, &user_id).map_err(FlowError::from)?;
                        let title = roster
                            .event_by_id(event_id)
                            .map(|found| found.title.clone())
                            .unwrap_or_default();
                        Ok::<_, FlowError>((title, roster.clone()))
                    })
                    .await;

                Ok(match result {
                    Ok((title, roster)) => {
                        self.republish_events(&roster, &event.channel_id).await;
                        Reply::Text(format!("🙅 Noted, you're out of **{title}**."))
                    }
                    Err(error) => self.flow_reply(error, &ctx.correlation_id),
                })
            }
            InteractionAction::OpenChannel { kind } => {
                match self.inner.channels.open(kind, &event.user_id, &event.username).await {
                    Ok(channel_id) => {
                        Ok(Reply::Text(format!("✅ Channel created: <#{channel_id}>")))
                    }
                    Err(error) => Ok(self.failure_reply(error, &ctx.correlation_id)),
                }
            }
            InteractionAction::CloseChannel => {
                let authorized =
                    self.inner.config.may_close_channels(&event.member_roles);
                let result = self
                    .inner
                    .channels
                    .close(
                        &event.channel_id,
                        &event.channel_name,
                        &event.username,
                        authorized,
                        self.inner.config.channels.logs.as_deref(),
                    )
                    .await;

                Ok(match result {
                    Ok(()) => Reply::Text("🗑️ Channel closed.".to_owned()),
                    Err(ApplicationError::Domain(domain)) => Reply::Text(domain.user_message()),
                    Err(error) => self.failure_reply(error, &ctx.correlation_id),
                })
            }
        }
    }

    async fn handle_donation_submit(
        &self,
        event: &ModalSubmitEvent,
        ctx: &EventContext,
    ) -> Result<Reply, EventHandlerError> {
        let submission = match parse_donation_submission(&event.fields) {
            Ok(submission) => submission,
            Err(domain) => return Ok(Reply::Text(domain.user_message())),
        };

        Ok(self
            .credit_and_ack(
                &event.user_id,
                &event.username,
                submission.amount,
                submission.attachment_url,
                &event.channel_id,
                &ctx.correlation_id,
            )
            .await)
    }
}

#[async_trait]
impl MemberService for BotServices {
    async fn handle_member_joined(
        &self,
        event: &MemberJoinedEvent,
        ctx: &EventContext,
    ) -> Result<(), EventHandlerError> {
        let Some(welcome_channel) = self.inner.config.channels.welcome.as_deref() else {
            return Ok(());
        };

        let message = embeds::welcome_message(&event.username, &event.guild_name);
        if let Err(error) = self.inner.api.send_message(welcome_channel, &message).await {
            warn!(
                event_name = "handlers.member.welcome_failed",
                user_id = %event.user_id,
                correlation_id = %ctx.correlation_id,
                error = %error,
                "welcome message could not be sent"
            );
        }
        Ok(())
    }
}
