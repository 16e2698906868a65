use std::sync::Arc;

use tracing::{debug, info};

use quartermaster_core::errors::ApplicationError;
use quartermaster_store::{MarkerSlot, MarkerStore, StoreError};

use crate::api::{ApiError, ChatApi, MessageRef};
use crate::embeds::MessageTemplate;

/// Keeps one standing message per marker slot up to date: edit in place when
/// the stored reference still resolves, otherwise send a fresh message and
/// remember it.
pub struct StatusPublisher {
    api: Arc<dyn ChatApi>,
    markers: Arc<MarkerStore>,
}

impl StatusPublisher {
    pub fn new(api: Arc<dyn ChatApi>, markers: Arc<MarkerStore>) -> Self {
        Self { api, markers }
    }

    pub async fn publish(
        &self,
        slot: MarkerSlot,
        fallback_channel: &str,
        message: &MessageTemplate,
    ) -> Result<MessageRef, ApplicationError> {
        if let Some(reference) = self.stored_reference(slot).await? {
            match self.api.edit_message(&reference, message).await {
                Ok(()) => {
                    debug!(
                        event_name = "publisher.standing.edited",
                        slot = ?slot,
                        reference = %reference,
                        "standing message edited in place"
                    );
                    return Ok(reference);
                }
                // The message was deleted out from under us; fall through to
                // publishing a fresh one.
                Err(ApiError::NotFound(_)) => {}
                Err(error) => return Err(ApplicationError::Integration(error.to_string())),
            }
        }

        let reference = self
            .api
            .send_message(fallback_channel, message)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;
        self.markers
            .set(slot, &reference.to_string())
            .await
            .map_err(store_error)?;

        info!(
            event_name = "publisher.standing.created",
            slot = ?slot,
            reference = %reference,
            "standing message created"
        );
        Ok(reference)
    }

    async fn stored_reference(&self, slot: MarkerSlot) -> Result<Option<MessageRef>, ApplicationError> {
        let raw = self.markers.get(slot).await.map_err(store_error)?;
        Ok(raw.as_deref().and_then(MessageRef::parse))
    }
}

fn store_error(error: StoreError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use quartermaster_store::{MarkerSlot, MarkerStore, MemoryBackend};

    use super::StatusPublisher;
    use crate::api::{
        ApiError, ChatApi, HistoryMessage, MessageRef, PrivateChannelRequest,
    };
    use crate::embeds::{MessageTemplate, ModalTemplate};

    #[derive(Default)]
    struct FakeChatApi {
        state: Mutex<FakeState>,
    }

    #[derive(Default)]
    struct FakeState {
        sends: Vec<String>,
        edits: Vec<String>,
        edit_fails_with_not_found: bool,
        next_message_id: u64,
    }

    impl FakeChatApi {
        async fn fail_edits(&self) {
            self.state.lock().await.edit_fails_with_not_found = true;
        }
    }

    #[async_trait]
    impl ChatApi for FakeChatApi {
        async fn send_message(
            &self,
            channel_id: &str,
            _message: &MessageTemplate,
        ) -> Result<MessageRef, ApiError> {
            let mut state = self.state.lock().await;
            state.next_message_id += 1;
            state.sends.push(channel_id.to_owned());
            Ok(MessageRef::new(channel_id, format!("M{}", state.next_message_id)))
        }

        async fn edit_message(
            &self,
            reference: &MessageRef,
            _message: &MessageTemplate,
        ) -> Result<(), ApiError> {
            let mut state = self.state.lock().await;
            if state.edit_fails_with_not_found {
                return Err(ApiError::NotFound(reference.to_string()));
            }
            state.edits.push(reference.to_string());
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
            _request: &PrivateChannelRequest,
        ) -> Result<String, ApiError> {
            Ok("C-new".to_owned())
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

    fn publisher(api: Arc<FakeChatApi>) -> (StatusPublisher, Arc<MarkerStore>) {
        let markers = Arc::new(MarkerStore::new(Arc::new(MemoryBackend::default())));
        (StatusPublisher::new(api, markers.clone()), markers)
    }

    #[tokio::test]
    async fn first_publish_sends_and_persists_the_reference() {
        let api = Arc::new(FakeChatApi::default());
        let (publisher, markers) = publisher(api.clone());

        let reference = publisher
            .publish(MarkerSlot::BankStatus, "C-bank", &MessageTemplate::text("status"))
            .await
            .expect("publish");

        assert_eq!(reference.channel_id, "C-bank");
        let stored = markers.get(MarkerSlot::BankStatus).await.expect("get").expect("stored");
        assert_eq!(stored, reference.to_string());
        assert_eq!(api.state.lock().await.sends.len(), 1);
    }

    #[tokio::test]
    async fn second_publish_edits_in_place() {
        let api = Arc::new(FakeChatApi::default());
        let (publisher, _markers) = publisher(api.clone());

        let first = publisher
            .publish(MarkerSlot::EventsStatus, "C-events", &MessageTemplate::text("v1"))
            .await
            .expect("publish");
        let second = publisher
            .publish(MarkerSlot::EventsStatus, "C-events", &MessageTemplate::text("v2"))
            .await
            .expect("publish");

        assert_eq!(first, second);
        let state = api.state.lock().await;
        assert_eq!(state.sends.len(), 1);
        assert_eq!(state.edits, vec![first.to_string()]);
    }

    #[tokio::test]
    async fn deleted_standing_message_falls_back_to_a_fresh_send() {
        let api = Arc::new(FakeChatApi::default());
        let (publisher, markers) = publisher(api.clone());

        let first = publisher
            .publish(MarkerSlot::BankStatus, "C-bank", &MessageTemplate::text("v1"))
            .await
            .expect("publish");
        api.fail_edits().await;
        let second = publisher
            .publish(MarkerSlot::BankStatus, "C-bank", &MessageTemplate::text("v2"))
            .await
            .expect("publish");

        assert_ne!(first, second);
        let stored = markers.get(MarkerSlot::BankStatus).await.expect("get").expect("stored");
        assert_eq!(stored, second.to_string());
        assert_eq!(api.state.lock().await.sends.len(), 2);
    }

    #[tokio::test]
    async fn garbage_marker_is_treated_as_absent() {
        let api = Arc::new(FakeChatApi::default());
        let (publisher, markers) = publisher(api.clone());
        markers.set(MarkerSlot::RolePicker, "not-a-reference").await.expect("set");

        publisher
            .publish(MarkerSlot::RolePicker, "C-roles", &MessageTemplate::text("picker"))
            .await
            .expect("publish");

        assert_eq!(api.state.lock().await.sends.len(), 1);
    }
}
