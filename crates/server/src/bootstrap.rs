use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use quartermaster_core::config::{AppConfig, ConfigError, LoadOptions};
use quartermaster_discord::api::{ChatApi, NoopChatApi};
use quartermaster_discord::gateway::{GatewayRunner, NoopGatewayTransport, ReconnectPolicy};
use quartermaster_discord::publisher::StatusPublisher;
use quartermaster_store::{FsBackend, MarkerStore, RecordStore};

use crate::handlers::BotServices;

pub struct Application {
    pub config: Arc<AppConfig>,
    pub store: Arc<RecordStore>,
    pub markers: Arc<MarkerStore>,
    pub api: Arc<dyn ChatApi>,
    pub publisher: Arc<StatusPublisher>,
    pub gateway: GatewayRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not prepare data directory `{path}`: {source}")]
    DataDir { path: PathBuf, source: std::io::Error },
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let data_dir = config.storage.data_dir.clone();
    std::fs::create_dir_all(&data_dir)
        .map_err(|source| BootstrapError::DataDir { path: data_dir.clone(), source })?;

    let config = Arc::new(config);
    let backend = Arc::new(FsBackend::new(&data_dir));
    let store = Arc::new(RecordStore::new(backend.clone()));
    let markers = Arc::new(MarkerStore::new(backend));

    // The real platform client attaches here; the noop stands in until then,
    // exactly like the noop gateway transport below.
    let api: Arc<dyn ChatApi> = Arc::new(NoopChatApi);
    let publisher = Arc::new(StatusPublisher::new(api.clone(), markers.clone()));

    let services = BotServices::new(config.clone(), store.clone(), publisher.clone(), api.clone());
    let gateway = GatewayRunner::new(
        Arc::new(NoopGatewayTransport),
        services.into_dispatcher(),
        ReconnectPolicy::default(),
    );

    info!(
        event_name = "system.bootstrap.store_ready",
        correlation_id = "bootstrap",
        data_dir = %data_dir.display(),
        "record store prepared"
    );

    Ok(Application { config, store, markers, api, publisher, gateway })
}
