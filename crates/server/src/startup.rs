//! One-time startup work: the version-change announcement and seeding the
//! role-picker standing message.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use quartermaster_core::errors::ApplicationError;
use quartermaster_discord::api::ChatApi;
use quartermaster_discord::embeds;
use quartermaster_discord::publisher::StatusPublisher;
use quartermaster_store::{MarkerSlot, MarkerStore};

pub const FALLBACK_CHANGELOG_LINE: &str = "- No changelog available.";

/// Announce once per version change: compare the persisted marker against
/// the built version, publish the changelog entry, then advance the marker.
pub async fn announce_version_change(
    api: &Arc<dyn ChatApi>,
    markers: &MarkerStore,
    update_channel: Option<&str>,
    changelog_path: &Path,
    current_version: &str,
) -> Result<(), ApplicationError> {
    let Some(update_channel) = update_channel else {
        debug!(
            event_name = "startup.announce.skipped",
            "no update channel configured; skipping version announcement"
        );
        return Ok(());
    };

    let last_announced = markers
        .get(MarkerSlot::LastVersion)
        .await
        .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
    if last_announced.as_deref() == Some(current_version) {
        debug!(
            event_name = "startup.announce.up_to_date",
            version = current_version,
            "version already announced"
        );
        return Ok(());
    }

    let entry = changelog_entry(changelog_path, current_version);
    api.send_message(update_channel, &embeds::update_announcement(current_version, &entry))
        .await
        .map_err(|error| ApplicationError::Integration(error.to_string()))?;
    markers
        .set(MarkerSlot::LastVersion, current_version)
        .await
        .map_err(|error| ApplicationError::Persistence(error.to_string()))?;

    info!(
        event_name = "startup.announce.published",
        version = current_version,
        "version announcement published"
    );
    Ok(())
}

/// Look up the changelog line for `version`; any problem with the file falls
/// back to the placeholder line.
fn changelog_entry(changelog_path: &Path, version: &str) -> String {
    let raw = match std::fs::read_to_string(changelog_path) {
        Ok(raw) => raw,
        Err(error) => {
            debug!(
                event_name = "startup.changelog.unreadable",
                path = %changelog_path.display(),
                error = %error,
                "changelog file not readable"
            );
            return FALLBACK_CHANGELOG_LINE.to_owned();
        }
    };

    match serde_json::from_str::<HashMap<String, String>>(&raw) {
        Ok(entries) => {
            entries.get(version).cloned().unwrap_or_else(|| FALLBACK_CHANGELOG_LINE.to_owned())
        }
        Err(error) => {
            warn!(
                event_name = "startup.changelog.unparsable",
                path = %changelog_path.display(),
                error = %error,
                "changelog file did not parse"
            );
            FALLBACK_CHANGELOG_LINE.to_owned()
        }
    }
}

/// Publish the role-picker message on first start; later starts leave the
/// existing one alone (the `sendroles` command re-publishes on demand).
pub async fn ensure_role_picker(
    publisher: &StatusPublisher,
    markers: &MarkerStore,
    role_picker_channel: Option<&str>,
) -> Result<(), ApplicationError> {
    let Some(channel) = role_picker_channel else {
        return Ok(());
    };

    let existing = markers
        .get(MarkerSlot::RolePicker)
        .await
        .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
    if existing.is_some() {
        return Ok(());
    }

    publisher.publish(MarkerSlot::RolePicker, channel, &embeds::role_picker_message()).await?;
    info!(event_name = "startup.role_picker.seeded", channel, "role picker message published");
    Ok(())
}
