use std::sync::Arc;

use quartermaster_core::config::{AppConfig, LoadOptions};
use quartermaster_store::{FsBackend, RecordStore};

use super::CommandResult;

/// Read-only view of the persisted event roster.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("events", "config_validation", error.to_string(), 2)
        }
    };

    let store = RecordStore::new(Arc::new(FsBackend::new(&config.storage.data_dir)));
    let loaded = match super::block_on(store.load_events()) {
        Ok(loaded) => loaded,
        Err(error) => return CommandResult::failure("events", "runtime", error, 3),
    };
    let roster = match loaded {
        Ok(roster) => roster,
        Err(error) => {
            return CommandResult::failure("events", "store_failure", error.to_string(), 3)
        }
    };

    if roster.events.is_empty() {
        return CommandResult::success("events", "no events scheduled");
    }

    let lines: Vec<String> = roster
        .events
        .iter()
        .enumerate()
        .map(|(position, event)| {
            format!(
                "[{position}] #{} {} — {} ({} in / {} out)",
                event.id,
                event.title,
                event.date,
                event.participants.len(),
                event.declined.len()
            )
        })
        .collect();

    CommandResult::success("events", lines.join("\n"))
}
