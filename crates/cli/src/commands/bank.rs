use std::sync::Arc;

use quartermaster_core::config::{AppConfig, LoadOptions};
use quartermaster_core::status::format_auec;
use quartermaster_store::{FsBackend, RecordStore};

use super::CommandResult;

/// Read-only view of the persisted ledger: total, top donors, history size.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("bank", "config_validation", error.to_string(), 2)
        }
    };

    let store = RecordStore::new(Arc::new(FsBackend::new(&config.storage.data_dir)));
    let loaded = match super::block_on(store.load_ledger()) {
        Ok(loaded) => loaded,
        Err(error) => return CommandResult::failure("bank", "runtime", error, 3),
    };
    let ledger = match loaded {
        Ok(ledger) => ledger,
        Err(error) => return CommandResult::failure("bank", "store_failure", error.to_string(), 3),
    };

    let mut lines = vec![
        format!("total: {}", format_auec(ledger.total)),
        format!("donors: {}", ledger.donors.len()),
        format!("transactions: {}", ledger.transactions.len()),
    ];
    for (rank, (user, amount)) in ledger.top_donors(5).enumerate() {
        lines.push(format!("top[{}]: {user} {}", rank + 1, format_auec(amount)));
    }

    CommandResult::success("bank", lines.join("\n"))
}
