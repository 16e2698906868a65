pub mod config;
pub mod errors;
pub mod ledger;
pub mod roster;
pub mod status;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ledger::{Ledger, Transaction, TransactionKind};
pub use roster::{EventRecord, EventRoster, RsvpOutcome};
pub use status::{
    format_auec, render_bank_status, render_donor_ranking, render_events_status, StatusPayload,
};
