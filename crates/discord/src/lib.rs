//! Discord integration - gateway bot interface
//!
//! This crate provides the chat-platform boundary for quartermaster:
//! - **Gateway** (`gateway`) - connection pump with reconnect/backoff over an
//!   abstract transport
//! - **Commands** (`commands`) - `!bank`, `!events`, `!help`, ... parsed once
//!   into a closed enum and routed through a service trait
//! - **Interactions** (`interactions`) - button/modal action ids decoded into
//!   typed actions
//! - **Events** (`events`) - the dispatcher that fans envelopes out to
//!   per-event-type handlers
//! - **Embeds** (`embeds`) - typed message/embed/component/modal templates
//! - **Publisher** (`publisher`) - standing status messages edited in place
//! - **Channels** (`channels`) - ephemeral private channels with
//!   transcript-on-close
//! - **Api** (`api`) - the `ChatApi` trait standing in for the platform's
//!   REST client
//!
//! # Architecture
//!
//! ```text
//! Gateway envelopes → EventDispatcher → Handlers → Core services + Store
//!                          ↓
//!                    Embed templates → ChatApi / StatusPublisher
//! ```

pub mod api;
pub mod channels;
pub mod commands;
pub mod embeds;
pub mod events;
pub mod gateway;
pub mod interactions;
pub mod publisher;
