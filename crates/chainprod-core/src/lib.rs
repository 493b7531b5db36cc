//! Async client for the Prusa chain production accessory.
//!
//! The accessory is a print-ejection chain controlled by a plugin running on
//! the printer host. This crate keeps a local copy of its status, sends its
//! commands, counts down the cooling time between polls and reacts to push
//! notifications.
//!
//! # Features
//!
//! - **Status sync**: fetch and apply the controller status, discarding
//!   responses that arrive after a newer one
//! - **Commands**: eject, cool-and-eject, fan/LED switches, serial connect;
//!   each followed by exactly one refresh
//! - **Cooling countdown**: local one-second ticks re-anchored by every sync
//! - **Push notifications**: refresh when the host signals a change
//! - **Events**: broadcast channel for every state change
//! - **Mock controller**: test without a printer host
//!
//! # Architecture
//!
//! | Component | Role |
//! |-----------|------|
//! | [`ChainTransport`] | moves status and commands; [`HttpTransport`] or [`MockController`] |
//! | [`StatusModel`] | last applied status, written only by the synchronizer |
//! | [`StatusSynchronizer`] | fetch, sequence, apply, re-anchor the countdown |
//! | [`CountdownController`] | one armed tick at a time |
//! | [`CommandDispatcher`] | send, then refresh |
//! | [`NotificationListener`] | filter by plugin identity, then refresh |
//! | [`ChainClient`] | wires the above and computes the [`DerivedView`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use chainprod_core::{ChainClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder("http://octopi.local")
//!         .api_key("ABCDEF0123")
//!         .build();
//!     let client = ChainClient::new(config)?;
//!
//!     client.start().await?;
//!     let view = client.view();
//!     println!("Chain: {} / Fans: {}", view.eject, view.fan);
//!
//!     if view.eject_enabled {
//!         client.dispatcher().cool_and_eject().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod countdown;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod http;
pub mod mock;
pub mod model;
pub mod notify;
pub mod sync;
pub mod traits;

pub use client::ChainClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use countdown::{CountdownController, CountdownState};
pub use dispatch::{CommandDispatcher, DispatchReport};
pub use error::{CommandError, Error, Result, SyncError, TransportError};
pub use events::{ChainEvent, EventDispatcher, EventReceiver, EventSender};
pub use http::{HttpTransport, plugin_endpoint};
pub use mock::{MockController, MockControllerBuilder};
pub use model::{StatusModel, StatusSnapshot};
pub use notify::{Notification, NotificationListener, NotificationSender};
pub use sync::{StatusSynchronizer, SyncOutcome};
pub use traits::ChainTransport;

// Re-export from chainprod-types
pub use chainprod_types::{
    Command, CommandName, ConnectionAction, CoolingTime, DEFAULT_PLUGIN_ID, DerivedView,
    DeviceStatus, EjectLabel, ParseError, SwitchLabel,
};

/// Type alias for a shared client reference.
pub type SharedClient = std::sync::Arc<ChainClient>;
