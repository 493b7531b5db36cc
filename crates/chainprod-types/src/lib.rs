//! Platform-agnostic types for the Prusa chain production accessory.
//!
//! This crate provides the value types shared by the async client
//! (chainprod-core) and any presentation layer built on top of it.
//!
//! # Features
//!
//! - [`DeviceStatus`]: the controller's status snapshot, with unknown fields
//!   kept distinct from `false`
//! - [`Command`] and [`CommandName`]: the command vocabulary and its flat JSON body
//! - [`DerivedView`]: pure label and enablement rules for a UI
//! - Error types for data parsing
//!
//! # Example
//!
//! ```
//! use chainprod_types::{DerivedView, DeviceStatus};
//!
//! let status = DeviceStatus::from_json(r#"{"errorOrClosed": true}"#).unwrap();
//! let view = DerivedView::compute(&status, 0, false);
//! assert_eq!(view.eject.to_string(), "-");
//! assert_eq!(view.connection.to_string(), "Connect");
//! ```

pub mod error;
pub mod types;
pub mod view;

pub use error::{ParseError, ParseResult};
pub use types::{Command, CommandName, DEFAULT_PLUGIN_ID, DeviceStatus};
pub use view::{ConnectionAction, CoolingTime, DerivedView, EjectLabel, SwitchLabel};
