//! Structured action space for MiniWoB-style browser environments.
//!
//! An [`ActionSpaceConfig`] describes which action kinds an agent may pick
//! and yields the [`ActionSpace`] schema its actions must fit. [`execute_action`]
//! turns one [`Action`] into exactly one call on a [`Driver`].

pub mod action;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod hands;
pub mod kinds;
pub mod space;

pub use action::Action;
pub use config::{ActionSpaceConfig, ScreenSize};
pub use dispatch::{Driver, execute_action};
pub use error::{ActionError, ConfigurationError};
pub use hands::{BrowserSession, SessionOptions};
pub use kinds::{ActionKind, CapabilityGroup, Primitive};
pub use space::{ActionField, ActionSpace, Charset, Space};
