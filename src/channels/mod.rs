//! Messaging channels.
//!
//! `channel` defines the platform-neutral outbound shapes and the
//! `Messenger` trait, `line` delivers through the LINE Messaging API, and
//! `webhook` receives LINE events over HTTP.

pub mod channel;
pub mod line;
pub mod webhook;

pub use channel::{Messenger, OutboundMessage, PromptChoice, Recipient};
pub use line::{LINE_API_BASE, LineConfig, LineMessenger};
pub use webhook::{WebhookState, webhook_routes};
