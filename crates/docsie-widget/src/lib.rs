//! Docsie widget bootstrap
//!
//! Client-side lifecycle manager for the embedded Docsie documentation
//! widget. For each container it injects the widget stylesheet and script,
//! negotiates authentication with the widget, and tears everything down
//! again on cleanup.
//!
//! Two handshake variants are supported, chosen per session:
//! - [`Handshake::Inline`]: the token travels in the script's `data-docsie`
//!   attribute as `authorizationToken`.
//! - [`Handshake::Redirect`]: the token is placed in the page URL (history
//!   replace, no reload) and the attribute carries an
//!   `authorizationFallbackURL` that brings the user back to this page after
//!   logging in.
//!
//! The document itself is abstracted behind [`Host`]; [`MemoryHost`] is an
//! in-memory document for tests and headless use.
//!
//! Typical flow:
//! 1. [`AuthClient::fetch_token`] and [`AuthClient::fetch_config`] (or [`mount`])
//! 2. [`WidgetBootstrap::initialize`] returns a [`LoadFuture`]
//! 3. the host reports the script outcome through the [`LoadSignal`] it received
//! 4. [`WidgetBootstrap::cleanup`] removes everything

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod memory;
pub mod signal;

pub use bootstrap::{WidgetBootstrap, WidgetSession};
pub use client::{AuthClient, DocsieConfig, mount};
pub use config::{BootstrapConfig, Handshake, build_config_attribute, build_fallback_url};
pub use error::{BootstrapError, HostError};
pub use host::{Host, NodeId, ScriptSpec};
pub use lifecycle::{WidgetAction, WidgetEvent, WidgetPhase};
pub use memory::{CleanupHook, MemoryHost};
pub use signal::{LoadFuture, LoadOutcome, LoadSignal};
