//! Notification delivery for Herald.
//!
//! - [`service::NotificationService`] persists notification records and is
//!   the entry point other crates use to notify a user.
//! - [`dispatch::EmailDispatcher`] delivers the matching emails in the
//!   background through a bounded worker pool.
//! - [`email::EmailGateway`] renders and transmits a message per kind; the
//!   Resend HTTP API in production, [`email::LogMailer`] when no provider is
//!   configured and [`memory::InMemoryMailer`] in tests.

pub mod dispatch;
pub mod email;
pub mod memory;
pub mod service;
pub mod templates;

pub use dispatch::{DispatchSnapshot, EmailDispatcher, EmailTask};
pub use email::{EmailGateway, EmailMessage, LogMailer, Recipient, ResendMailer};
pub use service::NotificationService;
