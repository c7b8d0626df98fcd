pub mod auth;
pub mod mailer;

pub use mailer::{mailer_from_setting, LogMailer, Mailer, NoopMailer};
