//! API key authentication (C5): header extraction, constant-time matching,
//! and a hot-reload watcher over the auth config file.

#![deny(missing_docs)]

mod authenticator;
mod error;
mod principal;
mod reload;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use principal::Principal;
pub use reload::spawn_watch;
