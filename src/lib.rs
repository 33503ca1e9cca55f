pub mod controllers;
pub mod core;
pub mod sync;
pub mod token;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use crate::controllers::session::{SessionManager, SessionStatus};
pub use crate::core::client::{Client, RemoteApi};
pub use crate::core::config::Args;
pub use crate::core::error::{ConfigError, Error};
pub use crate::core::state::AppState;
pub use crate::sync::reservations::ReservationStateTracker;
pub use crate::token::TokenCell;
pub use crate::token::store::{CredentialStore, FileStore, StoredCredentials};

/// Load configuration, install the tracing subscriber, wire the app state
/// and settle the stored session before any protected screen renders.
pub async fn bootstrap() -> Result<AppState, ConfigError> {
    let config = Args::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new(&config)?;

    state.session.initialize().await;

    Ok(state)
}
