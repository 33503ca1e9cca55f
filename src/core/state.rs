use std::sync::Arc;
use std::time::Duration;

use crate::controllers::session::SessionManager;
use crate::core::client::Client;
use crate::core::config::Args;
use crate::core::error::ConfigError;
use crate::sync::reservations::ReservationStateTracker;
use crate::token::TokenCell;
use crate::token::store::FileStore;

/// Everything a host embeds, wired once per process. Screens receive this
/// by reference instead of reaching for globals.
#[derive(Clone, Debug)]
pub struct AppState {
    pub session: Arc<SessionManager<Client, FileStore>>,
    pub reservations: Arc<ReservationStateTracker<Client, FileStore>>,
}

impl AppState {
    pub fn new(config: &Args) -> Result<Self, ConfigError> {
        let token = TokenCell::new();

        let client = Arc::new(Client::new(
            &config.user_agent,
            &config.api_url,
            Duration::from_secs(config.request_timeout),
            token.clone(),
        )?);

        let store = FileStore::new(config.credentials_path.clone());

        let session = Arc::new(SessionManager::new(client.clone(), store, token)?);

        let reservations = Arc::new(ReservationStateTracker::new(client, session.clone()));

        Ok(AppState {
            session,
            reservations,
        })
    }
}
