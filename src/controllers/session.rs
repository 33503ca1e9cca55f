use std::sync::Arc;

use regex::Regex;
use tokio::sync::{RwLock, watch};
use tracing::instrument;

use crate::core::client::RemoteApi;
use crate::core::error::{ConfigError, Error};
use crate::token::TokenCell;
use crate::token::claims;
use crate::token::store::{CredentialStore, StoredCredentials};
use crate::types::request::{Credentials, ProfileUpdate, Registration};
use crate::types::response::{Profile, TokenPair};

/// What a screen needs to know before rendering protected content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

#[derive(Clone, Debug)]
enum SessionState {
    Loading,
    Unauthenticated,
    Authenticated { profile: Profile },
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        match self {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
            SessionState::Authenticated { .. } => SessionStatus::Authenticated,
        }
    }
}

/// Single source of truth for the authenticated identity. Owns the
/// persisted credentials and the in-memory token slot; nothing else in the
/// crate touches either.
pub struct SessionManager<A, S> {
    api: Arc<A>,
    store: S,
    token: TokenCell,
    state: RwLock<SessionState>,
    status_tx: watch::Sender<SessionStatus>,
    username_pattern: Regex,
    email_pattern: Regex,
}

impl<A, S> std::fmt::Debug for SessionManager<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

impl<A: RemoteApi, S: CredentialStore> SessionManager<A, S> {
    pub fn new(api: Arc<A>, store: S, token: TokenCell) -> Result<Self, ConfigError> {
        let (status_tx, _) = watch::channel(SessionStatus::Loading);

        Ok(Self {
            api,
            store,
            token,
            state: RwLock::new(SessionState::Loading),
            status_tx,
            username_pattern: Regex::new(r"^[a-zA-Z0-9_-]{3,20}$")?,
            email_pattern: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?,
        })
    }

    /// Status transitions, in order. A host watches this to route between
    /// its login entry point and the rest of the app.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.status().await == SessionStatus::Authenticated
    }

    pub async fn profile(&self) -> Option<Profile> {
        match &*self.state.read().await {
            SessionState::Authenticated { profile } => Some(profile.clone()),
            _ => None,
        }
    }

    pub async fn subject_id(&self) -> Option<i64> {
        self.profile().await.map(|profile| profile.id)
    }

    async fn transition(&self, next: SessionState) {
        let status = next.status();

        *self.state.write().await = next;

        self.status_tx.send_replace(status);
    }

    /// Runs once at process start, before any protected screen renders.
    /// Never raises: a missing, corrupt or rejected token all land in
    /// `Unauthenticated` with storage cleared.
    #[instrument(skip_all)]
    pub async fn initialize(&self) -> SessionStatus {
        let stored = match self.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.transition(SessionState::Unauthenticated).await;
                return SessionStatus::Unauthenticated;
            }
            Err(e) => {
                tracing::warn!("stored credentials unreadable: {}", e);
                self.invalidate().await;
                return SessionStatus::Unauthenticated;
            }
        };

        let claims = match claims::decode(&stored.auth_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("stored token rejected: {}", e);
                self.invalidate().await;
                return SessionStatus::Unauthenticated;
            }
        };

        self.token.set(stored.auth_token.clone()).await;

        // local decoding only names the subject; the profile fetch is what
        // confirms the identity
        match self.api.fetch_profile(claims.user_id).await {
            Ok(profile) => {
                self.transition(SessionState::Authenticated { profile }).await;
                SessionStatus::Authenticated
            }
            Err(e) => {
                tracing::warn!("could not confirm stored identity: {}", e);
                self.invalidate().await;
                SessionStatus::Unauthenticated
            }
        }
    }

    /// Persist-then-commit. A storage failure rolls the in-memory state
    /// back to unauthenticated and surfaces the error.
    #[instrument(skip_all)]
    pub async fn login(&self, tokens: TokenPair, profile: Profile) -> Result<(), Error> {
        let credentials = StoredCredentials {
            auth_token: tokens.access.clone(),
            refresh_token: tokens.refresh,
        };

        if let Err(e) = self.store.save(&credentials).await {
            self.token.clear().await;
            self.transition(SessionState::Unauthenticated).await;

            return Err(Error::Store(e));
        }

        self.token.set(tokens.access).await;
        self.transition(SessionState::Authenticated { profile }).await;

        Ok(())
    }

    /// Exchange credentials for a token pair, confirm the embedded subject
    /// against the profile endpoint, then commit.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Profile, Error> {
        let tokens = self.api.obtain_token(credentials).await?;
        let claims = claims::decode(&tokens.access)?;

        self.token.set(tokens.access.clone()).await;

        match self.api.fetch_profile(claims.user_id).await {
            Ok(profile) => {
                self.login(tokens, profile.clone()).await?;

                Ok(profile)
            }
            Err(e) => {
                self.token.clear().await;

                Err(e)
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn sign_up(&self, registration: &Registration) -> Result<Profile, Error> {
        self.validate(registration)?;

        let response = self.api.register(registration).await?;

        let tokens = TokenPair {
            access: response.access,
            refresh: response.refresh,
        };

        self.login(tokens, response.user.clone()).await?;

        Ok(response.user)
    }

    fn validate(&self, registration: &Registration) -> Result<(), Error> {
        if !self.username_pattern.is_match(&registration.username) {
            return Err(Error::InvalidUsername);
        }

        if !self.email_pattern.is_match(&registration.email) {
            return Err(Error::InvalidEmail);
        }

        if registration.password.len() < 8 {
            return Err(Error::InvalidPassword(
                "password must be at least 8 characters".to_owned(),
            ));
        }

        Ok(())
    }

    /// Tell the server to drop the refresh token, then clean up locally no
    /// matter what it answered. The client is never left authenticated
    /// after this returns.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        let refresh_token = match self.store.load().await {
            Ok(Some(stored)) => Some(stored.refresh_token),
            _ => None,
        };

        if let Some(refresh_token) = refresh_token {
            if let Err(e) = self.api.logout(&refresh_token).await {
                tracing::warn!("server-side logout failed: {}", e);
            }
        }

        self.invalidate().await;
    }

    #[instrument(skip_all)]
    pub async fn refresh_user(&self) -> Result<Profile, Error> {
        let subject_id = self.subject_id().await.ok_or(Error::NoSession)?;

        match self.api.fetch_profile(subject_id).await {
            Ok(profile) => {
                self.transition(SessionState::Authenticated {
                    profile: profile.clone(),
                })
                .await;

                Ok(profile)
            }
            Err(e) => {
                self.invalidate().await;

                Err(e)
            }
        }
    }

    /// In-memory merge only; callers persist edits through
    /// `RemoteApi::update_profile` first.
    pub async fn update_user(&self, update: ProfileUpdate) {
        let mut state = self.state.write().await;

        if let SessionState::Authenticated { profile } = &mut *state {
            profile.apply(update);
        }
    }

    /// Route every remote result through here. An authorization failure
    /// tears the session down; everything else passes through untouched.
    pub async fn intercept<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(Error::Unauthorized) = &result {
            tracing::debug!("authorization failure, tearing down session");
            self.invalidate().await;
        }

        result
    }

    /// Unconditional local teardown. Idempotent: an already-unauthenticated
    /// session is left alone, so a 401 tears down at most once. Makes no
    /// network calls.
    pub(crate) async fn invalidate(&self) {
        {
            let mut state = self.state.write().await;

            if matches!(*state, SessionState::Unauthenticated) {
                return;
            }

            *state = SessionState::Unauthenticated;
        }

        self.token.clear().await;

        if let Err(e) = self.store.clear().await {
            tracing::warn!("failed to clear credential store: {}", e);
        }

        self.status_tx.send_replace(SessionStatus::Unauthenticated);
    }
}
