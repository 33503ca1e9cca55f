//! Shared test doubles, available to all `#[cfg(test)]` modules in the
//! crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use jsonwebtoken::{EncodingKey, Header};

use crate::core::client::RemoteApi;
use crate::core::error::Error;
use crate::token::claims::Claims;
use crate::token::store::{CredentialStore, StoredCredentials};
use crate::types::request::{Credentials, ProfileUpdate, Registration};
use crate::types::response::{
    HistoryEntry, Profile, ProfileEnvelope, RegisterResponse, Ride, TokenPair, UserRole,
};

/// Mint an access token the way the backend would. The signing secret is
/// arbitrary: the client decodes without verifying.
pub(crate) fn forge_token(user_id: i64, ttl_seconds: i64) -> String {
    let now = Utc::now().timestamp();

    let claims = Claims {
        exp: (now + ttl_seconds) as usize,
        iat: now as usize,
        user_id,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"remote-only-secret"),
    )
    .unwrap()
}

pub(crate) fn sample_profile(id: i64, username: &str) -> Profile {
    Profile {
        id,
        email: format!("{username}@example.com"),
        username: username.to_string(),
        phone_number: None,
        role: UserRole::Passenger,
        age: Some(24),
        license_picture: None,
        profile_picture: None,
    }
}

pub(crate) fn sample_ride(id: i64, title: &str) -> Ride {
    Ride {
        id,
        title: title.to_string(),
        driver: "karim".to_string(),
        depart_date: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        arrival_date: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        depart_place: "Tunis".to_string(),
        arrival_place: "Sousse".to_string(),
        number_of_places: 3,
        animals_allowed: false,
        smoker: false,
        price: 12.5,
    }
}

pub(crate) fn history_entry(ride: &Ride, visitor: &Profile) -> HistoryEntry {
    HistoryEntry {
        id: ride.id,
        post: ride.clone(),
        visitor: ProfileEnvelope {
            user: visitor.clone(),
        },
        visited_at: "2025-05-01 09:00".to_string(),
    }
}

/// Scripted stand-in for the backend.
#[derive(Default)]
pub(crate) struct StubApi {
    profile: Mutex<Option<Profile>>,
    tokens: Mutex<Option<TokenPair>>,
    rides: Mutex<Vec<Ride>>,
    history: Mutex<VecDeque<Vec<HistoryEntry>>>,
    unauthorized: AtomicBool,
    fail_logout: AtomicBool,
    fail_reserve: AtomicBool,
    fail_cancel: AtomicBool,
    register_count: AtomicUsize,
    profile_count: AtomicUsize,
    logout_count: AtomicUsize,
    reserve_count: AtomicUsize,
    cancel_count: AtomicUsize,
}

impl StubApi {
    pub(crate) fn set_profile(&self, profile: Profile) {
        *self.profile.lock().unwrap() = Some(profile);
    }

    pub(crate) fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.lock().unwrap() = Some(tokens);
    }

    pub(crate) fn set_rides(&self, rides: Vec<Ride>) {
        *self.rides.lock().unwrap() = rides;
    }

    /// Queue the answer for the next history poll; once drained, polls
    /// answer with an empty list.
    pub(crate) fn push_history(&self, entries: Vec<HistoryEntry>) {
        self.history.lock().unwrap().push_back(entries);
    }

    pub(crate) fn set_unauthorized(&self, value: bool) {
        self.unauthorized.store(value, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_logout(&self, value: bool) {
        self.fail_logout.store(value, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_reserve(&self, value: bool) {
        self.fail_reserve.store(value, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_cancel(&self, value: bool) {
        self.fail_cancel.store(value, Ordering::SeqCst);
    }

    pub(crate) fn register_calls(&self) -> usize {
        self.register_count.load(Ordering::SeqCst)
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_count.load(Ordering::SeqCst)
    }

    pub(crate) fn logout_calls(&self) -> usize {
        self.logout_count.load(Ordering::SeqCst)
    }

    pub(crate) fn reserve_calls(&self) -> usize {
        self.reserve_count.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_calls(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), Error> {
        if self.unauthorized.load(Ordering::SeqCst) {
            Err(Error::Unauthorized)
        } else {
            Ok(())
        }
    }
}

impl RemoteApi for StubApi {
    async fn register(&self, _registration: &Registration) -> Result<RegisterResponse, Error> {
        self.register_count.fetch_add(1, Ordering::SeqCst);

        let profile = self
            .profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Api("registration rejected".to_string()))?;

        let access = forge_token(profile.id, 3600);

        Ok(RegisterResponse {
            user: profile,
            access,
            refresh: "refresh-1".to_string(),
        })
    }

    async fn obtain_token(&self, _credentials: &Credentials) -> Result<TokenPair, Error> {
        self.tokens.lock().unwrap().clone().ok_or(Error::Unauthorized)
    }

    async fn fetch_profile(&self, id: i64) -> Result<Profile, Error> {
        self.profile_count.fetch_add(1, Ordering::SeqCst);
        self.gate()?;

        match self.profile.lock().unwrap().as_ref() {
            Some(profile) if profile.id == id => Ok(profile.clone()),
            _ => Err(Error::Unauthorized),
        }
    }

    async fn logout(&self, _refresh_token: &str) -> Result<(), Error> {
        self.logout_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(Error::Api("invalid refresh token".to_string()));
        }

        Ok(())
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<Profile, Error> {
        self.gate()?;

        self.profile.lock().unwrap().clone().ok_or(Error::Unauthorized)
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, Error> {
        self.gate()?;

        Ok(self.history.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn search_rides(&self, depart: &str, arrival: &str) -> Result<Vec<Ride>, Error> {
        self.gate()?;

        Ok(self
            .rides
            .lock()
            .unwrap()
            .iter()
            .filter(|ride| ride.depart_place == depart && ride.arrival_place == arrival)
            .cloned()
            .collect())
    }

    async fn reserve(&self, _ride_id: i64) -> Result<(), Error> {
        self.gate()?;
        self.reserve_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_reserve.load(Ordering::SeqCst) {
            return Err(Error::Api("ride already reserved".to_string()));
        }

        Ok(())
    }

    async fn cancel_reservation(&self, _ride_id: i64) -> Result<(), Error> {
        self.gate()?;
        self.cancel_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(Error::Api("ride is not reserved".to_string()));
        }

        Ok(())
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    slot: Mutex<Option<StoredCredentials>>,
    fail_saves: AtomicBool,
    clear_count: AtomicUsize,
}

/// In-memory secure storage. Clones share the same slot so a test can keep
/// a handle while the session manager owns another.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore(Arc<MemoryStoreInner>);

impl MemoryStore {
    pub(crate) fn seed(&self, credentials: StoredCredentials) {
        *self.0.slot.lock().unwrap() = Some(credentials);
    }

    pub(crate) fn stored(&self) -> Option<StoredCredentials> {
        self.0.slot.lock().unwrap().clone()
    }

    pub(crate) fn set_fail_saves(&self, value: bool) {
        self.0.fail_saves.store(value, Ordering::SeqCst);
    }

    pub(crate) fn clear_calls(&self) -> usize {
        self.0.clear_count.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryStore {
    async fn load(&self) -> Result<Option<StoredCredentials>, std::io::Error> {
        Ok(self.0.slot.lock().unwrap().clone())
    }

    async fn save(&self, credentials: &StoredCredentials) -> Result<(), std::io::Error> {
        if self.0.fail_saves.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("secure storage unavailable"));
        }

        *self.0.slot.lock().unwrap() = Some(credentials.clone());

        Ok(())
    }

    async fn clear(&self) -> Result<(), std::io::Error> {
        self.0.clear_count.fetch_add(1, Ordering::SeqCst);

        *self.0.slot.lock().unwrap() = None;

        Ok(())
    }
}
