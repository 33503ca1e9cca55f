use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::instrument;

use crate::controllers::session::{SessionManager, SessionStatus};
use crate::core::client::RemoteApi;
use crate::core::error::Error;
use crate::token::store::CredentialStore;
use crate::types::response::Ride;

/// Client-side view of "do I hold an open reservation". The tracked ride is
/// a read-through cache with optimistic write-ahead updates; the server's
/// answer on the next poll always wins.
pub struct ReservationStateTracker<A, S> {
    api: Arc<A>,
    session: Arc<SessionManager<A, S>>,
    state: RwLock<Option<Ride>>,
}

impl<A, S> std::fmt::Debug for ReservationStateTracker<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationStateTracker").finish()
    }
}

impl<A: RemoteApi, S: CredentialStore> ReservationStateTracker<A, S> {
    pub fn new(api: Arc<A>, session: Arc<SessionManager<A, S>>) -> Self {
        Self {
            api,
            session,
            state: RwLock::new(None),
        }
    }

    pub async fn has_active(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn active_ride(&self) -> Option<Ride> {
        self.state.read().await.clone()
    }

    /// Fetch the subject's reservation list and replace the local state
    /// with it, reverting any optimistic update the server didn't keep.
    /// Safe to call repeatedly.
    #[instrument(skip_all)]
    pub async fn poll(&self) -> Result<Option<Ride>, Error> {
        let entries = self.session.intercept(self.api.history().await).await?;

        let active = entries.into_iter().next().map(|entry| entry.post);

        *self.state.write().await = active.clone();

        Ok(active)
    }

    /// Ride search feeding the reserve flow. Routed through the session
    /// interceptor like every other remote call, so an authorization
    /// failure here tears the session down too.
    #[instrument(skip_all)]
    pub async fn search(&self, depart: &str, arrival: &str) -> Result<Vec<Ride>, Error> {
        self.session
            .intercept(self.api.search_rides(depart, arrival).await)
            .await
    }

    /// Reserving while a reservation is outstanding is a usage error,
    /// rejected before any network call is made.
    #[instrument(skip_all)]
    pub async fn reserve(&self, ride: Ride) -> Result<(), Error> {
        if self.has_active().await {
            return Err(Error::AlreadyReserved);
        }

        self.session
            .intercept(self.api.reserve(ride.id).await)
            .await?;

        *self.state.write().await = Some(ride);

        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn cancel(&self) -> Result<(), Error> {
        let Some(ride) = self.active_ride().await else {
            return Err(Error::NoReservation);
        };

        self.session
            .intercept(self.api.cancel_reservation(ride.id).await)
            .await?;

        *self.state.write().await = None;

        Ok(())
    }

    /// Poll on a fixed cadence until the session goes away. Hosts drive
    /// this while a reservation-aware screen is focused.
    pub async fn run(&self, period: Duration) {
        loop {
            match self.session.status().await {
                SessionStatus::Authenticated => {
                    if let Err(e) = self.poll().await {
                        tracing::warn!("reservation poll failed: {}", e);
                    }
                }
                SessionStatus::Unauthenticated => {
                    tracing::debug!("session gone, stopping reservation poller");
                    break;
                }
                SessionStatus::Loading => (),
            }

            tokio::time::sleep(period).await;
        }
    }
}
