use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use crate::core::error::{ConfigError, Error};
use crate::token::TokenCell;
use crate::types::request::{Credentials, ProfileUpdate, Registration};
use crate::types::response::{HistoryEntry, Profile, ProfileEnvelope, RegisterResponse, Ride, TokenPair};

/// The remote half of the application. Everything the backend owns sits
/// behind this seam so the session and reservation layers can be exercised
/// against a double.
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
    async fn register(&self, registration: &Registration) -> Result<RegisterResponse, Error>;

    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, Error>;

    async fn fetch_profile(&self, id: i64) -> Result<Profile, Error>;

    async fn logout(&self, refresh_token: &str) -> Result<(), Error>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, Error>;

    async fn history(&self) -> Result<Vec<HistoryEntry>, Error>;

    async fn search_rides(&self, depart: &str, arrival: &str) -> Result<Vec<Ride>, Error>;

    async fn reserve(&self, ride_id: i64) -> Result<(), Error>;

    async fn cancel_reservation(&self, ride_id: i64) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    url: String,
    token: TokenCell,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("url", &self.url).finish()
    }
}

impl Client {
    pub fn new(
        user_agent: &str,
        url: &str,
        timeout: Duration,
        token: TokenCell,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path)
    }

    /// Attach the current access token, if one exists at call time.
    async fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.get().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.endpoint(path))).await
    }

    async fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.endpoint(path))).await
    }

    async fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.patch(self.endpoint(path))).await
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        Err(Error::Api(Self::error_message(response).await))
    }

    /// Pull the server's own wording out of an error body; the caller shows
    /// it verbatim.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();

        match response.json::<serde_json::Value>().await {
            Ok(body) => ["error", "detail", "message"]
                .iter()
                .find_map(|key| {
                    body.get(key)
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("request failed with status {status}")),
            Err(_) => format!("request failed with status {status}"),
        }
    }
}

impl RemoteApi for Client {
    #[instrument(skip_all)]
    async fn register(&self, registration: &Registration) -> Result<RegisterResponse, Error> {
        let mut form = Form::new()
            .text("email", registration.email.clone())
            .text("username", registration.username.clone())
            .text("password", registration.password.clone())
            .text("type_user", registration.role.as_str());

        if let Some(phone_number) = &registration.phone_number {
            form = form.text("phone_number", phone_number.clone());
        }

        if let Some(age) = registration.age {
            form = form.text("age", age.to_string());
        }

        if let Some(picture) = &registration.license_picture {
            form = form.part(
                "ppermis_ic",
                Part::bytes(picture.bytes.clone()).file_name(picture.filename.clone()),
            );
        }

        if let Some(picture) = &registration.profile_picture {
            form = form.part(
                "user_pic",
                Part::bytes(picture.bytes.clone()).file_name(picture.filename.clone()),
            );
        }

        let response = self.post("register").await.multipart(form).send().await?;

        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip_all)]
    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, Error> {
        let response = self.post("token").await.json(credentials).send().await?;

        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, id: i64) -> Result<Profile, Error> {
        let response = self.get(&format!("user/id/{id}")).await.send().await?;

        let envelope: ProfileEnvelope = Self::check(response).await?.json().await?;

        Ok(envelope.user)
    }

    #[instrument(skip_all)]
    async fn logout(&self, refresh_token: &str) -> Result<(), Error> {
        let response = self
            .post("user/logout")
            .await
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    #[instrument(skip_all)]
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, Error> {
        let response = self.patch("user/update").await.json(update).send().await?;

        let envelope: ProfileEnvelope = Self::check(response).await?.json().await?;

        Ok(envelope.user)
    }

    #[instrument(skip_all)]
    async fn history(&self) -> Result<Vec<HistoryEntry>, Error> {
        let response = self.get("user/history").await.send().await?;

        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip_all)]
    async fn search_rides(&self, depart: &str, arrival: &str) -> Result<Vec<Ride>, Error> {
        let response = self
            .get(&format!("posts/find/{depart}/{arrival}"))
            .await
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip_all)]
    async fn reserve(&self, ride_id: i64) -> Result<(), Error> {
        let response = self
            .post(&format!("posts/reservation/{ride_id}"))
            .await
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    #[instrument(skip_all)]
    async fn cancel_reservation(&self, ride_id: i64) -> Result<(), Error> {
        let response = self
            .post(&format!("posts/reservation_annule/{ride_id}"))
            .await
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }
}
