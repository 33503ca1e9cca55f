use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::types::request::ProfileUpdate;

#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Driver,
    Passenger,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Driver => "driver",
            UserRole::Passenger => "passenger",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub phone_number: Option<String>,
    #[serde(rename = "type_user")]
    pub role: UserRole,
    pub age: Option<u32>,
    #[serde(rename = "ppermis_ic")]
    pub license_picture: Option<String>,
    #[serde(rename = "user_pic")]
    pub profile_picture: Option<String>,
}

impl Profile {
    /// In-memory merge of a partial edit; the server copy is updated
    /// separately through `RemoteApi::update_profile`.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(email) = update.email {
            self.email = email;
        }

        if let Some(username) = update.username {
            self.username = username;
        }

        if let Some(phone_number) = update.phone_number {
            self.phone_number = Some(phone_number);
        }

        if let Some(age) = update.age {
            self.age = Some(age);
        }
    }
}

/// The `{"user": ...}` wrapper the profile endpoints answer with.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileEnvelope {
    pub user: Profile,
}

#[derive(Clone, Deserialize)]
pub struct RegisterResponse {
    pub user: Profile,
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Ride {
    pub id: i64,
    pub title: String,
    #[serde(rename = "author_post")]
    pub driver: String,
    pub depart_date: NaiveTime,
    pub arrival_date: NaiveTime,
    pub depart_place: String,
    pub arrival_place: String,
    pub number_of_places: i32,
    #[serde(rename = "animals_autorised")]
    pub animals_allowed: bool,
    pub smoker: bool,
    pub price: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub post: Ride,
    pub visitor: ProfileEnvelope,
    pub visited_at: String,
}
