use serde::Serialize;

use crate::types::response::UserRole;

#[derive(Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Raw bytes of a picture submitted with a registration.
#[derive(Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub age: Option<u32>,
    pub license_picture: Option<Attachment>,
    pub profile_picture: Option<Attachment>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
