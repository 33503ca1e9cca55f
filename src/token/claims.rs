use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::core::error::Error;

#[derive(Deserialize, Serialize, Debug)]
pub struct Claims {
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    pub user_id: i64,
}

/// Recover the claims embedded in an access token without checking its
/// signature. The client never holds the signing secret; a decoded token
/// only identifies the subject, it does not prove the session is valid.
pub fn decode(token: &str) -> Result<Claims, Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();

    match jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(token_data) => Ok(token_data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(Error::ExpiredToken),
            _ => Err(Error::Jwt(e)),
        },
    }
}
