use serde::{Deserialize, Serialize};

use super::repo_types::User;

/// Request body for `POST /user/create`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request body for `POST /user/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Partial profile update; also the normalized form of a full `PUT`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceMeRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl From<ReplaceMeRequest> for UpdateMeRequest {
    fn from(r: ReplaceMeRequest) -> Self {
        Self {
            email: Some(r.email),
            name: Some(r.name),
            password: Some(r.password),
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub name: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
        }
    }
}
