use serde::{Deserialize, Serialize};

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: String,
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Drops fields that are absent or empty; an empty string never clears
    /// a stored value.
    pub fn without_empty_fields(self) -> Self {
        fn keep(field: Option<String>) -> Option<String> {
            field.filter(|value| !value.is_empty())
        }
        UpdateUserRequest {
            email: keep(self.email),
            bio: keep(self.bio),
            image: keep(self.image),
            username: keep(self.username),
            password: keep(self.password),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.bio.is_none()
            && self.image.is_none()
            && self.username.is_none()
            && self.password.is_none()
    }
}
