use crate::{
    authentication::verify_password,
    models::{Profile, User},
};

use super::{Collections, ContentStore, StoreError};

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub image: String,
}

/// Field updates for the signed-in user; `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    UnknownEmail,
    WrongPassword,
}

impl Collections {
    fn username_taken(&self, username: &str, except: Option<u64>) -> bool {
        self.users
            .iter()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

impl ContentStore {
    /// Appends a user and its profile. Username is checked before email.
    pub fn register_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut collections = self.write();
        if collections.username_taken(&new_user.username, None) {
            return Err(StoreError::Conflict("username"));
        }
        if collections.email_taken(&new_user.email, None) {
            return Err(StoreError::Conflict("email"));
        }

        collections.next_user_id += 1;
        let user = User {
            id: collections.next_user_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            bio: new_user.bio,
            image: new_user.image,
        };
        collections
            .profiles
            .entry(user.username.clone())
            .or_insert_with(|| Profile {
                username: user.username.clone(),
                bio: user.bio.clone(),
                image: user.image.clone(),
                following: false,
            });
        collections.users.push(user.clone());
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.read().users.iter().find(|u| u.email == email).cloned()
    }

    /// Exact email match, then an argon2 check of the password. The hash is
    /// verified after the lock is released.
    pub fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, LoginFailure> {
        let user = self
            .find_user_by_email(email)
            .ok_or(LoginFailure::UnknownEmail)?;
        match verify_password(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(LoginFailure::WrongPassword),
            Err(e) => {
                tracing::error!(error = %e, user_id = user.id, "Stored password hash is unreadable");
                Err(LoginFailure::WrongPassword)
            }
        }
    }

    pub fn update_user(&self, user_id: u64, changes: UserChanges) -> Result<User, StoreError> {
        let mut collections = self.write();
        let Some(index) = collections.users.iter().position(|u| u.id == user_id) else {
            return Err(StoreError::UnknownUser(user_id));
        };
        let old_username = collections.users[index].username.clone();

        if let Some(username) = &changes.username {
            if *username != old_username
                && (collections.username_taken(username, Some(user_id))
                    || collections.profiles.contains_key(username))
            {
                return Err(StoreError::Conflict("username"));
            }
        }
        if let Some(email) = &changes.email {
            if collections.email_taken(email, Some(user_id)) {
                return Err(StoreError::Conflict("email"));
            }
        }

        let user = &mut collections.users[index];
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        if let Some(image) = changes.image {
            user.image = image;
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        let user = user.clone();

        if user.username != old_username {
            collections.rename_profile(&old_username, &user.username);
        }
        if let Some(profile) = collections.profiles.get_mut(&user.username) {
            profile.bio = user.bio.clone();
            profile.image = user.image.clone();
        }
        Ok(user)
    }
}
