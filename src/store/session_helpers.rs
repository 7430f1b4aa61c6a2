use time::OffsetDateTime;

use crate::models::{Session, User};

use super::ContentStore;

impl ContentStore {
    /// Records a login. Sessions that have already expired are dropped here.
    pub fn open_session(&self, token: String, session: Session) {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut collections = self.write();
        collections.sessions.retain(|_, s| s.expires_at > now);
        collections.sessions.insert(token, session);
    }

    /// The user a live session was opened for.
    pub fn session_user(&self, token: &str) -> Option<User> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let collections = self.read();
        let session = collections
            .sessions
            .get(token)
            .filter(|s| s.expires_at > now)?;
        collections
            .users
            .iter()
            .find(|u| u.id == session.user_id)
            .cloned()
    }
}
