//! Registration, login and sessions.

use chrono::Utc;
use uuid::Uuid;

use super::Marketplace;
use super::password;
use super::validation::validate_registration;
use crate::error::Error;
use crate::error::Result;
use crate::model::NewUser;
use crate::model::Role;
use crate::model::Session;
use crate::model::User;

impl Marketplace {
    /// Creates an account with any role. Used by admins and the CLI.
    pub async fn create_account(&self, input: NewUser) -> Result<User> {
        validate_registration(&input.email, &input.name, &input.password)?;

        let user = User {
            id: Uuid::new_v4(),
            email: input.email.trim().to_lowercase(),
            name: input.name.trim().to_string(),
            role: input.role,
            created_at: Utc::now(),
        };
        let hash = password::hash_password(&input.password);
        if !self.db.users().insert(&user, &hash).await? {
            return Err(Error::conflict(format!("email {} is already registered", user.email)));
        }
        log::info!("Created {} account {}", user.role, user.email);
        Ok(user)
    }

    /// Public sign-up. Only BUYER and SELLER may be chosen.
    pub async fn register(&self, input: NewUser) -> Result<User> {
        if !matches!(input.role, Role::Buyer | Role::Seller) {
            return Err(Error::invalid("role", "must be BUYER or SELLER"));
        }
        self.create_account(input).await
    }

    /// Checks credentials and opens a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Session, User)> {
        let found = self.db.users().find_credentials(email.trim()).await?;
        let Some((user, _)) = found.filter(|(_, hash)| password::verify_password(password, hash)) else {
            log::info!("Failed login for {}", email.trim());
            return Err(Error::unauthorized("invalid email or password"));
        };

        let now = Utc::now();
        let session = Session {
            token: password::generate_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.config.session_ttl,
        };
        self.db.sessions().insert(&session).await?;
        log::debug!("Opened session for {}", user.email);
        Ok((session, user))
    }

    /// Closes a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.db.sessions().delete(token).await?;
        Ok(())
    }

    /// Resolves a session token to its user. Expired sessions are removed
    /// and rejected.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let session = self
            .db
            .sessions()
            .find(token)
            .await?
            .ok_or_else(|| Error::unauthorized("unknown session"))?;

        if session.is_expired() {
            self.db.sessions().delete(token).await?;
            return Err(Error::unauthorized("session expired"));
        }

        self.db
            .users()
            .find(session.user_id)
            .await?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }
}
