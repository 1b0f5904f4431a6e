use crate::repository::{NewUser, UserRepository};
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};
use crate::{CoreError, CoreResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::Deserialize;
use skybook_shared::{Masked, User, UserId};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct HashingParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingParams {
    fn hasher(&self) -> CoreResult<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| CoreError::InternalError(format!("Invalid hashing parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Registration input. The avatar is an opaque, already-processed blob.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: Masked<String>,
    pub avatar: Option<Vec<u8>>,
}

/// Verified against when the email is unknown, so that every login pays
/// for one hash verification.
const UNKNOWN_ACCOUNT_PASSWORD: &str = "unknown-account-placeholder";

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hashing: HashingParams,
    unknown_account_hash: Arc<OnceCell<Masked<String>>>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, hashing: HashingParams) -> Self {
        Self {
            users,
            hashing,
            unknown_account_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn register(&self, account: NewAccount) -> CoreResult<UserId> {
        let email = normalize_email(&account.email);
        validate_email(&email)?;
        validate_password(account.password.expose())?;
        validate_name("First name", &account.first_name)?;
        validate_name("Last name", &account.last_name)?;

        let password_hash = self.hash_password(account.password).await?;
        let user_id = self
            .users
            .insert_user(NewUser {
                email: email.clone(),
                first_name: account.first_name.trim().to_string(),
                last_name: account.last_name.trim().to_string(),
                password_hash,
                profile_image: account.avatar,
            })
            .await?;

        tracing::info!(%user_id, "Registered account {}", email);
        Ok(user_id)
    }

    /// Unknown email, malformed email and wrong password are all reported
    /// as [`CoreError::AuthFailure`].
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<User> {
        let email = normalize_email(email);
        if validate_email(&email).is_err() {
            return Err(CoreError::AuthFailure);
        }

        let record = match self.users.find_user_by_email(&email).await? {
            Some(record) => record,
            None => {
                tracing::debug!("Login attempt for unknown account {}", email);
                let stored = self.unknown_account_hash().await?;
                self.verify_password(stored, Masked::new(password.to_string()))
                    .await?;
                return Err(CoreError::AuthFailure);
            }
        };

        let verified = self
            .verify_password(record.password_hash, Masked::new(password.to_string()))
            .await?;
        if !verified {
            tracing::debug!(user_id = %record.user.id, "Password mismatch");
            return Err(CoreError::AuthFailure);
        }

        Ok(record.user)
    }

    /// Hash of a fixed password under the configured cost, computed once.
    async fn unknown_account_hash(&self) -> CoreResult<Masked<String>> {
        self.unknown_account_hash
            .get_or_try_init(|| self.hash_password(Masked::from(UNKNOWN_ACCOUNT_PASSWORD)))
            .await
            .cloned()
    }

    async fn hash_password(&self, password: Masked<String>) -> CoreResult<Masked<String>> {
        let argon = self.hashing.hasher()?;
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon
                .hash_password(password.expose().as_bytes(), &salt)
                .map(|hash| Masked::new(hash.to_string()))
                .map_err(|e| CoreError::InternalError(format!("Password hashing failed: {}", e)))
        })
        .await
        .map_err(|e| CoreError::InternalError(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(
        &self,
        stored: Masked<String>,
        candidate: Masked<String>,
    ) -> CoreResult<bool> {
        // Cost parameters are read from the stored hash
        let argon = self.hashing.hasher()?;
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(stored.expose())
                .map_err(|e| CoreError::InternalError(format!("Stored hash is malformed: {}", e)))?;
            Ok(argon
                .verify_password(candidate.expose().as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|e| CoreError::InternalError(format!("Hashing task failed: {}", e)))?
    }
}
