use crate::database::{map_sqlx, unique_violation};
use crate::rows::UserRow;
use async_trait::async_trait;
use skybook_core::{NewUser, StorageError, UserRecord, UserRepository};
use skybook_shared::UserId;
use sqlx::PgPool;

const EMAIL_CONSTRAINT: &str = "users_email_key";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert_user(&self, user: NewUser) -> Result<UserId, StorageError> {
        let id = UserId::new();
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash, profile_image)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.password_hash.expose())
        .bind(user.profile_image.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(id),
            Err(err) if unique_violation(&err) == Some(EMAIL_CONSTRAINT) => {
                Err(StorageError::DuplicateEmail(user.email))
            }
            Err(err) => Err(map_sqlx(err)),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, first_name, last_name, password_hash, profile_image, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(UserRecord::from))
    }
}
