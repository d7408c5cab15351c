use async_trait::async_trait;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use sqlx::QueryBuilder;
use sqlx::Sqlite;
use sqlx::SqlitePool;

use crate::domain::user::models::BirthDate;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    name: Option<String>,
    phone_number: Option<String>,
    birth_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            name: r.name.map(DisplayName::new).transpose()?,
            phone_number: r.phone_number.map(PhoneNumber::new).transpose()?,
            birth_date: r.birth_date.map(BirthDate::new).transpose()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// A row that no longer passes validation is a storage fault, not caller input.
fn into_user(row: UserRow) -> Result<User, UserError> {
    let id = row.id;
    User::try_from(row)
        .map_err(|e| UserError::DatabaseError(format!("stored user {} is invalid: {}", id, e)))
}

/// Translate a failed write, surfacing email uniqueness as its own outcome.
fn write_error(e: sqlx::Error, email: Option<&EmailAddress>) -> UserError {
    if let (Some(db_err), Some(email)) = (e.as_database_error(), email) {
        if db_err.is_unique_violation() {
            return UserError::EmailAlreadyExists(email.to_string());
        }
    }
    UserError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, email: &EmailAddress, password_hash: &str) -> Result<User, UserError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, email, password_hash, name, phone_number, birth_date, created_at, updated_at
            "#,
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Some(email)))?;

        into_user(row)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, phone_number, birth_date, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(into_user).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, phone_number, birth_date, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(into_user).transpose()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &UpdateProfileCommand,
    ) -> Result<User, UserError> {
        // Single statement: existence is decided by the UPDATE itself.
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(name) = &update.name {
            query.push(", name = ").push_bind(name.as_str().to_string());
        }
        if let Some(email) = &update.email {
            query.push(", email = ").push_bind(email.as_str().to_string());
        }
        if let Some(phone_number) = &update.phone_number {
            query
                .push(", phone_number = ")
                .push_bind(phone_number.as_str().to_string());
        }
        if let Some(birth_date) = &update.birth_date {
            query.push(", birth_date = ").push_bind(birth_date.date());
        }

        query.push(" WHERE id = ").push_bind(id.0);
        query.push(
            " RETURNING id, email, password_hash, name, phone_number, birth_date, created_at, updated_at",
        );

        let row = query
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, update.email.as_ref()))?;

        match row {
            Some(r) => into_user(r),
            None => Err(UserError::NotFound(id.to_string())),
        }
    }
}
