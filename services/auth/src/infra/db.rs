use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use cinevault_auth_schema::users;
use cinevault_domain::credential::Email;
use cinevault_domain::user::UserRole;

use crate::domain::repository::CredentialStore;
use crate::domain::types::{AuthUser, NewUser};
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct DbCredentialStore {
    pub db: DatabaseConnection,
}

impl DbCredentialStore {
    /// Trivial statement for readiness checks.
    pub async fn ping(&self) -> Result<(), AuthServiceError> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .context("database ping")
            .map_err(AuthServiceError::upstream)?;
        Ok(())
    }
}

impl CredentialStore for DbCredentialStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .context("find user by email")
            .map_err(AuthServiceError::upstream)?;
        model.map(user_from_model).transpose()
    }

    async fn create(&self, user: &NewUser) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.as_str().to_owned()),
            password_hash: Set(user.password_hash.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            role: Set(i16::from(user.role.as_u8())),
            created_at: Set(user.created_at),
            updated_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .context("update password hash")
            .map_err(AuthServiceError::upstream)?;
        if result.rows_affected == 0 {
            return Err(AuthServiceError::NotFound);
        }
        Ok(())
    }
}

// The unique index on `email` settles concurrent registrations of one address.
fn map_insert_error(err: DbErr) -> AuthServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AuthServiceError::DuplicateUser,
        _ => AuthServiceError::upstream(anyhow::Error::new(err).context("create user")),
    }
}

fn user_from_model(model: users::Model) -> Result<AuthUser, AuthServiceError> {
    let role = u8::try_from(model.role)
        .ok()
        .and_then(UserRole::from_u8)
        .with_context(|| format!("user {} has unknown role {}", model.id, model.role))
        .map_err(AuthServiceError::Internal)?;
    Ok(AuthUser {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        first_name: model.first_name,
        last_name: model.last_name,
        role,
        created_at: model.created_at,
    })
}
