use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ResetRequest, User};

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(db)
        .await
        .context("create user")?;
        Ok(user)
    }

    pub async fn set_password_hash(
        conn: &mut PgConnection,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(conn)
            .await
            .context("update password hash")?;
        Ok(res.rows_affected() == 1)
    }
}

impl ResetRequest {
    /// Drops the user's earlier requests and stores a new one.
    pub async fn replace_for(
        conn: &mut PgConnection,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<ResetRequest> {
        sqlx::query("DELETE FROM password_reset_requests WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .context("delete old reset requests")?;

        let row = sqlx::query_as::<_, ResetRequest>(
            r#"
            INSERT INTO password_reset_requests (id, user_id, token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&mut *conn)
        .await
        .context("insert reset request")?;
        Ok(row)
    }

    /// Deletes and returns the request, so a token can be taken once.
    pub async fn take(conn: &mut PgConnection, token: &str) -> anyhow::Result<Option<ResetRequest>> {
        let row = sqlx::query_as::<_, ResetRequest>(
            r#"
            DELETE FROM password_reset_requests
            WHERE token = $1
            RETURNING id, user_id, token, expires_at
            "#,
        )
        .bind(token)
        .fetch_optional(conn)
        .await
        .context("take reset request")?;
        Ok(row)
    }
}
