use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub height: Option<i32>,
    pub weight: Option<f64>,
    pub birth_date: Option<Date>,
    pub calorie_deficit: Option<i32>,
}

/// `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<Option<String>>,
    pub height: Option<Option<i32>>,
    pub weight: Option<Option<f64>>,
    pub birth_date: Option<Option<Date>>,
    pub calorie_deficit: Option<Option<i32>>,
}

pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, email, name, height, weight, birth_date, calorie_deficit
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find profile")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    changes: ProfileChanges,
) -> anyhow::Result<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        UPDATE users SET
            name = CASE WHEN $2 THEN $3 ELSE name END,
            height = CASE WHEN $4 THEN $5 ELSE height END,
            weight = CASE WHEN $6 THEN $7 ELSE weight END,
            birth_date = CASE WHEN $8 THEN $9 ELSE birth_date END,
            calorie_deficit = CASE WHEN $10 THEN $11 ELSE calorie_deficit END
        WHERE id = $1
        RETURNING id, email, name, height, weight, birth_date, calorie_deficit
        "#,
    )
    .bind(user_id)
    .bind(changes.name.is_some())
    .bind(changes.name.flatten())
    .bind(changes.height.is_some())
    .bind(changes.height.flatten())
    .bind(changes.weight.is_some())
    .bind(changes.weight.flatten())
    .bind(changes.birth_date.is_some())
    .bind(changes.birth_date.flatten())
    .bind(changes.calorie_deficit.is_some())
    .bind(changes.calorie_deficit.flatten())
    .fetch_optional(db)
    .await
    .context("update profile")?;
    Ok(row)
}
