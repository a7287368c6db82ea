use crate::db::{models::User, DbPool};
use crate::error::{Error, Result};
use chrono::Utc;
use sqlx::types::Json;

/// Create a user record
pub async fn create_user(pool: &DbPool, name: &str) -> Result<User> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, favorite_recipes, created_at, updated_at)
        VALUES (?, '[]', ?, ?)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get user by ID
pub async fn get_user(pool: &DbPool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Add a recipe to a user's favorites (no-op if already present)
pub async fn add_favorite(pool: &DbPool, user_id: i64, recipe_id: i64) -> Result<User> {
    let user = get_user(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {user_id} not found")))?;

    let mut favorites = user.favorite_recipes.0;
    if favorites.contains(&recipe_id) {
        return Ok(User {
            favorite_recipes: Json(favorites),
            ..user
        });
    }
    favorites.push(recipe_id);

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET favorite_recipes = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(Json(&favorites))
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}
