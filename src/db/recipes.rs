use crate::db::{models::*, DbPool};
use crate::error::{Error, Result};
use chrono::Utc;
use sqlx::types::Json;

/// Create a new recipe
pub async fn create_recipe(
    pool: &DbPool,
    new_recipe: &NewRecipe,
    submitter: &Submitter,
) -> Result<Recipe> {
    let now = Utc::now();
    let tags = dedup_tags(new_recipe.tags.clone());
    let keys = search_keys(&new_recipe.name, &tags, &new_recipe.ingredients);

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (
            name, description, ingredients, tags, instructions,
            num_servings, prep_time, cook_time, review, total_reviews,
            count_positive, count_negative, nutrition, video_url, alt_image_url,
            credits, user_num, search_keys, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 0, 0, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&new_recipe.name)
    .bind(&new_recipe.description)
    .bind(Json(&new_recipe.ingredients))
    .bind(Json(&tags))
    .bind(Json(&new_recipe.instructions))
    .bind(new_recipe.num_servings)
    .bind(new_recipe.prep_time)
    .bind(new_recipe.cook_time)
    .bind(new_recipe.nutrition.as_ref().map(Json))
    .bind(&new_recipe.video_url)
    .bind(&new_recipe.alt_image_url)
    .bind(&submitter.credits)
    .bind(submitter.user_num)
    .bind(Json(keys))
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(recipe)
}

/// Get recipe by ID
pub async fn get_recipe(pool: &DbPool, recipe_id: i64) -> Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Recipe {recipe_id} not found")))?;

    Ok(recipe)
}

/// Replace the fields present in `update`, leaving the rest untouched
pub async fn update_recipe(pool: &DbPool, recipe_id: i64, update: &UpdateRecipe) -> Result<Recipe> {
    let ratings = update.user_ratings;
    let counts = [
        update.total_reviews,
        ratings.map(|r| r.count_positive),
        ratings.map(|r| r.count_negative),
    ];
    if counts.iter().flatten().any(|count| *count < 0) {
        return Err(Error::Validation(
            "Review and rating counts must be non-negative".to_string(),
        ));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        UPDATE recipes
        SET name = COALESCE(?, name),
            description = COALESCE(?, description),
            ingredients = COALESCE(?, ingredients),
            tags = COALESCE(?, tags),
            instructions = COALESCE(?, instructions),
            num_servings = COALESCE(?, num_servings),
            prep_time = COALESCE(?, prep_time),
            cook_time = COALESCE(?, cook_time),
            review = COALESCE(?, review),
            total_reviews = COALESCE(?, total_reviews),
            count_positive = COALESCE(?, count_positive),
            count_negative = COALESCE(?, count_negative),
            nutrition = COALESCE(?, nutrition),
            video_url = COALESCE(?, video_url),
            alt_image_url = COALESCE(?, alt_image_url),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.ingredients.as_ref().map(Json))
    .bind(update.tags.clone().map(|tags| Json(dedup_tags(tags))))
    .bind(update.instructions.as_ref().map(Json))
    .bind(update.num_servings)
    .bind(update.prep_time)
    .bind(update.cook_time)
    .bind(update.review)
    .bind(update.total_reviews)
    .bind(ratings.map(|r| r.count_positive))
    .bind(ratings.map(|r| r.count_negative))
    .bind(update.nutrition.as_ref().map(Json))
    .bind(&update.video_url)
    .bind(&update.alt_image_url)
    .bind(now)
    .bind(recipe_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Recipe {recipe_id} not found")))?;

    // Searchable text changed, so the folded keys must follow
    if update.name.is_some() || update.tags.is_some() || update.ingredients.is_some() {
        let keys = search_keys(&recipe.name, &recipe.tags.0, &recipe.ingredients.0);
        sqlx::query("UPDATE recipes SET search_keys = ? WHERE id = ?")
            .bind(Json(keys))
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(recipe)
}

/// Delete recipe
pub async fn delete_recipe(pool: &DbPool, recipe_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Recipe {recipe_id} not found")));
    }

    Ok(())
}

/// List recipes submitted by a user
pub async fn list_recipes_by_user(pool: &DbPool, user_id: i64) -> Result<Vec<Recipe>> {
    let recipes = sqlx::query_as::<_, Recipe>(
        "SELECT * FROM recipes WHERE user_num = ? ORDER BY name ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(recipes)
}

/// Fetch a batch of recipes by ID; unknown IDs are skipped
pub async fn list_recipes_by_ids(pool: &DbPool, recipe_ids: &[i64]) -> Result<Vec<Recipe>> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    // One JSON array bind keeps large lists clear of SQLite's variable limit
    let recipes = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT * FROM recipes
        WHERE id IN (SELECT value FROM json_each(?))
        ORDER BY name ASC, id ASC
        "#,
    )
    .bind(Json(recipe_ids))
    .fetch_all(pool)
    .await?;

    Ok(recipes)
}

/// Count all recipes
pub async fn count_all_recipes(pool: &DbPool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    fn pancakes() -> NewRecipe {
        NewRecipe {
            name: "Pancakes".to_string(),
            description: Some("Fluffy".to_string()),
            ingredients: vec!["2 eggs".to_string(), "1 cup milk".to_string()],
            tags: vec![
                "breakfast".to_string(),
                "sweet".to_string(),
                "breakfast".to_string(),
            ],
            instructions: vec!["Mix".to_string(), "Fry".to_string()],
            num_servings: Some(4),
            prep_time: Some(5),
            cook_time: Some(15),
            nutrition: Some(serde_json::json!({"calories": 350})),
            video_url: None,
            alt_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_recipe_crud() {
        let pool = init_memory_pool().await.unwrap();

        let submitter = Submitter {
            credits: Some("Ada".to_string()),
            user_num: Some(7),
        };
        let recipe = create_recipe(&pool, &pancakes(), &submitter).await.unwrap();
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.tags.0, vec!["breakfast", "sweet"]);
        assert_eq!(recipe.review, 0.0);
        assert_eq!(recipe.total_reviews, 0);
        assert_eq!(recipe.user_ratings, UserRatings::default());
        assert_eq!(recipe.credits.as_deref(), Some("Ada"));
        assert_eq!(recipe.user_num, Some(7));
        assert_eq!(recipe.nutrition.as_ref().unwrap().0["calories"], 350);

        // Get recipe
        let retrieved = get_recipe(&pool, recipe.id).await.unwrap();
        assert_eq!(retrieved.id, recipe.id);
        assert_eq!(retrieved.instructions.0, vec!["Mix", "Fry"]);

        // Partial update leaves other fields alone
        let updated = update_recipe(
            &pool,
            recipe.id,
            &UpdateRecipe {
                name: Some("Buttermilk Pancakes".to_string()),
                total_reviews: Some(3),
                user_ratings: Some(UserRatings {
                    count_positive: 2,
                    count_negative: 1,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Buttermilk Pancakes");
        assert_eq!(updated.total_reviews, 3);
        assert_eq!(updated.user_ratings.count_positive, 2);
        assert_eq!(updated.ingredients.0, vec!["2 eggs", "1 cup milk"]);
        assert!(updated.updated_at >= recipe.updated_at);

        // Delete
        delete_recipe(&pool, recipe.id).await.unwrap();
        assert!(matches!(
            get_recipe(&pool, recipe.id).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(count_all_recipes(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_recipe_is_not_found() {
        let pool = init_memory_pool().await.unwrap();

        assert!(matches!(get_recipe(&pool, 42).await, Err(Error::NotFound(_))));
        assert!(matches!(
            delete_recipe(&pool, 42).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            update_recipe(&pool, 42, &UpdateRecipe::default()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_negative_counts() {
        let pool = init_memory_pool().await.unwrap();
        let recipe = create_recipe(&pool, &pancakes(), &Submitter::default())
            .await
            .unwrap();

        let result = update_recipe(
            &pool,
            recipe.id,
            &UpdateRecipe {
                total_reviews: Some(-1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_by_user_and_ids() {
        let pool = init_memory_pool().await.unwrap();
        let mine = Submitter {
            credits: None,
            user_num: Some(1),
        };

        let mut waffles = pancakes();
        waffles.name = "Waffles".to_string();
        let a = create_recipe(&pool, &waffles, &mine).await.unwrap();
        let b = create_recipe(&pool, &pancakes(), &mine).await.unwrap();
        let c = create_recipe(&pool, &pancakes(), &Submitter::default())
            .await
            .unwrap();

        let by_user = list_recipes_by_user(&pool, 1).await.unwrap();
        let names: Vec<_> = by_user.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pancakes", "Waffles"]);

        let by_ids = list_recipes_by_ids(&pool, &[a.id, c.id, 999]).await.unwrap();
        let ids: Vec<_> = by_ids.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, a.id]);
        assert!(!ids.contains(&b.id));

        assert!(list_recipes_by_ids(&pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_ids_handles_large_batches() {
        let pool = init_memory_pool().await.unwrap();
        let recipe = create_recipe(&pool, &pancakes(), &Submitter::default())
            .await
            .unwrap();

        // Well past SQLite's default limit on bound variables
        let mut ids: Vec<i64> = (100_000..140_000).collect();
        ids.push(recipe.id);

        let found = list_recipes_by_ids(&pool, &ids).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, recipe.id);
    }

    #[tokio::test]
    async fn test_update_refreshes_search_keys() {
        let pool = init_memory_pool().await.unwrap();
        let recipe = create_recipe(&pool, &pancakes(), &Submitter::default())
            .await
            .unwrap();

        let keys: (Json<Vec<String>>,) =
            sqlx::query_as("SELECT search_keys FROM recipes WHERE id = ?")
                .bind(recipe.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(
            keys.0 .0,
            vec!["pancakes", "breakfast", "sweet", "2 eggs", "1 cup milk"]
        );

        update_recipe(
            &pool,
            recipe.id,
            &UpdateRecipe {
                name: Some("CRÊPES".to_string()),
                tags: Some(vec!["Dessert".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let keys: (Json<Vec<String>>,) =
            sqlx::query_as("SELECT search_keys FROM recipes WHERE id = ?")
                .bind(recipe.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(keys.0 .0, vec!["crêpes", "dessert", "2 eggs", "1 cup milk"]);
    }
}
