use axum::{
    extract::{Multipart, Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::{
    api::models::*,
    api::session::{MaybeSessionUser, SessionUser},
    db::{self, models::*},
    media::MediaClient,
    search::RecipeQuery,
    utils::validation,
    Error, Result,
};

/// Multipart field holding an uploaded image
const IMAGE_FIELD: &str = "image";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub media: Option<MediaClient>,
    pub settings: crate::config::Settings,
}

/// GET /recipes - Search and sort recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<Recipe>>> {
    debug!("List recipes request: {:?}", raw);

    let query = RecipeQuery::from_query_string(raw.as_deref())?;
    let recipes = query.fetch_all(&state.pool).await?;

    Ok(Json(recipes))
}

/// GET /recipes/:id - Get recipe details
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Recipe>> {
    debug!("Get recipe request: {}", id);

    let recipe = db::recipes::get_recipe(&state.pool, id).await?;
    Ok(Json(recipe))
}

/// POST /recipes - Submit a new recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    MaybeSessionUser(user): MaybeSessionUser,
    Json(new_recipe): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Recipe>)> {
    debug!("Create recipe request: {}", new_recipe.name);

    validation::validate_new_recipe(&new_recipe)?;

    let submitter = user.map(Submitter::from).unwrap_or_default();
    let recipe = db::recipes::create_recipe(&state.pool, &new_recipe, &submitter).await?;
    info!("Created recipe {} ({})", recipe.id, recipe.name);

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PATCH /recipes/:id - Replace any subset of a recipe's fields
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateRecipe>,
) -> Result<Json<Recipe>> {
    debug!("Update recipe request: {}", id);

    let recipe = db::recipes::update_recipe(&state.pool, id, &update).await?;
    Ok(Json(recipe))
}

/// DELETE /recipes/:id - Remove a recipe
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RedirectResponse>> {
    debug!("Delete recipe request: {}", id);

    db::recipes::delete_recipe(&state.pool, id).await?;
    info!("Deleted recipe {}", id);

    Ok(Json(RedirectResponse {
        redirect: "/recipes".to_string(),
    }))
}

/// POST /recipes/upload - Push an image to the media host
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let media = state
        .media
        .as_ref()
        .ok_or_else(|| Error::Config("Media uploads are not configured".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Failed to read multipart data: {}", e.body_text())))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("Failed to read file data: {}", e.body_text())))?;

        if data.is_empty() {
            return Err(Error::Validation("Uploaded image is empty".to_string()));
        }

        debug!("Upload image request: {} ({} bytes)", file_name, data.len());
        let url = media.upload(&file_name, data.to_vec()).await?;

        return Ok(Json(UploadResponse { url }));
    }

    Err(Error::Validation(format!(
        "Missing `{IMAGE_FIELD}` file field"
    )))
}

/// GET /recipes/created - Recipes submitted by the session user
pub async fn created_recipes(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<Vec<Recipe>>> {
    debug!("Created recipes request for user {}", user.user_id);

    let recipes = db::recipes::list_recipes_by_user(&state.pool, user.user_id).await?;
    Ok(Json(recipes))
}

/// GET /recipes/favorited - Recipes the session user has favorited
pub async fn favorited_recipes(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<Vec<Recipe>>> {
    debug!("Favorited recipes request for user {}", user.user_id);

    let account = db::users::get_user(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", user.user_id)))?;

    let recipes = db::recipes::list_recipes_by_ids(&state.pool, &account.favorite_recipes.0).await?;
    Ok(Json(recipes))
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// GET /ready - Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<ReadinessResponse>> {
    // Check database connectivity
    let db_healthy = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    Ok(Json(ReadinessResponse {
        ready: db_healthy,
        database: if db_healthy { "ok" } else { "error" }.to_string(),
        media: if state.media.is_some() {
            "configured"
        } else {
            "disabled"
        }
        .to_string(),
    }))
}
