use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Thumbs-up / thumbs-down tallies nested inside a recipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRatings {
    pub count_positive: i64,
    pub count_negative: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Json<Vec<String>>,
    pub tags: Json<Vec<String>>,
    pub instructions: Json<Vec<String>>,
    pub num_servings: Option<i64>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub review: f64,
    pub total_reviews: i64,
    #[sqlx(flatten)]
    pub user_ratings: UserRatings,
    pub nutrition: Option<Json<serde_json::Value>>,
    pub video_url: Option<String>,
    pub alt_image_url: Option<String>,
    pub credits: Option<String>,
    pub user_num: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a client submits when creating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub num_servings: Option<i64>,
    #[serde(default)]
    pub prep_time: Option<i64>,
    #[serde(default)]
    pub cook_time: Option<i64>,
    #[serde(default)]
    pub nutrition: Option<serde_json::Value>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub alt_image_url: Option<String>,
}

/// Who submitted a recipe, taken from the request's session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submitter {
    pub credits: Option<String>,
    pub user_num: Option<i64>,
}

/// Partial update: every present field replaces the stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRecipe {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub num_servings: Option<i64>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub review: Option<f64>,
    pub total_reviews: Option<i64>,
    pub user_ratings: Option<UserRatings>,
    pub nutrition: Option<serde_json::Value>,
    pub video_url: Option<String>,
    pub alt_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub favorite_recipes: Json<Vec<i64>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Drop repeated tags, keeping the first occurrence of each in order
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Case-folded name, tags and ingredients that search terms match against
pub fn search_keys(name: &str, tags: &[String], ingredients: &[String]) -> Vec<String> {
    std::iter::once(name)
        .chain(tags.iter().map(String::as_str))
        .chain(ingredients.iter().map(String::as_str))
        .map(crate::search::fold_case)
        .collect()
}
