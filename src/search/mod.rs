//! Recipe listing queries.
//!
//! A [`RecipeQuery`] pairs the caller's search [`Terms`] with a single
//! [`SortOrder`]. Building it does no I/O; the SQL is assembled and run only
//! when [`RecipeQuery::fetch_all`] is awaited.
//!
//! Terms are matched against each recipe's `search_keys` column, which holds
//! the name, tags and ingredients folded with [`fold_case`] when the recipe is
//! written. Folding both sides in Rust keeps matching Unicode-aware; SQLite's
//! own `lower()` only handles ASCII.

pub mod params;

use crate::db::{models::Recipe, DbPool};
use crate::error::Result;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

/// Escape character used in every `LIKE ... ESCAPE` clause
const LIKE_ESCAPE: char = '\\';

/// Free-text search terms matched against name, tags and ingredients
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Terms {
    /// No filtering, every recipe matches
    #[default]
    Any,
    /// One term that must appear in the name, a tag or an ingredient
    One(String),
    /// Every term must appear, each in any of the three fields
    All(Vec<String>),
}

impl Terms {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Terms::Any => &[],
            Terms::One(term) => std::slice::from_ref(term),
            Terms::All(terms) => terms,
        }
    }
}

impl From<Vec<String>> for Terms {
    fn from(terms: Vec<String>) -> Self {
        if terms.is_empty() {
            Terms::Any
        } else {
            Terms::All(terms)
        }
    }
}

/// Result ordering, selected by the `filter` request parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most reviewed first
    Popular,
    /// Most recently updated first
    Recent,
    /// Best review score first
    HighlyRated,
    /// Alphabetical by name
    #[default]
    Name,
}

impl SortOrder {
    /// Map a sort key to its order. Keys are case-sensitive; anything
    /// unrecognized falls back to alphabetical.
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("Popular") => SortOrder::Popular,
            Some("Recent") => SortOrder::Recent,
            Some("Highly Rated") => SortOrder::HighlyRated,
            _ => SortOrder::Name,
        }
    }

    /// The key clients send to request this order, if it has one
    pub fn key(self) -> Option<&'static str> {
        match self {
            SortOrder::Popular => Some("Popular"),
            SortOrder::Recent => Some("Recent"),
            SortOrder::HighlyRated => Some("Highly Rated"),
            SortOrder::Name => None,
        }
    }

    /// `ORDER BY` body. `id` breaks ties so repeated queries agree.
    fn order_clause(self) -> &'static str {
        match self {
            SortOrder::Popular => "total_reviews DESC, id ASC",
            SortOrder::Recent => "updated_at DESC, id ASC",
            SortOrder::HighlyRated => "review DESC, id ASC",
            SortOrder::Name => "name ASC, id ASC",
        }
    }
}

/// Escape `LIKE` metacharacters so `text` only ever matches literally
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case folding applied to search terms and to stored search keys alike
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive "contains" pattern for one search term
fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(&fold_case(term)))
}

/// A not-yet-executed recipe listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub terms: Terms,
    pub sort: SortOrder,
}

impl RecipeQuery {
    pub fn new(terms: Terms, sort: SortOrder) -> Self {
        Self { terms, sort }
    }

    /// Assemble the SQL for this query
    pub fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new("SELECT * FROM recipes");

        for (i, term) in self.terms.as_slice().iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            push_term_clause(&mut builder, &contains_pattern(term));
        }

        builder.push(" ORDER BY ");
        builder.push(self.sort.order_clause());
        builder
    }

    /// Run the query
    pub async fn fetch_all(&self, pool: &DbPool) -> Result<Vec<Recipe>> {
        debug!(
            "Recipe query: {} term(s), sort {:?}",
            self.terms.as_slice().len(),
            self.sort
        );

        let mut builder = self.build();
        let recipes = builder
            .build_query_as::<Recipe>()
            .fetch_all(pool)
            .await?;

        Ok(recipes)
    }
}

/// Any folded name, tag or ingredient contains the pattern
fn push_term_clause(builder: &mut QueryBuilder<'static, Sqlite>, pattern: &str) {
    builder.push("EXISTS (SELECT 1 FROM json_each(recipes.search_keys) WHERE json_each.value LIKE ");
    builder.push_bind(pattern.to_string());
    builder.push(" ESCAPE '\\')");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewRecipe, Submitter};
    use crate::db::{init_memory_pool, recipes};
    use sqlx::Execute;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("egg"), "egg");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        // Regex metacharacters mean nothing to LIKE
        assert_eq!(escape_like("a.b*"), "a.b*");
    }

    #[test]
    fn test_contains_pattern_lowercases() {
        assert_eq!(contains_pattern("EGG"), "%egg%");
        assert_eq!(contains_pattern("50%_Off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("ÉCLAIR"), "%éclair%");
    }

    #[test]
    fn test_sort_key_selects_exactly_one_order() {
        assert_eq!(SortOrder::from_key(Some("Popular")), SortOrder::Popular);
        assert_eq!(SortOrder::from_key(Some("Recent")), SortOrder::Recent);
        assert_eq!(
            SortOrder::from_key(Some("Highly Rated")),
            SortOrder::HighlyRated
        );
        assert_eq!(SortOrder::from_key(None), SortOrder::Name);
        assert_eq!(SortOrder::from_key(Some("popular")), SortOrder::Name);
        assert_eq!(SortOrder::from_key(Some("Oldest")), SortOrder::Name);

        for order in [
            SortOrder::Popular,
            SortOrder::Recent,
            SortOrder::HighlyRated,
            SortOrder::Name,
        ] {
            assert_eq!(SortOrder::from_key(order.key()), order);
        }
    }

    #[test]
    fn test_build_without_terms_is_unfiltered() {
        let query = RecipeQuery::new(Terms::Any, SortOrder::Popular);
        let mut builder = query.build();
        let sql = builder.build().sql().to_string();
        assert_eq!(
            sql,
            "SELECT * FROM recipes ORDER BY total_reviews DESC, id ASC"
        );
    }

    #[test]
    fn test_build_joins_terms_with_and() {
        let query = RecipeQuery::new(
            Terms::All(vec!["egg".to_string(), "milk".to_string()]),
            SortOrder::Name,
        );
        let mut builder = query.build();
        let sql = builder.build().sql().to_string();

        assert_eq!(sql.matches(" WHERE EXISTS").count(), 1);
        assert_eq!(sql.matches(" AND EXISTS").count(), 1);
        assert_eq!(sql.matches("LIKE").count(), 2);
        assert!(!sql.contains("lower("));
        assert!(sql.ends_with("ORDER BY name ASC, id ASC"));
    }

    #[tokio::test]
    async fn test_fetch_all_matches_tags_and_ingredients() {
        let pool = init_memory_pool().await.unwrap();

        for (name, tags, ingredients) in [
            ("Omelette", vec!["Breakfast"], vec!["3 EGGS", "butter"]),
            ("Pasta", vec!["dinner"], vec!["flour", "water"]),
            ("Custard", vec!["dessert"], vec!["milk", "sugar"]),
        ] {
            let recipe = NewRecipe {
                name: name.to_string(),
                tags: tags.into_iter().map(String::from).collect(),
                ingredients: ingredients.into_iter().map(String::from).collect(),
                ..Default::default()
            };
            recipes::create_recipe(&pool, &recipe, &Submitter::default())
                .await
                .unwrap();
        }

        let by_ingredient = RecipeQuery::new(Terms::One("egg".to_string()), SortOrder::Name)
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(by_ingredient.len(), 1);
        assert_eq!(by_ingredient[0].name, "Omelette");

        let by_tag = RecipeQuery::new(Terms::One("breakfast".to_string()), SortOrder::Name)
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);

        let all = RecipeQuery::default().fetch_all(&pool).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Custard", "Omelette", "Pasta"]);
    }
}
