use crate::db::models::Recipe;
use crate::search::{RecipeQuery, SortOrder, Terms};
use crate::{Error, Result};
use reqwest::Client;

/// Turn command-line words into a recipe query
pub fn query_from_args(mut terms: Vec<String>, filter: Option<&str>) -> RecipeQuery {
    let terms = match terms.len() {
        0 => Terms::Any,
        1 => Terms::One(terms.remove(0)),
        _ => Terms::All(terms),
    };
    RecipeQuery::new(terms, SortOrder::from_key(filter))
}

/// Search for recipes on a running server
pub async fn search(server_url: &str, query: &RecipeQuery) -> Result<()> {
    let client = Client::new();

    let qs = query.to_query_string();
    let url = if qs.is_empty() {
        format!("{server_url}/recipes")
    } else {
        format!("{server_url}/recipes?{qs}")
    };

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Internal(format!(
            "Search failed with status {status}: {body}"
        )));
    }

    let recipes: Vec<Recipe> = response.json().await?;
    print_search_results(&recipes);

    Ok(())
}

fn print_search_results(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("No recipes found");
        return;
    }

    println!("\nFound {} recipes:\n", recipes.len());
    println!("{:<5} {:<40} {:>7} {:>8} {:<20}", "ID", "Name", "Rating", "Reviews", "Tags");
    println!("{}", "-".repeat(84));

    for recipe in recipes {
        let tags = recipe.tags.join(", ");

        println!(
            "{:<5} {:<40} {:>7.1} {:>8} {:<20}",
            recipe.id,
            truncate(&recipe.name, 38),
            recipe.review,
            recipe.total_reviews,
            truncate(&tags, 18)
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
