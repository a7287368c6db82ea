// Validation utilities
use crate::db::models::NewRecipe;
use crate::error::{Error, Result};
use tracing::warn;
use url::Url;

/// Validate a media reference is an absolute http(s) URL with a host
pub fn validate_media_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            warn!("Rejected media URL with scheme {}: {}", scheme, url_str);
            return Err(Error::Validation(format!(
                "Media URL must use http or https scheme: {url_str}"
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(Error::Validation("Media URL must have a valid host".to_string()));
    }

    Ok(url)
}

/// Check a recipe submission before it is stored
pub fn validate_new_recipe(recipe: &NewRecipe) -> Result<()> {
    if recipe.name.trim().is_empty() {
        return Err(Error::Validation("Recipe name is required".to_string()));
    }

    let counts = [
        ("num_servings", recipe.num_servings),
        ("prep_time", recipe.prep_time),
        ("cook_time", recipe.cook_time),
    ];
    for (field, value) in counts {
        if value.is_some_and(|v| v < 0) {
            return Err(Error::Validation(format!("{field} must be non-negative")));
        }
    }

    for url in [&recipe.video_url, &recipe.alt_image_url].into_iter().flatten() {
        validate_media_url(url)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_media_url() {
        assert!(validate_media_url("https://res.cloudinary.com/demo/pie.png").is_ok());
        assert!(validate_media_url("http://youtube.com/watch?v=abc").is_ok());

        assert!(validate_media_url("ftp://example.com/pie.png").is_err());
        assert!(validate_media_url("javascript:alert(1)").is_err());
        assert!(validate_media_url("not-a-url").is_err());
    }

    #[test]
    fn test_validate_new_recipe() {
        let mut recipe = NewRecipe {
            name: "Pie".to_string(),
            alt_image_url: Some("https://res.cloudinary.com/demo/pie.png".to_string()),
            ..Default::default()
        };
        assert!(validate_new_recipe(&recipe).is_ok());

        recipe.prep_time = Some(-5);
        assert!(matches!(
            validate_new_recipe(&recipe),
            Err(Error::Validation(_))
        ));

        recipe.prep_time = Some(5);
        recipe.video_url = Some("file:///etc/passwd".to_string());
        assert!(validate_new_recipe(&recipe).is_err());

        recipe.video_url = None;
        recipe.name = "   ".to_string();
        assert!(validate_new_recipe(&recipe).is_err());
    }
}
