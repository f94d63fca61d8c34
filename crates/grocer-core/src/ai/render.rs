//! Prompt rendering shared by the HTTP backends

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};

fn render(
    prompts: &RwLock<PromptLibrary>,
    id: PromptId,
    vars: &HashMap<&str, &str>,
) -> Result<String> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    prompts.render_user(id, vars)
}

/// Requested phrases with duplicates removed, first occurrence kept
pub(crate) fn unique_phrases(phrases: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    phrases
        .iter()
        .map(String::as_str)
        .filter(|p| seen.insert(*p))
        .collect()
}

pub(crate) fn match_products_prompt(
    prompts: &RwLock<PromptLibrary>,
    phrases: &[String],
    catalog_names: &[String],
) -> Result<String> {
    let catalog_json = serde_json::to_string(catalog_names)?;
    let items_json = serde_json::to_string(&unique_phrases(phrases))?;

    let mut vars = HashMap::new();
    vars.insert("catalog_json", catalog_json.as_str());
    vars.insert("items_json", items_json.as_str());
    render(prompts, PromptId::MatchProducts, &vars)
}

pub(crate) fn expand_meal_prompt(
    prompts: &RwLock<PromptLibrary>,
    description: &str,
) -> Result<String> {
    let mut vars = HashMap::new();
    vars.insert("meal", description);
    render(prompts, PromptId::ExpandMeal, &vars)
}

pub(crate) fn parse_flyer_prompt(prompts: &RwLock<PromptLibrary>, store: &str) -> Result<String> {
    let mut vars = HashMap::new();
    vars.insert("store", store);
    render(prompts, PromptId::ParseFlyer, &vars)
}

/// Guess an image MIME type from its magic bytes (defaults to JPEG)
pub(crate) fn image_mime_type(image_data: &[u8]) -> &'static str {
    if image_data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image_data.starts_with(b"RIFF") && image_data.get(8..12) == Some(&b"WEBP"[..]) {
        "image/webp"
    } else if image_data.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_phrases_keeps_first_occurrence() {
        let phrases = vec!["milk".to_string(), "eggs".to_string(), "milk".to_string()];
        assert_eq!(unique_phrases(&phrases), vec!["milk", "eggs"]);
    }

    #[test]
    fn test_match_products_prompt_embeds_json_lists() {
        let prompts = RwLock::new(PromptLibrary::embedded_only());
        let prompt = match_products_prompt(
            &prompts,
            &["milk".to_string(), "milk".to_string()],
            &["2% Milk 4L".to_string(), "Whole \"Milk\"".to_string()],
        )
        .unwrap();

        assert!(prompt.contains(r#"Requested items: ["milk"]"#));
        assert!(prompt.contains(r#"["2% Milk 4L","Whole \"Milk\""]"#));
    }

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type(&[0x89, b'P', b'N', b'G', 0x0d]), "image/png");
        assert_eq!(image_mime_type(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(image_mime_type(&[0xff, 0xd8, 0xff]), "image/jpeg");
    }
}
