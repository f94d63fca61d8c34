//! JSON parsing helpers for AI backend responses
//!
//! Models are asked for bare JSON but often wrap it in a markdown code fence.
//! The fence is stripped, then the payload is decoded strictly: anything that
//! does not have exactly the requested shape is an error.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::Resolution;

use super::types::FlyerDeal;

/// Remove a surrounding markdown code fence (```json ... ```), if any
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(after_ticks) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the opening fence line (it may carry a language tag)
    let body = after_ticks.split_once('\n').map(|(_, b)| b).unwrap_or("");
    let body = body.rsplit_once("```").map(|(b, _)| b).unwrap_or(body);
    body.trim()
}

/// Shorten raw model output for error messages
fn truncate_raw(raw: &str) -> String {
    const MAX: usize = 200;
    if raw.len() <= MAX {
        return raw.to_string();
    }
    let mut end = MAX;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}

fn decode_json(response: &str) -> Result<Value> {
    let payload = strip_code_fence(response);
    serde_json::from_str(payload).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate_raw(payload)
        ))
    })
}

/// Decode a product matching response
///
/// The payload must be a JSON object whose keys are exactly the requested
/// phrases and whose values are product names or null. Returns one
/// resolution per input phrase, in input order.
pub fn parse_product_matches(response: &str, phrases: &[String]) -> Result<Vec<Resolution>> {
    let value = decode_json(response)?;
    let Value::Object(object) = value else {
        return Err(Error::InvalidData(format!(
            "Expected a JSON object of matches | Raw: {}",
            truncate_raw(strip_code_fence(response))
        )));
    };

    let requested: HashSet<&str> = phrases.iter().map(String::as_str).collect();
    if let Some(extra) = object.keys().find(|k| !requested.contains(k.as_str())) {
        return Err(Error::InvalidData(format!(
            "Match response contains unrequested item \"{}\"",
            extra
        )));
    }

    phrases
        .iter()
        .map(|phrase| match object.get(phrase) {
            Some(Value::String(name)) => Ok(Resolution::new(phrase.clone(), Some(name.clone()))),
            Some(Value::Null) => Ok(Resolution::unmatched(phrase.clone())),
            Some(other) => Err(Error::InvalidData(format!(
                "Match for \"{}\" must be a string or null, got {}",
                phrase, other
            ))),
            None => Err(Error::InvalidData(format!(
                "Match response is missing item \"{}\"",
                phrase
            ))),
        })
        .collect()
}

/// Decode a meal expansion response into trimmed, non-empty ingredient names
pub fn parse_ingredients(response: &str) -> Result<Vec<String>> {
    let value = decode_json(response)?;
    let Value::Array(items) = value else {
        return Err(Error::InvalidData(format!(
            "Expected a JSON array of ingredients | Raw: {}",
            truncate_raw(strip_code_fence(response))
        )));
    };

    let mut ingredients = Vec::with_capacity(items.len());
    for item in items {
        let Value::String(name) = item else {
            return Err(Error::InvalidData(format!(
                "Ingredient must be a string, got {}",
                item
            )));
        };
        let name = name.trim();
        if !name.is_empty() {
            ingredients.push(name.to_string());
        }
    }
    Ok(ingredients)
}

/// Decode a flyer vision response, discarding unusable deals
pub fn parse_flyer_deals(response: &str) -> Result<Vec<FlyerDeal>> {
    let value = decode_json(response)?;
    let Value::Array(items) = value else {
        return Err(Error::InvalidData(format!(
            "Expected a JSON array of deals | Raw: {}",
            truncate_raw(strip_code_fence(response))
        )));
    };

    let mut deals = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<FlyerDeal>(item) {
            Ok(mut deal) if deal.is_valid() => {
                deal.product_name = deal.product_name.trim().to_string();
                deals.push(deal);
            }
            Ok(deal) => warn!(
                product = %deal.product_name,
                price = deal.sale_price,
                "Discarding flyer deal without a name or positive price"
            ),
            Err(e) => warn!("Discarding malformed flyer deal: {}", e),
        }
    }
    Ok(deals)
}
