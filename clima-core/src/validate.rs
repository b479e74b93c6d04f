//! City input policy: Latin letters (including the Spanish accented set), spaces, hyphens and
//! commas. Anything else is rejected before a request is built.

use crate::error::LookupError;

const ACCENTED: &[char] = &[
    'á', 'é', 'í', 'ó', 'ú', 'Á', 'É', 'Í', 'Ó', 'Ú', 'ñ', 'Ñ', 'ü', 'Ü',
];

/// Validate raw form input and return the trimmed city name.
pub fn validate_city(raw: &str) -> Result<String, LookupError> {
    let city = raw.trim();

    if city.is_empty() {
        return Err(LookupError::InvalidInput("city name is empty".to_string()));
    }

    if let Some(bad) = city.chars().find(|c| !is_allowed(*c)) {
        return Err(LookupError::InvalidInput(format!(
            "character {bad:?} is not allowed in a city name"
        )));
    }

    Ok(city.to_string())
}

pub fn is_allowed(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, ' ' | '-' | ',') || ACCENTED.contains(&c)
}
