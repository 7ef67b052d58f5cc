//! Username format rules and signup-time suggestions.
//!
//! Validation is pure and synchronous so pages can run it on every
//! keystroke; availability lives on the coordinator because it needs the
//! profile store.

use rand::Rng;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;

const MAX_SUGGESTIONS: usize = 3;

/// Why a username failed format validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsernameFormatError {
    #[error("username can only contain lowercase letters, numbers, underscore (_), and hyphen (-)")]
    DisallowedCharacter,
    #[error("username must be at least {USERNAME_MIN_LEN} characters long")]
    TooShort,
    #[error("username must be {USERNAME_MAX_LEN} characters or less")]
    TooLong,
}

/// Validate against `^[a-z0-9_-]{3,20}$`.
///
/// # Errors
///
/// Returns the first rule the name breaks, charset before length.
pub fn validate_username(name: &str) -> Result<(), UsernameFormatError> {
    if name.is_empty() || !name.bytes().all(is_allowed_byte) {
        return Err(UsernameFormatError::DisallowedCharacter);
    }
    if name.len() < USERNAME_MIN_LEN {
        return Err(UsernameFormatError::TooShort);
    }
    if name.len() > USERNAME_MAX_LEN {
        return Err(UsernameFormatError::TooLong);
    }
    Ok(())
}

fn is_allowed_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-'
}

/// Build at most three candidate usernames from name parts and birth year.
///
/// Deterministic given `rng`: the tie-breaker suffixes are the only random
/// input, so tests pin a seed. Every returned candidate passes
/// [`validate_username`]; overlong combinations are truncated and anything
/// unrepairable is dropped.
#[must_use]
pub fn suggest_usernames<R: Rng>(first_name: &str, last_name: &str, date_of_birth: &str, rng: &mut R) -> Vec<String> {
    let first = letters(first_name);
    let last = letters(last_name);
    if first.is_empty() || last.is_empty() {
        return Vec::new();
    }
    let first_initial = &first[..1];
    let last_initial = &last[..1];
    let year = birth_year(date_of_birth);

    let mut candidates: Vec<String> = Vec::new();
    if let Some(year) = year {
        candidates.push(format!("{first}{last}{year}"));
    }
    candidates.push(format!("{first}{last_initial}{}", rng.random_range(1..=999)));
    if let Some(year) = year {
        candidates.push(format!("{first_initial}{last_initial}{year}{}", rng.random_range(1..=99)));
    }
    candidates.push(format!("{first}_{last}"));
    if let Some(year) = year {
        candidates.push(format!("{first}-{last_initial}{:02}", year.rem_euclid(100)));
    }
    candidates.push(format!("{first_initial}{last}{}", rng.random_range(0..999)));

    let mut suggestions = Vec::new();
    for candidate in candidates {
        let Some(repaired) = repair(&candidate) else {
            continue;
        };
        if !suggestions.contains(&repaired) {
            suggestions.push(repaired);
            if suggestions.len() == MAX_SUGGESTIONS {
                break;
            }
        }
    }
    suggestions
}

/// [`suggest_usernames`] with the process RNG, for page scripts.
#[must_use]
pub fn suggest_usernames_default(first_name: &str, last_name: &str, date_of_birth: &str) -> Vec<String> {
    suggest_usernames(first_name, last_name, date_of_birth, &mut rand::rng())
}

/// Keep only the ASCII letters of a name, lowercased.
fn letters(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Year from a `YYYY-MM-DD` date string.
fn birth_year(date_of_birth: &str) -> Option<i32> {
    date_of_birth.trim().get(..4)?.parse().ok()
}

fn repair(candidate: &str) -> Option<String> {
    let truncated = if candidate.len() > USERNAME_MAX_LEN {
        &candidate[..USERNAME_MAX_LEN]
    } else {
        candidate
    };
    validate_username(truncated).ok()?;
    Some(truncated.to_owned())
}

#[cfg(test)]
#[path = "username_test.rs"]
mod tests;
