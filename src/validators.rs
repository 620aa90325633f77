/// Input validators
///
/// - Email: length limits and a practical RFC 5322 format check
/// - Chirp body: length limit and moderation of a fixed word list

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSORED: &str = "****";

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a chirp body and returns the moderated text
pub fn validate_chirp(body: &str) -> Result<String, ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyField("body".to_string()));
    }

    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("Chirp".to_string(), MAX_CHIRP_LENGTH));
    }

    Ok(clean_body(body))
}

/// Replace profane words with `****`
///
/// Words are split on single spaces and compared case-insensitively;
/// a word with attached punctuation ("Sharbert!") is left alone.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                CENSORED
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("a@x.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  walt@breakingbad.com ").unwrap(), "walt@breakingbad.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("").is_err());
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limit() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
    }

    #[test]
    fn test_clean_body() {
        assert_eq!(
            clean_body("I had something interesting for breakfast"),
            "I had something interesting for breakfast"
        );
        assert_eq!(
            clean_body("I hear Mastodon is better than Chirpy. sharbert I need to migrate"),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(
            clean_body("I really need a kerfuffle to go to bed sooner, Fornax !"),
            "I really need a **** to go to bed sooner, **** !"
        );
        assert_eq!(clean_body("Sharbert!"), "Sharbert!");
    }

    #[test]
    fn test_chirp_length() {
        assert!(validate_chirp(&"a".repeat(MAX_CHIRP_LENGTH)).is_ok());
        assert_eq!(
            validate_chirp(&"a".repeat(MAX_CHIRP_LENGTH + 1)),
            Err(ValidationError::TooLong("Chirp".to_string(), MAX_CHIRP_LENGTH))
        );
        assert!(validate_chirp("   ").is_err());
    }

    #[test]
    fn test_chirp_length_counts_characters() {
        assert!(validate_chirp(&"é".repeat(MAX_CHIRP_LENGTH)).is_ok());
    }
}
