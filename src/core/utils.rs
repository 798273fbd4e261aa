use rand::RngCore;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

use super::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_NAME_GRAPHEMES: usize = 256;
const FORBIDDEN_NAME_CHARACTERS: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed display name, or a validation error when it is empty, too long
/// or carries markup characters.
pub fn parse_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation_error("Name is required"));
    }
    if trimmed.graphemes(true).count() > MAX_NAME_GRAPHEMES {
        return Err(AppError::validation_error("Name is too long"));
    }
    if trimmed.chars().any(|c| FORBIDDEN_NAME_CHARACTERS.contains(&c)) {
        return Err(AppError::validation_error("Name contains invalid characters"));
    }
    Ok(trimmed.to_string())
}

/// Title columns are VARCHAR(255).
pub const MAX_TITLE_CHARS: usize = 255;

/// Non-empty trimmed title for books and courses.
pub fn parse_title(title: &str, what: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation_error(format!("{} title is required", what)));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation_error(format!(
            "{} title must be at most {} characters",
            what, MAX_TITLE_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// 32 random bytes, hex encoded.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn cache_key(prefix: &str, input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    format!("{}:{}", prefix, hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};
    use fake::faker::name::en::Name;
    use fake::Fake;

    #[test]
    fn emails_are_trimmed_and_lower_cased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn generated_names_are_accepted() {
        for _ in 0..20 {
            let name: String = Name().fake();
            assert_ok!(parse_name(&name));
        }
    }

    #[test]
    fn blank_and_markup_names_are_rejected() {
        assert_err!(parse_name("   "));
        assert_err!(parse_name("<script>"));
        assert_err!(parse_name(&"a".repeat(257)));
    }

    #[test]
    fn titles_are_trimmed() {
        assert_eq!(assert_ok!(parse_title("  Rust Book ", "Book")), "Rust Book");
        let err = assert_err!(parse_title(" ", "Course"));
        assert_eq!(err.message(), "Course title is required");
    }

    #[test]
    fn titles_are_capped_at_the_column_width() {
        let longest = "é".repeat(MAX_TITLE_CHARS);
        assert_eq!(assert_ok!(parse_title(&format!(" {} ", longest), "Book")), longest);

        let err = assert_err!(parse_title(&"a".repeat(MAX_TITLE_CHARS + 1), "Book"));
        assert_eq!(err.message(), "Book title must be at most 255 characters");
    }

    #[test]
    fn reset_tokens_are_64_hex_chars_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn cache_keys_are_stable_per_input() {
        assert_eq!(cache_key("ai", "hello"), cache_key("ai", "hello"));
        assert_ne!(cache_key("ai", "hello"), cache_key("ai", "hello!"));
        assert!(cache_key("drive", "x").starts_with("drive:"));
    }
}
