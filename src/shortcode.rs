//! Short code generation and validation

use rand::RngExt;

/// Alphabet random codes are drawn from
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated codes when none is configured
pub const DEFAULT_LENGTH: usize = 6;

pub const MIN_LENGTH: usize = 3;
pub const MAX_LENGTH: usize = 20;

/// Generate a random short code of exactly `length` characters.
///
/// Uniqueness is not checked here; callers must handle collisions.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `code` is 3 to 20 ASCII alphanumeric characters
pub fn is_valid_format(code: &str) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_has_requested_length() {
        for length in [1, DEFAULT_LENGTH, MAX_LENGTH, 32] {
            assert_eq!(generate(length).len(), length);
        }
        assert!(generate(0).is_empty());
    }

    #[test]
    fn test_generate_uses_alphabet_only() {
        let code = generate(1000);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_covers_alphabet() {
        // 62 symbols over 20k draws: every symbol shows up with overwhelming probability
        let seen: HashSet<u8> = generate(20_000).bytes().collect();
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn test_generated_default_codes_are_valid() {
        for _ in 0..100 {
            assert!(is_valid_format(&generate(DEFAULT_LENGTH)));
        }
    }

    #[test]
    fn test_is_valid_format_bounds() {
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("ab"));
        assert!(is_valid_format("abc"));
        assert!(is_valid_format("A1b2C3"));
        assert!(is_valid_format(&"x".repeat(20)));
        assert!(!is_valid_format(&"x".repeat(21)));
    }

    #[test]
    fn test_is_valid_format_rejects_non_alphanumeric() {
        assert!(!is_valid_format("abc-def"));
        assert!(!is_valid_format("abc_def"));
        assert!(!is_valid_format("abc def"));
        assert!(!is_valid_format("abc/"));
        // Non-ASCII letters are not part of the alphabet
        assert!(!is_valid_format("abcé"));
        assert!(!is_valid_format("日本語"));
    }
}
