//! Short code generation and validation utilities.
//!
//! Generated codes are derived from a SHA-256 digest of the original URL and
//! a salt, so the same input always produces the same candidate. Collision
//! handling lives in [`crate::application::services::UrlRegistry`], which
//! retries with a different salt.

use crate::error::AppError;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Hard upper bound for any short code, generated or custom.
pub const MAX_CODE_LENGTH: usize = 32;

/// Reserved codes that cannot be used as short links.
///
/// These collide with fixed routes and would never be reachable.
const RESERVED_CODES: &[&str] = &["api", "health"];

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Alphanumeric without `0 O I l 1`.
const UNAMBIGUOUS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

/// Character set used for generated codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    #[default]
    Alphanumeric,
    Unambiguous,
}

impl Alphabet {
    fn symbols(&self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => ALPHANUMERIC,
            Self::Unambiguous => UNAMBIGUOUS,
        }
    }
}

impl FromStr for Alphabet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alphanumeric" => Ok(Self::Alphanumeric),
            "unambiguous" => Ok(Self::Unambiguous),
            other => Err(format!(
                "unknown alphabet '{}', expected 'alphanumeric' or 'unambiguous'",
                other
            )),
        }
    }
}

/// Deterministic short code generator.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    alphabet: Alphabet,
}

impl CodeGenerator {
    /// Creates a generator producing codes of `length` characters.
    ///
    /// `length` is clamped to `1..=MAX_CODE_LENGTH`.
    pub fn new(length: usize, alphabet: Alphabet) -> Self {
        Self {
            length: length.clamp(1, MAX_CODE_LENGTH),
            alphabet,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Derives a candidate code from `original_url` and `salt`.
    ///
    /// Digest bytes are mapped onto the alphabet by rejection sampling, so
    /// every symbol is equally likely. When one digest runs out, the next
    /// block is hashed with an incremented block index.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let generator = CodeGenerator::new(7, Alphabet::Alphanumeric);
    /// let code = generator.generate("https://example.com", 1_700_000_000);
    /// assert_eq!(code.len(), 7);
    /// assert_eq!(code, generator.generate("https://example.com", 1_700_000_000));
    /// ```
    pub fn generate(&self, original_url: &str, salt: u64) -> String {
        let symbols = self.alphabet.symbols();
        let base = symbols.len();
        let accept_below = 256 - (256 % base);

        let mut code = String::with_capacity(self.length);
        let mut block: u32 = 0;

        while code.len() < self.length {
            let digest = Sha256::new()
                .chain_update(original_url.as_bytes())
                .chain_update(salt.to_be_bytes())
                .chain_update(block.to_be_bytes())
                .finalize();

            for byte in digest.iter().map(|&b| b as usize) {
                if byte < accept_below {
                    code.push(symbols[byte % base] as char);
                    if code.len() == self.length {
                        break;
                    }
                }
            }

            block += 1;
        }

        code
    }
}

/// Returns true if `code` could be a stored short code: 1 to
/// [`MAX_CODE_LENGTH`] characters from `[A-Za-z0-9_-]`.
pub fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: `min_length..=max_length` (`max_length` never above [`MAX_CODE_LENGTH`])
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Cannot be a reserved route word
///
/// # Errors
///
/// Returns [`AppError::InvalidCode`] if any validation rule is violated.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_custom_code("my-Link_24", 4, 20).is_ok());
/// assert!(validate_custom_code("abc", 4, 20).is_err());       // Too short
/// assert!(validate_custom_code("a/b/c/d", 4, 20).is_err());   // Path separator
/// ```
pub fn validate_custom_code(
    code: &str,
    min_length: usize,
    max_length: usize,
) -> Result<(), AppError> {
    let max_length = max_length.min(MAX_CODE_LENGTH);

    if code.len() < min_length || code.len() > max_length {
        return Err(AppError::invalid_code(
            format!(
                "Custom code must be {}-{} characters",
                min_length, max_length
            ),
            json!({ "provided_length": code.len() }),
        ));
    }

    if !is_well_formed(code) {
        return Err(AppError::invalid_code(
            "Custom code can only contain letters, digits, hyphens and underscores",
            json!({ "code": code }),
        ));
    }

    if RESERVED_CODES.iter().any(|r| r.eq_ignore_ascii_case(code)) {
        return Err(AppError::invalid_code(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn generator() -> CodeGenerator {
        CodeGenerator::new(7, Alphabet::Alphanumeric)
    }

    #[test]
    fn test_generate_has_configured_length() {
        assert_eq!(generator().generate("https://example.com", 1).len(), 7);
        assert_eq!(
            CodeGenerator::new(32, Alphabet::Alphanumeric)
                .generate("https://example.com", 1)
                .len(),
            32
        );
    }

    #[test]
    fn test_generate_is_alphanumeric() {
        for salt in 0..200 {
            let code = generator().generate("https://example.com", salt);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{}", code);
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let url = "https://example.com";
        assert_eq!(
            generator().generate(url, 1_234_567_890),
            generator().generate(url, 1_234_567_890)
        );
    }

    #[test]
    fn test_different_salts_give_different_codes() {
        let url = "https://example.com";
        assert_ne!(
            generator().generate(url, 1_234_567_890),
            generator().generate(url, 1_234_567_891)
        );
    }

    #[test]
    fn test_different_urls_rarely_collide() {
        let codes: HashSet<String> = (0..1000)
            .map(|i| generator().generate(&format!("https://example.com/{}", i), 42))
            .collect();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_unambiguous_alphabet_skips_lookalikes() {
        let generator = CodeGenerator::new(32, Alphabet::Unambiguous);

        for salt in 0..100 {
            let code = generator.generate("https://example.com", salt);
            assert!(!code.contains(['0', 'O', 'I', 'l', '1']), "{}", code);
        }
    }

    #[test]
    fn test_length_is_clamped() {
        assert_eq!(CodeGenerator::new(0, Alphabet::Alphanumeric).length(), 1);
        assert_eq!(
            CodeGenerator::new(100, Alphabet::Alphanumeric).length(),
            MAX_CODE_LENGTH
        );
    }

    #[test]
    fn test_alphabet_from_str() {
        assert_eq!("alphanumeric".parse::<Alphabet>(), Ok(Alphabet::Alphanumeric));
        assert_eq!("Unambiguous".parse::<Alphabet>(), Ok(Alphabet::Unambiguous));
        assert!("base64".parse::<Alphabet>().is_err());
    }

    #[test]
    fn test_validate_accepts_mixed_charset() {
        assert!(validate_custom_code("My-Link_2024", 4, 20).is_ok());
        assert!(validate_custom_code("abcd", 4, 20).is_ok());
    }

    #[test]
    fn test_validate_too_short() {
        let err = validate_custom_code("abc", 4, 20).unwrap_err();
        assert!(matches!(err, AppError::InvalidCode { .. }));
        assert!(err.to_string().contains("4-20 characters"));
    }

    #[test]
    fn test_validate_too_long() {
        assert!(validate_custom_code(&"a".repeat(21), 4, 20).is_err());
    }

    #[test]
    fn test_validate_max_is_capped() {
        assert!(validate_custom_code(&"a".repeat(33), 4, 64).is_err());
        assert!(validate_custom_code(&"a".repeat(32), 4, 64).is_ok());
    }

    #[test]
    fn test_validate_rejects_path_characters() {
        for code in ["my/code", "my code", "code?x=1", "caf\u{e9}12", "a.b.c.d"] {
            let err = validate_custom_code(code, 1, 20).unwrap_err();
            assert!(matches!(err, AppError::InvalidCode { .. }), "{}", code);
        }
    }

    #[test]
    fn test_validate_reserved_codes() {
        for &reserved in RESERVED_CODES {
            assert!(validate_custom_code(reserved, 1, 20).is_err());
        }
        assert!(validate_custom_code("HEALTH", 1, 20).is_err());
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("abc1234"));
        assert!(is_well_formed("a"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed(&"a".repeat(33)));
        assert!(!is_well_formed("favicon.ico"));
    }
}
