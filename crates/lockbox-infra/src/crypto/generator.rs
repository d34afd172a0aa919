//! Credential generator.
//!
//! Draws characters uniformly from the enabled character classes using the OS
//! CSPRNG. Never seeded, never a general-purpose PRNG.

use lockbox_types::error::CryptoError;
use lockbox_types::generator::{GeneratorOptions, MAX_PASSWORD_LENGTH, MIN_STRONG_LENGTH};
use rand::Rng;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Visually confusable characters removed by `exclude_ambiguous`.
pub const AMBIGUOUS: &[char] = &['0', 'O', '1', 'l', 'I'];

fn class(chars: &str, exclude_ambiguous: bool) -> Vec<char> {
    chars
        .chars()
        .filter(|c| !exclude_ambiguous || !AMBIGUOUS.contains(c))
        .collect()
}

/// Union of the enabled classes. Classes are disjoint, so no duplicates.
fn alphabet(options: &GeneratorOptions) -> Vec<char> {
    let mut chars = Vec::new();
    if options.use_upper {
        chars.extend(class(UPPER, options.exclude_ambiguous));
    }
    if options.use_lower {
        chars.extend(class(LOWER, options.exclude_ambiguous));
    }
    if options.use_digits {
        chars.extend(class(DIGITS, options.exclude_ambiguous));
    }
    if options.use_symbols {
        chars.extend(class(SYMBOLS, options.exclude_ambiguous));
    }
    chars
}

fn check_max_length(length: usize) -> Result<(), CryptoError> {
    if length > MAX_PASSWORD_LENGTH {
        return Err(CryptoError::InvalidConfiguration(format!(
            "length cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn pick(rng: &mut OsRng, chars: &[char]) -> char {
    chars[rng.gen_range(0..chars.len())]
}

/// Generate a credential from `options`.
///
/// Fails with `InvalidConfiguration` before drawing any randomness when the
/// length is zero or above `MAX_PASSWORD_LENGTH`, or no class is enabled.
pub fn generate(options: &GeneratorOptions) -> Result<String, CryptoError> {
    if options.length == 0 {
        return Err(CryptoError::InvalidConfiguration(
            "length must be at least 1".to_string(),
        ));
    }
    check_max_length(options.length)?;
    if !options.any_class_enabled() {
        return Err(CryptoError::InvalidConfiguration(
            "at least one character class must be enabled".to_string(),
        ));
    }

    let chars = alphabet(options);
    let mut rng = OsRng;
    Ok((0..options.length).map(|_| pick(&mut rng, &chars)).collect())
}

/// Strong password over all four classes, ambiguous characters allowed.
pub fn generate_strong_password(length: usize) -> Result<String, CryptoError> {
    generate_strong_with(length, false)
}

/// Strong password guaranteed to contain at least one upper, lower, digit and
/// symbol character.
///
/// One character is drawn from each class, the rest from the combined
/// alphabet, then the whole sequence is shuffled so the guaranteed characters
/// sit at random positions. Lengths below 4 are rejected, not clamped.
pub fn generate_strong_with(length: usize, exclude_ambiguous: bool) -> Result<String, CryptoError> {
    if length < MIN_STRONG_LENGTH {
        return Err(CryptoError::InvalidConfiguration(format!(
            "strong passwords need at least {MIN_STRONG_LENGTH} characters"
        )));
    }
    check_max_length(length)?;

    let classes = [
        class(UPPER, exclude_ambiguous),
        class(LOWER, exclude_ambiguous),
        class(DIGITS, exclude_ambiguous),
        class(SYMBOLS, exclude_ambiguous),
    ];
    let all: Vec<char> = classes.concat();

    let mut rng = OsRng;
    let mut password: Vec<char> = classes.iter().map(|c| pick(&mut rng, c)).collect();
    password.extend((MIN_STRONG_LENGTH..length).map(|_| pick(&mut rng, &all)));
    password.shuffle(&mut rng);

    Ok(password.into_iter().collect())
}

/// Entropy of a credential drawn uniformly with `options`, in bits.
///
/// Zero when the options cannot generate anything.
pub fn estimate_entropy_bits(options: &GeneratorOptions) -> f64 {
    let size = alphabet(options).len();
    if size == 0 || options.length == 0 {
        return 0.0;
    }
    options.length as f64 * (size as f64).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_each_class(password: &str) -> bool {
        password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| SYMBOLS.contains(c))
    }

    #[test]
    fn test_generate_respects_length() {
        for length in [1, 8, 16, 64] {
            let options = GeneratorOptions {
                length,
                ..Default::default()
            };
            assert_eq!(generate(&options).unwrap().chars().count(), length);
        }
    }

    #[test]
    fn test_generate_only_enabled_classes() {
        let options = GeneratorOptions {
            length: 200,
            use_upper: false,
            use_lower: false,
            use_digits: true,
            use_symbols: false,
            exclude_ambiguous: false,
        };
        let value = generate(&options).unwrap();
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_no_class_is_error() {
        let options = GeneratorOptions {
            use_upper: false,
            use_lower: false,
            use_digits: false,
            use_symbols: false,
            ..Default::default()
        };
        assert!(matches!(
            generate(&options),
            Err(CryptoError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_generate_zero_length_is_error() {
        let options = GeneratorOptions {
            length: 0,
            ..Default::default()
        };
        assert!(matches!(
            generate(&options),
            Err(CryptoError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_exclude_ambiguous() {
        let options = GeneratorOptions {
            length: 500,
            exclude_ambiguous: true,
            ..Default::default()
        };
        for _ in 0..10 {
            let value = generate(&options).unwrap();
            assert!(!value.chars().any(|c| AMBIGUOUS.contains(&c)), "{value}");
        }

        for _ in 0..10 {
            let value = generate_strong_with(100, true).unwrap();
            assert!(!value.chars().any(|c| AMBIGUOUS.contains(&c)), "{value}");
        }
    }

    #[test]
    fn test_ambiguous_digits_reduce_to_two_through_nine() {
        assert_eq!(class(DIGITS, true).iter().collect::<String>(), "23456789");
        assert_eq!(class(UPPER, true).len(), 24);
        assert_eq!(class(LOWER, true).len(), 25);
        assert_eq!(class(SYMBOLS, true).len(), SYMBOLS.len());
    }

    #[test]
    fn test_strong_password_contains_every_class() {
        for length in [4, 5, 8, 16, 32, 128] {
            for _ in 0..25 {
                let password = generate_strong_password(length).unwrap();
                assert_eq!(password.chars().count(), length);
                assert!(has_each_class(&password), "{password}");
            }
        }
    }

    #[test]
    fn test_strong_password_too_short_is_error() {
        for length in 0..MIN_STRONG_LENGTH {
            assert!(matches!(
                generate_strong_password(length),
                Err(CryptoError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_strong_password_guaranteed_chars_not_fixed() {
        // With a fixed class order the first character would always be upper-case.
        let leading_upper = (0..200)
            .filter(|_| {
                generate_strong_password(4)
                    .unwrap()
                    .starts_with(|c: char| c.is_ascii_uppercase())
            })
            .count();
        assert!(leading_upper < 200);
    }

    #[test]
    fn test_generated_values_differ() {
        let a = generate_strong_password(32).unwrap();
        let b = generate_strong_password(32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_entropy_estimate() {
        let options = GeneratorOptions {
            length: 10,
            use_upper: false,
            use_lower: false,
            use_digits: true,
            use_symbols: false,
            exclude_ambiguous: false,
        };
        let bits = estimate_entropy_bits(&options);
        assert!((bits - 10.0 * 10f64.log2()).abs() < 1e-9);

        let none = GeneratorOptions {
            use_digits: false,
            ..options
        };
        assert_eq!(estimate_entropy_bits(&none), 0.0);
    }

    #[test]
    fn test_length_above_maximum_is_error() {
        for length in [MAX_PASSWORD_LENGTH + 1, usize::MAX] {
            let options = GeneratorOptions {
                length,
                ..Default::default()
            };
            assert!(matches!(
                generate(&options),
                Err(CryptoError::InvalidConfiguration(_))
            ));
            assert!(matches!(
                generate_strong_with(length, false),
                Err(CryptoError::InvalidConfiguration(_))
            ));
        }

        let options = GeneratorOptions {
            length: MAX_PASSWORD_LENGTH,
            ..Default::default()
        };
        assert_eq!(generate(&options).unwrap().chars().count(), MAX_PASSWORD_LENGTH);
        assert_eq!(
            generate_strong_password(MAX_PASSWORD_LENGTH).unwrap().chars().count(),
            MAX_PASSWORD_LENGTH
        );
    }
}
