//! Bidirectional mapping between domain enums and their stored string form.
//!
//! Application code works with symbolic tags; the database stores plain text
//! whose case convention differs per table (roles are persisted upper-case,
//! statuses lower-case). Each enum declares its own rule through
//! [`PersistedEnum`], and [`encode`]/[`decode`] apply it. Decoding accepts
//! any casing of a known tag and never falls back to a default variant.

use thiserror::Error;

/// Case convention a column uses for an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredCase {
    Lower,
    Upper,
}

/// A domain enum with a fixed stored string representation.
///
/// `tag` must return the canonical lower-case tag; `VARIANTS` must list
/// every variant exactly once so decoding can probe the full set.
pub trait PersistedEnum: Copy + Eq + Sized + 'static {
    /// Diagnostic label used in error messages (e.g. `"user role"`).
    const NAME: &'static str;
    /// Case convention of the storage column.
    const STORED_CASE: StoredCase;
    /// All variants, in declaration order.
    const VARIANTS: &'static [Self];

    /// Canonical lower-case tag for this variant.
    fn tag(self) -> &'static str;
}

/// Stored string did not match any variant of the enumeration.
///
/// This is a data-integrity condition, not user input: a row was written
/// with a value the application does not recognize.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {enumeration} value: {value:?}")]
pub struct UnknownEnumValue {
    pub enumeration: &'static str,
    pub value: String,
}

/// Renders the variant in the case convention its column expects.
#[must_use]
pub fn encode<E: PersistedEnum>(value: E) -> String {
    match E::STORED_CASE {
        StoredCase::Lower => value.tag().to_owned(),
        StoredCase::Upper => value.tag().to_ascii_uppercase(),
    }
}

/// Parses a stored string back into the enum, tolerating any casing.
///
/// Matches the lower-cased input against the canonical tags first, then
/// attempts one exact match against the raw input before failing.
///
/// # Errors
///
/// Returns [`UnknownEnumValue`] when the string matches no variant.
pub fn decode<E: PersistedEnum>(raw: &str) -> Result<E, UnknownEnumValue> {
    let lowered = raw.to_ascii_lowercase();
    for &variant in E::VARIANTS {
        if variant.tag() == lowered {
            return Ok(variant);
        }
    }
    for &variant in E::VARIANTS {
        if variant.tag() == raw {
            return Ok(variant);
        }
    }
    Err(UnknownEnumValue {
        enumeration: E::NAME,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
    }

    impl PersistedEnum for Light {
        const NAME: &'static str = "light";
        const STORED_CASE: StoredCase = StoredCase::Upper;
        const VARIANTS: &'static [Self] = &[Light::Red, Light::Green];

        fn tag(self) -> &'static str {
            match self {
                Light::Red => "red",
                Light::Green => "green",
            }
        }
    }

    #[test]
    fn encode_applies_stored_case() {
        assert_eq!(encode(Light::Red), "RED");
        assert_eq!(encode(Light::Green), "GREEN");
    }

    #[test]
    fn decode_round_trips_every_variant() {
        for &variant in Light::VARIANTS {
            assert_eq!(decode::<Light>(&encode(variant)).unwrap(), variant);
        }
    }

    #[test]
    fn decode_accepts_any_case() {
        assert_eq!(decode::<Light>("red").unwrap(), Light::Red);
        assert_eq!(decode::<Light>("Red").unwrap(), Light::Red);
        assert_eq!(decode::<Light>("gReEn").unwrap(), Light::Green);
    }

    #[test]
    fn decode_rejects_unknown_value() {
        let err = decode::<Light>("blue").unwrap_err();
        assert_eq!(err.enumeration, "light");
        assert_eq!(err.value, "blue");
    }

    #[test]
    fn decode_never_defaults_on_empty() {
        assert!(decode::<Light>("").is_err());
    }
}
