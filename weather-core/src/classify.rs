use thiserror::Error;

use crate::model::{DEFAULT_COUNTRY, LocationQuery};

/// Shortest digit run (after hyphens are removed) treated as a postal code.
const MIN_POSTAL_DIGITS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Input cannot be empty.")]
pub struct InvalidInput;

/// Decide whether `input` is a postal code or a city name.
///
/// Postal codes fall back to [`DEFAULT_COUNTRY`]; use [`classify_with_country`]
/// when the caller knows the country.
pub fn classify(input: &str) -> Result<LocationQuery, InvalidInput> {
    classify_with_country(input, DEFAULT_COUNTRY)
}

/// Like [`classify`], but postal codes are tagged with `country`.
///
/// Anything that is not a postal code is passed through verbatim as a city
/// name; the provider decides whether it exists.
pub fn classify_with_country(input: &str, country: &str) -> Result<LocationQuery, InvalidInput> {
    if input.trim().is_empty() {
        return Err(InvalidInput);
    }

    if is_postal_code(input) {
        return Ok(LocationQuery::PostalCode {
            code: input.to_string(),
            country: country.to_string(),
        });
    }

    Ok(LocationQuery::City { name: input.to_string() })
}

/// Digits and hyphens only, with at least five digits.
pub fn is_postal_code(input: &str) -> bool {
    let digits: String = input.chars().filter(|c| *c != '-').collect();
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits.len() >= MIN_POSTAL_DIGITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        for input in ["", " ", "\t", "  \n "] {
            assert_eq!(classify(input), Err(InvalidInput), "input: {input:?}");
        }
    }

    #[test]
    fn five_or_more_digits_is_postal_code() {
        assert_eq!(
            classify("10001").unwrap(),
            LocationQuery::PostalCode { code: "10001".into(), country: "US".into() }
        );
        assert!(matches!(classify("123456").unwrap(), LocationQuery::PostalCode { .. }));
    }

    #[test]
    fn hyphens_are_ignored_when_counting_digits() {
        let query = classify("12345-6789").unwrap();
        assert_eq!(
            query,
            LocationQuery::PostalCode { code: "12345-6789".into(), country: "US".into() }
        );
        assert!(matches!(classify("12-34-5").unwrap(), LocationQuery::PostalCode { .. }));
    }

    #[test]
    fn short_or_mixed_input_is_city() {
        for input in ["1234", "12-34", "SW1A 1AA", "-----", "New York", "75008a", "!!"] {
            assert!(
                matches!(classify(input).unwrap(), LocationQuery::City { .. }),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn city_name_is_kept_verbatim() {
        assert_eq!(
            classify("New  York").unwrap(),
            LocationQuery::City { name: "New  York".into() }
        );
    }

    #[test]
    fn explicit_country_is_used_for_postal_codes() {
        assert_eq!(
            classify_with_country("75008", "FR").unwrap(),
            LocationQuery::PostalCode { code: "75008".into(), country: "FR".into() }
        );
    }

    #[test]
    fn non_ascii_digits_are_not_postal_codes() {
        assert!(!is_postal_code("١٢٣٤٥"));
    }
}
