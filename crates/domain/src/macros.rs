//! Macro for implementing Display and FromStr for wire-level enums
//!
//! HTTP methods, credential domains and environments all travel as strings
//! (in config files, log fields and across the embedding boundary). This
//! macro gives them one consistent textual form and case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use gamelink_domain::impl_wire_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Region {
//!     Europe,
//!     NorthAmerica,
//! }
//!
//! impl_wire_enum_conversions!(Region {
//!     Europe => "eu",
//!     NorthAmerica => "na",
//! });
//!
//! assert_eq!(Region::Europe.to_string(), "eu");
//! assert_eq!("NA".parse::<Region>().unwrap(), Region::NorthAmerica);
//! ```

/// Implements `Display` and `FromStr` for a fieldless enum.
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
///
/// Parsing ignores ASCII case, so `"get"`, `"GET"` and `"Get"` are all
/// accepted when the canonical form is `"GET"`.
#[macro_export]
macro_rules! impl_wire_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return ::core::result::Result::Ok(Self::$variant);
                    }
                )+
                ::core::result::Result::Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    // Call sites import the crate's one-parameter alias.
    #[allow(unused_imports)]
    use crate::errors::Result;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestVerb {
        Fetch,
        Store,
    }

    impl_wire_enum_conversions!(TestVerb {
        Fetch => "FETCH",
        Store => "STORE",
    });

    #[test]
    fn display_uses_canonical_form() {
        assert_eq!(TestVerb::Fetch.to_string(), "FETCH");
        assert_eq!(TestVerb::Store.to_string(), "STORE");
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(TestVerb::from_str("fetch").unwrap(), TestVerb::Fetch);
        assert_eq!(TestVerb::from_str(" Store ").unwrap(), TestVerb::Store);
    }

    #[test]
    fn invalid_input_names_the_enum() {
        let result = TestVerb::from_str("delete");
        assert!(result.unwrap_err().contains("Invalid TestVerb: delete"));
        assert!(TestVerb::from_str("").is_err());
    }
}
