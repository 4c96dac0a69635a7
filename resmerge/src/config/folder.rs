//! Parsed folder configurations and best-match resolution.
//!
//! A [`FolderConfiguration`] is the ordered set of qualifiers parsed from one
//! resource folder name (`values-en-rUS` → language `en`, region `US`). It
//! provides:
//!
//! - parsing and canonical rendering of qualifier strings,
//! - the compatibility check between a candidate folder and a reference
//!   device configuration, and
//! - best-match selection across a candidate list, applying each qualifier
//!   dimension as a successive filter in priority order.

use std::fmt;

use super::qualifier::{Qualifier, DIMENSION_COUNT, DIM_LANGUAGE};

/// The parsed, ordered set of qualifiers for one resource folder.
///
/// At most one qualifier per dimension; absent dimensions are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderConfiguration {
    qualifiers: [Option<Qualifier>; DIMENSION_COUNT],
}

impl FolderConfiguration {
    /// The configuration with no qualifiers (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `-`-separated qualifier string, e.g. `"en-rUS"` or `""`.
    ///
    /// Returns `None` if any token fails to parse, appears out of dimension
    /// order, or repeats a dimension. A region qualifier is only valid after
    /// a language qualifier.
    pub fn from_qualifier_string(qualifiers: &str) -> Option<FolderConfiguration> {
        if qualifiers.is_empty() {
            return Some(FolderConfiguration::new());
        }
        Self::from_tokens(qualifiers.split('-'))
    }

    /// Parses an iterator of qualifier tokens.
    pub fn from_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<FolderConfiguration> {
        let mut config = FolderConfiguration::new();
        let mut last_dimension: Option<usize> = None;

        for token in tokens {
            let qualifier = Qualifier::parse(token)?;
            let dimension = qualifier.dimension();

            // Tokens must appear in strictly ascending dimension order.
            if let Some(last) = last_dimension {
                if dimension <= last {
                    return None;
                }
            }
            // A region is meaningless without a language.
            if matches!(qualifier, Qualifier::Region(_)) && config.qualifier(DIM_LANGUAGE).is_none()
            {
                return None;
            }

            config.qualifiers[dimension] = Some(qualifier);
            last_dimension = Some(dimension);
        }

        Some(config)
    }

    /// Adds or replaces one qualifier.
    pub fn set(&mut self, qualifier: Qualifier) {
        let dimension = qualifier.dimension();
        self.qualifiers[dimension] = Some(qualifier);
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, qualifier: Qualifier) -> Self {
        self.set(qualifier);
        self
    }

    /// The qualifier at the given dimension, if present.
    pub fn qualifier(&self, dimension: usize) -> Option<&Qualifier> {
        self.qualifiers[dimension].as_ref()
    }

    /// Whether this configuration has no qualifiers at all.
    pub fn is_default(&self) -> bool {
        self.qualifiers.iter().all(|q| q.is_none())
    }

    /// Canonical qualifier string: present qualifiers in dimension order,
    /// `-`-joined, empty for the default configuration.
    ///
    /// Because parsing normalizes casing and this renders in dimension
    /// order, the result is a normalized unique key for the configuration.
    pub fn qualifier_string(&self) -> String {
        let mut out = String::new();
        for qualifier in self.qualifiers.iter().flatten() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push_str(&qualifier.to_string());
        }
        out
    }

    /// Whether a folder with this configuration can serve the given
    /// reference configuration at all.
    ///
    /// Every qualifier this configuration carries must be compatible with
    /// the reference's qualifier in the same dimension; a qualifier in a
    /// dimension the reference leaves unset is a conflict. The default
    /// configuration matches every reference.
    pub fn is_match_for(&self, reference: &FolderConfiguration) -> bool {
        for (dimension, qualifier) in self.qualifiers.iter().enumerate() {
            let Some(qualifier) = qualifier else { continue };
            match reference.qualifier(dimension) {
                Some(reference_qualifier) => {
                    if !qualifier.matches(reference_qualifier) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

impl fmt::Display for FolderConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("(default)")
        } else {
            f.write_str(&self.qualifier_string())
        }
    }
}

/// Something carrying a folder configuration, eligible for best-match
/// selection.
pub trait Configurable {
    /// The folder configuration this object applies to.
    fn configuration(&self) -> FolderConfiguration;
}

impl Configurable for FolderConfiguration {
    fn configuration(&self) -> FolderConfiguration {
        self.clone()
    }
}

/// Selects the best-matching candidate for a reference configuration.
///
/// The algorithm follows the platform's resolution order:
///
/// 1. Discard candidates whose configuration conflicts with the reference.
/// 2. For each qualifier dimension in priority order, if the reference sets
///    that dimension and at least one surviving candidate matches it, keep
///    only the candidates that do.
/// 3. Stop as soon as one candidate remains; ties after all dimensions are
///    broken by candidate order (first one wins).
pub fn find_matching_configurable<'a, T: Configurable>(
    candidates: &'a [T],
    reference: &FolderConfiguration,
) -> Option<&'a T> {
    let mut remaining: Vec<&T> = candidates
        .iter()
        .filter(|c| c.configuration().is_match_for(reference))
        .collect();

    if remaining.is_empty() {
        return None;
    }

    for dimension in 0..DIMENSION_COUNT {
        if remaining.len() == 1 {
            break;
        }
        let Some(reference_qualifier) = reference.qualifier(dimension) else {
            continue;
        };
        let any_matches = remaining.iter().any(|c| {
            c.configuration()
                .qualifier(dimension)
                .is_some_and(|q| q.matches(reference_qualifier))
        });
        if any_matches {
            remaining.retain(|c| {
                c.configuration()
                    .qualifier(dimension)
                    .is_some_and(|q| q.matches(reference_qualifier))
            });
        }
    }

    remaining.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(qualifiers: &str) -> FolderConfiguration {
        FolderConfiguration::from_qualifier_string(qualifiers)
            .unwrap_or_else(|| panic!("'{qualifiers}' should parse"))
    }

    #[test]
    fn test_empty_string_is_default_config() {
        let c = config("");
        assert!(c.is_default());
        assert_eq!(c.qualifier_string(), "");
    }

    #[test]
    fn test_locale_parsing() {
        let c = config("en-rUS");
        assert_eq!(c.qualifier_string(), "en-rUS");
        assert!(!c.is_default());
    }

    #[test]
    fn test_rejects_out_of_order_tokens() {
        // density before language reverses dimension order
        assert!(FolderConfiguration::from_qualifier_string("hdpi-en").is_none());
        // duplicate dimension
        assert!(FolderConfiguration::from_qualifier_string("en-fr").is_none());
    }

    #[test]
    fn test_rejects_region_without_language() {
        assert!(FolderConfiguration::from_qualifier_string("rUS").is_none());
    }

    #[test]
    fn test_rejects_unknown_token() {
        assert!(FolderConfiguration::from_qualifier_string("en-xyz").is_none());
    }

    #[test]
    fn test_normalization_produces_canonical_casing() {
        let c = config("EN-rus");
        assert_eq!(c.qualifier_string(), "en-rUS");
    }

    #[test]
    fn test_default_config_matches_everything() {
        let default = FolderConfiguration::new();
        assert!(default.is_match_for(&config("en-rUS-hdpi-v21")));
        assert!(default.is_match_for(&FolderConfiguration::new()));
    }

    #[test]
    fn test_extra_qualifier_conflicts() {
        // Candidate is more specific than the reference allows.
        assert!(!config("en-rUS").is_match_for(&config("en")));
        assert!(config("en").is_match_for(&config("en-rUS")));
    }

    #[test]
    fn test_best_match_prefers_most_specific() {
        let candidates = vec![config(""), config("en"), config("en-rUS")];

        let best = find_matching_configurable(&candidates, &config("en-rUS")).unwrap();
        assert_eq!(best.qualifier_string(), "en-rUS");

        let best = find_matching_configurable(&candidates, &config("en-rGB")).unwrap();
        assert_eq!(best.qualifier_string(), "en");

        let best = find_matching_configurable(&candidates, &config("fr")).unwrap();
        assert_eq!(best.qualifier_string(), "");
    }

    #[test]
    fn test_best_match_tie_breaks_on_order() {
        // Two identical candidates: the first in list order wins.
        let candidates = vec![config("en"), config("en")];
        let best = find_matching_configurable(&candidates, &config("en")).unwrap();
        assert!(std::ptr::eq(best, &candidates[0]));
    }

    #[test]
    fn test_best_match_none_when_all_conflict() {
        let candidates = vec![config("fr"), config("de")];
        assert!(find_matching_configurable(&candidates, &config("en")).is_none());
    }

    #[test]
    fn test_higher_dimension_filtered_before_lower_priority() {
        // land vs hdpi: orientation outranks density.
        let candidates = vec![config("land"), config("hdpi")];
        let reference = config("land-hdpi");
        let best = find_matching_configurable(&candidates, &reference).unwrap();
        assert_eq!(best.qualifier_string(), "land");
    }

    proptest! {
        /// Re-parsing a canonical qualifier string reproduces the config.
        #[test]
        fn prop_qualifier_string_roundtrips(
            lang in "[a-z]{2}",
            version in 1u16..35,
        ) {
            let original = FolderConfiguration::new()
                .with(Qualifier::Language(lang))
                .with(Qualifier::Version(version));
            let rendered = original.qualifier_string();
            let reparsed = FolderConfiguration::from_qualifier_string(&rendered).unwrap();
            prop_assert_eq!(original, reparsed);
        }
    }
}
