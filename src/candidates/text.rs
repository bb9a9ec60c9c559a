//! Text normalization shared by candidate identity and deduplication.

use std::collections::BTreeSet;

/// Lowercase, keep only alphanumerics (any script) and whitespace, collapse
/// runs of whitespace into single spaces and trim.
///
/// ```
/// use the_waypoint::candidates::text::normalize_text;
///
/// assert_eq!(normalize_text("  Tsukiji   MARKET! "), "tsukiji market");
/// assert_eq!(normalize_text("Café--Bar"), "cafébar");
/// assert_eq!(normalize_text("築地市場"), "築地市場");
/// ```
pub fn normalize_text(raw: &str) -> String {
    let filtered: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The normalized `title|location` seed a candidate's identity is derived from.
pub fn identity_seed(title: &str, location: Option<&str>) -> String {
    format!(
        "{}|{}",
        normalize_text(title),
        normalize_text(location.unwrap_or(""))
    )
}

/// Token set over the normalized title and location.
pub fn token_set(title: &str, location: Option<&str>) -> BTreeSet<String> {
    normalize_text(title)
        .split(' ')
        .chain(normalize_text(location.unwrap_or("")).split(' '))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trailing address segments that name a country rather than a destination.
const COUNTRY_NAMES: &[&str] = &[
    "australia", "austria", "brazil", "canada", "china", "france", "germany", "greece",
    "india", "indonesia", "ireland", "italy", "japan", "korea", "malaysia", "mexico",
    "morocco", "netherlands", "new zealand", "peru", "philippines", "portugal",
    "singapore", "south korea", "spain", "switzerland", "taiwan", "thailand", "turkey",
    "uk", "united kingdom", "united states", "usa", "us", "vietnam",
];

/// Administrative words stripped from the end of the chosen segment.
const ADMIN_SUFFIXES: &[&str] = &[
    " city", " ward", " prefecture", " province", " district", " county", "-shi", "-ku", "-fu",
];

/// Destination named by a free-text location, lowercased.
///
/// Postal codes are removed from every segment. Trailing segments that name a
/// country or carry fewer than three letters (state codes) are dropped while
/// an earlier segment remains, and the last surviving segment loses any
/// administrative suffix.
///
/// ```
/// use the_waypoint::candidates::text::destination_from_location;
///
/// assert_eq!(destination_from_location("Chuo City, Tokyo, Japan").as_deref(), Some("tokyo"));
/// assert_eq!(destination_from_location("Nakagyo, Kyoto").as_deref(), Some("kyoto"));
/// ```
pub fn destination_from_location(location: &str) -> Option<String> {
    let mut segments: Vec<String> = location
        .split(',')
        .map(|segment| {
            segment
                .split_whitespace()
                .filter(|word| !word.chars().any(|c| c.is_ascii_digit()))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        })
        .filter(|segment| !segment.is_empty())
        .collect();

    while segments.len() > 1 {
        let last = &segments[segments.len() - 1];
        let letters = last.chars().filter(|c| c.is_alphabetic()).count();
        if COUNTRY_NAMES.contains(&last.as_str()) || letters < 3 {
            segments.pop();
        } else {
            break;
        }
    }

    let chosen = segments.pop()?;
    let stripped = ADMIN_SUFFIXES
        .iter()
        .find_map(|suffix| chosen.strip_suffix(suffix))
        .filter(|rest| !rest.trim().is_empty())
        .unwrap_or(&chosen);

    Some(stripped.trim().to_string())
}

/// Jaccard similarity of two token sets; two empty sets are identical.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_cases() {
        let cases = vec![
            ("Tsukiji Market", "tsukiji market"),
            ("  tsukiji MARKET  ", "tsukiji market"),
            ("Fushimi\tInari-Taisha", "fushimi inaritaisha"),
            ("!!!", ""),
            ("Café de Flore", "café de flore"),
            ("浅草寺", "浅草寺"),
            ("Москва, Красная площадь", "москва красная площадь"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_text(input), expected, "normalize_text({:?})", input);
        }
    }

    #[test]
    fn test_identity_seed() {
        assert_eq!(identity_seed("Tsukiji Market", Some("Tokyo")), "tsukiji market|tokyo");
        assert_eq!(identity_seed("Tsukiji Market", None), "tsukiji market|");
        assert_ne!(
            identity_seed("築地市場", Some("Tokyo")),
            identity_seed("浅草寺", Some("Tokyo"))
        );
    }

    #[test]
    fn test_non_latin_titles_do_not_collide_in_similarity() {
        let tsukiji = token_set("築地市場", Some("Tokyo"));
        let sensoji = token_set("浅草寺", Some("Tokyo"));
        assert!(jaccard(&tsukiji, &sensoji) < 0.5);
    }

    #[test]
    fn test_destination_from_location_cases() {
        let cases = vec![
            ("Chuo City, Tokyo, Japan", Some("tokyo")),
            ("Nakagyo Ward, Kyoto, Japan", Some("kyoto")),
            ("Nakagyo, Kyoto", Some("kyoto")),
            ("Asakusa, Tokyo ", Some("tokyo")),
            ("Kyoto City, Japan", Some("kyoto")),
            ("1-22-7 Jinnan, Shibuya, Tokyo 150-0041, Japan", Some("tokyo")),
            ("500 Market St, San Francisco, CA 94105, USA", Some("san francisco")),
            ("Osaka-shi", Some("osaka")),
            ("Japan", Some("japan")),
            ("Kyoto", Some("kyoto")),
            (" , ", None),
            ("", None),
        ];
        for (input, expected) in cases {
            assert_eq!(
                destination_from_location(input).as_deref(),
                expected,
                "destination_from_location({:?})",
                input
            );
        }
    }

    #[test]
    fn test_jaccard() {
        let a = token_set("Tsukiji Outer Market", Some("Tokyo"));
        let b = token_set("Tsukiji Market", Some("Tokyo"));
        assert!((jaccard(&a, &b) - 0.75).abs() < 1e-9);

        let c = token_set("Golden Gai", Some("Tokyo"));
        assert!(jaccard(&a, &c) < 0.3);

        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 1.0);
    }
}
