//! Quality-preference policy over resolved download variants.
//!
//! The policy is deterministic for a given input set: an exact match on the
//! target rank wins, then the highest rank strictly below the target, then
//! the lowest rank strictly above it. A non-empty set with no parseable
//! ranks still yields the first variant rather than failing outright.

use tracing::trace;

use crate::resolver::DownloadVariant;

/// Preferred quality rank when none is configured.
pub const DEFAULT_TARGET_QUALITY: u32 = 720;

/// Picks one variant from the set by the fixed quality-preference policy.
///
/// Returns `None` only for an empty input set. Tie-breaks resolve to the
/// earliest variant in input order.
#[must_use]
pub fn select_variant(variants: &[DownloadVariant], target: u32) -> Option<&DownloadVariant> {
    let mut best_below: Option<(u32, &DownloadVariant)> = None;
    let mut best_above: Option<(u32, &DownloadVariant)> = None;

    for variant in variants {
        let Some(quality) = parse_quality(&variant.quality) else {
            trace!(quality = %variant.quality, "variant rank not parseable, skipping");
            continue;
        };
        if quality == target {
            return Some(variant);
        }
        if quality < target {
            if best_below.is_none_or(|(best, _)| quality > best) {
                best_below = Some((quality, variant));
            }
        } else if best_above.is_none_or(|(best, _)| quality < best) {
            best_above = Some((quality, variant));
        }
    }

    best_below
        .or(best_above)
        .map(|(_, variant)| variant)
        .or_else(|| variants.first())
}

/// Parses the leading decimal digits of a quality string (`"720"`, `"720p"`).
fn parse_quality(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(quality: &str) -> DownloadVariant {
        DownloadVariant {
            url: format!("https://cdn.example.com/v-{quality}.mp4"),
            quality: quality.to_string(),
            container: "mp4".to_string(),
            size_text: None,
            display_name: None,
        }
    }

    #[test]
    fn test_exact_target_match_wins() {
        let variants = vec![variant("480"), variant("720"), variant("1080")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "720");
    }

    #[test]
    fn test_all_below_target_picks_maximum() {
        let variants = vec![variant("240"), variant("360")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "360");
    }

    #[test]
    fn test_all_above_target_picks_minimum() {
        let variants = vec![variant("2160"), variant("1080"), variant("1440")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "1080");
    }

    #[test]
    fn test_below_preferred_over_above() {
        let variants = vec![variant("1080"), variant("480")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "480");
    }

    #[test]
    fn test_empty_set_returns_none() {
        assert!(select_variant(&[], 720).is_none());
    }

    #[test]
    fn test_unparseable_ranks_fall_back_to_first() {
        let variants = vec![variant("audio"), variant("hd")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "audio");
    }

    #[test]
    fn test_tie_break_keeps_input_order() {
        // Two distinct variants with the same rank: the earlier one wins.
        let mut duplicate = variant("480");
        duplicate.url = "https://cdn.example.com/other-480.mp4".to_string();
        let variants = vec![variant("480"), duplicate];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.url, "https://cdn.example.com/v-480.mp4");
    }

    #[test]
    fn test_quality_suffix_parses() {
        let variants = vec![variant("720p")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "720p");
    }

    #[test]
    fn test_mixed_parseable_and_unparseable() {
        let variants = vec![variant("audio"), variant("360")];
        let selected = select_variant(&variants, 720).unwrap();
        assert_eq!(selected.quality, "360");
    }
}
