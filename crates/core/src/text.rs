//! Pure string functions used by the normalizer's text pipeline.

use crate::domain::{NO_EMOJI, NO_YOUTUBE_LINK};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

// Inclusive code-point ranges treated as emoji: Extended_Pictographic, regional
// indicators, skin-tone modifiers, plus ZWJ (200D), keycap (20E3) and VS16 (FE0F)
// so that multi-code-point sequences are captured and removed whole.
// Sorted and non-overlapping; looked up with a binary search.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x200D, 0x200D),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x20E3, 0x20E3),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x2199),
    (0x21A9, 0x21AA),
    (0x231A, 0x231B),
    (0x2328, 0x2328),
    (0x2388, 0x2388),
    (0x23CF, 0x23CF),
    (0x23E9, 0x23F3),
    (0x23F8, 0x23FA),
    (0x24C2, 0x24C2),
    (0x25AA, 0x25AB),
    (0x25B6, 0x25B6),
    (0x25C0, 0x25C0),
    (0x25FB, 0x25FE),
    (0x2600, 0x2605),
    (0x2607, 0x2612),
    (0x2614, 0x2685),
    (0x2690, 0x2705),
    (0x2708, 0x2712),
    (0x2714, 0x2714),
    (0x2716, 0x2716),
    (0x271D, 0x271D),
    (0x2721, 0x2721),
    (0x2728, 0x2728),
    (0x2733, 0x2734),
    (0x2744, 0x2744),
    (0x2747, 0x2747),
    (0x274C, 0x274C),
    (0x274E, 0x274E),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2763, 0x2767),
    (0x2795, 0x2797),
    (0x27A1, 0x27A1),
    (0x27B0, 0x27B0),
    (0x27BF, 0x27BF),
    (0x2934, 0x2935),
    (0x2B05, 0x2B07),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50),
    (0x2B55, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
    (0xFE0F, 0xFE0F),
    (0x1F000, 0x1F0FF),
    (0x1F10D, 0x1F10F),
    (0x1F12F, 0x1F12F),
    (0x1F16C, 0x1F171),
    (0x1F17E, 0x1F17F),
    (0x1F18E, 0x1F18E),
    (0x1F191, 0x1F19A),
    (0x1F1AD, 0x1F1FF),
    (0x1F201, 0x1F20F),
    (0x1F21A, 0x1F21A),
    (0x1F22F, 0x1F22F),
    (0x1F232, 0x1F23A),
    (0x1F23C, 0x1F23F),
    (0x1F249, 0x1F53D),
    (0x1F546, 0x1F64F),
    (0x1F680, 0x1F6FF),
    (0x1F774, 0x1F77F),
    (0x1F7D5, 0x1F7FF),
    (0x1F80C, 0x1F80F),
    (0x1F848, 0x1F84F),
    (0x1F85A, 0x1F85F),
    (0x1F888, 0x1F88F),
    (0x1F8AE, 0x1F8FF),
    (0x1F90C, 0x1F93A),
    (0x1F93C, 0x1F945),
    (0x1F947, 0x1FAFF),
    (0x1FC00, 0x1FFFD),
];

pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                Ordering::Less
            } else if lo > cp {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

/// Concatenates every emoji character in order of appearance, or `NO_EMOJI`
pub fn extract_emojis(text: &str) -> String {
    let emojis: String = text.chars().filter(|c| is_emoji(*c)).collect();
    if emojis.is_empty() {
        NO_EMOJI.to_string()
    } else {
        emojis
    }
}

/// Deletes emoji characters without inserting anything in their place
pub fn remove_emojis(text: &str) -> String {
    text.chars().filter(|c| !is_emoji(*c)).collect()
}

fn youtube_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://(?:www\.)?(?:youtube\.com|youtu\.be)/[^\s]+").unwrap()
    })
}

/// All YouTube URLs joined with ", ", or `NO_YOUTUBE_LINK`
pub fn extract_youtube_links(text: &str) -> String {
    let links: Vec<&str> = youtube_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();
    if links.is_empty() {
        NO_YOUTUBE_LINK.to_string()
    } else {
        links.join(", ")
    }
}

/// Deletes YouTube URLs and trims the ends. Interior whitespace is left untouched.
pub fn remove_youtube_links(text: &str) -> String {
    youtube_pattern().replace_all(text, "").trim().to_string()
}

/// Replaces each whitespace run (newlines included) with a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emoji_ranges_are_sorted_and_disjoint() {
        for pair in EMOJI_RANGES.windows(2) {
            assert!(pair[0].0 <= pair[0].1);
            assert!(pair[0].1 < pair[1].0, "{:X?} overlaps {:X?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_is_emoji_common_pictographs() {
        for c in ['😀', '🔥', '👍', '🚀', '❤', '⭐', '🇪', '🏽'] {
            assert!(is_emoji(c), "{} should be an emoji", c);
        }
    }

    #[test]
    fn test_is_emoji_rejects_text() {
        for c in ['a', 'Z', '0', '9', '#', '*', ' ', 'ሰ', 'é', '-', '/'] {
            assert!(!is_emoji(c), "{:?} should not be an emoji", c);
        }
    }

    #[test]
    fn test_extract_emojis_in_order() {
        assert_eq!(extract_emojis("Hi 🔥 there 😀 again 👍"), "🔥😀👍");
    }

    #[test]
    fn test_extract_emojis_none_found() {
        assert_eq!(extract_emojis("plain text 123"), NO_EMOJI);
        assert_eq!(extract_emojis(""), NO_EMOJI);
    }

    #[test]
    fn test_extract_emojis_keeps_zwj_sequence_whole() {
        let family = "👨\u{200D}👩\u{200D}👧";
        assert_eq!(extract_emojis(&format!("family {}", family)), family);
        assert_eq!(remove_emojis(&format!("family {}", family)), "family ");
    }

    #[test]
    fn test_remove_emojis_does_not_pad() {
        assert_eq!(remove_emojis("a😀b"), "ab");
        assert_eq!(remove_emojis("Check this 😀 now"), "Check this  now");
    }

    #[test]
    fn test_remove_emojis_variation_selector() {
        assert_eq!(remove_emojis("love ❤\u{FE0F}!"), "love !");
    }

    #[test]
    fn test_extract_youtube_links_short_and_long() {
        let text = "see https://youtu.be/abc123 and http://www.youtube.com/watch?v=xyz";
        assert_eq!(
            extract_youtube_links(text),
            "https://youtu.be/abc123, http://www.youtube.com/watch?v=xyz"
        );
    }

    #[test]
    fn test_extract_youtube_links_none_found() {
        assert_eq!(extract_youtube_links("visit https://example.com/video"), NO_YOUTUBE_LINK);
        assert_eq!(extract_youtube_links(""), NO_YOUTUBE_LINK);
    }

    #[test]
    fn test_extract_youtube_links_stops_at_whitespace() {
        assert_eq!(
            extract_youtube_links("https://youtube.com/shorts/q1\nnext line"),
            "https://youtube.com/shorts/q1"
        );
    }

    #[test]
    fn test_remove_youtube_links_trims_ends() {
        assert_eq!(remove_youtube_links("Check this  https://youtu.be/abc123"), "Check this");
        assert_eq!(remove_youtube_links("https://youtu.be/a"), "");
    }

    #[test]
    fn test_remove_youtube_links_keeps_interior_double_space() {
        assert_eq!(
            remove_youtube_links("Watch https://youtu.be/x now"),
            "Watch  now"
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Watch  now\n\nplease "), "Watch now please");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_second_pass_finds_nothing() {
        let text = "Check this 😀 https://youtu.be/abc123";
        let once = remove_youtube_links(&remove_emojis(text));
        assert_eq!(extract_emojis(&once), NO_EMOJI);
        assert_eq!(extract_youtube_links(&once), NO_YOUTUBE_LINK);
        assert_eq!(remove_youtube_links(&remove_emojis(&once)), once);
    }
}
