#![forbid(unsafe_code)]

use crate::utils::route::is_valid_token;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const TOKEN_SEPARATOR : char = '-';
const WORD_SEPARATOR  : char = ' ';

// ***************************************************************************
//                            Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// normalize:
// ---------------------------------------------------------------------------
/** Convert a route token into a canonical title by replacing each hyphen
 * with a single space.  The conversion is lossy: "a--b" becomes "a  b" and
 * the original spacing cannot be recovered.  Segments without hyphens are
 * returned unchanged.
 */
pub fn normalize(segment: &str) -> String {
    if !segment.contains(TOKEN_SEPARATOR) {
        return segment.to_string();
    }
    segment.split(TOKEN_SEPARATOR).collect::<Vec<&str>>().join(" ")
}

// ---------------------------------------------------------------------------
// canonical_key:
// ---------------------------------------------------------------------------
/** The storage key for a title.  Filenames are always derived from the
 * lower-cased title so that "Hello" and "hello" address the same page on
 * case-sensitive filesystems.
 */
pub fn canonical_key(title: &str) -> String {
    title.to_lowercase()
}

// ---------------------------------------------------------------------------
// display_title:
// ---------------------------------------------------------------------------
/** Capitalize the first letter of every space separated word.  This is a
 * display transform only and never feeds back into the storage key.
 */
pub fn display_title(title: &str) -> String {
    let mut s = String::with_capacity(title.len());
    for (i, word) in title.split(WORD_SEPARATOR).enumerate() {
        if i > 0 {s.push(WORD_SEPARATOR);}
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            s.extend(first.to_uppercase());
            s.push_str(chars.as_str());
        }
    }
    s
}

// ---------------------------------------------------------------------------
// route_token:
// ---------------------------------------------------------------------------
/** Turn a free form title, such as one typed into the create form, into a
 * lower-cased route token.  Multi-word titles are joined with hyphens.  None
 * is returned when the result would not be accepted by the route grammar.
 */
pub fn route_token(title: &str) -> Option<String> {
    let words: Vec<String> = title.split_whitespace().map(str::to_lowercase).collect();
    let token = if words.len() > 1 {
        words.join("-")
    } else {
        words.into_iter().next()?
    };

    if is_valid_token(&token) {Some(token)} else {None}
}

// ---------------------------------------------------------------------------
// page_route:
// ---------------------------------------------------------------------------
/** The route token that addresses an already stored title.  Each space maps
 * back to exactly one hyphen, so normalize(page_route(t)) == t and repeated,
 * leading or trailing separators survive the trip.
 */
pub fn page_route(title: &str) -> Option<String> {
    let token = title.replace(WORD_SEPARATOR, &TOKEN_SEPARATOR.to_string());
    if is_valid_token(&token) {Some(token)} else {None}
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_without_hyphen_is_identity() {
        for t in ["hello", "abc123", "CamelCase", ""] {
            assert_eq!(normalize(t), t);
        }
    }

    #[test]
    fn normalize_replaces_every_hyphen() {
        assert_eq!(normalize("my-page"), "my page");
        assert_eq!(normalize("a-b-c-d"), "a b c d");
        assert_eq!(normalize("a--b"), "a  b");
        assert_eq!(normalize("-lead"), " lead");
    }

    #[test]
    fn normalize_preserves_segment_count() {
        let token = "one-two-three";
        let title = normalize(token);
        assert_eq!(title.split(' ').count(), token.split('-').count());
    }

    #[test]
    fn display_title_capitalizes_words() {
        assert_eq!(display_title("my page"), "My Page");
        assert_eq!(display_title("hello"), "Hello");
        assert_eq!(display_title("a  b"), "A  B");
        assert_eq!(display_title("2nd edition"), "2nd Edition");
        assert_eq!(display_title(""), "");
    }

    #[test]
    fn canonical_key_lowercases() {
        assert_eq!(canonical_key("My Page"), "my page");
    }

    #[test]
    fn route_token_joins_words() {
        assert_eq!(route_token("My Page").as_deref(), Some("my-page"));
        assert_eq!(route_token("  Spaced   Out  ").as_deref(), Some("spaced-out"));
        assert_eq!(route_token("Single").as_deref(), Some("single"));
    }

    #[test]
    fn route_token_rejects_unroutable_titles() {
        assert_eq!(route_token(""), None);
        assert_eq!(route_token("   "), None);
        assert_eq!(route_token("../etc/passwd"), None);
        assert_eq!(route_token("caf\u{e9}"), None);
    }

    #[test]
    fn page_route_inverts_normalize() {
        for token in ["my-page", "a--b", "-x", "x-", "plain"] {
            let title = normalize(token);
            assert_eq!(page_route(&title).as_deref(), Some(token));
        }
        assert_eq!(page_route("a.b"), None);
        assert_eq!(page_route(""), None);
    }
}
