//! Session title inference.
//!
//! Titles are taken from the first stored message rather than generated:
//! the content is kept verbatim, capped at [`TITLE_MAX_CHARS`] characters.

/// Maximum number of characters kept from the first message.
pub const TITLE_MAX_CHARS: usize = 100;

/// Derive a session title from the first message of a conversation.
///
/// Deterministic: the content is not rewritten, only cut on a char
/// boundary. Blank content is kept as-is so the title is never silently
/// replaced by a default.
pub fn infer_title(first_content: &str) -> String {
    first_content.chars().take(TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_verbatim() {
        assert_eq!(infer_title("hello"), "hello");
    }

    #[test]
    fn test_keeps_surrounding_whitespace() {
        assert_eq!(infer_title("  plan a trip \n"), "  plan a trip \n");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let title = infer_title(&long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(title.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_blank_content_kept() {
        assert_eq!(infer_title("   "), "   ");
        assert_eq!(infer_title(""), "");
    }
}
