//! Best-effort markdown cleanup before chunking

use regex_lite::Regex;

/// Strip markdown decoration down to plain text.
///
/// Fenced code blocks (paired triple-backtick delimiters, possibly spanning
/// lines) are removed entirely, inline code spans are unwrapped to their
/// content, and runs of three or more newlines collapse to two. This is a
/// narrow text transform, not a markdown parser: nested or unbalanced
/// fences are not handled.
pub fn markdown_to_text(markdown: &str) -> String {
    let fences = Regex::new(r"(?s)```.*?```").expect("static fence pattern");
    let inline = Regex::new(r"`([^`]*)`").expect("static inline pattern");
    let blank_runs = Regex::new(r"\n{3,}").expect("static newline pattern");

    let without_blocks = fences.replace_all(markdown, "");
    let without_inline = inline.replace_all(&without_blocks, "$1");
    let collapsed = blank_runs.replace_all(&without_inline, "\n\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_text(""), "");
    }

    #[test]
    fn test_already_normalized_text_unchanged() {
        let text = "Policy overview.\n\nCoverage applies to all plans.";
        assert_eq!(markdown_to_text(text), text);
    }

    #[test]
    fn test_fenced_code_block_removed() {
        let text = "before\n```x\ncode\n```\nafter";
        assert_eq!(markdown_to_text(text), "before\n\nafter");
    }

    #[test]
    fn test_inline_code_unwrapped() {
        assert_eq!(markdown_to_text("use `code` here"), "use code here");
    }

    #[test]
    fn test_blank_runs_collapsed() {
        assert_eq!(markdown_to_text("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_multiple_fences_removed_non_greedily() {
        let text = "a\n```\none\n```\nb\n```\ntwo\n```\nc";
        let cleaned = markdown_to_text(text);
        assert!(!cleaned.contains("one"));
        assert!(!cleaned.contains("two"));
        assert!(cleaned.contains('b'));
    }
}
