// Utility functions
use scraper::ElementRef;

/// Keeps only ASCII digits: "12 500 000 FCFA" -> "12500000".
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Concatenated text of an element, trimmed.
pub fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `None` for empty or whitespace-only strings.
pub fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_only_strips_everything_else() {
        assert_eq!(digits_only("12 500 000 FCFA"), "12500000");
        assert_eq!(digits_only("85\u{a0}000 km"), "85000");
        assert_eq!(digits_only("n/a"), "");
    }

    #[test]
    fn non_empty_rejects_blank() {
        assert_eq!(non_empty("  ".into()), None);
        assert_eq!(non_empty("x".into()), Some("x".into()));
    }
}
