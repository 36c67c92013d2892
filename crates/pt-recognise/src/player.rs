/// Names an OCR pass can produce that are placeholders, not real player
/// names.
const INVALID_NAMES: &[&str] = &["you", "player", "empty", "seat", "-", "?", "n/a"];

/// Normalises a raw OCR'd seat name, filtering placeholders to empty.
pub fn filter_player_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if INVALID_NAMES.contains(&lower.as_str()) {
        return None;
    }
    if trimmed.chars().count() == 1 && !trimmed.chars().next().unwrap().is_ascii_digit() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parses a seat's stack/bet text into a numeric amount, reusing the same
/// thousand-separator stripping as the pot recogniser.
pub fn parse_stack(raw: &str) -> Option<f64> {
    crate::pot::parse_amount(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_known_placeholders_case_insensitively() {
        assert_eq!(filter_player_name("Player"), None);
        assert_eq!(filter_player_name("EMPTY"), None);
        assert_eq!(filter_player_name("-"), None);
        assert_eq!(filter_player_name("?"), None);
    }

    #[test]
    fn filters_single_non_digit_char() {
        assert_eq!(filter_player_name("x"), None);
        assert_eq!(filter_player_name("9"), Some("9".to_string()));
    }

    #[test]
    fn keeps_real_names() {
        assert_eq!(filter_player_name("Ivan23"), Some("Ivan23".to_string()));
    }
}
