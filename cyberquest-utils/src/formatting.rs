/// Shorten text to at most `max_chars` characters, appending `...` when
/// anything was cut. Counts characters, not bytes.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", trimmed[..byte_idx].trim_end()),
        None => trimmed.to_owned(),
    }
}

/// Percentage of correct answers rounded to one decimal place; 0 when
/// nothing has been answered.
pub fn accuracy_percent(correct: i64, answered: i64) -> f64 {
    if answered <= 0 {
        return 0.0;
    }

    let ratio = correct as f64 / answered as f64 * 100.0;
    (ratio * 10.0).round() / 10.0
}

/// Share of `required` that `current` covers, as a percentage in [0, 100].
pub fn progress_percent(current: i64, required: i64) -> f64 {
    if required <= 0 {
        return 100.0;
    }

    (current as f64 / required as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::{accuracy_percent, excerpt, progress_percent};

    #[test]
    fn excerpt_cuts_on_char_boundaries() {
        assert_eq!(excerpt("short question", 50), "short question");
        assert_eq!(excerpt("abcdefghij", 4), "abcd...");
        assert_eq!(excerpt("ééééé", 2), "éé...");
        assert_eq!(excerpt("word  next", 5), "word...");
    }

    #[test]
    fn accuracy_rounds_to_one_decimal() {
        assert_eq!(accuracy_percent(0, 0), 0.0);
        assert_eq!(accuracy_percent(1, 3), 33.3);
        assert_eq!(accuracy_percent(2, 3), 66.7);
        assert_eq!(accuracy_percent(5, 5), 100.0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(50, 100), 50.0);
        assert_eq!(progress_percent(400, 250), 100.0);
        assert_eq!(progress_percent(-5, 100), 0.0);
        assert_eq!(progress_percent(10, 0), 100.0);
    }
}
