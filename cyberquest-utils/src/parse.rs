/// Interpret a boolean-ish env or query value (`1`, `true`, `yes`, `on`).
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Coerce a level number from loose input.
///
/// Accepts integers and decimal strings (truncated toward zero). Anything
/// unparseable, non-finite or below 1 becomes 1.
pub fn coerce_level(raw: &str) -> i32 {
    let value = raw.trim();
    if let Ok(level) = value.parse::<i64>() {
        return clamp_level(level);
    }

    match value.parse::<f64>() {
        Ok(level) if level.is_finite() => clamp_level(level.trunc() as i64),
        _ => 1,
    }
}

fn clamp_level(level: i64) -> i32 {
    i32::try_from(level).map_or(1, |level| level.max(1))
}

/// Parse a positive count such as a `limit` query value, falling back to
/// `default` for missing, malformed or non-positive input.
pub fn parse_positive_count(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .map_or(default, |value| u32::try_from(value).unwrap_or(u32::MAX))
}

/// Split a comma-joined option cell into trimmed, non-empty entries.
pub fn split_option_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Whether two answers are the same once trimmed and lower-cased. Uses
/// Unicode case folding, so `Ärger` matches `ärger`.
pub fn answers_match(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// Treat blank strings as absent.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
