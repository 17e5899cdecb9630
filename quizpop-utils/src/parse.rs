use std::time::Duration;

use quizpop_core::badges::BadgeId;

/// Parse a compact duration like `90s`, `15m`, `3h`, `1h30m`, `2d` or plain seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    if compact.bytes().all(|byte| byte.is_ascii_digit()) {
        let seconds = compact.parse::<u64>().ok().filter(|value| *value > 0)?;
        return Some(Duration::from_secs(seconds));
    }

    let mut total_seconds = 0_u64;
    let mut digits = String::new();
    for ch in compact.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let unit_seconds = match ch.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => return None,
        };
        let value = digits.parse::<u64>().ok()?;
        digits.clear();
        total_seconds = total_seconds.checked_add(value.checked_mul(unit_seconds)?)?;
    }

    // A trailing number without a unit after unit segments is ambiguous.
    if !digits.is_empty() || total_seconds == 0 {
        return None;
    }

    Some(Duration::from_secs(total_seconds))
}

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`).
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a comma or space separated list of badge ids.
pub fn parse_badge_ids(raw: &str) -> Option<Vec<BadgeId>> {
    raw.split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<BadgeId>().ok())
        .collect()
}
