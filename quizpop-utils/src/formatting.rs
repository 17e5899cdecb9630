use quizpop_core::lives::MAX_LIVES;
use quizpop_core::xp::XP_PER_LEVEL;

/// Render lives as filled and empty hearts (e.g. `♥♥♥♡♡`).
pub fn format_hearts(lives: u8) -> String {
    let filled = usize::from(lives.min(MAX_LIVES));
    let empty = usize::from(MAX_LIVES) - filled;
    format!("{}{}", "♥".repeat(filled), "♡".repeat(empty))
}

/// Render level progress as a fixed-width bar followed by `xp/100`.
pub fn format_xp_bar(xp: u32, width: usize) -> String {
    let xp = xp.min(XP_PER_LEVEL);
    let filled = width * xp as usize / XP_PER_LEVEL as usize;
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        xp,
        XP_PER_LEVEL
    )
}

/// Format seconds into a compact human-readable duration (e.g. 59s, 2h 5m, 1d 3h).
pub fn format_compact_duration(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let parts: Vec<String> = if days > 0 {
        vec![(days, 'd'), (hours, 'h')]
    } else if hours > 0 {
        vec![(hours, 'h'), (minutes, 'm')]
    } else {
        vec![(minutes, 'm'), (seconds, 's')]
    }
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| format!("{value}{unit}"))
    .collect();

    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_compact_duration, format_hearts, format_xp_bar};

    #[test]
    fn hearts_show_missing_lives() {
        assert_eq!(format_hearts(5), "♥♥♥♥♥");
        assert_eq!(format_hearts(2), "♥♥♡♡♡");
        assert_eq!(format_hearts(0), "♡♡♡♡♡");
        assert_eq!(format_hearts(9), "♥♥♥♥♥");
    }

    #[test]
    fn xp_bar_scales_to_width() {
        assert_eq!(format_xp_bar(0, 10), "[----------] 0/100");
        assert_eq!(format_xp_bar(55, 10), "[#####-----] 55/100");
        assert_eq!(format_xp_bar(99, 4), "[###-] 99/100");
    }

    #[test]
    fn compact_duration_formatting() {
        assert_eq!(format_compact_duration(0), "0s");
        assert_eq!(format_compact_duration(59), "59s");
        assert_eq!(format_compact_duration(60), "1m");
        assert_eq!(format_compact_duration(61), "1m 1s");
        assert_eq!(format_compact_duration(3_600), "1h");
        assert_eq!(format_compact_duration(7_500), "2h 5m");
        assert_eq!(format_compact_duration(86_400), "1d");
        assert_eq!(format_compact_duration(97_200), "1d 3h");
    }
}
