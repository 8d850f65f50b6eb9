use chrono::{DateTime, Utc};

/// 32-bit string hash over UTF-16 code units, `h = h * 31 + unit` with
/// wrapping arithmetic. The result is stable across runs and platforms.
pub fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Hue in degrees derived from [`rolling_hash`], so one poster ID always gets
/// the same colour.
pub fn stable_hue(text: &str) -> f32 {
    (rolling_hash(text).unsigned_abs() % 360) as f32
}

pub fn format_post_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Cuts `text` to at most `max_chars` characters, appending an ellipsis when
/// anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn rolling_hash_matches_known_values() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        assert_eq!(rolling_hash("1-2"), 48_534);
    }

    #[test]
    fn rolling_hash_wraps_instead_of_overflowing() {
        let long = "z".repeat(64);
        assert_eq!(rolling_hash(&long), rolling_hash(&long));
    }

    #[test]
    fn hue_stays_in_range() {
        for id in ["", "AbCd1234", "zzzzzzzzzzzzzzzzzzzzzz", "ID"] {
            let hue = stable_hue(id);
            assert!((0.0..360.0).contains(&hue), "{id}: {hue}");
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé…");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn post_time_is_utc() {
        let time = Utc.timestamp_opt(0, 0).single().expect("valid timestamp");
        assert_eq!(format_post_time(time), "1970-01-01 00:00:00 UTC");
    }
}
