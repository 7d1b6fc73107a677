/// Formats milliseconds as `m:ss`.
pub fn format_time(milliseconds: u64) -> String {
    let minutes = milliseconds / 60_000;
    let seconds = (milliseconds % 60_000) / 1000;
    format!("{}:{:02}", minutes, seconds)
}

/// Masks a secret for display, one bullet per character.
pub fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(180_000), "3:00");
        assert_eq!(format_time(61_000), "1:01");
        assert_eq!(format_time(9_999), "0:09");
    }

    #[test]
    fn test_format_time_zero() {
        assert_eq!(format_time(0), "0:00");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("1234"), "••••");
        assert_eq!(mask(""), "");
    }
}
