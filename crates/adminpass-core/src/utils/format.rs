use chrono::{DateTime, TimeZone};

/// Characters of a token shown in logs and status output
const TOKEN_PREVIEW_LEN: usize = 20;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with 1024-based units, e.g. `1.5 KB`.
/// At most two decimals are kept and trailing zeros are dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Format a timestamp as `YYYY-MM-DD HH:mm:ss`, or `-` when absent.
pub fn format_date<Tz: TimeZone>(date: Option<&DateTime<Tz>>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match date {
        Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// First few characters of a token followed by an ellipsis, for logging.
pub fn token_preview(token: &str) -> String {
    let preview: String = token.chars().take(TOKEN_PREVIEW_LEN).collect();
    format!("{}...", preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024 * 1024), "5120 TB");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_date(Some(&date)), "2024-03-09 07:05:01");
        assert_eq!(format_date::<Utc>(None), "-");
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abc"), "abc...");
        assert_eq!(
            token_preview("eyJhbGciOiJIUzI1NiJ9.payload.sig"),
            "eyJhbGciOiJIUzI1NiJ9..."
        );
    }
}
