use anyhow::Result;
use url::Url;

use crate::TubeMirrorError;

/// Filename used when a title is empty or sanitizes down to nothing
pub const PLACEHOLDER_TITLE: &str = "unknown_title";

/// Characters that cannot appear in a filename on common filesystems
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| TubeMirrorError::InvalidUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!(TubeMirrorError::InvalidUrl(format!(
            "{} (URL must use HTTP or HTTPS protocol)",
            url
        )));
    }

    Ok(parsed.to_string())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Strip characters that are illegal in filenames, keeping everything else in order.
///
/// No escaping and no truncation: very long titles go to the filesystem unchanged.
pub fn sanitize_filename(filename: Option<&str>) -> String {
    let sanitized: String = filename
        .unwrap_or_default()
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .collect();

    if sanitized.is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        sanitized
    }
}

/// External tools the binary shells out to
pub struct ToolCheck<'a> {
    pub yt_dlp: &'a str,
    pub rsync: &'a str,
    pub check_rsync: bool,
}

/// Check the environment for the tools the pipeline needs.
///
/// A missing yt-dlp is an error; the returned list holds warnings for optional tools.
pub async fn check_dependencies(tools: ToolCheck<'_>) -> Result<Vec<String>> {
    if !check_command_available(tools.yt_dlp, "--version").await {
        anyhow::bail!(TubeMirrorError::ToolMissing(format!(
            "{} is not installed or not in PATH. Install it: https://github.com/yt-dlp/yt-dlp",
            tools.yt_dlp
        )));
    }

    let mut missing = Vec::new();

    if !check_command_available("ffmpeg", "-version").await {
        missing.push("ffmpeg - required by yt-dlp for MP3 conversion".to_string());
    }

    if tools.check_rsync && !check_command_available(tools.rsync, "--version").await {
        missing.push(format!("{} - required for remote sync", tools.rsync));
    }

    Ok(missing)
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3661), "1h 1m 1s");
    }

    #[test]
    fn test_sanitize_filename_strips_illegal_chars() {
        assert_eq!(sanitize_filename(Some("AC/DC: Back in Black?")), "ACDC Back in Black");
        assert_eq!(sanitize_filename(Some(r#"a\b*c"d<e>f|g"#)), "abcdefg");

        let input = "Mix of *all* the \"things\" <2024> | a/b\\c?:";
        let output = sanitize_filename(Some(input));
        assert!(!output.chars().any(|c| ILLEGAL_FILENAME_CHARS.contains(&c)));
        let expected: String = input.chars().filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c)).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_sanitize_filename_keeps_other_chars() {
        assert_eq!(sanitize_filename(Some("  Café - Niño (Live) [4K] ")), "  Café - Niño (Live) [4K] ");
    }

    #[test]
    fn test_sanitize_filename_placeholder() {
        assert_eq!(sanitize_filename(None), PLACEHOLDER_TITLE);
        assert_eq!(sanitize_filename(Some("")), PLACEHOLDER_TITLE);
        assert_eq!(sanitize_filename(Some("???")), PLACEHOLDER_TITLE);
    }

    #[test]
    fn test_validate_and_normalize_url() {
        assert!(validate_and_normalize_url("https://example.com").is_ok());
        assert!(validate_and_normalize_url("http://example.com").is_ok());
        assert!(validate_and_normalize_url("ftp://example.com").is_err());
        assert!(validate_and_normalize_url("not-a-url").is_err());
    }

    #[tokio::test]
    async fn test_missing_extractor_is_fatal() {
        let result = check_dependencies(ToolCheck {
            yt_dlp: "definitely-not-a-real-yt-dlp-binary",
            rsync: "rsync",
            check_rsync: false,
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TubeMirrorError>(),
            Some(TubeMirrorError::ToolMissing(_))
        ));
    }
}
