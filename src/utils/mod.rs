const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
const PRESENTATION_SUFFIXES: [&str; 2] = [".ppt", ".pptx"];

/// Human-readable size using 1024-based units, rounded to two decimals.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = (bytes as f64 / scale as f64 * 100.0).round() / 100.0;
    format!("{} {}", value, SIZE_UNITS[unit])
}

/// Suffix check applied to dropped files. Case-sensitive: `DECK.PPTX` is rejected.
pub fn is_presentation(name: &str) -> bool {
    PRESENTATION_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Suggested save name for a download link: its last path segment.
pub fn suggested_filename(download_url: &url::Url) -> String {
    let name = download_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(sanitize_filename)
        .unwrap_or_default();

    if name.is_empty() {
        "compressed.pptx".to_string()
    } else {
        name
    }
}
