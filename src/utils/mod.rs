use regex::Regex;

/// Maximum number of title characters kept in a suggested file name
pub const TITLE_PREFIX_LEN: usize = 30;

const FALLBACK_STEM: &str = "video";
const FALLBACK_EXTENSION: &str = "mp4";

const ILLEGAL_CHARS: &str = r#"[<>:"/\\|?*\x00-\x1f]"#;

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized = match Regex::new(ILLEGAL_CHARS) {
        Ok(re) => re.replace_all(filename, "_").into_owned(),
        Err(_) => filename
            .chars()
            .map(|c| if is_illegal(c) { '_' } else { c })
            .collect(),
    };
    sanitized.trim().to_string()
}

fn is_illegal(c: char) -> bool {
    c < ' ' || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}

/// Builds `<title prefix>.<ext>` for the file handed to the delivery sink.
pub fn suggested_file_name(title: &str, ext: &str) -> String {
    let prefix: String = title.chars().take(TITLE_PREFIX_LEN).collect();
    let sanitized = sanitize_filename(&prefix);
    let stem = sanitized.trim_matches(|c| c == '.' || c == ' ');
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };

    let ext = ext.trim().trim_start_matches('.');
    let ext = if ext.is_empty() { FALLBACK_EXTENSION } else { ext };

    format!("{}.{}", stem, ext)
}
