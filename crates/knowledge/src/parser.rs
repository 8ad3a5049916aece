//! Source file parsing and text extraction.

use catalog_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("txt") | Some("text") | Some("csv") | Some("json") | Some("yaml")
            | Some("yml") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse a source file and extract clean text.
///
/// Files that are not valid UTF-8 or contain NUL bytes are rejected as binary.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);

    let bytes = fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let raw = match String::from_utf8(bytes) {
        Ok(text) if is_likely_text(&text) => text,
        _ => {
            return Err(AppError::Knowledge(format!(
                "Binary file not supported: {:?}",
                path
            )))
        }
    };

    let cleaned = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Html => clean_html(&raw),
        ContentType::PlainText | ContentType::Unknown => raw.trim().to_string(),
    };

    Ok(cleaned)
}

/// Clean markdown by removing excess formatting.
///
/// Blank lines are kept so paragraph boundaries survive for the splitter.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        result.push_str(trimmed);
        result.push('\n');
    }

    collapse_blank_lines(&result)
}

fn collapse_blank_lines(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 {
                result.push('\n');
            }
        } else {
            blank_run = 0;
            result.push_str(line);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags (simple approach).
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;

            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    // Collapse whitespace
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .get(..needle.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(needle))
        .unwrap_or(false)
}

/// Check if text is likely text (not binary).
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("file.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("FILE.TXT")),
            ContentType::PlainText
        );
        assert_eq!(
            ContentType::from_path(Path::new("page.html")),
            ContentType::Html
        );
        assert_eq!(
            ContentType::from_path(Path::new("noext")),
            ContentType::Unknown
        );
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# LensPro 4K\n\nComes in black.\n\n\n\n```\nspec\n```\n\nShips worldwide.";
        let output = clean_markdown(input);
        assert_eq!(output, "LensPro 4K\n\nComes in black.\n\nspec\n\nShips worldwide.");
    }

    #[test]
    fn test_clean_html() {
        let input = "<html><body><p>Hello <b>world</b></p><script>x()</script></body></html>";
        let output = clean_html(input);
        assert_eq!(output, "Hello world");
    }

    #[test]
    fn test_clean_html_non_ascii() {
        let input = "<p>Câmera ultra</p><STYLE>p{}</STYLE><p>nítida</p>";
        assert_eq!(clean_html(input), "Câmera ultra nítida");
    }

    #[test]
    fn test_parse_rejects_binary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("image.bin");
        std::fs::write(&path, [0u8, 159, 146, 150]).unwrap();

        assert!(parse_file(&path).is_err());
    }

    #[test]
    fn test_parse_plain_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("desk.txt");
        std::fs::write(&path, "  Standing desk, oak top.  \n").unwrap();

        assert_eq!(parse_file(&path).unwrap(), "Standing desk, oak top.");
    }
}
