/// Why an uploaded filename was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains null bytes.
    NullByte,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Filename has no extension after the last dot, or nothing before it.
    MissingExtension,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::MissingExtension => "Invalid filename: a file extension is required",
        }
    }
}

/// The client-supplied name of an upload, split for storage in `file_record`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    /// Name without extension, e.g. `diploma` for `Diploma.PDF` keeps its case.
    pub stem: String,
    /// Lowercase extension without the dot.
    pub extension: String,
}

/// Validate an uploaded filename and split it into stem and extension.
///
/// Control characters are rejected so the name can later be echoed in
/// `Content-Disposition` headers.
pub fn split_upload_name(filename: &str) -> Result<UploadName, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    let (stem, extension) = trimmed
        .rsplit_once('.')
        .ok_or(FilenameError::MissingExtension)?;
    if stem.is_empty() || extension.is_empty() {
        return Err(FilenameError::MissingExtension);
    }

    Ok(UploadName {
        stem: stem.to_string(),
        extension: extension.to_ascii_lowercase(),
    })
}

/// Build a safe inline `Content-Disposition` header value.
pub fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
