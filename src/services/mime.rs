use crate::error::AppError;
use std::path::Path;

/// Executable and script extensions rejected regardless of the declared
/// content type.
const DENIED_EXTENSIONS: &[&str] = &[
    "exe", "msi", "bat", "cmd", "sh", "ps1", "php", "jar", "dll", "com", "vbs", "js", "py",
    "pl", "rb",
];

const RISKY_MIME_TYPES: &[&str] = &[
    "application/x-msdownload",
    "application/x-ms-installer",
    "application/x-sh",
    "application/x-csh",
    "application/x-bat",
    "application/x-cmd",
    "application/java-archive",
    "application/x-javascript",
    "application/vnd.microsoft.portable-executable",
    "application/x-dosexec",
    "application/vnd.apple.installer+xml",
    "application/vnd.ms-cab-compressed",
    "application/x-httpd-php",
    "text/x-php",
    "application/x-perl",
    "application/x-python",
    "application/x-ruby",
];

const ALLOWED_MIME_TYPES: &[&str] = &[
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
    "application/rtf",
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/svg+xml",
    "image/tiff",
    // Audio
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/webm",
    // Video
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/quicktime",
    // Common text and code formats
    "application/json",
    "text/html",
    "text/css",
    "application/javascript",
    "application/xml",
    "text/xml",
];

/// Declared-type validation only; no byte-signature sniffing. Default-deny:
/// the extension deny-list wins over any declared type, risky types are
/// rejected next, and anything outside the allow-list is rejected last.
pub fn validate(file_name: &str, content_type: &str) -> Result<(), AppError> {
    if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if DENIED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::UnsafeFileType(format!(
                "File extension '.{}' is not allowed for security reasons",
                ext
            )));
        }
    }

    if RISKY_MIME_TYPES.contains(&content_type) {
        return Err(AppError::UnsafeFileType(format!(
            "File type '{}' is not allowed for security reasons",
            content_type
        )));
    }

    if ALLOWED_MIME_TYPES.contains(&content_type) {
        return Ok(());
    }

    Err(AppError::UnsafeFileType(format!(
        "Unknown file type '{}' is not allowed",
        content_type
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_extension_rejected_regardless_of_type() {
        for name in ["run.exe", "run.EXE", "setup.msi", "script.sh", "app.js"] {
            assert!(validate(name, "text/plain").is_err(), "{}", name);
        }
    }

    #[test]
    fn risky_mime_rejected() {
        assert!(validate("note.txt", "application/x-msdownload").is_err());
        assert!(validate("note.txt", "application/x-httpd-php").is_err());
    }

    #[test]
    fn allowed_types_accepted() {
        assert!(validate("photo.png", "image/png").is_ok());
        assert!(validate("doc.pdf", "application/pdf").is_ok());
        assert!(validate("notes.txt", "text/plain").is_ok());
        assert!(validate("archive.zip", "application/zip").is_ok());
    }

    #[test]
    fn unknown_type_rejected_by_default() {
        assert!(validate("blob.bin", "application/octet-stream").is_err());
        assert!(validate("data.xyz", "chemical/x-pdb").is_err());
    }
}
