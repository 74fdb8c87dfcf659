//! Shared utility helpers.

use std::path::Path;

use encoding_rs::WINDOWS_1252;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read a file as a string, trying UTF-8 first, then Windows-1252 as fallback.
///
/// A leading UTF-8 byte order mark is stripped, since SqlPackage writes one.
pub fn read_file_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let mut bytes = std::fs::read(path)?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(err) => {
            // Fall back to Windows-1252 (common for scripts saved on Windows)
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ));
            }
            Ok(decoded.into_owned())
        }
    }
}

/// Format a byte count as kilobytes with one decimal place.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.1}KB", bytes as f64 / 1024.0)
}
