//! Content fingerprinting for rename detection

use crate::types::SyncError;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 128-bit content fingerprint of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 16]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Compute the 128-bit fingerprint of a file's full content
///
/// The file is streamed in 64KB chunks through Blake3 and the first 16 bytes
/// of the hash are kept.
///
/// # Errors
/// * `SyncError::Read` if the file is unreadable or disappeared since it was listed
///
/// # Example
/// ```no_run
/// use replisync::hash::fingerprint;
/// use std::path::Path;
///
/// let digest = fingerprint(Path::new("file.txt"))?;
/// println!("{}", digest);
/// # Ok::<(), replisync::types::SyncError>(())
/// ```
pub fn fingerprint(file_path: &Path) -> Result<Digest, SyncError> {
    let mut file = File::open(file_path).map_err(|e| SyncError::read(file_path, e))?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| SyncError::read(file_path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[0..bytes_read]);
    }

    let hash = hasher.finalize();
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&hash.as_bytes()[..16]);
    Ok(Digest(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_fingerprint_empty_file() {
        let file = temp_with(b"");
        let digest = fingerprint(file.path()).unwrap();
        assert_eq!(digest.as_bytes().len(), 16);
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let file1 = temp_with(b"Test content for hashing");
        let file2 = temp_with(b"Test content for hashing");

        assert_eq!(
            fingerprint(file1.path()).unwrap(),
            fingerprint(file2.path()).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_different_content() {
        let file1 = temp_with(b"Content A");
        let file2 = temp_with(b"Content B");

        assert_ne!(
            fingerprint(file1.path()).unwrap(),
            fingerprint(file2.path()).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_is_blake3_prefix() {
        let file = temp_with(b"hello");
        let digest = fingerprint(file.path()).unwrap();
        let full = blake3::hash(b"hello");
        assert_eq!(&digest.as_bytes()[..], &full.as_bytes()[..16]);
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        let file = temp_with(b"display me");
        let shown = fingerprint(file.path()).unwrap().to_string();
        assert_eq!(shown.len(), 32);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_nonexistent_file_is_read_error() {
        let result = fingerprint(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(SyncError::Read { .. })));
    }
}
