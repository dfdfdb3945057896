//! SHA-256 digests
//!
//! Hex-encoded (lowercase) SHA-256 over in-memory bytes and files. The
//! output format matches `sha256sum` without the trailing file name.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 digest of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compute the SHA-256 digest of a file
///
/// # Errors
///
/// Returns the underlying IO error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();

    // Read file in chunks and update hasher
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // FIPS 180-2 test vectors
    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const TWO_BLOCK: &str = "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1";

    #[test]
    fn test_known_vectors() {
        assert_eq!(sha256_hex(b""), EMPTY);
        assert_eq!(sha256_hex(b"abc"), ABC);
        assert_eq!(
            sha256_hex(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq"),
            TWO_BLOCK
        );
    }

    #[test]
    fn test_file_matches_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Larger than one read buffer
        let content = vec![b'x'; 20_000];
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        assert_eq!(sha256_file(file.path()).unwrap(), sha256_hex(&content));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = sha256_file(Path::new("/nonexistent/solver/file.md"));
        assert!(result.is_err());
    }
}
