//! Content digest boundary: the pluggable function that maps a byte stream
//! to a fixed-length hash.
//!
//! The pipeline never cares which digest function is used; it only requires
//! a fixed 128-bit output rendered as a 32-character lowercase hex string.
//! [`Md5Digester`] is the default implementation. Batch digesting is an
//! optimization, not a correctness requirement: a batch call returns one
//! result per path, so a failure on one path never poisons its neighbours.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::HashError;

/// Digest length in bytes (128-bit MD5).
pub const DIGEST_LEN: usize = 16;

/// A fixed-length content digest.
pub type Digest = [u8; DIGEST_LEN];

/// Buffer size for streaming digest computation (64KB).
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Render a digest as a lowercase hexadecimal string of constant width
/// (32 characters).
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse a 32-character hexadecimal string back into a digest.
///
/// Returns `None` if the string has the wrong length or contains
/// non-hexadecimal characters.
#[must_use]
pub fn hex_to_digest(hex: &str) -> Option<Digest> {
    if hex.len() != DIGEST_LEN * 2 {
        return None;
    }

    let mut digest = [0u8; DIGEST_LEN];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let hex_str = std::str::from_utf8(chunk).ok()?;
        digest[i] = u8::from_str_radix(hex_str, 16).ok()?;
    }

    Some(digest)
}

/// The content-addressing function used by the hash worker pool.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// by every worker. The batch call exists because some backends amortize
/// per-call overhead across many files; the default just loops.
pub trait Digester: Send + Sync {
    /// Digest the content of a single file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    fn digest_file(&self, path: &Path) -> Result<Digest, HashError>;

    /// Digest a batch of files, returning one result per input path in
    /// order. A failed path yields its own `Err` entry; the rest of the
    /// batch is unaffected.
    fn digest_batch(&self, paths: &[PathBuf]) -> Vec<Result<Digest, HashError>> {
        paths.iter().map(|p| self.digest_file(p)).collect()
    }
}

/// Streaming MD5 digester.
///
/// Reads files in fixed-size chunks so memory use stays constant regardless
/// of file size.
#[derive(Debug, Clone)]
pub struct Md5Digester {
    buffer_size: usize,
}

impl Md5Digester {
    /// Create a digester with the default read buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: READ_BUFFER_SIZE,
        }
    }

    /// Create a digester with a custom read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }
}

impl Default for Md5Digester {
    fn default() -> Self {
        Self::new()
    }
}

impl Digester for Md5Digester {
    fn digest_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file =
            File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

            if bytes_read == 0 {
                break;
            }

            context.consume(&buffer[..bytes_read]);
        }

        Ok(context.compute().0)
    }
}
