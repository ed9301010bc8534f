//! Streaming content hashing.
//!
//! Digests are content-only: identical bytes yield the identical digest
//! regardless of file name or location, which is what makes them usable as
//! dedup keys and persisted record identities.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::ProcessingResult;

const HASH_BUFFER_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a file as a lowercase hex string.
///
/// The file is streamed through the digest in fixed-size chunks; it is
/// never loaded wholly into memory.
pub async fn hash_file(path: impl AsRef<Path>) -> ProcessingResult<String> {
    let mut file = File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
