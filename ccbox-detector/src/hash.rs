//! Dependency hashing: the cache key for a project image (§4.C, §4.D).

use sha2::{Digest, Sha256};
use std::path::Path;

/// SHA-256 of the concatenation, in sorted-by-filename order, of
/// `<filename>\n<file bytes>\n`. A missing file is encoded as
/// `<filename>\n<missing>\n` so presence/absence is itself hashed. Returns
/// the first 16 hex characters.
pub fn dependency_hash(dir: &Path, filenames: &[String]) -> String {
    let mut sorted: Vec<&String> = filenames.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for filename in sorted {
        hasher.update(filename.as_bytes());
        hasher.update(b"\n");
        match std::fs::read(dir.join(filename)) {
            Ok(bytes) => {
                hasher.update(&bytes);
                hasher.update(b"\n");
            }
            Err(_) => {
                hasher.update(b"<missing>\n");
            }
        }
    }

    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut s = String::with_capacity(chars);
    for byte in bytes {
        if s.len() >= chars {
            break;
        }
        s.push_str(&format!("{byte:02x}"));
    }
    s.truncate(chars);
    s
}
