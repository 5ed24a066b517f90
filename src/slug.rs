use sha2::{Digest, Sha256};

const MAX_LEN: usize = 63;
const SEPARATOR: char = '-';
const FALLBACK_PREFIX: &str = "feed-";
const FALLBACK_HASH_LEN: usize = 12;

fn hash_id(raw: &str, id_length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())[..id_length].to_string()
}

/// Turn an arbitrary title into a lowercase `[a-z0-9-]` identifier.
///
/// Runs of anything that is not an ASCII letter or digit collapse into a
/// single `-`. Titles with nothing usable left get a stable hash-based name,
/// so the result is never empty.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len().min(MAX_LEN));
    let mut pending_separator = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                if out.len() + 1 >= MAX_LEN {
                    break;
                }
                out.push(SEPARATOR);
            }
            pending_separator = false;
            if out.len() >= MAX_LEN {
                break;
            }
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if out.is_empty() {
        return format!("{FALLBACK_PREFIX}{}", hash_id(title, FALLBACK_HASH_LEN));
    }
    out
}
