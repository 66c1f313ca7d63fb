//! ** idgen module **
//! Stable ids for choice options that were not given an explicit name.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// Id for a choice option: `_` followed by the base64 SHA-1 digest of its prompt.
///
/// Generated ids start with `_`, which user-written identifiers cannot, so they never
/// collide with a label.
pub fn choice_id(prompt: &str) -> String {
    format!("_{}", STANDARD.encode(Sha1::digest(prompt.as_bytes())))
}
