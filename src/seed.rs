//! Deterministic seed derivation.
//!
//! Personalized exams must be reproducible: the same student key and the
//! same question tree must yield the same randomized variant on every
//! machine and every run. Seeds are therefore derived by hashing the
//! relevant identifiers with SHA-256 and folding the digest into a
//! `u64`, never from process-local state.

use sha2::{Digest, Sha256};

/// Derive a stable 64-bit seed from an ordered list of components.
///
/// Components are length-prefixed before hashing, so `["ab", "c"]` and
/// `["a", "bc"]` produce different seeds.
pub fn stable_seed<I, S>(components: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for component in components {
        let bytes = component.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    let digest = hasher.finalize();
    u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

/// Seed for one student's rendition of one configuration subtree.
pub fn subtree_seed(class: &str, path: &[String], student_key: &str) -> u64 {
    let mut parts: Vec<&str> = vec![class];
    parts.extend(path.iter().map(|s| s.as_str()));
    parts.push(student_key);
    stable_seed(parts)
}
