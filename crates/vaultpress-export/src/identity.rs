//! Stable post identity: `nanoId` and the permalink derived from it.

use rand::Rng;
use vaultpress_core::{FrontMatter, keys};

/// Characters used for generated ids (no `0`, to avoid confusion with `O`)
pub const NANO_ID_ALPHABET: &[u8] = b"123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const NANO_ID_LENGTH: usize = 25;

/// Random id of [`NANO_ID_LENGTH`] characters from [`NANO_ID_ALPHABET`]
pub fn generate_nano_id() -> String {
    let mut rng = rand::thread_rng();
    (0..NANO_ID_LENGTH)
        .map(|_| NANO_ID_ALPHABET[rng.gen_range(0..NANO_ID_ALPHABET.len())] as char)
        .collect()
}

pub fn permalink_for(nano_id: &str) -> String {
    format!("/{}/", nano_id)
}

/// Give `fm` its identity and return the id.
///
/// An id in `existing` (a previously exported post) wins over the one already
/// in `fm`; a fresh id is generated only when neither has one. The permalink
/// is always rewritten from the final id.
pub fn ensure_identity(fm: &mut FrontMatter, existing: Option<&FrontMatter>) -> String {
    let nano_id = existing
        .and_then(|e| e.nano_id())
        .or_else(|| fm.nano_id())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let id = generate_nano_id();
            log::debug!("Assigned new nanoId {}", id);
            id
        });

    fm.set(keys::NANO_ID, nano_id.as_str());
    fm.set(keys::PERMALINK, permalink_for(&nano_id));
    nano_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = generate_nano_id();
        assert_eq!(id.len(), NANO_ID_LENGTH);
        assert!(id.bytes().all(|b| NANO_ID_ALPHABET.contains(&b)));
        assert_ne!(generate_nano_id(), id);
    }

    #[test]
    fn test_generates_when_absent() {
        let mut fm = FrontMatter::new();
        fm.set("title", "T");

        let id = ensure_identity(&mut fm, None);
        assert_eq!(fm.nano_id(), Some(id.as_str()));
        assert_eq!(fm.permalink(), Some(format!("/{}/", id).as_str()));

        let keys: Vec<_> = fm.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["title", "nanoId", "permalink"]);
    }

    #[test]
    fn test_keeps_current_id() {
        let mut fm = FrontMatter::new();
        fm.set("nanoId", "abc");
        fm.set("permalink", "/stale/");

        assert_eq!(ensure_identity(&mut fm, None), "abc");
        assert_eq!(fm.permalink(), Some("/abc/"));
    }

    #[test]
    fn test_existing_post_wins() {
        let mut fm = FrontMatter::new();
        fm.set("nanoId", "mine");
        let mut existing = FrontMatter::new();
        existing.set("nanoId", "theirs");

        assert_eq!(ensure_identity(&mut fm, Some(&existing)), "theirs");
        assert_eq!(fm.permalink(), Some("/theirs/"));
    }

    #[test]
    fn test_existing_without_id_falls_back() {
        let mut fm = FrontMatter::new();
        fm.set("nanoId", "mine");
        let existing = FrontMatter::new();

        assert_eq!(ensure_identity(&mut fm, Some(&existing)), "mine");
    }

    #[test]
    fn test_empty_id_is_regenerated() {
        let mut fm = FrontMatter::new();
        fm.set("nanoId", "");

        let id = ensure_identity(&mut fm, None);
        assert_eq!(id.len(), NANO_ID_LENGTH);
    }
}
