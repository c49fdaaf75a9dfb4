// SPDX-License-Identifier: Apache-2.0

//! `H_` key family: per-file content digests.

use crate::error::ChangeTrackerError;
use cfagent_store::Tree;

/// A supported digest algorithm tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestTag {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    /// The agent's preferred algorithm, resolved by the caller before
    /// storage; kept distinct so a policy can say "best" without caring
    /// which concrete algorithm that resolves to on this host.
    Best,
}

impl DigestTag {
    /// The literal tag text, left-padded to the fixed 7-byte width the
    /// on-disk key format uses.
    fn tag_text(self) -> &'static str {
        match self {
            DigestTag::Md5 => "MD5",
            DigestTag::Sha1 => "SHA1",
            DigestTag::Sha224 => "SHA224",
            DigestTag::Sha256 => "SHA256",
            DigestTag::Sha384 => "SHA384",
            DigestTag::Sha512 => "SHA512",
            DigestTag::Best => "best",
        }
    }

    fn padded(self) -> [u8; 7] {
        let mut buf = [0u8; 7];
        let text = self.tag_text().as_bytes();
        buf[..text.len()].copy_from_slice(text);
        buf
    }
}

fn hash_key(tag: DigestTag, path: &str) -> String {
    let mut key = String::from("H_");
    key.push_str(&String::from_utf8_lossy(&tag.padded()));
    key.push('\0');
    key.push_str(path);
    key
}

/// The result of [`check_and_update_hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashOutcome {
    /// No prior record existed; the new digest was stored.
    New,
    /// The stored digest matches the new one.
    Unchanged,
    /// The stored digest differs; overwritten only if `update` was set.
    Changed,
}

/// Compares `digest` against the stored record for `(tag, path)`, storing
/// it when absent or (if `update` is set) when it differs.
pub fn check_and_update_hash(
    tree: &Tree,
    path: &str,
    tag: DigestTag,
    digest: &[u8],
    update: bool,
) -> Result<HashOutcome, ChangeTrackerError> {
    let key = hash_key(tag, path);
    match tree.get(&key)? {
        None => {
            tree.put(&key, digest)?;
            Ok(HashOutcome::New)
        }
        Some(prev) if prev == digest => Ok(HashOutcome::Unchanged),
        Some(_) => {
            if update {
                tree.put(&key, digest)?;
            }
            Ok(HashOutcome::Changed)
        }
    }
}

/// Removes the stored hash record for `(tag, path)`, if any.
pub fn forget_hash(tree: &Tree, path: &str, tag: DigestTag) -> Result<(), ChangeTrackerError> {
    tree.delete(&hash_key(tag, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_store::Store;

    #[test]
    fn first_write_is_new_then_unchanged_then_changed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("hashes").expect("tree");

        let outcome = check_and_update_hash(&tree, "/etc/motd", DigestTag::Sha256, b"abc", true).unwrap();
        assert_eq!(outcome, HashOutcome::New);

        let outcome = check_and_update_hash(&tree, "/etc/motd", DigestTag::Sha256, b"abc", true).unwrap();
        assert_eq!(outcome, HashOutcome::Unchanged);

        let outcome = check_and_update_hash(&tree, "/etc/motd", DigestTag::Sha256, b"def", false).unwrap();
        assert_eq!(outcome, HashOutcome::Changed);
        // update=false: the stored digest must still be "abc".
        let outcome = check_and_update_hash(&tree, "/etc/motd", DigestTag::Sha256, b"abc", true).unwrap();
        assert_eq!(outcome, HashOutcome::Unchanged);
    }

    #[test]
    fn distinct_tags_for_the_same_path_are_independent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("hashes").expect("tree");

        check_and_update_hash(&tree, "/f", DigestTag::Md5, b"md5digest", true).unwrap();
        let outcome = check_and_update_hash(&tree, "/f", DigestTag::Sha1, b"sha1digest", true).unwrap();
        assert_eq!(outcome, HashOutcome::New);
    }
}
