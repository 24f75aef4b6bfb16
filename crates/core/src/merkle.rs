//! Merkle root computation over ordered chunk hashes.
//!
//! Nodes are built with [`hash_concat`] over the hex text of the two children,
//! so the root can be recomputed by anyone holding the ordered hex list. An odd
//! node at the end of a level is paired with itself. A single leaf is its own
//! root.

use crate::hash::{ContentHash, hash_bytes, hash_concat};

/// Compute the Merkle root of an ordered list of hex hashes.
///
/// The empty list yields `hash_bytes(b"")`. Ingestion never produces an empty
/// list, but the value is defined so verification of arbitrary input is total.
///
/// Leaves are expected to be hex digests. When the root ends up being a single
/// string that is not a valid digest (a lone malformed leaf, for instance),
/// the root is `hash_bytes` of that string's text. Such a root never equals a
/// root produced by ingestion, so verification of malformed input fails.
pub fn compute_merkle_root<S: AsRef<str>>(leaves: &[S]) -> ContentHash {
    match leaves {
        [] => hash_bytes(b""),
        [only] => leaf_hash(only.as_ref()),
        _ => {
            let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_string()).collect();
            while level.len() > 1 {
                level = next_level(&level);
            }
            leaf_hash(&level[0])
        }
    }
}

/// Recompute the root and compare it with an expected value.
pub fn verify_merkle_root<S: AsRef<str>>(leaves: &[S], expected: &ContentHash) -> crate::Result<()> {
    let computed = compute_merkle_root(leaves);
    if &computed != expected {
        return Err(crate::Error::HashMismatch {
            expected: expected.to_hex(),
            actual: computed.to_hex(),
        });
    }
    Ok(())
}

fn next_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_concat([left, right]).to_hex()
        })
        .collect()
}

// A root that is a bare leaf is returned as-is. Non-digest text is hashed.
fn leaf_hash(leaf: &str) -> ContentHash {
    ContentHash::from_hex(leaf).unwrap_or_else(|_| hash_bytes(leaf.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(items: &[&[u8]]) -> Vec<String> {
        items.iter().map(|d| hash_bytes(d).to_hex()).collect()
    }

    #[test]
    fn test_empty_root_is_empty_hash() {
        let none: [&str; 0] = [];
        assert_eq!(compute_merkle_root(&none), hash_bytes(b""));
    }

    #[test]
    fn test_single_leaf_is_root() {
        let l = leaves(&[b"only"]);
        assert_eq!(compute_merkle_root(&l).to_hex(), l[0]);
    }

    #[test]
    fn test_two_leaves() {
        let l = leaves(&[b"a", b"b"]);
        assert_eq!(compute_merkle_root(&l), hash_concat([&l[0], &l[1]]));
    }

    #[test]
    fn test_odd_tail_pairs_with_itself() {
        let l = leaves(&[b"a", b"b", b"c"]);
        let ab = hash_concat([&l[0], &l[1]]).to_hex();
        let cc = hash_concat([&l[2], &l[2]]).to_hex();
        let expected = hash_concat([&ab, &cc]);
        assert_eq!(compute_merkle_root(&l), expected);
    }

    #[test]
    fn test_five_leaves() {
        let l = leaves(&[b"1", b"2", b"3", b"4", b"5"]);
        let n12 = hash_concat([&l[0], &l[1]]).to_hex();
        let n34 = hash_concat([&l[2], &l[3]]).to_hex();
        let n55 = hash_concat([&l[4], &l[4]]).to_hex();
        let n1234 = hash_concat([&n12, &n34]).to_hex();
        let n5555 = hash_concat([&n55, &n55]).to_hex();
        assert_eq!(compute_merkle_root(&l), hash_concat([&n1234, &n5555]));
    }

    #[test]
    fn test_order_matters() {
        let l = leaves(&[b"a", b"b"]);
        let reversed: Vec<String> = l.iter().rev().cloned().collect();
        assert_ne!(compute_merkle_root(&l), compute_merkle_root(&reversed));
    }

    #[test]
    fn test_verify_merkle_root() {
        let l = leaves(&[b"x", b"y", b"z"]);
        let root = compute_merkle_root(&l);
        assert!(verify_merkle_root(&l, &root).is_ok());
        assert!(verify_merkle_root(&l[..2], &root).is_err());
    }

    #[test]
    fn test_malformed_single_leaf_hashes_its_text() {
        let root = compute_merkle_root(["not-a-hash"].as_slice());
        assert_eq!(root, hash_bytes(b"not-a-hash"));
        assert!(verify_merkle_root(["not-a-hash"].as_slice(), &hash_bytes(b"")).is_err());
    }
}
