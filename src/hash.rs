//! Content fingerprinting for sources and `.mod` interface artifacts.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::{fmt, io::Read, path::Path, str::FromStr};

/// A SHA-1 hex digest.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(String);

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Hash {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

/// Hashes the bytes of `path`, optionally salted with the canonical form of `args`.
///
/// Salting with the argument list is what makes a flipped compiler flag invalidate
/// every source's cache entry even though the file contents themselves didn't change;
/// see the crate-level docs for why this matters for correctness.
pub fn hash_file(path: &Path, args: Option<&[String]>) -> Result<Hash> {
    let mut hasher = Sha1::new();
    if let Some(args) = args {
        hasher.update(canonical_args(args).as_bytes());
    }
    let mut file = std::fs::File::open(path)?;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Hash(hex::encode(hasher.finalize())))
}

/// A stable, self-consistent serialization of an argument list used to salt source hashes.
///
/// Only needs to agree between the write and read side of the *same* implementation,
/// so a NUL-joined token list gives a stable, self-consistent serialization of the
/// argument list.
fn canonical_args(args: &[String]) -> String {
    args.join("\0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn same_bytes_same_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.f90");
        std::fs::write(&path, b"module foo\nend module foo\n").unwrap();
        let h1 = hash_file(&path, None).unwrap();
        let h2 = hash_file(&path, None).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn args_salt_the_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.f90");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"module foo\nend module foo\n").unwrap();
        let unsalted = hash_file(&path, None).unwrap();
        let salted = hash_file(&path, Some(&["-O2".to_string()])).unwrap();
        assert_ne!(unsalted, salted);
    }

    #[test]
    fn different_args_differ() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.f90");
        std::fs::write(&path, b"module foo\n").unwrap();
        let a = hash_file(&path, Some(&["-O0".to_string()])).unwrap();
        let b = hash_file(&path, Some(&["-O2".to_string()])).unwrap();
        assert_ne!(a, b);
    }
}
