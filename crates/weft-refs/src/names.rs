//! Ref-name codec, validation, and glob matching.
//!
//! A header key `(height, hash)` is encoded as
//! `<hexheight>.<base64urlhash>` where `<hexheight>` is 16 lowercase hex
//! digits (big-endian zero-padded u64) and `<base64urlhash>` is the
//! unpadded base64url encoding of the 32-byte hash (43 characters). The
//! `.` separator is mandatory. Zero-padding the height makes lexicographic
//! name order within a namespace group and ascend by height, with the
//! encoded hash as a deterministic tiebreak.

use weft_types::BlockHash;

use crate::error::{RefError, RefResult};

/// Ref namespaces maintained by the header store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// One ref per stored header.
    Header,
    /// One ref per current branch tip.
    Leaf,
}

impl Namespace {
    /// The on-disk directory name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "bh",
            Self::Leaf => "leaf",
        }
    }

    /// Parse the on-disk directory name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bh" => Some(Self::Header),
            "leaf" => Some(Self::Leaf),
            _ => None,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode a header key as `<hexheight>.<base64urlhash>`.
pub fn encode_key(height: u64, hash: &BlockHash) -> String {
    format!("{height:016x}.{}", hash.to_base64url())
}

/// Parse a `<hexheight>.<base64urlhash>` key back into `(height, hash)`.
pub fn parse_key(key: &str) -> RefResult<(u64, BlockHash)> {
    let invalid = |reason: &str| RefError::InvalidRefName {
        name: key.to_string(),
        reason: reason.to_string(),
    };

    let (height_part, hash_part) = key.split_once('.').ok_or_else(|| invalid("missing '.'"))?;
    if height_part.len() != 16 {
        return Err(invalid("height must be 16 hex digits"));
    }
    if height_part
        .bytes()
        .any(|b| !b.is_ascii_digit() && !(b'a'..=b'f').contains(&b))
    {
        return Err(invalid("height must be lowercase hex"));
    }
    let height =
        u64::from_str_radix(height_part, 16).map_err(|_| invalid("unparsable height"))?;
    let hash = BlockHash::from_base64url(hash_part)
        .map_err(|e| invalid(&format!("bad hash: {e}")))?;
    Ok((height, hash))
}

/// Full ref name: `<namespace>/<hexheight>.<base64urlhash>`.
pub fn format_ref(ns: Namespace, height: u64, hash: &BlockHash) -> String {
    format!("{}/{}", ns.as_str(), encode_key(height, hash))
}

/// Parse a full ref name into `(namespace, height, hash)`.
pub fn parse_ref(name: &str) -> RefResult<(Namespace, u64, BlockHash)> {
    let (ns_part, key_part) = name.split_once('/').ok_or_else(|| RefError::InvalidRefName {
        name: name.to_string(),
        reason: "missing namespace".into(),
    })?;
    let ns = Namespace::parse(ns_part).ok_or_else(|| RefError::InvalidRefName {
        name: name.to_string(),
        reason: format!("unknown namespace {ns_part:?}"),
    })?;
    let (height, hash) = parse_key(key_part)?;
    Ok((ns, height, hash))
}

/// Glob matching every ref of a namespace at one height.
pub fn height_glob(ns: Namespace, height: u64) -> String {
    format!("{}/{height:016x}.*", ns.as_str())
}

/// Validate a ref name before it touches the backend.
///
/// Names are `/`-separated, components are non-empty, and path traversal
/// (`.` / `..` components) is rejected so a name can never escape the ref
/// directory.
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    let invalid = |reason: &str| RefError::InvalidRefName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("ref name must not be empty"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("must not start or end with '/'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty"));
        }
        if component == "." || component == ".." {
            return Err(invalid("path traversal components are forbidden"));
        }
        if component.contains(['\\', '*', '\0']) {
            return Err(invalid("component contains a forbidden character"));
        }
    }
    Ok(())
}

/// Match a name against a glob pattern with `*` wildcards.
///
/// `*` matches any run of characters, including `/` and the empty run.
/// All other characters match themselves.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p = pattern.as_bytes();
    let n = name.as_bytes();

    let (mut pi, mut ni) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            // Backtrack: let the last '*' swallow one more character.
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}
