//! Lazy header sequences: rank enumeration and ancestor walks.
//!
//! Both iterators pull from live store state; they hold no lock between
//! pulls and are finite and non-restartable.

use std::collections::VecDeque;

use weft_refs::{height_glob, parse_ref, Namespace};
use weft_types::{BlockHash, BlockHeader};

use crate::db::HeaderDb;
use crate::error::{HeaderDbError, HeaderDbResult};

/// Streams headers in ascending `(height, hash)` order.
///
/// Heights are enumerated one at a time from the `bh/` namespace; headers
/// are decoded on demand. Enumeration ends at the first height with no
/// stored headers or past the configured maximum.
pub struct RankIter<'a> {
    db: &'a HeaderDb,
    next_height: u64,
    max_height: u64,
    pending: VecDeque<(u64, BlockHash)>,
    exhausted: bool,
}

impl<'a> RankIter<'a> {
    pub(crate) fn new(db: &'a HeaderDb, min_height: u64, max_height: u64) -> Self {
        Self {
            db,
            next_height: min_height,
            max_height,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Enumerate the refs at the next height into the pending queue.
    fn fill(&mut self) -> HeaderDbResult<()> {
        let pattern = height_glob(Namespace::Header, self.next_height);
        let mut names = self.db.refs.list_refs(&pattern)?;
        names.sort();
        if names.is_empty() {
            self.exhausted = true;
            return Ok(());
        }
        for name in names {
            match parse_ref(&name) {
                Ok((_, height, hash)) => self.pending.push_back((height, hash)),
                Err(e) => {
                    return Err(HeaderDbError::Corruption {
                        op: "entries_by_rank",
                        id: name,
                        reason: format!("malformed header ref name: {e}"),
                    })
                }
            }
        }
        self.next_height += 1;
        Ok(())
    }
}

impl Iterator for RankIter<'_> {
    type Item = HeaderDbResult<BlockHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((height, hash)) = self.pending.pop_front() {
                return match self.db.lookup_by_key(height, &hash) {
                    Ok(Some(header)) => Some(Ok(header)),
                    Ok(None) => Some(Err(HeaderDbError::Corruption {
                        op: "entries_by_rank",
                        id: format!("{height}.{}", hash.to_base64url()),
                        reason: "listed header ref vanished".into(),
                    })),
                    Err(e) => Some(Err(e)),
                };
            }
            if self.exhausted || self.next_height > self.max_height {
                return None;
            }
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}

/// Walks the parent chain of a stored header down to genesis, yielding
/// the parent first. A missing intermediate parent surfaces as corruption
/// and ends the walk.
pub struct AncestorIter<'a> {
    db: &'a HeaderDb,
    current: Option<BlockHeader>,
}

impl<'a> AncestorIter<'a> {
    pub(crate) fn new(db: &'a HeaderDb, from: BlockHeader) -> Self {
        Self {
            db,
            current: Some(from),
        }
    }
}

impl Iterator for AncestorIter<'_> {
    type Item = HeaderDbResult<BlockHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        match self.db.parent_of(&current) {
            Ok(Some(parent)) => {
                self.current = Some(parent.clone());
                Some(Ok(parent))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
