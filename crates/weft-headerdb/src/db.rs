//! The header database: content-addressed storage for one chain's header DAG.
//!
//! Every stored header is a tree object whose entries point at selected
//! ancestors (the spectrum), at the parent, and — as the final, blob-mode
//! entry — at the canonically encoded header itself. Two ref namespaces
//! index the trees: `bh/` for every header, `leaf/` for current tips.
//!
//! # Invariants
//!
//! - Every `bh/h.x` ref resolves to a tree whose header blob decodes to a
//!   header with height `h` and hash `x`.
//! - Every stored header's parent is stored, except genesis.
//! - A `leaf/h.x` ref exists iff no stored header has parent `x`.
//! - Genesis headers are injected only at initialization.
//!
//! Violations surface as [`HeaderDbError::Corruption`].

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};
use weft_crypto::meets_target;
use weft_refs::{format_ref, parse_ref, FsRefStore, Namespace, RefError, RefStore};
use weft_store::{EntryMode, FsObjectStore, ObjectStore, Tree, TreeIndex};
use weft_types::{BlockHash, BlockHeader, ChainId, ObjectId};

use crate::entry::HeaderTreeEntry;
use crate::error::{HeaderDbError, HeaderDbResult};
use crate::iter::{AncestorIter, RankIter};
use crate::spectrum::spectrum;

/// Outcome of an insert: a distinguished value, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The header was written and is now visible.
    Inserted,
    /// An identical header was already stored; the store is unchanged.
    AlreadyExists,
}

/// Options for opening a header database.
///
/// Spectrum tuning is deliberately not configurable here: its constants
/// define the on-disk tree layout (see [`spectrum`](crate::spectrum)).
#[derive(Clone, Debug)]
pub struct HeaderDbConfig {
    /// The chain this database indexes. Headers for any other chain are
    /// rejected at insert.
    pub chain: ChainId,
}

impl Default for HeaderDbConfig {
    fn default() -> Self {
        Self {
            chain: ChainId::new(0),
        }
    }
}

/// Header database for a single chain.
///
/// The handle is a scoped resource: backends are allocated at open and
/// released on drop. All mutations serialize through one process-wide
/// write gate; reads take the shared side. Object writes always precede
/// the ref writes that make them visible, so an interrupted insert leaves
/// at most unreferenced objects.
pub struct HeaderDb {
    pub(crate) chain: ChainId,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) refs: Arc<dyn RefStore>,
    gate: RwLock<()>,
}

impl HeaderDb {
    /// Open (or create) a directory-backed database and inject the genesis
    /// headers.
    ///
    /// Reopening an existing directory with the same genesis is a no-op
    /// for the already-present headers.
    pub fn open(
        path: &Path,
        config: HeaderDbConfig,
        genesis: &[BlockHeader],
    ) -> HeaderDbResult<Self> {
        let store = FsObjectStore::open(&path.join("objects"))?;
        let refs = FsRefStore::open(&path.join("refs"))?;
        Self::with_backends(Arc::new(store), Arc::new(refs), config, genesis)
    }

    /// Build a database over injected backends and inject the genesis
    /// headers. Used with in-memory backends in tests and embeddings.
    pub fn with_backends(
        store: Arc<dyn ObjectStore>,
        refs: Arc<dyn RefStore>,
        config: HeaderDbConfig,
        genesis: &[BlockHeader],
    ) -> HeaderDbResult<Self> {
        let db = Self {
            chain: config.chain,
            store,
            refs,
            gate: RwLock::new(()),
        };
        for header in genesis {
            db.inject_genesis(header)?;
        }
        Ok(db)
    }

    /// The chain this database indexes.
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Insert a mined header whose parent is already stored.
    ///
    /// Idempotent: re-inserting a stored header returns
    /// [`Insertion::AlreadyExists`] and leaves the store unchanged. The
    /// `bh/` ref is written with overwrite enabled, so a retry after a
    /// crash mid-insert converges to the same final state.
    pub fn insert(&self, header: &BlockHeader) -> HeaderDbResult<Insertion> {
        let _gate = self.write_gate()?;

        if header.chain != self.chain {
            return Err(HeaderDbError::ChainMismatch {
                expected: self.chain,
                actual: header.chain,
            });
        }

        let bh_name = format_ref(Namespace::Header, header.height, &header.hash);
        if self.refs.lookup_ref(&bh_name)?.is_some() {
            return Ok(Insertion::AlreadyExists);
        }

        if header.height == 0 {
            return Err(HeaderDbError::InvalidGenesis { height: 0 });
        }
        self.check_header(header)?;

        let parent_name = format_ref(Namespace::Header, header.height - 1, &header.parent);
        let parent_tree_id =
            self.refs
                .lookup_ref(&parent_name)?
                .ok_or(HeaderDbError::MissingParent {
                    height: header.height,
                    parent: header.parent,
                })?;

        // Collect the spectrum pointers by descending from the parent's
        // own spectrum. These heights exist whenever the parent does.
        let mut entries = Vec::new();
        for target in spectrum(header.height) {
            let ancestor = self
                .lookup_at_height_inner(parent_tree_id, target)
                .map_err(|e| match e {
                    HeaderDbError::AncestorNotFound { start, target } => {
                        HeaderDbError::Corruption {
                            op: "insert",
                            id: start.to_hex(),
                            reason: format!("spectrum ancestor at height {target} missing"),
                        }
                    }
                    other => other,
                })?;
            entries.push(ancestor.to_tree_entry(EntryMode::Tree));
        }

        let blob_id = self.store.write_blob(&header.encode())?;

        let parent_entry = HeaderTreeEntry {
            height: header.height - 1,
            hash: header.parent,
            object_id: parent_tree_id,
        };
        entries.push(parent_entry.to_tree_entry(EntryMode::Tree));

        let self_entry = HeaderTreeEntry {
            height: header.height,
            hash: header.hash,
            object_id: blob_id,
        };
        entries.push(self_entry.to_tree_entry(EntryMode::Blob));

        let tree_id = self.store.write_tree(&Tree::new(entries))?;

        self.refs.set_ref(&bh_name, tree_id, true)?;
        let leaf_name = format_ref(Namespace::Leaf, header.height, &header.hash);
        self.refs.set_ref(&leaf_name, tree_id, true)?;

        // The parent stops being a leaf once it has a stored child.
        let parent_leaf = format_ref(Namespace::Leaf, header.height - 1, &header.parent);
        match self.refs.delete_ref(&parent_leaf) {
            Ok(()) | Err(RefError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        debug!(%header, tree = %tree_id.short_hex(), "inserted header");
        Ok(Insertion::Inserted)
    }

    /// Write a genesis header outside the normal insert path. Only valid
    /// during initialization.
    fn inject_genesis(&self, header: &BlockHeader) -> HeaderDbResult<()> {
        let _gate = self.write_gate()?;

        if header.height != 0 {
            return Err(HeaderDbError::InvalidGenesis {
                height: header.height,
            });
        }
        if header.chain != self.chain {
            return Err(HeaderDbError::ChainMismatch {
                expected: self.chain,
                actual: header.chain,
            });
        }
        self.check_header(header)?;

        let bh_name = format_ref(Namespace::Header, 0, &header.hash);
        if self.refs.lookup_ref(&bh_name)?.is_some() {
            return Ok(());
        }

        let blob_id = self.store.write_blob(&header.encode())?;
        let self_entry = HeaderTreeEntry {
            height: 0,
            hash: header.hash,
            object_id: blob_id,
        };
        let tree_id = self
            .store
            .write_tree(&Tree::new(vec![self_entry.to_tree_entry(EntryMode::Blob)]))?;

        self.refs.set_ref(&bh_name, tree_id, true)?;
        let leaf_name = format_ref(Namespace::Leaf, 0, &header.hash);
        self.refs.set_ref(&leaf_name, tree_id, true)?;

        debug!(%header, "injected genesis header");
        Ok(())
    }

    /// Self-consistency checks applied to every header before it is
    /// written: the stored hash must match the recomputed content digest,
    /// and the proof of work must satisfy the header's own target.
    fn check_header(&self, header: &BlockHeader) -> HeaderDbResult<()> {
        if !header.hash_is_valid() {
            return Err(HeaderDbError::InvalidHeader {
                hash: header.hash,
                reason: "hash does not match header content".into(),
            });
        }
        if !meets_target(&header.hash, &header.target) {
            return Err(HeaderDbError::InvalidHeader {
                hash: header.hash,
                reason: "proof of work does not meet target".into(),
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// Fetch a header by its `(height, hash)` key. Returns `None` when the
    /// header is not stored.
    pub fn lookup_by_key(
        &self,
        height: u64,
        hash: &BlockHash,
    ) -> HeaderDbResult<Option<BlockHeader>> {
        let _gate = self.read_gate()?;
        self.lookup_by_key_inner(height, hash)
    }

    pub(crate) fn lookup_by_key_inner(
        &self,
        height: u64,
        hash: &BlockHash,
    ) -> HeaderDbResult<Option<BlockHeader>> {
        let name = format_ref(Namespace::Header, height, hash);
        let Some(tree_id) = self.refs.lookup_ref(&name)? else {
            return Ok(None);
        };
        let header = self.header_at_inner("lookup_by_key", tree_id)?;
        if header.height != height || header.hash != *hash {
            return Err(HeaderDbError::Corruption {
                op: "lookup_by_key",
                id: name,
                reason: "ref points at a tree for a different header".into(),
            });
        }
        Ok(Some(header))
    }

    /// The tree object id of a stored header, or `None` if absent. The id
    /// is the starting point for [`lookup_at_height`].
    ///
    /// [`lookup_at_height`]: HeaderDb::lookup_at_height
    pub fn tree_id(&self, height: u64, hash: &BlockHash) -> HeaderDbResult<Option<ObjectId>> {
        let _gate = self.read_gate()?;
        let name = format_ref(Namespace::Header, height, hash);
        Ok(self.refs.lookup_ref(&name)?)
    }

    /// Find the ancestor at exactly `target` height, descending from the
    /// node stored at `start`.
    ///
    /// Each step follows the smallest spectrum pointer at or above the
    /// target, reading O(log h) tree objects in total. Fails with
    /// [`HeaderDbError::AncestorNotFound`] when `target` is above the
    /// start node.
    pub fn lookup_at_height(
        &self,
        start: ObjectId,
        target: u64,
    ) -> HeaderDbResult<HeaderTreeEntry> {
        let _gate = self.read_gate()?;
        self.lookup_at_height_inner(start, target)
    }

    fn lookup_at_height_inner(
        &self,
        start: ObjectId,
        target: u64,
    ) -> HeaderDbResult<HeaderTreeEntry> {
        let mut current = start;
        loop {
            let tree = self.read_referenced_tree("lookup_at_height", &current)?;
            let (node, _) = Self::self_entry("lookup_at_height", &tree, current)?;
            if node.height == target {
                return Ok(node);
            }
            if node.height < target {
                return Err(HeaderDbError::AncestorNotFound { start, target });
            }

            let mut next: Option<HeaderTreeEntry> = None;
            for raw in &tree.entries[..tree.len() - 1] {
                if raw.mode != EntryMode::Tree {
                    return Err(HeaderDbError::Corruption {
                        op: "lookup_at_height",
                        id: current.to_hex(),
                        reason: format!("ancestor entry {:?} is not a tree", raw.name),
                    });
                }
                let entry = HeaderTreeEntry::from_tree_entry(raw).map_err(|e| {
                    HeaderDbError::Corruption {
                        op: "lookup_at_height",
                        id: current.to_hex(),
                        reason: format!("malformed entry name: {e}"),
                    }
                })?;
                if entry.height >= node.height {
                    return Err(HeaderDbError::Corruption {
                        op: "lookup_at_height",
                        id: current.to_hex(),
                        reason: format!(
                            "entry at height {} not below node height {}",
                            entry.height, node.height
                        ),
                    });
                }
                if entry.height >= target
                    && next.map_or(true, |n| entry.height < n.height)
                {
                    next = Some(entry);
                }
            }

            let Some(next) = next else {
                return Err(HeaderDbError::AncestorNotFound { start, target });
            };
            if next.height == target {
                return Ok(next);
            }
            current = next.object_id;
        }
    }

    /// The parent pointer of the node stored at `tree_id` (the
    /// second-to-last tree entry). Genesis nodes have none; the underlying
    /// out-of-bounds read surfaces as a store error.
    pub fn parent_entry(&self, tree_id: ObjectId) -> HeaderDbResult<HeaderTreeEntry> {
        let _gate = self.read_gate()?;
        let raw = self.store.read_tree_entry(&tree_id, TreeIndex::FromEnd(1))?;
        if raw.mode != EntryMode::Tree {
            return Err(HeaderDbError::Corruption {
                op: "parent_entry",
                id: tree_id.to_hex(),
                reason: "parent entry is not a tree".into(),
            });
        }
        HeaderTreeEntry::from_tree_entry(&raw).map_err(|e| HeaderDbError::Corruption {
            op: "parent_entry",
            id: tree_id.to_hex(),
            reason: format!("malformed parent entry name: {e}"),
        })
    }

    /// The parent header of a stored header, or `None` for genesis.
    ///
    /// A missing parent for a stored non-genesis header violates the
    /// parent invariant and surfaces as corruption.
    pub fn parent_of(&self, header: &BlockHeader) -> HeaderDbResult<Option<BlockHeader>> {
        let _gate = self.read_gate()?;
        if header.height == 0 {
            return Ok(None);
        }
        let height = header.height - 1;
        match self.lookup_by_key_inner(height, &header.parent)? {
            Some(parent) => Ok(Some(parent)),
            None => Err(HeaderDbError::Corruption {
                op: "parent_of",
                id: format_ref(Namespace::Header, height, &header.parent),
                reason: "parent ref missing for stored header".into(),
            }),
        }
    }

    /// Walk the parent chain from `from` down to genesis, yielding the
    /// parent first. The sequence is lazy and non-restartable.
    pub fn walk_ancestors(&self, from: &BlockHeader) -> AncestorIter<'_> {
        AncestorIter::new(self, from.clone())
    }

    // -------------------------------------------------------------------
    // Enumeration
    // -------------------------------------------------------------------

    /// All current branch tips, in `(height, hash)` order.
    ///
    /// Leaf refs touched by external tooling may be malformed; those are
    /// skipped rather than failing the enumeration.
    pub fn leaves(&self) -> HeaderDbResult<Vec<BlockHeader>> {
        let _gate = self.read_gate()?;
        let names = self.refs.list_refs("leaf/*")?;

        let mut keys = Vec::with_capacity(names.len());
        for name in names {
            match parse_ref(&name) {
                Ok((_, height, hash)) => keys.push((height, hash, name)),
                Err(e) => warn!(%name, error = %e, "skipping malformed leaf ref"),
            }
        }
        keys.sort();

        let mut out = Vec::with_capacity(keys.len());
        for (height, hash, name) in keys {
            let Some(tree_id) = self.refs.lookup_ref(&name)? else {
                continue;
            };
            let header = self.header_at_inner("leaves", tree_id)?;
            if header.height != height || header.hash != hash {
                return Err(HeaderDbError::Corruption {
                    op: "leaves",
                    id: name,
                    reason: "leaf ref points at a tree for a different header".into(),
                });
            }
            out.push(header);
        }
        Ok(out)
    }

    /// Stream headers in ascending height order, starting at `min_height`.
    ///
    /// Enumeration ends at the first height with no stored headers (the
    /// end of the DAG), after `max_height`, or after `limit` headers. The
    /// returned flag is `true` when the enumeration was not truncated by
    /// `limit`.
    pub fn entries_by_rank(
        &self,
        min_height: u64,
        max_height: u64,
        limit: usize,
    ) -> HeaderDbResult<(Vec<BlockHeader>, bool)> {
        let mut iter = self.rank_iter(min_height, max_height);
        let mut out = Vec::new();
        while out.len() < limit {
            match iter.next() {
                Some(Ok(header)) => out.push(header),
                Some(Err(e)) => return Err(e),
                None => return Ok((out, true)),
            }
        }
        // Limit reached: complete only if nothing was left behind.
        match iter.next() {
            None => Ok((out, true)),
            Some(Err(e)) => Err(e),
            Some(Ok(_)) => Ok((out, false)),
        }
    }

    /// Lazy pull-based variant of [`entries_by_rank`]. Finite and
    /// non-restartable; re-invoke to enumerate again.
    ///
    /// [`entries_by_rank`]: HeaderDb::entries_by_rank
    pub fn rank_iter(&self, min_height: u64, max_height: u64) -> RankIter<'_> {
        RankIter::new(self, min_height, max_height)
    }

    // -------------------------------------------------------------------
    // Internal reads
    // -------------------------------------------------------------------

    /// Read a tree object that an existing ref or tree entry pointed at.
    /// Absence here is an invariant violation, not a plain miss.
    fn read_referenced_tree(&self, op: &'static str, id: &ObjectId) -> HeaderDbResult<Tree> {
        match self.store.read_tree(id) {
            Ok(tree) => Ok(tree),
            Err(weft_store::StoreError::NotFound(_)) => Err(HeaderDbError::Corruption {
                op,
                id: id.to_hex(),
                reason: "referenced tree object missing".into(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The self entry of a tree: its last, blob-mode entry. Returns the
    /// entry keyed by the tree's own object id (so callers can keep
    /// descending) together with the id of the header blob it points at.
    fn self_entry(
        op: &'static str,
        tree: &Tree,
        tree_id: ObjectId,
    ) -> HeaderDbResult<(HeaderTreeEntry, ObjectId)> {
        let last = tree
            .entry(TreeIndex::FromEnd(0))
            .ok_or_else(|| HeaderDbError::Corruption {
                op,
                id: tree_id.to_hex(),
                reason: "tree object has no entries".into(),
            })?;
        if last.mode != EntryMode::Blob {
            return Err(HeaderDbError::Corruption {
                op,
                id: tree_id.to_hex(),
                reason: "last tree entry is not the header blob".into(),
            });
        }
        let entry =
            HeaderTreeEntry::from_tree_entry(last).map_err(|e| HeaderDbError::Corruption {
                op,
                id: tree_id.to_hex(),
                reason: format!("malformed self entry name: {e}"),
            })?;
        Ok((
            HeaderTreeEntry {
                object_id: tree_id,
                ..entry
            },
            last.object_id,
        ))
    }

    /// Decode the header stored at a tree object, verifying it against the
    /// tree's self entry.
    pub(crate) fn header_at_inner(
        &self,
        op: &'static str,
        tree_id: ObjectId,
    ) -> HeaderDbResult<BlockHeader> {
        let tree = self.read_referenced_tree(op, &tree_id)?;
        let (node, blob_id) = Self::self_entry(op, &tree, tree_id)?;

        let bytes = match self.store.read_blob(&blob_id) {
            Ok(bytes) => bytes,
            Err(weft_store::StoreError::NotFound(id)) => {
                return Err(HeaderDbError::Corruption {
                    op,
                    id: id.to_hex(),
                    reason: "referenced header blob missing".into(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let header = BlockHeader::decode(&bytes).map_err(|e| HeaderDbError::Corruption {
            op,
            id: tree_id.to_hex(),
            reason: format!("header blob does not decode: {e}"),
        })?;
        if header.height != node.height || header.hash != node.hash {
            return Err(HeaderDbError::Corruption {
                op,
                id: tree_id.to_hex(),
                reason: "decoded header does not match its tree entry".into(),
            });
        }
        Ok(header)
    }

    // -------------------------------------------------------------------
    // Gate
    // -------------------------------------------------------------------

    fn read_gate(&self) -> HeaderDbResult<RwLockReadGuard<'_, ()>> {
        self.gate.read().map_err(|_| HeaderDbError::LockPoisoned)
    }

    fn write_gate(&self) -> HeaderDbResult<RwLockWriteGuard<'_, ()>> {
        self.gate.write().map_err(|_| HeaderDbError::LockPoisoned)
    }
}

impl std::fmt::Debug for HeaderDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderDb").field("chain", &self.chain).finish()
    }
}
