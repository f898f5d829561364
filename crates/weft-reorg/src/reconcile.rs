//! Two-cursor branch walk and transaction set difference.

use std::collections::HashSet;

use tracing::debug;
use weft_headerdb::HeaderDb;
use weft_types::{BlockHeader, TxHash};

use crate::error::{ReorgError, ReorgResult};

/// Default bound on the combined length of the two walked branches.
pub const DEFAULT_DEPTH_LIMIT: u64 = 10_000;

/// Compute the transactions to reintroduce to the mempool when `old_head`
/// is abandoned in favor of `new_head`.
///
/// Returns every transaction that appears in a header on the abandoned
/// branch (old head down to, exclusive of, the least common ancestor) and
/// in no header on the adopted branch. `payload_txs` maps a header to its
/// transaction set and is typically backed by the payload database.
pub fn reconcile<F>(
    db: &HeaderDb,
    new_head: &BlockHeader,
    old_head: &BlockHeader,
    payload_txs: F,
) -> ReorgResult<HashSet<TxHash>>
where
    F: Fn(&BlockHeader) -> HashSet<TxHash>,
{
    reconcile_with_limit(db, new_head, old_head, payload_txs, DEFAULT_DEPTH_LIMIT)
}

/// [`reconcile`] with an explicit depth bound.
///
/// The walk reads O(|old branch| + |new branch|) headers; if the branches
/// have not rejoined within `depth_limit` steps the fork is deeper than
/// the caller is willing to handle and [`ReorgError::ForkTooDeep`] is
/// returned.
pub fn reconcile_with_limit<F>(
    db: &HeaderDb,
    new_head: &BlockHeader,
    old_head: &BlockHeader,
    payload_txs: F,
    depth_limit: u64,
) -> ReorgResult<HashSet<TxHash>>
where
    F: Fn(&BlockHeader) -> HashSet<TxHash>,
{
    require_stored(db, old_head)?;
    require_stored(db, new_head)?;

    // Interleaved walk: step whichever cursor is higher until both arrive
    // at the same header. Headers strictly between a head and the least
    // common ancestor make up that head's branch.
    let mut old_cursor = old_head.clone();
    let mut new_cursor = new_head.clone();
    let mut old_branch: Vec<BlockHeader> = Vec::new();
    let mut new_branch: Vec<BlockHeader> = Vec::new();

    let mut steps: u64 = 0;
    while old_cursor.hash != new_cursor.hash {
        steps += 1;
        if steps > depth_limit {
            return Err(ReorgError::ForkTooDeep { limit: depth_limit });
        }
        if old_cursor.height >= new_cursor.height {
            old_branch.push(old_cursor.clone());
            old_cursor = step_down(db, &old_cursor, depth_limit)?;
        } else {
            new_branch.push(new_cursor.clone());
            new_cursor = step_down(db, &new_cursor, depth_limit)?;
        }
    }

    debug!(
        ancestor_height = old_cursor.height,
        abandoned = old_branch.len(),
        adopted = new_branch.len(),
        "branches rejoined"
    );

    let mut old_txs: HashSet<TxHash> = HashSet::new();
    for header in &old_branch {
        old_txs.extend(payload_txs(header));
    }
    let mut new_txs: HashSet<TxHash> = HashSet::new();
    for header in &new_branch {
        new_txs.extend(payload_txs(header));
    }

    old_txs.retain(|tx| !new_txs.contains(tx));
    Ok(old_txs)
}

fn require_stored(db: &HeaderDb, head: &BlockHeader) -> ReorgResult<()> {
    if db.lookup_by_key(head.height, &head.hash)?.is_none() {
        return Err(ReorgError::MissingHead {
            height: head.height,
            hash: head.hash,
        });
    }
    Ok(())
}

/// Step a cursor to its parent. Running out of parents means the branches
/// never rejoin, which the depth bound reports.
fn step_down(db: &HeaderDb, cursor: &BlockHeader, limit: u64) -> ReorgResult<BlockHeader> {
    match db.parent_of(cursor)? {
        Some(parent) => Ok(parent),
        None => Err(ReorgError::ForkTooDeep { limit }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use weft_headerdb::{HeaderDbConfig, Insertion};
    use weft_refs::InMemoryRefStore;
    use weft_store::InMemoryObjectStore;
    use weft_types::{
        BlockHash, ChainId, ChainVersion, PayloadHash, Target, Weight,
    };

    fn sealed(mut header: BlockHeader) -> BlockHeader {
        header.hash = header.compute_hash();
        header
    }

    fn genesis() -> BlockHeader {
        sealed(BlockHeader {
            version: ChainVersion::new(1),
            chain: ChainId::new(0),
            height: 0,
            creation_time: 1_000_000,
            nonce: 0,
            flags: 0,
            epoch_start: 1_000_000,
            parent: BlockHash::from_bytes([0; 32]),
            payload_hash: PayloadHash::from_bytes([0; 32]),
            target: Target::MAX,
            weight: Weight::ZERO,
            hash: BlockHash::from_bytes([0; 32]),
        })
    }

    fn child(parent: &BlockHeader, nonce: u64) -> BlockHeader {
        let mut payload = [0u8; 32];
        payload[..8].copy_from_slice(&nonce.to_le_bytes());
        sealed(BlockHeader {
            height: parent.height + 1,
            creation_time: parent.creation_time + 30_000_000,
            nonce,
            parent: parent.hash,
            payload_hash: PayloadHash::from_bytes(payload),
            ..parent.clone()
        })
    }

    fn open_mem(genesis_headers: &[BlockHeader]) -> HeaderDb {
        HeaderDb::with_backends(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
            HeaderDbConfig::default(),
            genesis_headers,
        )
        .unwrap()
    }

    fn extend(db: &HeaderDb, from: &BlockHeader, n: u64, nonce_base: u64) -> Vec<BlockHeader> {
        let mut headers = vec![from.clone()];
        for i in 0..n {
            let next = child(headers.last().unwrap(), nonce_base + i);
            assert_eq!(db.insert(&next).unwrap(), Insertion::Inserted);
            headers.push(next);
        }
        headers
    }

    fn tx(n: u8) -> TxHash {
        TxHash::from_bytes([n; 32])
    }

    /// Payload lookup backed by an in-memory map keyed by header hash.
    fn payload_fn(
        map: HashMap<BlockHash, HashSet<TxHash>>,
    ) -> impl Fn(&BlockHeader) -> HashSet<TxHash> {
        move |header| map.get(&header.hash).cloned().unwrap_or_default()
    }

    // -------------------------------------------------------------------
    // Simple forks
    // -------------------------------------------------------------------

    #[test]
    fn simple_fork_returns_abandoned_txs() {
        // G-A-B-C with D' forking off B.
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let main = extend(&db, &g, 3, 100);
        let c = &main[3];
        let d2 = child(&main[2], 999);
        db.insert(&d2).unwrap();

        let mut payloads = HashMap::new();
        payloads.insert(c.hash, HashSet::from([tx(1), tx(2)]));
        payloads.insert(d2.hash, HashSet::from([tx(2), tx(3)]));

        let back = reconcile(&db, &d2, c, payload_fn(payloads)).unwrap();
        assert_eq!(back, HashSet::from([tx(1)]));
    }

    #[test]
    fn deep_fork_returns_only_unique_txs() {
        // Chain to height 10, then branches of length 5 and 8.
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let trunk = extend(&db, &g, 10, 100);
        let short = extend(&db, &trunk[10], 5, 200);
        let long = extend(&db, &trunk[10], 8, 300);

        let mut payloads = HashMap::new();
        let mut short_txs = HashSet::new();
        for (i, header) in short.iter().skip(1).enumerate() {
            let t = tx(10 + i as u8);
            short_txs.insert(t);
            // One tx per header, plus one shared with the long branch.
            payloads.insert(header.hash, HashSet::from([t, tx(99)]));
        }
        for (i, header) in long.iter().skip(1).enumerate() {
            payloads.insert(header.hash, HashSet::from([tx(50 + i as u8), tx(99)]));
        }

        let back = reconcile(
            &db,
            long.last().unwrap(),
            short.last().unwrap(),
            payload_fn(payloads),
        )
        .unwrap();
        // The shared tx(99) is on the adopted branch; only the short
        // branch's own txs come back.
        assert_eq!(back, short_txs);
    }

    #[test]
    fn trunk_txs_are_untouched() {
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let trunk = extend(&db, &g, 4, 100);
        let side = extend(&db, &trunk[2], 3, 200);

        let mut payloads = HashMap::new();
        // Shared history carries txs too; they must not be returned.
        payloads.insert(trunk[1].hash, HashSet::from([tx(1)]));
        payloads.insert(trunk[4].hash, HashSet::from([tx(2)]));
        payloads.insert(side[3].hash, HashSet::from([tx(3)]));

        let back = reconcile(&db, side.last().unwrap(), &trunk[4], payload_fn(payloads)).unwrap();
        assert_eq!(back, HashSet::from([tx(2)]));
    }

    // -------------------------------------------------------------------
    // Degenerate shapes
    // -------------------------------------------------------------------

    #[test]
    fn same_head_returns_empty() {
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let chain = extend(&db, &g, 3, 100);
        let tip = chain.last().unwrap();

        let mut payloads = HashMap::new();
        payloads.insert(tip.hash, HashSet::from([tx(1)]));

        let back = reconcile(&db, tip, tip, payload_fn(payloads)).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn fast_forward_returns_empty() {
        // Old head is an ancestor of the new head: nothing was abandoned.
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let chain = extend(&db, &g, 5, 100);

        let mut payloads = HashMap::new();
        for header in chain.iter().skip(1) {
            payloads.insert(header.hash, HashSet::from([tx(header.height as u8)]));
        }

        let back = reconcile(&db, &chain[5], &chain[2], payload_fn(payloads)).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn rollback_returns_whole_branch() {
        // New head is an ancestor of the old head: everything above it
        // comes back.
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let chain = extend(&db, &g, 4, 100);

        let mut payloads = HashMap::new();
        for header in chain.iter().skip(1) {
            payloads.insert(header.hash, HashSet::from([tx(header.height as u8)]));
        }

        let back = reconcile(&db, &chain[1], &chain[4], payload_fn(payloads)).unwrap();
        assert_eq!(back, HashSet::from([tx(2), tx(3), tx(4)]));
    }

    // -------------------------------------------------------------------
    // Failure modes
    // -------------------------------------------------------------------

    #[test]
    fn missing_head_is_rejected() {
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let chain = extend(&db, &g, 2, 100);
        let stranger = child(&chain[2], 777); // never inserted

        let err = reconcile(&db, &stranger, &chain[2], |_| HashSet::new()).unwrap_err();
        assert!(matches!(err, ReorgError::MissingHead { height: 3, .. }));

        let err = reconcile(&db, &chain[2], &stranger, |_| HashSet::new()).unwrap_err();
        assert!(matches!(err, ReorgError::MissingHead { .. }));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let g = genesis();
        let db = open_mem(&[g.clone()]);
        let trunk = extend(&db, &g, 2, 100);
        let a = extend(&db, &trunk[2], 4, 200);
        let b = extend(&db, &trunk[2], 4, 300);

        let err = reconcile_with_limit(
            &db,
            a.last().unwrap(),
            b.last().unwrap(),
            |_| HashSet::new(),
            3,
        )
        .unwrap_err();
        assert!(matches!(err, ReorgError::ForkTooDeep { limit: 3 }));

        // A generous limit succeeds on the same fork.
        let ok = reconcile_with_limit(
            &db,
            a.last().unwrap(),
            b.last().unwrap(),
            |_| HashSet::new(),
            100,
        );
        assert!(ok.is_ok());
    }
}
