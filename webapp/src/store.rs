//! Document store abstraction. Writes go through batches, each of which
//! is applied atomically; large write sets are chunked below the backend's
//! per-batch limit and the chunks committed concurrently.

use std::collections::BTreeMap;

use futures::future::join_all;
use futures::lock::Mutex;
use tracing::{debug, warn};

use crate::error::{PersistenceError, StoreError};
use crate::programs::Program;
use crate::shop::{Shop, ShopEdit};

/// Most operations a single batch may carry.
pub const MAX_BATCH_OPS: usize = 450;

#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    /// Create-only: fails the batch if the id already exists.
    Create(Shop),
    /// Fails the batch if the id does not exist.
    Update { id: String, edit: ShopEdit, updated_at_ms: i64 },
    /// Deleting a missing document is not an error.
    Delete(String),
}

impl WriteOp {
    pub fn id(&self) -> &str {
        match self {
            WriteOp::Create(shop) => &shop.id,
            WriteOp::Update { id, .. } => id,
            WriteOp::Delete(id) => id,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every op to `shops` or none of them.
    pub fn apply_to(&self, shops: &mut BTreeMap<String, Shop>) -> Result<(), StoreError> {
        // Validate against the state as it evolves inside the batch, so two
        // creates of the same id in one batch also conflict
        let mut exists: BTreeMap<&str, bool> = BTreeMap::new();
        for op in &self.ops {
            let id = op.id();
            let present = *exists.entry(id).or_insert_with(|| shops.contains_key(id));
            match op {
                WriteOp::Create(_) if present => return Err(StoreError::AlreadyExists(id.to_string())),
                WriteOp::Update { .. } if !present => return Err(StoreError::NotFound(id.to_string())),
                WriteOp::Create(_) => {
                    exists.insert(id, true);
                }
                WriteOp::Delete(_) => {
                    exists.insert(id, false);
                }
                WriteOp::Update { .. } => {}
            }
        }

        for op in &self.ops {
            match op {
                WriteOp::Create(shop) => {
                    shops.insert(shop.id.clone(), shop.clone());
                }
                WriteOp::Update { id, edit, updated_at_ms } => {
                    if let Some(shop) = shops.get_mut(id) {
                        edit.apply_to(shop, *updated_at_ms);
                    }
                }
                WriteOp::Delete(id) => {
                    shops.remove(id);
                }
            }
        }
        Ok(())
    }
}

/// Splits `ops` into batches of at most `MAX_BATCH_OPS`, preserving order.
pub fn chunk_ops(ops: Vec<WriteOp>) -> Vec<WriteBatch> {
    chunk_ops_by(ops, MAX_BATCH_OPS)
}

pub fn chunk_ops_by(ops: Vec<WriteOp>, max_ops: usize) -> Vec<WriteBatch> {
    let max_ops = max_ops.max(1);
    let mut batches = Vec::with_capacity(ops.len().div_ceil(max_ops));
    let mut current = WriteBatch::new();
    for op in ops {
        if current.len() >= max_ops {
            batches.push(std::mem::take(&mut current));
        }
        current.push(op);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}


// --------------------------------------------------------------------------
// DocumentStore

/// Backing store of shops and the program list.
///
/// Implementations must apply a `WriteBatch` atomically. Concurrent
/// `commit` calls may interleave in any order.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
    async fn list_shops(&self) -> Result<Vec<Shop>, StoreError>;
    async fn get_shop(&self, id: &str) -> Result<Option<Shop>, StoreError>;
    async fn load_programs(&self) -> Result<Vec<Program>, StoreError>;
    async fn save_programs(&self, programs: &[Program]) -> Result<(), StoreError>;
}

/// Chunks `ops` and commits every chunk concurrently. Returns the number
/// of operations written. If any chunk fails the others are left as they
/// are: there is no rollback.
pub async fn commit_chunked<S: DocumentStore>(store: &S, ops: Vec<WriteOp>) -> Result<usize, PersistenceError> {
    let batches = chunk_ops(ops);
    let total = batches.len();
    debug!("committing {} batches", total);

    let sizes: Vec<usize> = batches.iter().map(WriteBatch::len).collect();
    let results = join_all(batches.into_iter().map(|b| store.commit(b))).await;

    let mut committed_ops = 0;
    let mut failed = 0;
    let mut first = None;
    for (result, size) in results.into_iter().zip(sizes) {
        match result {
            Ok(()) => committed_ops += size,
            Err(err) => {
                warn!("batch of {} operations failed: {}", size, err);
                failed += 1;
                first.get_or_insert(err);
            }
        }
    }

    match first {
        None => {
            debug!("committed {} operations in {} batches", committed_ops, total);
            Ok(committed_ops)
        }
        Some(first) => Err(PersistenceError { total, failed, committed_ops, first }),
    }
}


// --------------------------------------------------------------------------
// MemoryStore

#[derive(Debug, Default)]
struct MemoryState {
    shops: BTreeMap<String, Shop>,
    programs: Vec<Program>,
}

/// Store kept entirely in memory; what the browser build caches between
/// snapshots and what tests run against.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self { state: Mutex::new(MemoryState::default()) }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(shops: Vec<Shop>, programs: Vec<Program>) -> Self {
        let shops = shops.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self { state: Mutex::new(MemoryState { shops, programs }) }
    }
}

impl DocumentStore for MemoryStore {
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        batch.apply_to(&mut state.shops)
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, StoreError> {
        Ok(self.state.lock().await.shops.values().cloned().collect())
    }

    async fn get_shop(&self, id: &str) -> Result<Option<Shop>, StoreError> {
        Ok(self.state.lock().await.shops.get(id).cloned())
    }

    async fn load_programs(&self) -> Result<Vec<Program>, StoreError> {
        Ok(self.state.lock().await.programs.clone())
    }

    async fn save_programs(&self, programs: &[Program]) -> Result<(), StoreError> {
        self.state.lock().await.programs = programs.to_vec();
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shop(id: &str) -> Shop {
        Shop { id: id.into(), name: id.into(), ..Default::default() }
    }

    fn creates(n: usize) -> Vec<WriteOp> {
        (0..n).map(|i| WriteOp::Create(shop(&format!("s{i}")))).collect()
    }

    /// Fails every `nth` commit it sees, delegating the rest.
    struct FlakyStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        nth: usize,
    }

    impl DocumentStore for FlakyStore {
        async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call % self.nth == 0 {
                return Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "quota")));
            }
            self.inner.commit(batch).await
        }
        async fn list_shops(&self) -> Result<Vec<Shop>, StoreError> {
            self.inner.list_shops().await
        }
        async fn get_shop(&self, id: &str) -> Result<Option<Shop>, StoreError> {
            self.inner.get_shop(id).await
        }
        async fn load_programs(&self) -> Result<Vec<Program>, StoreError> {
            self.inner.load_programs().await
        }
        async fn save_programs(&self, programs: &[Program]) -> Result<(), StoreError> {
            self.inner.save_programs(programs).await
        }
    }

    #[test]
    fn chunks_respect_batch_limit() {
        let batches = chunk_ops(creates(1000));
        let sizes: Vec<usize> = batches.iter().map(WriteBatch::len).collect();
        assert_eq!(sizes, vec![450, 450, 100]);
        assert_eq!(batches[1].ops()[0].id(), "s450");

        assert_eq!(chunk_ops(creates(450)).len(), 1);
        assert_eq!(chunk_ops(creates(451)).len(), 2);
        assert!(chunk_ops(Vec::new()).is_empty());
    }

    #[test]
    fn create_is_create_only() {
        let store = MemoryStore::with_data(vec![shop("a")], Vec::new());
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Create(shop("b")));
        batch.push(WriteOp::Create(shop("a")));
        let err = block_on(store.commit(batch)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == "a"));
        // The batch is atomic: "b" was not written either
        assert_eq!(block_on(store.get_shop("b")).unwrap(), None);
    }

    #[test]
    fn duplicate_create_within_batch_conflicts() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Create(shop("a")));
        batch.push(WriteOp::Create(shop("a")));
        assert!(block_on(store.commit(batch)).is_err());
    }

    #[test]
    fn update_requires_existing_document() {
        let store = MemoryStore::with_data(vec![shop("a")], Vec::new());
        let edit = ShopEdit { name: "Renamed".into(), ..Default::default() };

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Update { id: "missing".into(), edit: edit.clone(), updated_at_ms: 1 });
        assert!(matches!(block_on(store.commit(batch)), Err(StoreError::NotFound(_))));

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Update { id: "a".into(), edit, updated_at_ms: 7 });
        block_on(store.commit(batch)).unwrap();
        let a = block_on(store.get_shop("a")).unwrap().unwrap();
        assert_eq!(a.name, "Renamed");
        assert_eq!(a.updated_at_ms, Some(7));
    }

    #[test]
    fn commit_chunked_writes_everything() {
        let store = MemoryStore::new();
        let written = block_on(commit_chunked(&store, creates(1000))).unwrap();
        assert_eq!(written, 1000);
        assert_eq!(block_on(store.list_shops()).unwrap().len(), 1000);
    }

    #[test]
    fn partial_failure_keeps_committed_batches() {
        let store = FlakyStore { inner: MemoryStore::new(), calls: AtomicUsize::new(0), nth: 2 };
        let err = block_on(commit_chunked(&store, creates(1000))).unwrap_err();
        assert_eq!(err.total, 3);
        assert_eq!(err.failed, 1);
        assert!(matches!(err.first, StoreError::Io(_)));

        let stored = block_on(store.list_shops()).unwrap().len();
        assert_eq!(stored, err.committed_ops);
        assert!(stored > 0 && stored < 1000);
    }

    #[test]
    fn programs_round_trip() {
        let store = MemoryStore::new();
        let programs = vec![Program { label: "A".into(), value: "a".into(), color: "#fff".into() }];
        block_on(store.save_programs(&programs)).unwrap();
        assert_eq!(block_on(store.load_programs()).unwrap(), programs);
    }
}
