//! Operations the map and list screens perform against a store. Each one
//! validates its input completely before it writes anything.

use tracing::info;

use crate::access::Session;
use crate::block::BlockPlan;
use crate::block_index::{shops_in_block, summarize_blocks, BlockSummary};
use crate::error::{Result, StoreError};
use crate::geometry::CoordGeo;
use crate::programs::{Program, ProgramRegistry};
use crate::shop::{sort_by_no, BlockId, Shop, ShopEdit};
use crate::stats::{compute_stats, ShopStats};
use crate::store::{commit_chunked, DocumentStore, WriteBatch, WriteOp};

/// Result of a successful block creation.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedBlock {
    pub block_id: BlockId,
    pub shops: Vec<Shop>,
}

/// Partitions the region spanned by `points` and writes one shop per cell.
///
/// On a `Persistence` error some shops may already be stored. Calling again
/// with a later `now_ms` creates a new block id, so a retry never collides
/// with the leftovers; clean those up with `delete_block`.
pub async fn create_block<S: DocumentStore>(
    store: &S,
    session: &Session,
    points: &[CoordGeo],
    plan: &BlockPlan,
    now_ms: i64,
) -> Result<CreatedBlock> {
    session.require_admin("create blocks")?;
    let cells = plan.generate(points)?;

    let block_id = BlockId::from_millis(now_ms);
    let shops: Vec<Shop> = cells
        .iter()
        .map(|cell| Shop::from_cell(cell, &block_id, now_ms))
        .collect();

    let ops = shops.iter().cloned().map(WriteOp::Create).collect();
    commit_chunked(store, ops).await?;
    info!("created {} ({} shops)", block_id, shops.len());

    Ok(CreatedBlock { block_id, shops })
}

/// Deletes every shop generated for `block_id`. Returns how many were removed.
pub async fn delete_block<S: DocumentStore>(store: &S, session: &Session, block_id: &str) -> Result<usize> {
    session.require_admin("delete blocks")?;
    let Some(block) = BlockId::parse(block_id) else {
        return Ok(0);
    };

    let shops = store.list_shops().await?;
    let ops: Vec<WriteOp> = shops_in_block(&shops, &block)
        .map(|s| WriteOp::Delete(s.id.clone()))
        .collect();
    if ops.is_empty() {
        return Ok(0);
    }
    let deleted = commit_chunked(store, ops).await?;
    info!("deleted {} shops of {}", deleted, block);
    Ok(deleted)
}

/// All shops ordered by shop number.
pub async fn list_shops<S: DocumentStore>(store: &S) -> Result<Vec<Shop>> {
    let mut shops = store.list_shops().await?;
    sort_by_no(&mut shops);
    Ok(shops)
}

/// Saves an operator's edit of one shop and returns the updated record.
pub async fn edit_shop<S: DocumentStore>(store: &S, id: &str, edit: &ShopEdit, now_ms: i64) -> Result<Shop> {
    let edit = edit.normalized()?;
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::Update { id: id.to_string(), edit, updated_at_ms: now_ms });
    store.commit(batch).await?;
    store
        .get_shop(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
}

pub async fn shop_stats<S: DocumentStore>(store: &S) -> Result<ShopStats> {
    Ok(compute_stats(&store.list_shops().await?))
}

/// Generated blocks, newest first.
pub async fn list_blocks<S: DocumentStore>(store: &S) -> Result<Vec<BlockSummary>> {
    Ok(summarize_blocks(&store.list_shops().await?))
}

pub async fn load_registry<S: DocumentStore>(store: &S) -> Result<ProgramRegistry> {
    Ok(ProgramRegistry::new(store.load_programs().await?))
}

pub async fn add_program<S: DocumentStore>(store: &S, label: &str, value: &str, color: &str) -> Result<Program> {
    let mut registry = load_registry(store).await?;
    let added = registry.add(label, value, color)?.clone();
    store.save_programs(registry.programs()).await?;
    Ok(added)
}

pub async fn edit_program<S: DocumentStore>(store: &S, value: &str, label: &str, color: &str) -> Result<Program> {
    let mut registry = load_registry(store).await?;
    let edited = registry.edit(value, label, color)?.clone();
    store.save_programs(registry.programs()).await?;
    Ok(edited)
}

/// Removes a program; refused while any shop still has it assigned.
pub async fn remove_program<S: DocumentStore>(store: &S, value: &str) -> Result<Program> {
    let mut registry = load_registry(store).await?;
    let shops = store.list_shops().await?;
    let removed = registry.remove(value, &shops)?;
    store.save_programs(registry.programs()).await?;
    Ok(removed)
}
