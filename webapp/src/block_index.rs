use std::collections::HashMap;

use serde::Serialize;

use crate::shop::{BlockId, Shop};

/// One generated block as seen from the shops that carry its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub block_id: String,
    pub created_at_ms: i64,
    pub start_no: Option<i64>,
    pub end_no: Option<i64>,
    pub count: usize,
}

impl BlockSummary {
    /// "Block 12-40" when the numbers are known, else the raw id.
    pub fn title(&self) -> String {
        match (self.start_no, self.end_no) {
            (Some(start), Some(end)) => format!("Block {start}-{end}"),
            _ => format!("Block {}", self.block_id),
        }
    }
}

/// Groups shops by block id, newest block first. Shops without a block id
/// (entered by hand) are ignored.
pub fn summarize_blocks(shops: &[Shop]) -> Vec<BlockSummary> {
    let mut blocks: HashMap<String, BlockSummary> = HashMap::new();

    for shop in shops {
        let Some(block) = shop.block_id.as_deref().and_then(BlockId::parse) else {
            continue;
        };
        let summary = blocks
            .entry(block.as_str().to_string())
            .or_insert_with(|| BlockSummary {
                block_id: block.as_str().to_string(),
                created_at_ms: block.created_at_ms(),
                start_no: None,
                end_no: None,
                count: 0,
            });
        summary.count += 1;
        if let Some(no) = shop.parsed_no() {
            summary.start_no = Some(summary.start_no.map_or(no, |s| s.min(no)));
            summary.end_no = Some(summary.end_no.map_or(no, |e| e.max(no)));
        }
    }

    let mut blocks: Vec<BlockSummary> = blocks.into_values().collect();
    // Newest first; the id breaks ties so output is deterministic
    blocks.sort_by(|a, b| {
        b.created_at_ms
            .cmp(&a.created_at_ms)
            .then_with(|| a.block_id.cmp(&b.block_id))
    });
    blocks
}

/// Ids of every shop belonging to `block`.
pub fn shops_in_block<'a>(shops: &'a [Shop], block: &'a BlockId) -> impl Iterator<Item = &'a Shop> + 'a {
    shops
        .iter()
        .filter(move |s| s.block_id.as_deref().map(str::trim) == Some(block.as_str()))
}
