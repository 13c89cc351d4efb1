//! Shop map of the Hal market: partitions hand-drawn blocks into numbered
//! shop cells, stores them, and summarizes, filters and draws the result.
//!
//! The same crate builds natively (used by the `hal` CLI) and for wasm32,
//! where `wasm` exposes the pure parts to the browser map page.

pub mod access;
pub mod actions;
pub mod block;
pub mod block_index;
pub mod drawing;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod programs;
pub mod shop;
pub mod stats;
pub mod store;
pub mod utils;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use access::{Role, Session};
pub use block::{BlockPlan, Cell, Direction, NumberingOrigin, Region, MAX_CELLS};
pub use block_index::BlockSummary;
pub use error::{Error, InvalidInputError, PersistenceError, Result, StoreError};
pub use filter::ShopFilter;
pub use geometry::CoordGeo;
pub use programs::{Program, ProgramRegistry};
pub use shop::{BlockId, Shop, ShopEdit};
pub use stats::ShopStats;
pub use store::{DocumentStore, MemoryStore, WriteBatch, WriteOp};
