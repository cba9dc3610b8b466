//! Schema-driven random data population.
//!
//! The engine walks containers, composites and fields of a schema provider,
//! asks a [`HandlerRegistry`] for a value generator per field and writes the
//! results through a [`mockseed_core::PersistenceBackend`], all inside one
//! transaction per run.

pub mod coin;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod model;
pub mod node;
pub mod output;
pub mod registry;
pub mod retry;
pub mod store;

pub use coin::{CoinToss, FairCoin, FixedCoin};
pub use engine::{DiscoveredContainer, Discovery, PopulationEngine};
pub use errors::PopulateError;
pub use model::{PopulateIssue, PopulateOptions, RunReport};
pub use node::{FieldNode, NodeKind, SchemaNode};
pub use registry::{HandlerContext, HandlerFn, HandlerRegistry, HandlerSource};
pub use retry::{RetryPolicy, UniqueOutcome};
pub use store::{JournalEntry, MemoryBackend};
