pub mod codec;
pub mod conflict;
pub mod engine;
pub mod labels;
pub mod matcher;
pub mod report;

pub use engine::{Direction, EngineConfig, SyncEngine};
pub use report::SyncResult;
