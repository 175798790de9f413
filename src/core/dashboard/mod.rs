// Dashboard evaluation: model, probes, rules and the concurrent runner

pub mod evaluator;
pub mod events;
pub mod model;
pub mod probes;
pub mod results;
pub mod runner;

pub use evaluator::{builtin_error_status, evaluate};
pub use events::{EventSink, RunEvent, WriterSink};
pub use model::{
    Banner, Check, CodeMatch, Dashboard, Generate, Group, Match, Rule, Slot, Status, Theme, Tile,
};
pub use probes::{CheckKind, Probe, ProbeError, ProbeResult};
pub use results::{DashboardResult, GenerateOutcome, GroupResult, SlotResult, TileResult};
pub use runner::{effective_concurrency, GenerateOrdering, RunOptions, Runner};
