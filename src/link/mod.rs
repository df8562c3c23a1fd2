mod actions;
mod engine;
mod machine;
pub mod reason;
mod state;
mod timers;


pub use actions::{ActionBuffer, AuthFailureKind, LinkAction, Notification};
pub use engine::{EngineOutput, LinkEngine};
pub use machine::{ConnectTarget, LinkInput};
#[cfg(target_has_atomic = "64")]
pub use state::SnapshotCell;
pub use state::{LinkSnapshot, LinkState};
pub use timers::{TimerKind, TimerSet};
