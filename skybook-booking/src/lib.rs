pub mod engine;
pub mod stage;

pub use engine::{BookingEngine, RetryPolicy};
pub use stage::{BookingStage, Operation, StageError};
