pub mod builders;
pub mod engine_harness;
pub mod recording_sink;

pub use builders::*;
pub use engine_harness::*;
pub use recording_sink::*;
