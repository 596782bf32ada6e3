pub mod engine;

pub use engine::EngineServices;
