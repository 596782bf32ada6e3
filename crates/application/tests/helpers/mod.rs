pub mod mock_engine;

pub use mock_engine::*;
