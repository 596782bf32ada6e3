pub mod client;
pub mod daemon;

pub use client::{run_browse, run_lookup};
pub use daemon::run_daemon;
