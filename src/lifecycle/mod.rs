//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Ctrl+C → Shutdown::trigger
//!     → ShutdownSignal::wait resolves in every subscriber
//!     → HttpServer stops accepting, config reload loop ends → drain → exit
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
