//! Backend implementations for different execution contexts
//!
//! Only local execution is built in. Remote execution is expressed by the
//! commands themselves (`ssh ...`), not by a separate backend.

pub mod local;
pub use local::LocalLauncher;
