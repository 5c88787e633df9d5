//! Scene module - script-driven rendering
//!
//! - Script parsing into typed commands
//! - A session holding buffers, sticky flags and the current image

mod script;
mod session;

pub use script::*;
pub use session::*;
