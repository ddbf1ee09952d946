//! External engine: resolution, build and process control

pub mod invoker;
pub mod locator;

pub use invoker::{CancelFlag, EngineInvoker, EngineOutput};
pub use locator::{find_program, ResolvedEngine};
