//! Authentication-flow trees and the engine that builds them remotely.
//!
//! The remote API acknowledges node creation without returning an identifier, so every creation
//! is followed by a re-fetch of the parent's children and a [`resolve_or_fail`] match. The
//! [`FlowBuilder`] drives those calls in strict order against any [`FlowRemote`]: the HTTP admin
//! client in production, [`MemoryFlowRemote`] in tests.

pub mod builder;
pub mod memory;
pub mod model;
pub mod remote;
pub mod resolve;

pub use builder::*;
pub use memory::*;
pub use model::*;
pub use remote::*;
pub use resolve::*;
