//! Transform subsystem.
//!
//! A bounded stack of model matrices. Every draw call reads the top to build its
//! model matrix; `push`/`pop` scope transforms the way `save`/`restore` do in
//! canvas APIs.

mod stack;

pub use stack::{TransformStack, TRANSFORM_STACK_CAPACITY};
