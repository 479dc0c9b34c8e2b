//! Execution of artifact transforms with slot injection and output checks.
//!
//! A transform type describes itself with a [`TypeSchema`]: its settable
//! properties, their setters, and which of them carry a [`SlotKind`] marker.
//! Slot discovery reads that schema once per type. A [`TransformRegistration`]
//! then instantiates the transform, injects the primary input and workspace
//! directory, runs it, and checks that every output it reports is owned by
//! the execution. The same registration can compute the transform's input
//! cache key without running it.

#![warn(missing_docs)]

pub mod discovery;
pub mod error;
pub mod outputs;
pub mod registration;
pub mod schema;

pub use discovery::{slots_for, DiscoveredSlots, InjectableSlot};
pub use error::{BoxError, ExecutionStage, InvalidOutputReason, TransformError};
pub use outputs::validate_outputs;
pub use registration::{PropertyWalker, Transform, TransformRegistration};
pub use schema::{PropertySchema, Setter, SetterFn, SlotKind, TypeSchema};
