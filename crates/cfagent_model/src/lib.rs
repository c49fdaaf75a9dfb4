// SPDX-License-Identifier: Apache-2.0

//! The typed policy AST and its static syntax tables.
//!
//! This crate has no parser and no evaluator: it defines the shapes that
//! [`Policy`] is built out of, the index-based cross-references between
//! them, and the declarative tables describing which promise types and
//! attributes the engine knows about. Everything stateful (class heaps,
//! variable scopes, lock state, …) lives in the crates that consume this
//! one.

pub mod body;
pub mod bundle;
pub mod constraint;
pub mod ids;
pub mod policy;
pub mod promise;
pub mod syntax;
pub mod value;

pub use body::Body;
pub use bundle::Bundle;
pub use constraint::Constraint;
pub use ids::{BodyId, BundleId, ConstraintId, ConstraintParent, PromiseId, SectionId};
pub use policy::Policy;
pub use promise::{BundleSection, Promise};
pub use value::{FunctionCall, RightValue};
