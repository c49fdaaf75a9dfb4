// SPDX-License-Identifier: Apache-2.0

//! The promise expander: variable/function expansion, Cartesian-product
//! iteration over list-valued constraints, and the pre-eval recheck that
//! runs against each resulting concrete promise. This crate sits between
//! [`cfagent_validator`] (which checks the unexpanded AST) and the
//! actuators: it turns one [`cfagent_model::Promise`] into zero or more
//! [`expand::ConcretePromise`] instances an actuator can run directly,
//! re-validating types that only become known after expansion and
//! flagging the one non-convergence pattern that is cross-promise rather
//! than per-promise.

pub mod error;
pub mod expand;
pub mod preeval;

pub use error::ExpanderError;
pub use expand::{ConcreteConstraint, ConcretePromise, Expansion};
pub use preeval::{detect_reused_insert_anchors, recheck_constraint_types};
