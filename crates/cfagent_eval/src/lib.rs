// SPDX-License-Identifier: Apache-2.0

//! The per-agent-run evaluation context — class heap, variable scopes,
//! namespace and frame stacks, and the class guard expression language
//! that reads them.

pub mod classalgebra;
pub mod classes;
pub mod context;
pub mod frames;
pub mod persist;
pub mod vars;

pub use classalgebra::{is_defined_class, ClassExpr, ClassExprError, ClassLookup};
pub use classes::{ClassHeap, ClassScope};
pub use context::EvalContext;
pub use frames::{Frame, FrameStack};
pub use persist::{MemoryPersistentClassStore, PersistPolicy, PersistentClass, PersistentClassStore};
pub use vars::{Scope, VariableTable};
