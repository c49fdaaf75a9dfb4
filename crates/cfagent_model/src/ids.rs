// SPDX-License-Identifier: Apache-2.0

//! Index-based back-references.

use serde::{Deserialize, Serialize};

macro_rules! def_id {
    ($name:ident) => {
        /// Index into the corresponding `Vec` on [`crate::policy::Policy`].
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// The raw index.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

def_id!(BundleId);
def_id!(BodyId);
def_id!(SectionId);
def_id!(PromiseId);
def_id!(ConstraintId);

/// Tagged back-reference: a constraint belongs to either a promise or a
/// body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintParent {
    /// Owned by a promise.
    Promise(PromiseId),
    /// Owned by a body.
    Body(BodyId),
}
