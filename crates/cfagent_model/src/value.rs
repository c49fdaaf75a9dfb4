// SPDX-License-Identifier: Apache-2.0

//! Right-hand-side values: the payload of a constraint's `lval => rval`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A function call right-value: a name plus an ordered list of arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The function name, e.g. `readfile`, `classmatch`, `and`.
    pub name: String,
    /// The ordered argument list.
    pub args: Vec<RightValue>,
}

impl Display for FunctionCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, a) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, ")")
    }
}

/// The right-hand side of a constraint. A flag elsewhere (`Constraint::references_body`)
/// distinguishes a `Scalar` that happens to name a body (`thing => bodyname`) from a `Scalar`
/// that is a literal string (`thing => "literal"`); both are represented the same way here,
/// the flag lives on the owning [`crate::constraint::Constraint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RightValue {
    /// A scalar string, possibly containing unexpanded `$(var)` references.
    Scalar(String),
    /// An ordered list of right-values.
    List(Vec<RightValue>),
    /// A function call.
    FunctionCall(FunctionCall),
    /// An arbitrary JSON container (used by `data` promises and `json`
    /// typed attributes).
    Container(serde_json::Value),
}

impl RightValue {
    /// Convenience constructor for a scalar.
    pub fn scalar(s: impl Into<String>) -> Self {
        RightValue::Scalar(s.into())
    }

    /// True if this right-value is something [`crate::expand`]-stage logic
    /// should iterate over: a list, or (after expansion) a function call
    /// that is known to return a container. The engine proper only needs
    /// the list case; function-call containers are detected by the
    /// promise expander once the call has been evaluated.
    pub fn is_list(&self) -> bool {
        matches!(self, RightValue::List(_))
    }

    /// Returns the scalar string if this is a [`RightValue::Scalar`].
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            RightValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list if this is a [`RightValue::List`].
    pub fn as_list(&self) -> Option<&[RightValue]> {
        match self {
            RightValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl Display for RightValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RightValue::Scalar(s) => write!(f, "{s}"),
            RightValue::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            RightValue::FunctionCall(call) => write!(f, "{call}"),
            RightValue::Container(json) => write!(f, "{json}"),
        }
    }
}

impl From<&str> for RightValue {
    fn from(s: &str) -> Self {
        RightValue::Scalar(s.to_owned())
    }
}

impl From<String> for RightValue {
    fn from(s: String) -> Self {
        RightValue::Scalar(s)
    }
}
