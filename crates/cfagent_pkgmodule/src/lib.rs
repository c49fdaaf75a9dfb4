// SPDX-License-Identifier: Apache-2.0

//! The package module protocol — a line-oriented request/response wire
//! protocol to out-of-process package providers, plus the
//! installed/updates caches and `present`/`absent` actuators built on top
//! of it.

pub mod actuator;
pub mod cache;
pub mod error;
pub mod protocol;

pub use actuator::{absent, present, PackageRequest, PackageType, RequestedVersion};
pub use cache::PackageCache;
pub use error::PkgModuleError;
pub use protocol::{call_module, check_api_version, Response, Verb};
