//! Version algebra
//!
//! # Modules
//!
//! - [`number`]: Concrete versions parsed from tags (`v1.2`, `release.r60`, `r2015.01.24`)
//! - [`spec`]: Range constraints (`>=1.0.*`) with precomputed per-component bounds
//! - [`latest`]: Newest satisfying tag selection used by fetch sources
//! - [`error`]: Parse errors

pub mod error;
pub mod latest;
pub mod number;
pub mod spec;

pub use error::ParseError;
pub use latest::select_latest;
pub use number::Version;
pub use spec::{Bound, Operator, VersionSpec};
