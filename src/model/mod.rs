//! Policy data model.
//!
//! Two layers live here:
//!
//! - [`PolicyDocument`] and friends are the serialized form read from disk.
//! - [`Policy`] is the validated, indexed form the diff engine queries.
//!
//! MLS expressions ([`LevelExpr`], [`RangeExpr`]) and conditional expressions
//! ([`CondExpr`]) are parsed when the document is deserialized and resolved
//! against the policy when it is built.
//!
//! ```ignore
//! let policy = PolicyBuilder::new("base")
//!     .class("file", None, &["read", "write"])
//!     .type_("httpd_t", &[])
//!     .allow("httpd_t", "self", "file", &["read"])
//!     .build()?;
//! assert_eq!(policy.av_rules().len(), 1);
//! ```

mod builder;
mod cond;
mod document;
mod mls;
mod policy;
mod syntax;

pub use builder::*;
pub use cond::*;
pub use document::*;
pub use mls::*;
pub use policy::*;
pub use syntax::*;
