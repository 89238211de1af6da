//! Semantic diff engine for SELinux policies.
//!
//! Two policies number their symbols independently, so nothing can be
//! compared by identifier. The engine first builds a [`TypeMap`], a shared
//! pseudo-type space that also absorbs renamed, split and merged types. Each
//! [`Category`] then canonicalizes both policies into sorted lists and runs a
//! sorted merge over them.
//!
//! # Architecture
//!
//! - [`CategoryDiffer`](traits::CategoryDiffer): canonicalize, key order,
//!   one-sided results and deep comparison for one category
//! - [`diff_category`](engine::diff_category): the generic merge
//! - [`DiffSession`]: runs categories by [`CategoryMask`], owns remap entries
//!   and results, and adds source line numbers on request
//!
//! # Example
//!
//! ```ignore
//! use poldiff::diff::{Category, CategoryMask, DiffSession, TypeRename};
//!
//! let renames = [TypeRename::new("foo_t", "bar_t")];
//! let mut session = DiffSession::new(&original, &modified, &renames)?;
//! session.run(CategoryMask::ALL)?;
//! println!("{} allow rules changed", session.stats(Category::AvAllow)?.total());
//! ```

pub mod categories;
mod category;
pub mod engine;
pub mod line_numbers;
mod result;
mod session;
pub mod traits;
pub mod type_map;

pub use category::{Category, CategoryMask};
pub use engine::diff_category;
pub use line_numbers::LineAnnotation;
pub use result::{CategorySummary, DiffForm, DiffItem, Stats};
pub use session::DiffSession;
pub use traits::{CategoryDiffer, DiffContext};
pub use type_map::{PseudoValue, RemapEntry, Side, TypeMap, TypeRename};
