//! Diff engine for comparing the API surface of two versions.
//!
//! # Features
//!
//! - **Identity matching**: elements are keyed by `full_name:signature`
//! - **Reconciliation**: a changed signature is one modification, not a
//!   removal plus an addition
//! - **Compatibility**: each change says whether existing callers keep working
//! - **Deterministic order**: changes sort by type, then identity
//!
//! # Example
//!
//! ```
//! use apitrail_core::differ::{diff, ChangeType};
//! use apitrail_core::types::{ApiElement, ApiKind};
//!
//! let old = vec![ApiElement::new("f", ApiKind::Function, "pkg").with_signature("(x) -> None")];
//! let new = vec![ApiElement::new("f", ApiKind::Function, "pkg").with_signature("(x, y=1) -> None")];
//!
//! let changes = diff(&old, &new, "1.0", "1.1");
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].change_type(), ChangeType::Modified);
//! assert!(changes[0].is_backwards_compatible());
//! ```

pub mod changes;
pub mod comparator;
pub mod compat;
pub mod identity;

pub use changes::{ApiChange, ChangeType};
pub use comparator::diff;
pub use identity::identity;
