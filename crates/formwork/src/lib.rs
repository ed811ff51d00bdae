//! Declarative form-state management.
//!
//! A [`FormController`] owns field values, validation rules, derived status
//! flags, and dynamic list sub-structures, and exposes a submit/reset
//! protocol to a rendering layer. Validation failures are reported as data in
//! an [`ErrorMap`]; [`FormError`] only covers API misuse.

mod arena;
mod controller;
mod error;
mod path;
mod rules;
mod status;
mod value;
mod watch;

pub use arena::ItemId;
pub use controller::{FieldBinding, FormController, SetOptions, ValidateTarget};
pub use error::{ErrorMap, FieldError, FormError, ValidationKind};
pub use path::{FieldPath, PathError, Segment};
pub use rules::RuleSet;
pub use status::{FieldMeta, FormStatus};
pub use watch::{FormEvent, WatchId};
