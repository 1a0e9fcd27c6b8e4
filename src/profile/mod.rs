//! The profile page: field metadata, validation, the per-form edit state
//! machine, display rules and the page controller tying them to a data
//! service and a session.

pub mod fields;
pub mod form;
pub mod page;
pub mod render;
pub mod validation;

pub use fields::{FieldDescriptor, InputKind};
pub use form::{EditableForm, ErrorMap, FormError, FormMode, SubmitPlan};
pub use page::{ProfilePage, SaveOutcome, USERS_COLLECTION};
pub use render::{DisplayOptions, FieldView, FormView};
pub use validation::{validate, FieldValidator};
