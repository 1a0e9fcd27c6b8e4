pub mod record;
pub mod user;

pub use record::{FieldChange, FormKind, FormRecord, PaymentData, PersonalData};
pub use user::{RecordId, UserRecord};
