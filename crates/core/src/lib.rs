pub mod config;
pub mod domain;
pub mod errors;
pub mod request_id;

pub use domain::{ChangeRequestForm, ChangeRequestRecord, RequestId};
pub use errors::{ApplicationError, DomainError};
pub use request_id::{date_prefix, next_request_id, Clock, FixedClock, SystemClock};
