use std::fmt;

use serde::{Deserialize, Serialize};

/// Daily sequential identifier of the form `MMDDYY-NN`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values captured by the modal before an id has been assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRequestForm {
    pub company_name: String,
    pub license_type: String,
    pub quantity: String,
}

impl ChangeRequestForm {
    pub fn into_record(self, id: RequestId, requester_id: impl Into<String>) -> ChangeRequestRecord {
        ChangeRequestRecord {
            id,
            requester_id: requester_id.into(),
            company_name: self.company_name,
            license_type: self.license_type,
            quantity: self.quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequestRecord {
    pub id: RequestId,
    pub requester_id: String,
    pub company_name: String,
    pub license_type: String,
    pub quantity: String,
}

impl ChangeRequestRecord {
    /// Cells in sheet column order.
    pub fn row(&self) -> [&str; 5] {
        [
            self.id.as_str(),
            &self.requester_id,
            &self.company_name,
            &self.license_type,
            &self.quantity,
        ]
    }
}
