use tokio::sync::RwLock;

use changereq_core::ChangeRequestRecord;

use super::{LedgerError, LedgerRepository, SheetRecord};

pub const DEFAULT_HEADER: [&str; 5] = ["CORID", "Requester", "Company", "License", "Quantity"];

pub struct InMemoryLedger {
    header: Vec<String>,
    rows: RwLock<Vec<Vec<String>>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER.iter().map(|column| column.to_string()).collect())
    }
}

impl InMemoryLedger {
    pub fn new(header: Vec<String>) -> Self {
        Self { header, rows: RwLock::new(Vec::new()) }
    }

    pub fn with_rows(self, rows: Vec<Vec<String>>) -> Self {
        Self { header: self.header, rows: RwLock::new(rows) }
    }

    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.read().await.clone()
    }
}

#[async_trait::async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn list_records(&self) -> Result<Vec<SheetRecord>, LedgerError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().map(|row| SheetRecord::from_row(&self.header, row)).collect())
    }

    async fn append_row(&self, record: &ChangeRequestRecord) -> Result<(), LedgerError> {
        let mut rows = self.rows.write().await;
        rows.push(record.row().iter().map(|cell| cell.to_string()).collect());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use changereq_core::{ChangeRequestRecord, RequestId};

    use crate::repositories::{InMemoryLedger, LedgerRepository};

    #[tokio::test]
    async fn appended_rows_are_listed_in_order() {
        let ledger = InMemoryLedger::default();
        for (id, company) in [("010125-01", "Acme"), ("010125-02", "Globex")] {
            ledger
                .append_row(&ChangeRequestRecord {
                    id: RequestId(id.to_string()),
                    requester_id: "U1".to_string(),
                    company_name: company.to_string(),
                    license_type: "Pro".to_string(),
                    quantity: "5".to_string(),
                })
                .await
                .expect("append should succeed");
        }

        let records = ledger.list_records().await.expect("list should succeed");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("CORID"), Some("010125-01"));
        assert_eq!(records[1].get("Company"), Some("Globex"));
        assert_eq!(ledger.rows().await[1], ["010125-02", "U1", "Globex", "Pro", "5"]);
    }
}
