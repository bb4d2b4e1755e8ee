use rusqlite::Row;
use std::sync::OnceLock;
use time::OffsetDateTime;

pub const TABLE_NAME: &str = "visit_log";

pub enum Columns {
    Id,
    MachineId,
    OperatorId,
    Timestamp,
    Transactions,
    Voids,
    VoidPercentage,
    VisitLocation,
    MachineIssue,
    ProductIssue,
    Comments,
    RawMachineName,
    CreatedAt,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::MachineId => "machine_id",
            Columns::OperatorId => "operator_id",
            Columns::Timestamp => "timestamp",
            Columns::Transactions => "transactions",
            Columns::Voids => "voids",
            Columns::VoidPercentage => "void_percentage",
            Columns::VisitLocation => "visit_location",
            Columns::MachineIssue => "machine_issue",
            Columns::ProductIssue => "product_issue",
            Columns::Comments => "comments",
            Columns::RawMachineName => "raw_machine_name",
            Columns::CreatedAt => "created_at",
            Columns::UpdatedAt => "updated_at",
        }
    }
}

/// One on-site operator visit, the logistics record reports are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitLog {
    pub id: i64,
    pub machine_id: i64,
    pub operator_id: Option<i64>,
    pub timestamp: OffsetDateTime,
    pub transactions: i64,
    pub voids: i64,
    pub void_percentage: f64,
    pub visit_location: String,
    pub machine_issue: String,
    pub product_issue: String,
    pub comments: String,
    pub raw_machine_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewVisitLog {
    pub machine_id: i64,
    pub operator_id: Option<i64>,
    pub timestamp: Option<OffsetDateTime>,
    pub transactions: i64,
    pub voids: i64,
    pub visit_location: String,
    pub machine_issue: String,
    pub product_issue: String,
    pub comments: String,
    pub raw_machine_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub machine_name: String,
    pub timestamp: String,
    pub copies: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCounts {
    pub operator_id: i64,
    pub visits: i64,
    pub machines: i64,
}

impl VisitLog {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::MachineId,
                Columns::OperatorId,
                Columns::Timestamp,
                Columns::Transactions,
                Columns::Voids,
                Columns::VoidPercentage,
                Columns::VisitLocation,
                Columns::MachineIssue,
                Columns::ProductIssue,
                Columns::Comments,
                Columns::RawMachineName,
                Columns::CreatedAt,
                Columns::UpdatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<VisitLog> {
        |row| {
            Ok(VisitLog {
                id: row.get(Columns::Id.as_str())?,
                machine_id: row.get(Columns::MachineId.as_str())?,
                operator_id: row.get(Columns::OperatorId.as_str())?,
                timestamp: row.get(Columns::Timestamp.as_str())?,
                transactions: row.get(Columns::Transactions.as_str())?,
                voids: row.get(Columns::Voids.as_str())?,
                void_percentage: row.get(Columns::VoidPercentage.as_str())?,
                visit_location: row.get(Columns::VisitLocation.as_str())?,
                machine_issue: row.get(Columns::MachineIssue.as_str())?,
                product_issue: row.get(Columns::ProductIssue.as_str())?,
                comments: row.get(Columns::Comments.as_str())?,
                raw_machine_name: row.get(Columns::RawMachineName.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
                updated_at: row.get(Columns::UpdatedAt.as_str())?,
            })
        }
    }

    pub fn has_issue(&self) -> bool {
        !self.machine_issue.trim().is_empty() || !self.product_issue.trim().is_empty()
    }
}

/// `voids / transactions * 100`, rounded to two decimals. Zero when there were no transactions.
pub fn void_percentage(voids: i64, transactions: i64) -> f64 {
    if transactions <= 0 {
        return 0.0;
    }
    (voids as f64 / transactions as f64 * 10_000.0).round() / 100.0
}
