/// Catalog primary keys are BIGSERIAL on the catalog service.
pub type DbId = i64;

/// Identifier of a training program (course) in the catalog.
pub type ProgramId = DbId;

/// Identifier of a subject in the catalog.
pub type SubjectId = DbId;

/// Monetary amount in whole naira. Unsigned so totals can never go negative.
pub type Amount = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
