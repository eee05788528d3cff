use chrono::NaiveDate;

/// A registered student profile.
///
/// Profiles are immutable once created; the directory never deletes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub dob: NaiveDate,
    pub school_name: String,
    pub registered_on: NaiveDate,
}

impl Student {
    /// Generate a candidate student id from an epoch-millisecond timestamp.
    ///
    /// Format is "STU" followed by four digits. Uniqueness is the caller's
    /// responsibility; on collision the caller retries with a bumped seed.
    pub fn generate_id(now_millis: u64) -> String {
        format!("STU{:04}", now_millis % 10_000)
    }
}
