use serde::{Deserialize, Serialize};

/// A registered student as exposed over the API.
///
/// Dates are plain `YYYY-MM-DD` strings so the wire format matches the
/// columns of the persisted students table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier, e.g. "STU0001"
    pub student_id: String,
    pub name: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    pub school_name: String,
    /// Registration date (YYYY-MM-DD)
    pub registered_on: String,
}

/// Request to register a new student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterStudentRequest {
    pub name: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    pub school_name: String,
    /// Optional caller-supplied identifier; generated when absent
    pub student_id: Option<String>,
}

/// Response after registering a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterStudentResponse {
    pub student: Student,
    /// Whether an identity pass image was produced and stored
    pub pass_saved: bool,
    pub pass_message: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
}

/// Request to record a scan (typed or QR-scanned identifier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordScanRequest {
    pub student_id: String,
}

/// The effect a scan had on the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScanAction {
    /// First entry of the day
    CheckedIn,
    /// Open session closed
    CheckedOut,
    /// New session after an earlier check-out the same day
    Reentered,
}

/// Response after recording a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub action: ScanAction,
    pub student_id: String,
    pub student_name: String,
    /// Day the scan was recorded against (YYYY-MM-DD)
    pub date: String,
    /// Wall-clock time of the scan (HH:MM:SS)
    pub time: String,
    /// Operator-facing message, e.g. "Amara checked IN at 09:15:00"
    pub message: String,
}

/// Current status of a student for a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DayStatus {
    In,
    Out,
    NoRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatusResponse {
    pub student_id: String,
    pub date: String,
    pub status: DayStatus,
}

/// Administrator login request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Administrator login response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    /// Session token to send as `X-Session-Token` on subsequent requests
    pub token: Option<String>,
    pub message: String,
    /// Seconds left on the lockout when login is temporarily blocked
    pub locked_for_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
    pub message: String,
}

/// One point on a daily occupancy timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyPoint {
    /// Event time (HH:MM:SS)
    pub time: String,
    /// Number of students in the pool immediately after the event
    pub count: u32,
}

/// Pool occupancy over the course of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyTimelineResponse {
    pub date: String,
    pub points: Vec<OccupancyPoint>,
}

/// A student currently in the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolPresence {
    pub student_id: String,
    pub name: String,
    pub time_in: String,
    /// Minutes since check-in, relative to the query time
    pub minutes_so_far: i64,
}

/// A completed visit earlier in the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedVisit {
    pub student_id: String,
    pub name: String,
    pub time_in: String,
    pub time_out: String,
    pub duration_minutes: Option<i64>,
}

/// Who is in the pool right now, and who already left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStatusResponse {
    pub date: String,
    pub currently_in: Vec<PoolPresence>,
    pub checked_out: Vec<CompletedVisit>,
    pub in_count: u32,
    pub out_count: u32,
    pub total_visits: u32,
}

/// Per-student attendance summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummaryResponse {
    pub student_id: String,
    pub name: String,
    /// Distinct calendar days with at least one record
    pub days_attended: u32,
    /// Total records (each one a check-in, closed or still open)
    pub total_records: u32,
    /// Sum of valid closed-session durations, in whole minutes
    pub total_minutes: i64,
    /// Closed sessions excluded because their duration was negative
    pub invalid_durations: u32,
    pub first_visit: Option<String>,
    pub last_visit: Option<String>,
    /// Visits per day, most recent first
    pub visits_by_date: Vec<DateVisitCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateVisitCount {
    pub date: String,
    pub visits: u32,
}

/// Calendar bucket granularity for trend rollups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RollupPeriod {
    Weekly,
    Monthly,
    Quarterly,
}

/// Distinct visitors in one calendar bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupBucket {
    /// Bucket label: "2025-W31", "2025-07" or "2025-Q3"
    pub period: String,
    pub unique_visitors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupResponse {
    pub period: RollupPeriod,
    pub buckets: Vec<RollupBucket>,
}

/// Month-over-month unique-visitor growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub period: String,
    pub unique_visitors: u32,
    /// Percentage growth versus the previous observed month; `None` when the
    /// previous count was zero (rendered as N/A)
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthResponse {
    pub points: Vec<GrowthPoint>,
}

/// One line of recent activity on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivityEntry {
    pub student_id: String,
    pub name: String,
    pub date: String,
    pub time_in: String,
    pub status: String,
}

/// Headline metrics for the landing dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub registered_students: u32,
    pub todays_records: u32,
    pub total_records: u32,
    pub recent_activity: Vec<RecentActivityEntry>,
}

/// An open session left over from a previous day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DanglingSession {
    pub student_id: String,
    pub name: String,
    pub date: String,
    pub time_in: String,
}

/// Data-quality counters surfaced alongside the reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    /// Stored rows skipped on load because they violated the record format
    pub malformed_records: u32,
    /// Sessions still open on days before today
    pub dangling_sessions: Vec<DanglingSession>,
}

/// A day's attendance exported as CSV text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub file_name: String,
    pub record_count: u32,
    pub csv: String,
}
