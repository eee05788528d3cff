use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;

/// Whether the last scan for a student-day was an entry or an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitStatus {
    In,
    Out,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::In => "In",
            VisitStatus::Out => "Out",
        }
    }

    pub fn parse(value: &str) -> Option<VisitStatus> {
        match value {
            "In" => Some(VisitStatus::In),
            "Out" => Some(VisitStatus::Out),
            _ => None,
        }
    }
}

/// A stored record that cannot be interpreted as a valid visit.
#[derive(Debug, thiserror::Error)]
pub enum MalformedVisit {
    #[error("status '{0}' is neither 'In' nor 'Out'")]
    UnknownStatus(String),
    #[error("date '{0}' is not a valid YYYY-MM-DD date")]
    BadDate(String),
    #[error("time '{0}' is not a valid HH:MM:SS time")]
    BadTime(String),
    #[error("record is 'Out' but has no check-out time")]
    MissingTimeOut,
    #[error("record is 'In' but carries a check-out time")]
    UnexpectedTimeOut,
}

/// One visit to the pool: a check-in, optionally closed by a check-out.
///
/// The only permitted mutation is closing the open record for a student-day
/// (set `time_out`, flip `status` to `Out`); everything else is append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub student_id: String,
    pub student_name: String,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: Option<NaiveTime>,
    pub status: VisitStatus,
}

impl VisitRecord {
    /// A fresh open record for a check-in at `time`.
    pub fn open(student_id: &str, student_name: &str, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            date,
            time_in: time,
            time_out: None,
            status: VisitStatus::In,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == VisitStatus::In && self.time_out.is_none()
    }

    /// Closed-session duration in whole minutes, floor-truncated.
    ///
    /// `None` for open sessions and for corrupted records whose check-out
    /// precedes the check-in; those never contribute to aggregates.
    pub fn duration_minutes(&self) -> Option<i64> {
        match (self.status, self.time_out) {
            (VisitStatus::Out, Some(out)) => {
                let minutes = (out - self.time_in).num_minutes();
                if minutes >= 0 {
                    Some(minutes)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Check the structural invariants a stored record must satisfy.
    pub fn validate(&self) -> Result<(), MalformedVisit> {
        match self.status {
            VisitStatus::Out if self.time_out.is_none() => Err(MalformedVisit::MissingTimeOut),
            VisitStatus::In if self.time_out.is_some() => Err(MalformedVisit::UnexpectedTimeOut),
            _ => Ok(()),
        }
    }
}

/// The effect a scan had on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    CheckedIn,
    CheckedOut,
    Reentered,
}

/// Per student-day slot of the ledger index.
#[derive(Debug, Default, Clone)]
struct DaySlot {
    /// Index of the open record for this student-day, if one exists
    open: Option<usize>,
    /// Total records for this student-day
    count: usize,
}

/// The attendance ledger: an ordered sequence of visit records plus an
/// explicit per-(student, day) index, so a scan resolves in one lookup
/// instead of a full-table filter.
///
/// The index is rebuilt whenever records are loaded from storage and kept
/// current by `apply_scan`.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<VisitRecord>,
    day_index: HashMap<(String, NaiveDate), DaySlot>,
}

impl Ledger {
    /// Build a ledger from records already in storage order.
    pub fn from_records(records: Vec<VisitRecord>) -> Self {
        let mut day_index: HashMap<(String, NaiveDate), DaySlot> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            let slot = day_index
                .entry((record.student_id.clone(), record.date))
                .or_default();
            slot.count += 1;
            // The last record for a student-day decides whether a session is open.
            slot.open = if record.is_open() { Some(idx) } else { None };
        }
        Self { records, day_index }
    }

    pub fn records(&self) -> &[VisitRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<VisitRecord> {
        self.records
    }

    /// Run the scan state machine for one student on one day.
    ///
    /// NoneToday -> append an open record (check-in). An open session ->
    /// close it in place (check-out). A closed day so far -> append a fresh
    /// open record (re-entry). Returns what happened.
    pub fn apply_scan(
        &mut self,
        student_id: &str,
        student_name: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> ScanAction {
        let key = (student_id.to_string(), date);
        let slot = self.day_index.entry(key).or_default();

        if let Some(open_idx) = slot.open {
            let record = &mut self.records[open_idx];
            record.time_out = Some(time);
            record.status = VisitStatus::Out;
            slot.open = None;
            return ScanAction::CheckedOut;
        }

        let action = if slot.count == 0 {
            ScanAction::CheckedIn
        } else {
            ScanAction::Reentered
        };
        self.records
            .push(VisitRecord::open(student_id, student_name, date, time));
        slot.open = Some(self.records.len() - 1);
        slot.count += 1;
        action
    }

    /// Status of the last record for a student-day, if any.
    pub fn current_status(&self, student_id: &str, date: NaiveDate) -> Option<VisitStatus> {
        self.day_index
            .get(&(student_id.to_string(), date))
            .filter(|slot| slot.count > 0)
            .map(|slot| {
                if slot.open.is_some() {
                    VisitStatus::In
                } else {
                    VisitStatus::Out
                }
            })
    }

    /// All records for a student-day, in check-in order.
    pub fn records_for_day(&self, student_id: &str, date: NaiveDate) -> Vec<&VisitRecord> {
        self.records
            .iter()
            .filter(|r| r.student_id == student_id && r.date == date)
            .collect()
    }
}
