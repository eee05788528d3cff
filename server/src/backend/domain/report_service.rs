//! Report aggregation over the attendance ledger.
//!
//! Every view here is a pure function of a ledger snapshot (plus the
//! directory for profile joins); the service holds no state of its own.
//! An empty ledger produces empty results, never an error.

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use log::info;
use std::collections::{BTreeMap, HashMap, HashSet};

use shared::{
    CompletedVisit, DanglingSession, DashboardResponse, DateVisitCount, DiagnosticsResponse,
    GrowthPoint, GrowthResponse, OccupancyPoint, OccupancyTimelineResponse, PoolPresence,
    PoolStatusResponse, RecentActivityEntry, RollupBucket, RollupPeriod, RollupResponse,
    StudentSummaryResponse,
};

use crate::backend::domain::directory_service::DirectoryService;
use crate::backend::domain::models::visit::{VisitRecord, VisitStatus};
use crate::backend::storage::{AttendanceRepository, AttendanceStorage, CsvConnection};

/// Service deriving report views from ledger snapshots
#[derive(Clone)]
pub struct ReportService {
    repository: AttendanceRepository,
    directory: DirectoryService,
}

impl ReportService {
    pub fn new(connection: CsvConnection, directory: DirectoryService) -> Self {
        Self {
            repository: AttendanceRepository::new(connection),
            directory,
        }
    }

    /// Pool occupancy over the course of one day
    pub async fn occupancy_timeline(&self, date: NaiveDate) -> Result<OccupancyTimelineResponse> {
        let load = self.repository.load_ledger().await?;
        Ok(occupancy_timeline(&load.records, date))
    }

    /// Who is in the pool on `date`, and who already left, as of `as_of`
    pub async fn pool_status(
        &self,
        date: NaiveDate,
        as_of: NaiveTime,
    ) -> Result<PoolStatusResponse> {
        let load = self.repository.load_ledger().await?;
        Ok(pool_status(&load.records, date, as_of))
    }

    /// Attendance summary for one student, or `None` for an unknown id
    pub async fn student_summary(
        &self,
        student_id: &str,
    ) -> Result<Option<StudentSummaryResponse>> {
        let student = match self.directory.get_student(student_id).await? {
            Some(student) => student,
            None => return Ok(None),
        };
        let load = self.repository.load_ledger().await?;
        Ok(Some(student_summary(
            &load.records,
            &student.student_id,
            &student.name,
        )))
    }

    /// Distinct visitors per calendar bucket
    pub async fn rollup(&self, period: RollupPeriod) -> Result<RollupResponse> {
        let load = self.repository.load_ledger().await?;
        Ok(rollup(&load.records, period))
    }

    /// Month-over-month growth of unique visitors
    pub async fn monthly_growth(&self) -> Result<GrowthResponse> {
        let load = self.repository.load_ledger().await?;
        Ok(monthly_growth(&load.records))
    }

    /// Headline metrics for the landing dashboard
    pub async fn dashboard(&self) -> Result<DashboardResponse> {
        let today = Local::now().date_naive();
        let load = self.repository.load_ledger().await?;
        let registered = self.directory.student_count().await?;
        info!(
            "Dashboard: {} students, {} records",
            registered,
            load.records.len()
        );
        Ok(dashboard(&load.records, registered, today))
    }

    /// Data-quality counters: malformed rows and dangling open sessions
    pub async fn diagnostics(&self) -> Result<DiagnosticsResponse> {
        let today = Local::now().date_naive();
        let load = self.repository.load_ledger().await?;
        Ok(diagnostics(&load.records, load.malformed, today))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Build the ±1 event list for a day, sort it by timestamp, and run the
/// clamped sum. An Out event with no matching prior In never drives the
/// count below zero.
fn occupancy_timeline(records: &[VisitRecord], date: NaiveDate) -> OccupancyTimelineResponse {
    let mut events: Vec<(NaiveTime, i32)> = Vec::new();
    for record in records.iter().filter(|r| r.date == date) {
        events.push((record.time_in, 1));
        if record.status == VisitStatus::Out {
            if let Some(out) = record.time_out {
                events.push((out, -1));
            }
        }
    }
    events.sort_by_key(|(time, _)| *time);

    let mut count: i32 = 0;
    let mut points = Vec::with_capacity(events.len());
    for (time, delta) in events {
        count = (count + delta).max(0);
        points.push(OccupancyPoint {
            time: format_time(time),
            count: count as u32,
        });
    }

    OccupancyTimelineResponse {
        date: format_date(date),
        points,
    }
}

fn pool_status(records: &[VisitRecord], date: NaiveDate, as_of: NaiveTime) -> PoolStatusResponse {
    // Latest record per student decides their side of the board.
    let mut day_records: Vec<&VisitRecord> = records.iter().filter(|r| r.date == date).collect();
    day_records.sort_by_key(|r| r.time_in);

    let mut latest: HashMap<&str, &VisitRecord> = HashMap::new();
    for &record in &day_records {
        latest.insert(record.student_id.as_str(), record);
    }

    let mut currently_in = Vec::new();
    let mut checked_out = Vec::new();
    for record in latest.values() {
        if record.status == VisitStatus::In {
            let minutes = (as_of - record.time_in).num_minutes().max(0);
            currently_in.push(PoolPresence {
                student_id: record.student_id.clone(),
                name: record.student_name.clone(),
                time_in: format_time(record.time_in),
                minutes_so_far: minutes,
            });
        } else {
            checked_out.push(CompletedVisit {
                student_id: record.student_id.clone(),
                name: record.student_name.clone(),
                time_in: format_time(record.time_in),
                time_out: record.time_out.map(format_time).unwrap_or_default(),
                duration_minutes: record.duration_minutes(),
            });
        }
    }
    currently_in.sort_by(|a, b| a.time_in.cmp(&b.time_in));
    checked_out.sort_by(|a, b| a.time_in.cmp(&b.time_in));

    let in_count = currently_in.len() as u32;
    let out_count = checked_out.len() as u32;
    PoolStatusResponse {
        date: format_date(date),
        currently_in,
        checked_out,
        in_count,
        out_count,
        total_visits: in_count + out_count,
    }
}

fn student_summary(
    records: &[VisitRecord],
    student_id: &str,
    name: &str,
) -> StudentSummaryResponse {
    let own: Vec<&VisitRecord> = records
        .iter()
        .filter(|r| r.student_id == student_id)
        .collect();

    let mut days: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    let mut total_minutes: i64 = 0;
    let mut invalid_durations: u32 = 0;
    for record in &own {
        *days.entry(record.date).or_insert(0) += 1;
        match record.duration_minutes() {
            Some(minutes) => total_minutes += minutes,
            None => {
                // Closed sessions whose check-out precedes the check-in are
                // corrupted data; open sessions simply have no duration yet.
                if record.status == VisitStatus::Out {
                    invalid_durations += 1;
                }
            }
        }
    }

    let visits_by_date: Vec<DateVisitCount> = days
        .iter()
        .rev()
        .map(|(date, visits)| DateVisitCount {
            date: format_date(*date),
            visits: *visits,
        })
        .collect();

    StudentSummaryResponse {
        student_id: student_id.to_string(),
        name: name.to_string(),
        days_attended: days.len() as u32,
        total_records: own.len() as u32,
        total_minutes,
        invalid_durations,
        first_visit: days.keys().next().map(|d| format_date(*d)),
        last_visit: days.keys().next_back().map(|d| format_date(*d)),
        visits_by_date,
    }
}

fn bucket_label(date: NaiveDate, period: RollupPeriod) -> String {
    match period {
        RollupPeriod::Weekly => {
            let week = date.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        RollupPeriod::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        // quarter = ceil(month / 3)
        RollupPeriod::Quarterly => format!("{:04}-Q{}", date.year(), (date.month() + 2) / 3),
    }
}

fn rollup(records: &[VisitRecord], period: RollupPeriod) -> RollupResponse {
    let mut buckets: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(bucket_label(record.date, period))
            .or_default()
            .insert(record.student_id.as_str());
    }

    RollupResponse {
        period,
        buckets: buckets
            .into_iter()
            .map(|(period, visitors)| RollupBucket {
                period,
                unique_visitors: visitors.len() as u32,
            })
            .collect(),
    }
}

/// Percentage change between two bucket counts. Division by zero is
/// undefined, not an error: rendered as N/A.
fn growth_pct(previous: u32, current: u32) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}

fn monthly_growth(records: &[VisitRecord]) -> GrowthResponse {
    let monthly = rollup(records, RollupPeriod::Monthly);

    let mut points = Vec::with_capacity(monthly.buckets.len());
    let mut previous: Option<u32> = None;
    for bucket in monthly.buckets {
        let pct = previous.and_then(|prev| growth_pct(prev, bucket.unique_visitors));
        previous = Some(bucket.unique_visitors);
        points.push(GrowthPoint {
            period: bucket.period,
            unique_visitors: bucket.unique_visitors,
            growth_pct: pct,
        });
    }

    GrowthResponse { points }
}

fn dashboard(records: &[VisitRecord], registered: usize, today: NaiveDate) -> DashboardResponse {
    let todays_records = records.iter().filter(|r| r.date == today).count();

    let mut recent: Vec<&VisitRecord> = records.iter().collect();
    recent.sort_by(|a, b| (b.date, b.time_in).cmp(&(a.date, a.time_in)));
    let recent_activity = recent
        .into_iter()
        .take(5)
        .map(|r| RecentActivityEntry {
            student_id: r.student_id.clone(),
            name: r.student_name.clone(),
            date: format_date(r.date),
            time_in: format_time(r.time_in),
            status: r.status.as_str().to_string(),
        })
        .collect();

    DashboardResponse {
        registered_students: registered as u32,
        todays_records: todays_records as u32,
        total_records: records.len() as u32,
        recent_activity,
    }
}

fn diagnostics(records: &[VisitRecord], malformed: usize, today: NaiveDate) -> DiagnosticsResponse {
    let dangling_sessions = records
        .iter()
        .filter(|r| r.is_open() && r.date < today)
        .map(|r| DanglingSession {
            student_id: r.student_id.clone(),
            name: r.student_name.clone(),
            date: format_date(r.date),
            time_in: format_time(r.time_in),
        })
        .collect();

    DiagnosticsResponse {
        malformed_records: malformed as u32,
        dangling_sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    fn closed(id: &str, name: &str, day: &str, t_in: &str, t_out: &str) -> VisitRecord {
        VisitRecord {
            student_id: id.to_string(),
            student_name: name.to_string(),
            date: date(day),
            time_in: time(t_in),
            time_out: Some(time(t_out)),
            status: VisitStatus::Out,
        }
    }

    fn open(id: &str, name: &str, day: &str, t_in: &str) -> VisitRecord {
        VisitRecord::open(id, name, date(day), time(t_in))
    }

    #[test]
    fn occupancy_rises_and_falls_with_scans() {
        let records = vec![
            closed("STU0001", "Amara", "2025-07-01", "09:00:00", "10:00:00"),
            closed("STU0002", "Bimal", "2025-07-01", "09:30:00", "11:00:00"),
            open("STU0003", "Chatura", "2025-07-01", "09:45:00"),
        ];

        let timeline = occupancy_timeline(&records, date("2025-07-01"));
        let counts: Vec<u32> = timeline.points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![1, 2, 3, 2, 1]);
    }

    #[test]
    fn occupancy_never_goes_negative() {
        // An Out with no matching In: corrupted import.
        let records = vec![VisitRecord {
            student_id: "STU0001".to_string(),
            student_name: "Amara".to_string(),
            date: date("2025-07-01"),
            time_in: time("12:00:00"),
            time_out: Some(time("08:00:00")),
            status: VisitStatus::Out,
        }];

        let timeline = occupancy_timeline(&records, date("2025-07-01"));
        // The -1 at 08:00 precedes the +1 at 12:00 once sorted; the floor holds.
        assert_eq!(timeline.points[0].count, 0);
        assert_eq!(timeline.points[1].count, 1);
    }

    #[test]
    fn occupancy_only_counts_the_requested_day() {
        let records = vec![
            closed("STU0001", "Amara", "2025-07-01", "09:00:00", "10:00:00"),
            closed("STU0001", "Amara", "2025-07-02", "09:00:00", "10:00:00"),
        ];
        let timeline = occupancy_timeline(&records, date("2025-07-01"));
        assert_eq!(timeline.points.len(), 2);
    }

    #[test]
    fn empty_ledger_yields_empty_reports() {
        let records: Vec<VisitRecord> = Vec::new();

        assert!(occupancy_timeline(&records, date("2025-07-01")).points.is_empty());
        let status = pool_status(&records, date("2025-07-01"), time("12:00:00"));
        assert_eq!(status.total_visits, 0);
        assert!(rollup(&records, RollupPeriod::Monthly).buckets.is_empty());
        assert!(monthly_growth(&records).points.is_empty());
        let board = dashboard(&records, 0, date("2025-07-01"));
        assert_eq!(board.total_records, 0);
        assert!(board.recent_activity.is_empty());
    }

    #[test]
    fn pool_status_splits_by_last_record() {
        let records = vec![
            // Amara came, left, came back: currently in.
            closed("STU0001", "Amara", "2025-07-01", "09:00:00", "10:00:00"),
            open("STU0001", "Amara", "2025-07-01", "11:00:00"),
            // Bimal left for the day.
            closed("STU0002", "Bimal", "2025-07-01", "09:30:00", "10:30:00"),
        ];

        let status = pool_status(&records, date("2025-07-01"), time("11:30:00"));
        assert_eq!(status.in_count, 1);
        assert_eq!(status.out_count, 1);
        assert_eq!(status.total_visits, 2);
        assert_eq!(status.currently_in[0].student_id, "STU0001");
        assert_eq!(status.currently_in[0].minutes_so_far, 30);
        assert_eq!(status.checked_out[0].duration_minutes, Some(60));
    }

    #[test]
    fn summary_counts_days_records_and_valid_minutes() {
        let records = vec![
            closed("STU0001", "Amara", "2025-07-01", "09:00:00", "10:00:00"),
            closed("STU0001", "Amara", "2025-07-01", "11:00:00", "11:30:00"),
            closed("STU0001", "Amara", "2025-07-03", "09:00:00", "09:45:00"),
            // Corrupted: out before in. Excluded from minutes, counted.
            closed("STU0001", "Amara", "2025-07-04", "12:00:00", "08:00:00"),
            open("STU0001", "Amara", "2025-07-05", "09:00:00"),
            // Another student's records never leak in.
            closed("STU0002", "Bimal", "2025-07-01", "09:00:00", "10:00:00"),
        ];

        let summary = student_summary(&records, "STU0001", "Amara");
        assert_eq!(summary.days_attended, 4);
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.total_minutes, 60 + 30 + 45);
        assert_eq!(summary.invalid_durations, 1);
        assert_eq!(summary.first_visit.as_deref(), Some("2025-07-01"));
        assert_eq!(summary.last_visit.as_deref(), Some("2025-07-05"));
        assert_eq!(summary.visits_by_date[0].date, "2025-07-05");
        assert_eq!(summary.visits_by_date.last().unwrap().visits, 2);
    }

    #[test]
    fn rollups_bucket_by_week_month_and_quarter() {
        let records = vec![
            closed("STU0001", "Amara", "2025-01-06", "09:00:00", "10:00:00"),
            closed("STU0002", "Bimal", "2025-01-07", "09:00:00", "10:00:00"),
            closed("STU0001", "Amara", "2025-02-10", "09:00:00", "10:00:00"),
            closed("STU0001", "Amara", "2025-04-01", "09:00:00", "10:00:00"),
        ];

        let weekly = rollup(&records, RollupPeriod::Weekly);
        assert_eq!(weekly.buckets[0].period, "2025-W02");
        assert_eq!(weekly.buckets[0].unique_visitors, 2);

        let monthly = rollup(&records, RollupPeriod::Monthly);
        let labels: Vec<&str> = monthly.buckets.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(labels, vec!["2025-01", "2025-02", "2025-04"]);

        let quarterly = rollup(&records, RollupPeriod::Quarterly);
        let labels: Vec<&str> = quarterly.buckets.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(labels, vec!["2025-Q1", "2025-Q2"]);
        assert_eq!(quarterly.buckets[0].unique_visitors, 2);
    }

    #[test]
    fn repeat_visits_count_once_per_bucket() {
        let records = vec![
            closed("STU0001", "Amara", "2025-07-01", "09:00:00", "10:00:00"),
            closed("STU0001", "Amara", "2025-07-08", "09:00:00", "10:00:00"),
            closed("STU0001", "Amara", "2025-07-15", "09:00:00", "10:00:00"),
        ];
        let monthly = rollup(&records, RollupPeriod::Monthly);
        assert_eq!(monthly.buckets.len(), 1);
        assert_eq!(monthly.buckets[0].unique_visitors, 1);
    }

    #[test]
    fn growth_is_fifty_percent_for_ten_to_fifteen() {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(closed(
                &format!("STU{:04}", i),
                "Visitor",
                "2025-06-15",
                "09:00:00",
                "10:00:00",
            ));
        }
        for i in 0..15 {
            records.push(closed(
                &format!("STU{:04}", i),
                "Visitor",
                "2025-07-15",
                "09:00:00",
                "10:00:00",
            ));
        }

        let growth = monthly_growth(&records);
        assert_eq!(growth.points.len(), 2);
        assert_eq!(growth.points[0].growth_pct, None);
        assert_eq!(growth.points[1].growth_pct, Some(50.0));
    }

    #[test]
    fn growth_from_zero_is_undefined_not_infinite() {
        assert_eq!(growth_pct(0, 15), None);
        assert_eq!(growth_pct(10, 15), Some(50.0));
        assert_eq!(growth_pct(10, 5), Some(-50.0));
    }

    #[test]
    fn first_observed_month_has_no_growth_figure() {
        let records = vec![closed("STU0001", "Amara", "2025-07-01", "09:00:00", "10:00:00")];
        let growth = monthly_growth(&records);
        assert_eq!(growth.points.len(), 1);
        assert_eq!(growth.points[0].growth_pct, None);
    }

    #[test]
    fn dashboard_reports_counts_and_recent_activity() {
        let records = vec![
            closed("STU0001", "Amara", "2025-06-30", "09:00:00", "10:00:00"),
            closed("STU0002", "Bimal", "2025-07-01", "08:00:00", "09:00:00"),
            open("STU0003", "Chatura", "2025-07-01", "09:30:00"),
        ];

        let board = dashboard(&records, 12, date("2025-07-01"));
        assert_eq!(board.registered_students, 12);
        assert_eq!(board.todays_records, 2);
        assert_eq!(board.total_records, 3);
        assert_eq!(board.recent_activity[0].student_id, "STU0003");
        assert_eq!(board.recent_activity.last().unwrap().date, "2025-06-30");
    }

    #[test]
    fn diagnostics_surface_dangling_sessions() {
        let records = vec![
            open("STU0001", "Amara", "2025-06-30", "18:00:00"),
            open("STU0002", "Bimal", "2025-07-01", "09:00:00"),
        ];

        let diag = diagnostics(&records, 2, date("2025-07-01"));
        assert_eq!(diag.malformed_records, 2);
        // Today's open session is normal; yesterday's is dangling.
        assert_eq!(diag.dangling_sessions.len(), 1);
        assert_eq!(diag.dangling_sessions[0].student_id, "STU0001");
    }
}
