use crate::backend::domain::commands::scans::ScanOutcome;
use crate::backend::domain::models::visit::ScanAction as DomainScanAction;
use shared::{ScanAction, ScanResponse};

/// Maps scan outcomes to their wire representation
pub struct ScanMapper;

impl ScanMapper {
    pub fn to_dto(outcome: ScanOutcome) -> ScanResponse {
        ScanResponse {
            action: match outcome.action {
                DomainScanAction::CheckedIn => ScanAction::CheckedIn,
                DomainScanAction::CheckedOut => ScanAction::CheckedOut,
                DomainScanAction::Reentered => ScanAction::Reentered,
            },
            student_id: outcome.student_id,
            student_name: outcome.student_name,
            date: outcome.date.format("%Y-%m-%d").to_string(),
            time: outcome.time.format("%H:%M:%S").to_string(),
            message: outcome.message,
        }
    }
}
