use std::io::Write;

use chrono::SecondsFormat;

use super::domain::StatusChangeRecord;

#[derive(Debug, thiserror::Error)]
pub enum AuditExportError {
    #[error("failed to write audit CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush audit CSV: {0}")]
    Io(#[from] std::io::Error),
}

const HEADER: [&str; 7] = [
    "change_id",
    "application_id",
    "previous_status",
    "new_status",
    "actor",
    "created_at",
    "notes_snapshot",
];

/// Write an application's status history as CSV, one row per audit record.
pub fn write_history_csv<W: Write>(
    records: &[StatusChangeRecord],
    writer: W,
) -> Result<(), AuditExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for record in records {
        let created_at = record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        csv.write_record([
            record.id.0.as_str(),
            record.application_id.0.as_str(),
            record.previous_status.label(),
            record.new_status.label(),
            record.actor.0.as_str(),
            created_at.as_str(),
            record.notes_snapshot.as_deref().unwrap_or(""),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn history_csv(records: &[StatusChangeRecord]) -> Result<String, AuditExportError> {
    let mut buffer = Vec::new();
    write_history_csv(records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::applications::domain::{
        ActorId, ApplicationId, ApplicationStatus, StatusChangeId,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn writes_header_and_one_row_per_record() {
        let records = vec![StatusChangeRecord {
            id: StatusChangeId::from("chg-1"),
            application_id: ApplicationId::from("app-1"),
            previous_status: ApplicationStatus::Submitted,
            new_status: ApplicationStatus::Interview,
            notes_snapshot: Some("strong portfolio, \"remote\" only".to_string()),
            actor: ActorId::from("recruiter-7"),
            created_at: Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap(),
        }];

        let output = history_csv(&records).expect("csv renders");
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("change_id,application_id,previous_status,new_status,actor,created_at,notes_snapshot")
        );
        assert_eq!(
            lines.next(),
            Some("chg-1,app-1,SUBMITTED,INTERVIEW,recruiter-7,2025-03-04T09:30:00Z,\"strong portfolio, \"\"remote\"\" only\"")
        );
        assert_eq!(lines.next(), None);
    }
}
