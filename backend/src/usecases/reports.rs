use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::reports::ReportEntity,
    repositories::reports::ReportRepository,
    value_objects::{
        enums::report_enums::ReportStatus,
        validation::{ReportInput, validate_report},
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::UseCaseResult;

pub struct ReportUseCase<R>
where
    R: ReportRepository + Send + Sync + 'static,
{
    report_repository: Arc<R>,
}

impl<R> ReportUseCase<R>
where
    R: ReportRepository + Send + Sync + 'static,
{
    pub fn new(report_repository: Arc<R>) -> Self {
        Self { report_repository }
    }

    pub async fn submit(&self, reporter_id: Uuid, input: ReportInput) -> UseCaseResult<ReportEntity> {
        let valid = validate_report(&input).map_err(|err| {
            warn!(%reporter_id, field = err.field, "reports: rejected report");
            err
        })?;

        let report = self
            .report_repository
            .insert(ReportEntity {
                id: Uuid::new_v4(),
                reporter_id,
                reported_item_type: valid.item_type.to_string(),
                reported_item_id: valid.item_id,
                reason: valid.reason.to_string(),
                description: valid.description,
                status: ReportStatus::Open.to_string(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%reporter_id, db_error = ?err, "reports: failed to store report");
                err
            })?;

        info!(%reporter_id, report_id = %report.id, "reports: report submitted");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::reports::MockReportRepository;

    #[tokio::test]
    async fn valid_reports_are_stored_open() {
        let item_id = Uuid::new_v4();
        let mut reports = MockReportRepository::new();
        reports
            .expect_insert()
            .withf(move |r| {
                r.status == "open"
                    && r.reported_item_type == "live_stream"
                    && r.reported_item_id == item_id
                    && r.reason == "hate_speech"
            })
            .times(1)
            .returning(|r| Box::pin(async move { Ok(r) }));

        let report = ReportUseCase::new(Arc::new(reports))
            .submit(
                Uuid::new_v4(),
                ReportInput {
                    reported_item_type: Some("live_stream".to_string()),
                    reported_item_id: Some(item_id.to_string()),
                    reason: Some("hate_speech".to_string()),
                    description: Some("  ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(report.description, None);
    }

    #[tokio::test]
    async fn reports_without_a_reason_are_rejected() {
        let mut reports = MockReportRepository::new();
        reports.expect_insert().never();

        let err = ReportUseCase::new(Arc::new(reports))
            .submit(Uuid::new_v4(), ReportInput::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Please select a reason for reporting");
    }
}
