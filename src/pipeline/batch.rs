// src/pipeline/batch.rs

//! Sequential batch extraction with inter-request pacing.
//!
//! Requests run one at a time with a configured delay between network
//! attempts. Per-request failures are collected, not propagated: one bad
//! course must not abort the rest of the batch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{CourseAssessment, Institution, SemesterSelection};
use crate::pipeline::Pipeline;

/// One course to extract in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub institution: Institution,
    pub course: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SemesterSelection>,
}

/// Result of one batch entry.
#[derive(Debug)]
pub struct BatchOutcome {
    pub request: BatchRequest,
    pub result: Result<CourseAssessment, AppError>,
}

/// Aggregate result of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BatchOutcome>,
}

impl Pipeline {
    /// Run a batch of extraction requests sequentially.
    pub async fn run_batch(&self, requests: Vec<BatchRequest>) -> BatchSummary {
        let delay = Duration::from_millis(self.config.scraper.request_delay_ms);
        let total = requests.len();
        let mut summary = BatchSummary::default();

        for (index, request) in requests.into_iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = self
                .extract(request.institution, &request.course, request.selection)
                .await;
            match &result {
                Ok(value) => {
                    summary.succeeded += 1;
                    log::info!(
                        "[{}/{}] {} {}: {} items",
                        index + 1,
                        total,
                        request.institution.as_str(),
                        request.course,
                        value.items.len()
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    log::warn!(
                        "[{}/{}] {} {} failed: {e}",
                        index + 1,
                        total,
                        request.institution.as_str(),
                        request.course
                    );
                }
            }
            summary.outcomes.push(BatchOutcome { request, result });
        }

        summary
    }
}
