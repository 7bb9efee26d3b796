use tracing::{info, warn};

use crate::errors::ClientError;
use crate::store_client::RecommendationApi;

/// Trims `job_id`, rejecting a blank one locally with a 400.
pub fn validate_job_id(job_id: &str) -> Result<&str, ClientError> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return Err(ClientError::RequestRejected {
            status: 400,
            message: "A job must be selected before requesting recommendations".to_string(),
        });
    }
    Ok(job_id)
}

/// Asks the evaluator to score every candidate against `job_id` and returns the task id.
///
/// Never retried: a rejection or transport failure goes straight back to the caller.
pub async fn submit_for_job<A>(api: &A, job_id: &str) -> Result<String, ClientError>
where
    A: RecommendationApi + ?Sized,
{
    let job_id = validate_job_id(job_id)?;

    match api.submit_recommendation(job_id).await {
        Ok(handle) => {
            info!("Recommendation task {} started for job {}", handle.task_id, job_id);
            Ok(handle.task_id)
        }
        Err(e) => {
            warn!("Recommendation submission for job {} failed: {}", job_id, e);
            Err(e)
        }
    }
}
