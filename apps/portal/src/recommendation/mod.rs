// Recommendation pipeline: submit → poll → merge → rank, plus the summary view.
// All remote calls go through store_client traits; nothing here builds HTTP requests.

pub mod merger;
pub mod poller;
pub mod ranking;
pub mod session;
pub mod submitter;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;
