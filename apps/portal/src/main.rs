mod config;
mod errors;
mod models;
mod recommendation;
mod store_client;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::candidate::CandidateDraft;
use crate::models::job::JobPostingDraft;
use crate::recommendation::ranking::SortMode;
use crate::recommendation::session::{CycleOutcome, RankedEntry, RecommendationSession};
use crate::store_client::PortalClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Recruitment portal recommendation client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List candidates, filtered and sorted
    Candidates {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortMode::Experience)]
        sort: SortMode,
    },
    /// Show a single candidate
    Show { record_id: String },
    /// Create a candidate, or update it when --record-id is given
    SaveCandidate(CandidateArgs),
    DeleteCandidate { record_id: String },
    /// List job postings
    Jobs,
    /// Create a job posting, or update it when --id is given
    SaveJob(JobArgs),
    DeleteJob { job_id: String },
    /// Score every candidate against a job and show the ranked result
    Recommend {
        job_id: String,
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortMode::Experience)]
        sort: SortMode,
    },
}

#[derive(Args, Debug)]
struct CandidateArgs {
    #[arg(long)]
    record_id: Option<String>,
    #[arg(long)]
    name: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    years: Option<u32>,
    /// Comma-separated skills
    #[arg(long)]
    skills: Option<String>,
    #[arg(long)]
    about: Option<String>,
    #[arg(long)]
    url: Option<String>,
}

impl From<CandidateArgs> for CandidateDraft {
    fn from(a: CandidateArgs) -> Self {
        CandidateDraft {
            record_id: a.record_id,
            name: a.name,
            city: a.city,
            position: a.position,
            total_experience_years: a.years,
            experiences: a.skills,
            about: a.about,
            url: a.url,
        }
    }
}

#[derive(Args, Debug)]
struct JobArgs {
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    title: String,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    locations: Option<String>,
    #[arg(long)]
    work_type: Option<String>,
    #[arg(long)]
    required_skills: Option<String>,
    #[arg(long)]
    experience_required: Option<String>,
    #[arg(long)]
    years: Option<u32>,
    #[arg(long)]
    description: Option<String>,
}

impl From<JobArgs> for JobPostingDraft {
    fn from(a: JobArgs) -> Self {
        JobPostingDraft {
            id: a.id,
            title: a.title,
            department: a.department,
            locations: a.locations,
            work_type: a.work_type,
            required_skills: a.required_skills,
            experience_required: a.experience_required,
            total_experience_years: a.years,
            job_description: a.description,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting portal client v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(PortalClient::new(config.api_url.clone(), config.http_timeout())?);
    info!("Store client initialized ({})", client.base_url());

    let poll = config.poll_config();
    info!(
        "Polling every {}ms, at most {} attempts",
        poll.interval.as_millis(),
        poll.max_attempts
    );

    let session = RecommendationSession::new(client.clone(), client.clone(), poll);

    match cli.command {
        Commands::Candidates { search, sort } => {
            session.refresh_candidates().await?;
            print_ranked(&session.ranked(&search, sort).await);
        }
        Commands::Show { record_id } => {
            let candidate = client.get_candidate(&record_id).await?;
            print_ranked(&[RankedEntry {
                candidate: candidate.clone(),
                score: None,
            }]);
            if let Some(about) = candidate.about.as_deref() {
                println!("\n{about}");
            }
            if let Some(url) = candidate.url.as_deref() {
                println!("{url}");
            }
        }
        Commands::SaveCandidate(args) => {
            let draft = CandidateDraft::from(args);
            session.save_candidate(&draft).await?;
            println!("Saved candidate {}", draft.name);
        }
        Commands::DeleteCandidate { record_id } => {
            session.delete_candidate(&record_id).await?;
            println!("Deleted candidate {record_id}");
        }
        Commands::SaveJob(args) => {
            let draft = JobPostingDraft::from(args);
            match draft.id.as_deref() {
                Some(job_id) => client.update_job_posting(job_id, &draft).await?,
                None => client.create_job_posting(&draft).await?,
            }
            println!("Saved job posting {}", draft.title);
        }
        Commands::DeleteJob { job_id } => {
            client.delete_job_posting(&job_id).await?;
            println!("Deleted job posting {job_id}");
        }
        Commands::Jobs => {
            session.refresh_jobs().await?;
            for job in session.jobs().await {
                println!(
                    "{:<12} {:<32} {:<20} {}",
                    job.id,
                    job.display_title(),
                    job.locations.as_deref().unwrap_or("-"),
                    job.work_type.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Recommend {
            job_id,
            search,
            sort,
        } => {
            session.refresh_candidates().await?;
            info!(
                "Requesting scores for {} candidates",
                session.candidates().await.len()
            );

            let outcome = tokio::select! {
                outcome = session.run_recommendation(&job_id) => outcome,
                _ = tokio::signal::ctrl_c() => {
                    session.clear_selection().await;
                    bail!("Recommendation for job {job_id} cancelled");
                }
            };

            if let CycleOutcome::Completed { unmatched, .. } = &outcome {
                if *unmatched > 0 {
                    info!("{unmatched} scores referenced candidates not in the local collection");
                }
            }

            if let Some(job) = session.selected_job().await {
                println!("Recommendations for job {job}");
            }
            if let Some(error) = session.last_error().await {
                println!("Error: {error}");
            }
            if let Some(notice) = session.notice().await {
                println!("{}", notice.message());
            }
            let view = session.summary().await;
            if let Some(summary) = view.summary() {
                if let Some(at) = view.received_at() {
                    println!("Evaluation received {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                println!(
                    "Average score: {:.1} | Above 50: {} ({:.0}%) | Evaluated: {}",
                    summary.average_score,
                    summary.above_50_count,
                    view.above_threshold_ratio() * 100.0,
                    summary.total_candidates,
                );
            }
            if !session.has_scores().await {
                println!("No scores for job {job_id}; showing {sort:?} order");
            }
            print_ranked(&session.ranked(&search, sort).await);

            if let CycleOutcome::Failed(e) = outcome {
                bail!("Recommendation for job {job_id} failed: {e}");
            }
        }
    }

    Ok(())
}

fn print_ranked(entries: &[RankedEntry]) {
    for entry in entries {
        let c = &entry.candidate;
        let score = entry
            .score
            .map(|s| format!("{s:>5.1}"))
            .unwrap_or_else(|| "    -".to_string());
        let flag = if c.is_profile_incomplete() { " (incomplete profile)" } else { "" };
        println!(
            "{score}  {:<24} {:<16} {:>4} yrs  {}{flag}",
            c.display_name(),
            c.city_or_empty(),
            c.experience_years(),
            c.position.as_deref().unwrap_or("-"),
        );
    }
}
