use crate::infra::LoggingNotifier;
use clap::Args;
use job_board::error::AppError;
use job_board::workflows::applications::transition::{self, TransitionKind};
use job_board::workflows::applications::{
    history_csv, ActorClaims, ActorRole, ApplicationPipelineService, ApplicationStatus,
    ApplicationSubmission, CandidateContact, CandidateId, InMemoryApplicationRepository,
    JobPostingId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Candidate display name used for the sample application
    #[arg(long, default_value = "Ada Lovelace")]
    pub(crate) candidate: String,
    /// Job title of the sample posting
    #[arg(long, default_value = "Backend Engineer")]
    pub(crate) job_title: String,
    /// Stop at rejection instead of hiring the candidate
    #[arg(long)]
    pub(crate) reject: bool,
    /// Print the audit trail as CSV
    #[arg(long)]
    pub(crate) csv: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        candidate,
        job_title,
        reject,
        csv,
    } = args;

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let service = ApplicationPipelineService::new(repository, Arc::new(LoggingNotifier));
    let Some(authority) = ActorClaims::new("demo-recruiter", ActorRole::Company).pipeline_authority()
    else {
        println!("Demo recruiter lacks pipeline authority");
        return Ok(());
    };

    let email = format!(
        "{}@example.com",
        candidate.to_ascii_lowercase().replace(' ', ".")
    );
    let record = match service.submit(ApplicationSubmission {
        job_posting_id: JobPostingId::from("demo-posting"),
        job_title,
        candidate: CandidateContact {
            candidate_id: CandidateId::from("demo-candidate"),
            display_name: candidate,
            email,
        },
        internal_notes: Some("sourced from demo".to_string()),
    }) {
        Ok(record) => record,
        Err(err) => {
            println!("Submission rejected: {err}");
            return Ok(());
        }
    };

    println!("Application pipeline demo");
    println!(
        "- {} applied to {} -> {} ({})",
        record.candidate.display_name, record.job_title, record.status, record.id
    );

    let last = if reject {
        ApplicationStatus::Rejected
    } else {
        ApplicationStatus::Hired
    };
    let steps = [
        ApplicationStatus::Interview,
        ApplicationStatus::Evaluation,
        ApplicationStatus::Interview,
        last,
        ApplicationStatus::Evaluation,
    ];

    for requested in steps {
        match service.change_status(&record.id, requested, &authority).await {
            Ok(outcome) if outcome.changed => {
                println!("- moved to {} (notification: {:?})", outcome.status, outcome.notification)
            }
            Ok(outcome) => println!("- already {}; nothing recorded", outcome.status),
            Err(err) => println!("- refused: {err}"),
        }
    }

    let history = match service.history(&record.id) {
        Ok(history) => history,
        Err(err) => {
            println!("Audit trail unavailable: {err}");
            return Ok(());
        }
    };

    if csv {
        match history_csv(&history) {
            Ok(text) => print!("\n{text}"),
            Err(err) => println!("Audit CSV unavailable: {err}"),
        }
    } else {
        println!("\nAudit trail");
        for change in &history {
            println!(
                "- {} {} -> {} by {}",
                change.created_at.format("%Y-%m-%d %H:%M:%S"),
                change.previous_status,
                change.new_status,
                change.actor
            );
        }
    }

    Ok(())
}

pub(crate) fn transition_matrix() -> String {
    let mut out = format!("{:<12}", "from \\ to");
    for requested in ApplicationStatus::ALL {
        out.push_str(&format!("{:<12}", requested.label()));
    }
    out.push('\n');

    for current in ApplicationStatus::ALL {
        out.push_str(&format!("{:<12}", current.label()));
        for requested in ApplicationStatus::ALL {
            let cell = match transition::check(current, requested) {
                Ok(TransitionKind::Unchanged) => "no-op",
                Ok(_) => "allowed",
                Err(denial) => denial.code(),
            };
            out.push_str(&format!("{cell:<12}"));
        }
        out.push('\n');
    }
    out
}

pub(crate) fn print_transition_matrix() {
    print!("{}", transition_matrix());
}
