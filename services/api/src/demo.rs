use crate::infra::{
    InMemoryCommitteeRepository, InMemoryNotificationOutbox, LoggingNotificationDispatcher,
};
use clap::Args;
use label_committee::config::AppConfig;
use label_committee::error::AppError;
use label_committee::telemetry;
use label_committee::workflows::committee::{
    ActorId, ApplicationId, ApplicationStatus, CommitteeDecisionService, CommitteeStats,
    DecisionReceipt, DecisionRequest, DecisionSource, Evaluation, EvaluatorId, OutboxRelay,
    Recommendation, StartupId, SuggestedAction, Verdict, VotingEngine, VotingSnapshot,
};
use label_committee::workflows::import::EvaluationImporter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct TallyArgs {
    /// CSV export with evaluator_id,application_id,recommendation,total_score,is_submitted
    #[arg(long)]
    pub(crate) evaluations: PathBuf,
    /// Application whose rows should be tallied
    #[arg(long)]
    pub(crate) application: String,
    /// Override the configured quorum
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) quorum: Option<u32>,
    /// Override the configured minimum average score for approval
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub(crate) min_score: Option<u32>,
    /// Print the snapshot as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the configured quorum for the demo committee
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) quorum: Option<u32>,
    /// Leave queued notifications undelivered
    #[arg(long)]
    pub(crate) skip_relay: bool,
}

pub(crate) fn run_tally(args: TallyArgs) -> Result<(), AppError> {
    let TallyArgs {
        evaluations,
        application,
        quorum,
        min_score,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;
    config.warn_ignored_settings();

    if let Some(quorum) = quorum {
        config.voting.quorum_required = quorum;
    }
    if let Some(min_score) = min_score {
        config.voting.min_score_for_approval = min_score;
    }
    config.voting.validate()?;

    let application_id = ApplicationId(application);
    let rows = EvaluationImporter::from_path(&evaluations)?;
    let rows = EvaluationImporter::for_application(rows, &application_id);
    let snapshot = VotingEngine::new(config.voting).snapshot(&application_id, &rows, None);

    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Snapshot unavailable as JSON: {err}"),
        }
    } else {
        println!(
            "Tally for {} from {}",
            application_id.0,
            evaluations.display()
        );
        render_snapshot(&snapshot);
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;
    config.warn_ignored_settings();
    if let Some(quorum) = args.quorum {
        config.voting.quorum_required = quorum;
    }
    config.voting.validate()?;

    let outbox = Arc::new(InMemoryNotificationOutbox::default());
    let service = CommitteeDecisionService::new(
        Arc::new(InMemoryCommitteeRepository::default()),
        outbox.clone(),
        config.voting.clone(),
    );

    println!("Label committee demo");
    println!(
        "Rules: quorum {}, minimum average score {}",
        config.voting.quorum_required, config.voting.min_score_for_approval
    );

    let ballots: [(&str, &[(&str, Recommendation, f64)]); 3] = [
        (
            "app-101",
            &[
                ("eval-ana", Recommendation::Approve, 84.0),
                ("eval-ben", Recommendation::Approve, 77.0),
                ("eval-cho", Recommendation::Reject, 58.0),
            ],
        ),
        (
            "app-102",
            &[
                ("eval-ana", Recommendation::Approve, 52.0),
                ("eval-ben", Recommendation::Approve, 49.0),
                ("eval-cho", Recommendation::Pending, 61.0),
            ],
        ),
        ("app-103", &[("eval-ana", Recommendation::Reject, 35.0)]),
    ];

    for (application, votes) in ballots {
        let application_id = ApplicationId(application.to_string());
        service.register_application(
            application_id.clone(),
            StartupId(format!("startup-{application}")),
        )?;
        service.transition_application(&application_id, ApplicationStatus::Pending)?;

        for (evaluator, recommendation, score) in votes {
            service.record_evaluation(Evaluation {
                evaluator_id: EvaluatorId(evaluator.to_string()),
                application_id: application_id.clone(),
                recommendation: Some(*recommendation),
                total_score: Some(*score),
                is_submitted: true,
            })?;
        }

        let snapshot = service.voting_snapshot(&application_id)?;
        println!("\nApplication {application}");
        render_snapshot(&snapshot);
    }

    let chair = ActorId("chair-demo".to_string());

    let strong = ApplicationId("app-101".to_string());
    let suggestion = service.voting_snapshot(&strong)?.suggested_action();
    if suggestion == SuggestedAction::Approve {
        let receipt = service.apply_decision(
            &strong,
            Some(&chair),
            DecisionRequest {
                verdict: Verdict::Approved,
                source: DecisionSource::Automatic,
                notes: None,
            },
        )?;
        render_receipt(&receipt);
    }

    let contested = ApplicationId("app-102".to_string());
    let receipt = service.override_decision(
        &contested,
        Some(&chair),
        Verdict::Rejected,
        "Scores below the committee bar despite favourable recommendations",
    )?;
    render_receipt(&receipt);

    render_stats(&service.committee_stats()?);

    if args.skip_relay {
        println!("\nNotification relay skipped");
        return Ok(());
    }

    let relay = OutboxRelay::new(
        outbox,
        Arc::new(LoggingNotificationDispatcher),
        config.outbox.max_attempts,
        config.outbox.batch_size,
    );
    let report = relay.run_once()?;
    println!(
        "\nNotifications: {} delivered, {} retried, {} dead-lettered",
        report.delivered, report.retried, report.dead_lettered
    );

    Ok(())
}

fn render_snapshot(snapshot: &VotingSnapshot) {
    println!(
        "  Votes: {} approve, {} reject, {} pending ({} submitted, quorum {})",
        snapshot.approve_count,
        snapshot.reject_count,
        snapshot.pending_count,
        snapshot.total_votes,
        snapshot.quorum_required
    );
    match snapshot.average_score {
        Some(score) => println!(
            "  Average score: {score} ({})",
            if snapshot.score_passes_threshold {
                "meets threshold"
            } else {
                "below threshold"
            }
        ),
        None => println!("  Average score: n/a"),
    }
    if let Some(decision) = snapshot.calculated_decision {
        println!(
            "  Calculated: {} ({}% confidence)",
            decision.label(),
            snapshot.decision_confidence
        );
    }
    println!(
        "  Suggested action: {} - {}",
        snapshot.suggestion.action.label(),
        snapshot.suggestion.justification
    );
}

fn render_receipt(receipt: &DecisionReceipt) {
    let decision = &receipt.decision;
    println!(
        "\nDecision recorded for {}: {} via {}",
        decision.application_id.0,
        receipt.application_status.label(),
        decision
            .decision_source
            .map(DecisionSource::label)
            .unwrap_or("unknown")
    );
    if let Some(notes) = &decision.decision_notes {
        println!("  Notes: {notes}");
    }
    if let Some(startup) = receipt.startup_status {
        println!("  Startup status: {}", startup.label());
    }
    match receipt.notification {
        Some(entry) => println!("  Notification queued as entry {}", entry.0),
        None => println!("  Notification could not be queued"),
    }
}

fn render_stats(stats: &CommitteeStats) {
    println!("\nCommittee pipeline");
    println!("  Applications: {}", stats.applications);
    println!("  Awaiting quorum: {}", stats.awaiting_quorum);
    println!("  Ready for decision: {}", stats.ready_for_decision);
    println!("  Needs review: {}", stats.needs_review);
    println!("  Approved: {}", stats.approved);
    println!("  Rejected: {}", stats.rejected);
    println!(
        "  Average participation: {:.1} votes",
        stats.average_participation
    );
}
