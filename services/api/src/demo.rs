use crate::infra::{InMemoryContestRepository, LoggingVoteNotifier};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use storyfest::config::AppConfig;
use storyfest::error::AppError;
use storyfest::ranking::{
    ContestImporter, EventId, Leaderboard, RankingMetric, RankingPolicy, RankingService,
    Standing, VoteOutcome, VoterIdentity,
};

const DEMO_EVENT: &str = "spring-finals";

const DEMO_ENTRIES: &str = "entry_id,event_id,title,class_level,votes,views
kite,spring-finals,The Lost Kite,Primary,,
river,spring-finals,River Song,Primary,,
lantern,spring-finals,Paper Lantern,Primary,,
owl,spring-finals,The Owl Who Counted,Middle,,
monsoon,spring-finals,Monsoon Letters,Middle,,
bridge,spring-finals,Bridge of Ropes,Secondary,,
orbit,spring-finals,Orbit,Secondary,,
ember,spring-finals,Ember,Secondary,,
";

const DEMO_SCORES: &str = "rater_id,role,entry_id,score
asha,judge,kite,9
ravi,judge,kite,8.5
asha,judge,river,9.5
ravi,judge,lantern,7
asha,judge,owl,8
ravi,judge,owl,8
asha,judge,monsoon,6.5
ravi,judge,bridge,9
asha,judge,orbit,7.5
ravi,judge,ember,5
parent-12,,ember,10
";

#[derive(Args, Debug)]
pub(crate) struct LeaderboardArgs {
    /// Entries CSV export (entry_id,event_id,title,class_level,votes,views)
    #[arg(long)]
    pub(crate) entries: PathBuf,
    /// Scores CSV export (rater_id,role,entry_id,score)
    #[arg(long)]
    pub(crate) scores: PathBuf,
    /// Only print this event (defaults to every event in the export)
    #[arg(long)]
    pub(crate) event: Option<String>,
    /// Ranking metric: judge or community
    #[arg(long, default_value = "judge", value_parser = parse_metric)]
    pub(crate) metric: RankingMetric,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Voter phone number used for the vote and view walkthrough
    #[arg(long, default_value = "+91 98765 43210")]
    pub(crate) voter: String,
    /// Podium size override for the walkthrough
    #[arg(long)]
    pub(crate) podium_size: Option<usize>,
}

fn parse_metric(raw: &str) -> Result<RankingMetric, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "judge" | "judges" => Ok(RankingMetric::Judge),
        "community" | "votes" => Ok(RankingMetric::Community),
        other => Err(format!("unknown metric '{other}', expected judge or community")),
    }
}

pub(crate) fn run_leaderboard(args: LeaderboardArgs) -> Result<(), AppError> {
    let LeaderboardArgs {
        entries,
        scores,
        event,
        metric,
    } = args;

    let policy = AppConfig::load()?.ranking;
    let snapshot = ContestImporter::from_paths(entries, scores)?;
    let events = match event {
        Some(event) => vec![EventId(event)],
        None => snapshot.events(),
    };

    let now = Utc::now();
    for event_id in events {
        let standings = snapshot.standings(&event_id, &policy, now);
        println!("Event {}", event_id);
        render_leaderboard(&standings.metric(metric).leaderboard);
        println!();
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { voter, podium_size } = args;

    let voter = match VoterIdentity::parse(&voter) {
        Ok(voter) => voter,
        Err(err) => {
            println!("Voter rejected: {err}");
            return Ok(());
        }
    };

    let mut policy = RankingPolicy::default();
    if let Some(size) = podium_size.filter(|size| *size > 0) {
        policy.podium_size = size;
    }

    let snapshot = ContestImporter::from_readers(DEMO_ENTRIES.as_bytes(), DEMO_SCORES.as_bytes())?;
    let repository = Arc::new(InMemoryContestRepository::from_snapshot(snapshot));
    let notifier = Arc::new(LoggingVoteNotifier::default());
    let service = RankingService::new(repository, notifier.clone(), policy);
    let event_id = EventId(DEMO_EVENT.to_string());

    println!("Storyfest ranking demo ({DEMO_EVENT})");
    println!(
        "Policy: podium {} (max {} per class), voting pool {}, cooldown {}h",
        policy.podium_size, policy.per_class_cap, policy.pool_size, policy.cooldown_hours
    );

    println!("\nJudge standings");
    render_leaderboard(&service.leaderboard(&event_id, RankingMetric::Judge)?);

    let pool = service.eligible_pool(&event_id)?;
    let Some(target) = pool.entries.first().cloned() else {
        println!("\nVoting pool is empty; nothing to vote for");
        return Ok(());
    };

    println!("\nCommunity voting as {voter} for {target}");
    let start = Utc::now();
    for (label, at) in [
        ("now", start),
        ("after 23h", start + Duration::hours(23)),
        ("after 24h", start + Duration::hours(24)),
    ] {
        print_vote(label, at, service.cast_vote(&target, &voter, at)?);
    }

    for attempt in 1..=2 {
        let outcome = service.record_view(&target, &voter)?;
        println!("- view #{attempt}: {outcome:?}");
    }

    println!("\nCommunity standings");
    render_leaderboard(&service.leaderboard(&event_id, RankingMetric::Community)?);

    println!("\nNotifications dispatched: {}", notifier.sent().len());
    Ok(())
}

fn print_vote(label: &str, at: DateTime<Utc>, outcome: VoteOutcome) {
    match outcome {
        VoteOutcome::Accepted { vote_count } => {
            println!("- vote {label} ({}): accepted, {vote_count} total", at.format("%Y-%m-%d %H:%M"))
        }
        VoteOutcome::CoolingDown { hours_remaining } => println!(
            "- vote {label}: cooling down, {hours_remaining}h remaining"
        ),
        VoteOutcome::NotEligible => println!("- vote {label}: entry is not in the voting pool"),
    }
}

fn render_leaderboard(board: &Leaderboard) {
    if board.empty {
        println!("No standings yet for the {} leaderboard", board.metric_label);
        return;
    }
    if board.bootstrap {
        println!("(no {} results yet, every entry is open for voting)", board.metric_label);
    }

    render_section("Podium", &board.podium);
    render_section("Runners-up", &board.runners_up);
    render_section("Voting pool", &board.contenders);
}

fn render_section(title: &str, standings: &[Standing]) {
    if standings.is_empty() {
        return;
    }
    println!("{title}");
    for standing in standings {
        println!(
            "  {:>2}. {} [{}] {}",
            standing.rank,
            standing.title,
            standing.class_label.unwrap_or("Unclassified"),
            standing.display_score
        );
    }
}
