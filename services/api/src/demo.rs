use crate::infra::{match_service, semantic_scorer, FixtureMatchService, Fixtures};
use clap::Args;
use ride_match::config::AppConfig;
use ride_match::error::AppError;
use ride_match::matching::{
    rule_components, MatchOutcome, MatchRequest, MatchServiceError, UserId,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Ride to find passengers for
    #[arg(long)]
    pub(crate) ride_id: String,
    /// Identity of the caller; must be the ride host
    #[arg(long)]
    pub(crate) caller: String,
    /// Request semantic scoring (needs EMBEDDING_API_URL, otherwise falls back to rules)
    #[arg(long)]
    pub(crate) use_ai: bool,
    /// JSON file with `rides` and `users` (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// JSON file with `rides` and `users` (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
}

pub(crate) async fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let MatchArgs {
        ride_id,
        caller,
        use_ai,
        fixtures,
    } = args;

    let config = AppConfig::load()?;
    let service = match_service(
        Fixtures::load(fixtures.as_deref())?,
        semantic_scorer(&config)?,
    );

    let outcome = execute(&service, &ride_id, &caller, use_ai).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.response())?);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fixtures = Fixtures::load(args.fixtures.as_deref())?;
    let rides = fixtures.rides.clone();
    let service = match_service(fixtures, semantic_scorer(&config)?);

    println!("Ride matching demo");
    if service.semantic_configured() {
        println!("- Embedding endpoint configured; semantic runs call it live");
    } else {
        println!("- No embedding endpoint configured; semantic runs fall back to rules");
    }

    for ride in &rides {
        println!(
            "\nRide {} | {} -> {} | {} seats | gender preference {}",
            ride.id,
            ride.route.origin.address,
            ride.route.destination.address,
            ride.seats_offered,
            ride.preferences.gender.label()
        );

        for use_ai in [false, true] {
            let outcome = match execute(&service, &ride.id.0, &ride.host_id.0, use_ai).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    println!("  Match request failed: {}", err);
                    continue;
                }
            };
            render_outcome(&outcome);

            if !use_ai {
                if let Some(top) = outcome.matches.first() {
                    println!("  Why {} leads:", top.candidate.name);
                    for component in rule_components(&top.candidate, ride) {
                        println!(
                            "    - {}: +{:.1} ({})",
                            component.factor.label(),
                            component.points,
                            component.notes
                        );
                    }
                }
            }
        }
    }

    if let Some(ride) = rides.first() {
        let stranger = "user-not-the-host";
        if let Err(err) = execute(&service, &ride.id.0, stranger, false).await {
            println!("\nNon-host request for {} -> {}", ride.id, err);
        }
    }

    Ok(())
}

async fn execute(
    service: &FixtureMatchService,
    ride_id: &str,
    caller: &str,
    use_ai: bool,
) -> Result<MatchOutcome, MatchServiceError> {
    let request = MatchRequest::parse(ride_id, use_ai)?;
    service
        .find_matches(&UserId(caller.to_string()), request)
        .await
}

fn render_outcome(outcome: &MatchOutcome) {
    let mode = match serde_json::to_value(outcome.mode) {
        Ok(serde_json::Value::String(mode)) => mode,
        _ => format!("{:?}", outcome.mode),
    };
    println!("  Mode {} | {} matches", mode, outcome.matches.len());

    for (position, result) in outcome.matches.iter().enumerate() {
        if outcome.mode.semantic_applied() {
            println!(
                "    {}. {} ({}) final {} = rule {} / ai {}",
                position + 1,
                result.candidate.name,
                result.candidate.id,
                result.final_score,
                result.rule_score,
                result.ai_score
            );
        } else {
            println!(
                "    {}. {} ({}) score {}",
                position + 1,
                result.candidate.name,
                result.candidate.id,
                result.rule_score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_match::matching::MatchMode;

    fn sample_service() -> std::sync::Arc<FixtureMatchService> {
        match_service(Fixtures::load(None).expect("sample fixture"), None)
    }

    #[tokio::test]
    async fn execute_ranks_the_sample_airport_ride() {
        let service = sample_service();

        let outcome = execute(&service, "ride-airport-0614", "user-meera", false)
            .await
            .expect("host may match");

        assert_eq!(outcome.mode, MatchMode::RuleBased);
        // Rahul and Sana tie on 93; Rahul comes first in the fixture.
        let leaders: Vec<&str> = outcome
            .matches
            .iter()
            .take(2)
            .map(|result| result.candidate.id.0.as_str())
            .collect();
        assert_eq!(leaders, vec!["user-rahul", "user-sana"]);
    }

    #[tokio::test]
    async fn execute_applies_the_gender_preference() {
        let service = sample_service();

        let outcome = execute(&service, "ride-commute-ladies", "user-anita", false)
            .await
            .expect("host may match");

        let ids: Vec<&str> = outcome
            .matches
            .iter()
            .map(|result| result.candidate.id.0.as_str())
            .collect();
        assert_eq!(ids[0], "user-priya");
        assert!(!ids.contains(&"user-rahul"));
        assert!(!ids.contains(&"user-anita"));
    }

    #[tokio::test]
    async fn execute_rejects_malformed_ride_ids() {
        let service = sample_service();

        let err = execute(&service, "ride airport", "user-meera", false)
            .await
            .expect_err("whitespace is not allowed");

        assert!(matches!(err, MatchServiceError::Validation(_)));
    }
}
