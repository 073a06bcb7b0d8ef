use rust_decimal::Decimal;
use storage::{
    clock::Clock,
    dto::monitor::{SummaryResponse, SummaryTest},
    models::Attempt,
    services::{
        error::{ServiceError, ServiceResult},
        participation::{EventDirectory, ParticipationContext, ParticipationRequest},
    },
};

/// Current event with its tests, race tests carrying their obstacles
pub async fn get_summary(ctx: &ParticipationContext) -> ServiceResult<SummaryResponse> {
    let now = ctx.clock.now();
    let event = ctx
        .directory
        .current_event(now)
        .await?
        .ok_or(ServiceError::NoCurrentEvent)?;

    let tests = ctx.directory.tests_for_event(event.event_id).await?;
    let mut summary = Vec::with_capacity(tests.len());
    for test in tests {
        let obstacles = if test.is_race() {
            ctx.directory.obstacles_for_test(test.test_id).await?
        } else {
            Vec::new()
        };
        summary.push(SummaryTest::new(test, obstacles));
    }

    Ok(SummaryResponse {
        event: event.into(),
        tests: summary,
    })
}

/// Whether the team may attempt the test right now
pub async fn check_participation(
    ctx: &ParticipationContext,
    team_id: i32,
    test_id: i32,
    obstacle: Option<i32>,
) -> ServiceResult<()> {
    let request = ParticipationRequest {
        team_id,
        test_id,
        obstacle,
        score: None,
    };
    ctx.registrar().check(&request).await
}

/// Record an attempt, or one step of a race
pub async fn register_participation(
    ctx: &ParticipationContext,
    team_id: i32,
    test_id: i32,
    obstacle: Option<i32>,
    score: Option<Decimal>,
) -> ServiceResult<Attempt> {
    let request = ParticipationRequest {
        team_id,
        test_id,
        obstacle,
        score,
    };
    ctx.registrar().register(&request).await
}
