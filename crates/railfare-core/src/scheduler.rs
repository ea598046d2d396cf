//! Harvest scheduler: route × date fan-out and bounded concurrent dispatch.

use std::fmt::{Display, Formatter};

use futures::stream::{self, StreamExt};
use time::{Date, Duration, Weekday};

use crate::domain::{RawResponse, RouteSpec};
use crate::fetcher::{FareSource, FetchFailure};
use crate::policy::HarvestPolicy;
use crate::throttling::RequestThrottle;
use crate::{CoreError, ValidationError};

/// Weekdays harvested when none are configured.
pub const DEFAULT_WEEKDAYS: [Weekday; 2] = [Weekday::Tuesday, Weekday::Thursday];

/// Default look-ahead window in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 120;

/// One (route, departure date) fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestTask {
    pub route: RouteSpec,
    pub departure_date: Date,
}

impl Display for HarvestTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.route, self.departure_date)
    }
}

/// Collected responses plus the bookkeeping needed to account for drops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestOutcome {
    pub responses: Vec<RawResponse>,
    pub failed: usize,
    pub planned: usize,
}

impl HarvestOutcome {
    pub fn succeeded(&self) -> usize {
        self.responses.len()
    }
}

/// Expands `routes × [0, window_days)` day offsets from `start`, keeping only
/// dates whose weekday is in `weekdays`. Routes are the outer loop.
pub fn plan_tasks(
    routes: &[RouteSpec],
    start: Date,
    window_days: u32,
    weekdays: &[Weekday],
) -> Result<Vec<HarvestTask>, CoreError> {
    if routes.is_empty() {
        return Err(CoreError::EmptyRouteList);
    }
    if window_days == 0 {
        return Err(ValidationError::EmptyWindow.into());
    }
    if weekdays.is_empty() {
        return Err(ValidationError::EmptyWeekdaySet.into());
    }

    let dates = (0..window_days)
        .filter_map(|offset| start.checked_add(Duration::days(i64::from(offset))))
        .filter(|date| weekdays.contains(&date.weekday()))
        .collect::<Vec<_>>();

    let tasks = routes
        .iter()
        .flat_map(|route| {
            dates.iter().map(move |&departure_date| HarvestTask {
                route: route.clone(),
                departure_date,
            })
        })
        .collect();
    Ok(tasks)
}

/// Dispatches every task with at most `policy.max_concurrency` in flight.
///
/// Each task waits on the jitter/quota gate before calling the source. Results
/// are gathered by this coordinating future in completion order; failures are
/// logged and counted, never propagated.
pub async fn harvest(
    source: &dyn FareSource,
    tasks: &[HarvestTask],
    policy: &HarvestPolicy,
) -> Result<HarvestOutcome, ValidationError> {
    policy.validate()?;

    let throttle = RequestThrottle::new(policy.jitter, policy.quota);
    let throttle = &throttle;
    let timeout = policy.request_timeout;

    let mut outcome = HarvestOutcome {
        responses: Vec::with_capacity(tasks.len()),
        failed: 0,
        planned: tasks.len(),
    };

    log::info!(
        "harvesting {} tasks with {} workers",
        tasks.len(),
        policy.max_concurrency
    );

    let mut completions = stream::iter(tasks)
        .map(move |task| async move {
            throttle.wait().await;
            let result = match tokio::time::timeout(timeout, source.fetch(task)).await {
                Ok(result) => result,
                Err(_) => Err(FetchFailure::timeout(format!(
                    "no response within {}ms",
                    timeout.as_millis()
                ))),
            };
            (task, result)
        })
        .buffer_unordered(policy.max_concurrency);

    let mut completed = 0usize;
    while let Some((task, result)) = completions.next().await {
        completed += 1;
        match result {
            Ok(response) => {
                log::debug!(
                    "[{completed}/{}] {} response for {task}",
                    outcome.planned,
                    response.kind()
                );
                outcome.responses.push(response);
            }
            Err(failure) => {
                log::warn!(
                    "[{completed}/{}] dropping {task}: {failure}",
                    outcome.planned
                );
                outcome.failed += 1;
            }
        }
    }

    log::info!(
        "harvest finished: {} responses, {} failed",
        outcome.succeeded(),
        outcome.failed
    );
    Ok(outcome)
}
