use crate::pipeline::{Pipeline, RunReport, StepExecutor};
use crate::utils::time::{calculate_wait_duration, next_weekly_time, reporting_window, TriggerSchedule};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration as TokioDuration};
use tracing::{error, info, warn};

/// Start the weekly trigger loop.
///
/// Each firing spawns an independent run; runs are never deduplicated or
/// serialized against each other.
pub fn start_scheduler<X>(
    schedule: TriggerSchedule,
    run_on_startup: bool,
    pipeline: Arc<Pipeline<X>>,
) -> JoinHandle<()>
where
    X: StepExecutor + 'static,
{
    info!(
        "Starting digest scheduler: every {} at {:02}:{:02} ({})",
        schedule.weekday, schedule.hour, schedule.minute, schedule.timezone
    );

    tokio::spawn(async move {
        if run_on_startup {
            info!("Running digest on startup");
            trigger_run(Arc::clone(&pipeline), schedule);
        }

        run_scheduler_loop(schedule, pipeline).await;
    })
}

async fn run_scheduler_loop<X>(schedule: TriggerSchedule, pipeline: Arc<Pipeline<X>>)
where
    X: StepExecutor + 'static,
{
    loop {
        let now = Utc::now();
        let next = match next_weekly_time(now, &schedule) {
            Some(time) => time,
            None => {
                error!("Failed to calculate next digest time");
                sleep(TokioDuration::from_secs(3600)).await; // Retry in an hour
                continue;
            }
        };

        info!(
            "Next digest scheduled for {}",
            next.with_timezone(&schedule.timezone)
        );
        sleep(calculate_wait_duration(now, next)).await;

        trigger_run(Arc::clone(&pipeline), schedule);
    }
}

/// Compute the reporting window for the current moment and launch one run
pub fn trigger_run<X>(pipeline: Arc<Pipeline<X>>, schedule: TriggerSchedule) -> JoinHandle<RunReport>
where
    X: StepExecutor + 'static,
{
    let window = reporting_window(Utc::now(), schedule.timezone);

    tokio::spawn(async move {
        let report = pipeline.run(&window).await;
        log_report(&report);
        report
    })
}

fn log_report(report: &RunReport) {
    if report.is_success() {
        info!(
            "Digest run {} delivered email {} ({} events)",
            report.run_id,
            report.email_id.as_deref().unwrap_or("-"),
            report.event_count.unwrap_or_default()
        );
    } else {
        warn!(
            "Digest run {} ended {} at stage {}",
            report.run_id,
            report.state,
            report
                .failed_stage
                .map(|stage| stage.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}
