use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use rand::Rng;
use rsvp_backend::{
    config::Config,
    domain::models::{event::NewEventParams, user::User},
    error::AppError,
    state::AppState,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 10;
const CAPACITY: i32 = 50;
const USER_COUNT: usize = 400;

enum Outcome {
    Accepted,
    Rejected,
    Failed,
}

#[tokio::main]
async fn main() {
    let _guard = rsvp_backend::init_logging();
    println!("{}", "🚀 Starting RSVP Contention Benchmark".bold().green());

    let db_filename = format!("benchmark_{}.db", Uuid::new_v4());
    let config = Config {
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}?mode=rwc", db_filename)),
        mail_service_url: "http://localhost:8000/api/v1/send".to_string(),
        mail_service_token: "benchmark".to_string(),
        max_attendee_count: rsvp_backend::config::DEFAULT_MAX_ATTENDEE_COUNT,
        lock_wait_timeout: Duration::from_secs(5),
        base_url: "http://localhost:3000/event/".to_string(),
    };
    println!("Database: {}", config.database_url);

    let (state, _worker) = match rsvp_backend::start(&config).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("{} {}", "❌ Failed to start service:".red().bold(), e);
            return;
        }
    };

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let (event_id, user_ids) = match setup_data(&state).await {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{} {}", "❌ Setup failed:".red().bold(), e);
            return;
        }
    };
    println!("{}", "✅ Data created successfully.".green());
    println!("   Event ID: {} (capacity {})", event_id, CAPACITY);
    println!("   Users:    {}", user_ids.len());

    let user_ids = Arc::new(user_ids);
    let rps_stages = vec![50, 200, 1000];

    println!("\n{}", "=".repeat(76));
    println!("{:<10} | {:<12} | {:<12} | {:<10} | {:<10} | {:<10}", "RPS", "Mean (ms)", "P99 (ms)", "Accepted", "Rejected", "Invariant");
    println!("{:-<10}-+-{:-<12}-+-{:-<12}-+-{:-<10}-+-{:-<10}-+-{:-<10}", "", "", "", "", "", "");

    for &rps in &rps_stages {
        run_stage(&state, &event_id, &user_ids, rps).await;
    }

    if !config.database_url.starts_with("postgres") {
        let _ = std::fs::remove_file(&db_filename);
    }
}

async fn setup_data(state: &Arc<AppState>) -> Result<(String, Vec<String>), AppError> {
    let event = state.event_service.create(NewEventParams {
        name: "Benchmark Pickup Game".to_string(),
        group_id: None,
        capacity: CAPACITY,
        start: Utc::now() + ChronoDuration::days(7),
        location: "Load Test Arena".to_string(),
        creator_id: "benchmark".to_string(),
    }).await?;

    let mut user_ids = Vec::with_capacity(USER_COUNT);
    for i in 0..USER_COUNT {
        let user = state.user_repo.create(&User::new(format!("Bench User {}", i), None)).await?;
        user_ids.push(user.id);
    }
    Ok((event.id, user_ids))
}

async fn run_stage(state: &Arc<AppState>, event_id: &str, user_ids: &Arc<Vec<String>>, rps: u32) {
    let Some(rate) = NonZeroU32::new(rps) else { return };
    let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);
    let max = state.config.max_attendee_count;

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let state = state.clone();
            let event_id = event_id.to_string();
            let (user_id, count) = {
                let mut rng = rand::thread_rng();
                (user_ids[rng.gen_range(0..user_ids.len())].clone(), rng.gen_range(0..=max))
            };
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = state.rsvp_service.handle_response(&event_id, &user_id, count).await;
                let latency = req_start.elapsed();

                let outcome = match res {
                    Ok(_) => Outcome::Accepted,
                    Err(AppError::Validation(_)) => Outcome::Rejected,
                    Err(_) => Outcome::Failed,
                };

                let _ = tx.send((latency, outcome)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let Ok(mut histogram) = Histogram::<u64>::new(3) else { return };
    let (mut accepted, mut rejected, mut failed) = (0u64, 0u64, 0u64);

    while let Some((latency, outcome)) = rx.recv().await {
        match outcome {
            Outcome::Accepted => accepted += 1,
            Outcome::Rejected => rejected += 1,
            Outcome::Failed => failed += 1,
        }
        let _ = histogram.record(latency.as_micros() as u64);
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;

    let invariant = match check_invariants(state, event_id).await {
        Ok(true) => "OK".green().bold(),
        Ok(false) => "VIOLATED".red().bold(),
        Err(e) => format!("ERR {}", e).red(),
    };

    println!(
        "{:<10} | {:<12.2} | {:<12.2} | {:<10} | {:<10} | {:<10}",
        rps,
        mean_ms,
        p99_ms,
        accepted,
        rejected,
        invariant
    );
    if failed > 0 {
        println!("{}", format!("   {} calls failed (storage or lock timeout)", failed).yellow());
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
}

async fn check_invariants(state: &Arc<AppState>, event_id: &str) -> Result<bool, AppError> {
    let responses = state.event_repo.list_responses(event_id).await?;
    let seated: i64 = responses.iter()
        .filter(|r| !r.on_waitlist)
        .map(|r| i64::from(r.attendee_count))
        .sum();
    let waitlist_ok = responses.iter().all(|r| !r.on_waitlist || r.attendee_count == 1);
    Ok(seated <= i64::from(CAPACITY) && waitlist_ok)
}
