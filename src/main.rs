//! Monolith binary: HTTP boundary, worker pool, and lease reaper in one
//! process.

use overdub::adapters::http::{self, AppState};
use overdub::adapters::media::FfmpegTool;
use overdub::adapters::providers;
use overdub::adapters::redis::RedisPool;
use overdub::application::orchestrator::SubmissionService;
use overdub::application::pipeline::Pipeline;
use overdub::application::worker::{run_reaper_loop, Worker};
use overdub::config::Settings;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let settings = Arc::new(Settings::from_env());

    tracing_subscriber::fmt::init();

    if let Err(e) = tokio::fs::create_dir_all(&settings.upload_dir).await {
        eprintln!(
            "Failed to create upload dir {:?}: {}",
            settings.upload_dir, e
        );
        std::process::exit(1);
    }

    // 1. Adapters
    let redis = match RedisPool::new(&settings.redis_url, std::time::Duration::from_secs(settings.job_lease_secs)) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to Redis: {:?}", e);
            std::process::exit(1);
        }
    };

    let asr = providers::speech_to_text(&settings).unwrap_or_else(|e| {
        eprintln!("ASR provider setup failed: {}", e);
        std::process::exit(1);
    });
    let translator = providers::translator(&settings).unwrap_or_else(|e| {
        eprintln!("Translate provider setup failed: {}", e);
        std::process::exit(1);
    });
    let tts = providers::synthesizer(&settings).unwrap_or_else(|e| {
        eprintln!("TTS provider setup failed: {}", e);
        std::process::exit(1);
    });

    // 2. Application services
    let pipeline = Arc::new(Pipeline::new(
        asr,
        translator,
        tts,
        Arc::new(FfmpegTool::new()),
        settings.clone(),
    ));

    // 3. Workers
    for i in 0..settings.worker_count {
        let worker = Worker::new(redis.clone(), redis.clone(), pipeline.clone());
        tokio::spawn(async move {
            worker.run_worker_loop(i).await;
        });
    }
    println!("Started {} dubbing workers", settings.worker_count);

    // 4. Lease reaper
    let reaper_repo = redis.clone();
    let reaper_every = redis.lease() / 2;
    tokio::spawn(async move {
        run_reaper_loop(reaper_repo, reaper_every).await;
    });

    // 5. HTTP layer
    let state = Arc::new(AppState {
        submissions: SubmissionService::new(redis.clone()),
        repo: redis,
        settings: settings.clone(),
    });
    let app = http::router(state);

    // 6. Start server
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", settings.addr, settings.port))
        .await
        .expect("Failed to bind TCP listener");
    println!("Listening at {}:{}", settings.addr, settings.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
