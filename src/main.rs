use anyhow::Result;
use log::{error, info, warn};
use rppg_kiosk::api::rest::{AppState, RestApi};
use rppg_kiosk::config;
use rppg_kiosk::messaging::{self, broker::create_message_broker, KioskEvents, MessageBrokerTrait};
use rppg_kiosk::services::camera_manager::{create_backend, CameraManager, CaptureRequest};
use rppg_kiosk::services::narrative::create_annotator;
use rppg_kiosk::services::scan::{DemoIdentityResolver, ScanSettings, ScanTerminal};
use rppg_kiosk::services::vitals::SyntheticVitalsGenerator;
use rppg_kiosk::state::KioskState;
use std::path::PathBuf;
use std::sync::Arc;

async fn run_app() -> Result<()> {
    // First argument is an optional config file
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = config::load_config(config_path.as_deref())?;

    // Initialize logging; RUST_LOG overrides the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Starting rPPG attendance kiosk");
    info!("Configuration loaded");

    let kiosk = if config.demo.seed_records {
        KioskState::with_demo_records()
    } else {
        KioskState::new()
    }
    .into_shared();

    // Create the message broker
    let message_broker = create_message_broker(messaging::broker::DEFAULT_CAPACITY);
    let events = KioskEvents::new(message_broker.clone());
    info!("Message broker initialized");

    let backend = create_backend(&config.capture)?;
    let camera = CameraManager::new(backend, CaptureRequest::from_config(&config.capture));
    let annotator = create_annotator(&config.narrative)?;

    let terminal = ScanTerminal::new(
        camera,
        kiosk.clone(),
        events.clone(),
        Arc::new(SyntheticVitalsGenerator::new()),
        annotator,
        Arc::new(DemoIdentityResolver::new(config.scan.demo_employee_id.clone())),
        ScanSettings::from_config(&config.scan, &config.narrative),
    );

    // Publish system startup event
    if let Err(e) = message_broker
        .publish(
            messaging::EventType::SystemStartup,
            None,
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        )
        .await
    {
        warn!("Failed to publish system startup event: {}", e);
    }

    // Audit trail of committed attendance records
    message_broker
        .subscribe(
            messaging::EventType::RecordAppended,
            Arc::new(|event: messaging::EventMessage| {
                info!(
                    "Attendance recorded: {} ({}) {}",
                    event.payload["employeeName"].as_str().unwrap_or("unknown"),
                    event.payload["employeeId"].as_str().unwrap_or("-"),
                    event.payload["status"].as_str().unwrap_or("-")
                );
                Ok(())
            }),
        )
        .await?;

    // The kiosk starts on the terminal view, which holds the camera
    if let Err(e) = terminal.sync_with_view().await {
        warn!("Terminal started without camera: {}", e);
    }

    let http_server = RestApi::new(
        &config.api,
        AppState {
            kiosk,
            terminal: terminal.clone(),
            events,
        },
    )?;

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!("API server stopped: {}", e);
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down...");
        }
    }

    // Release the camera on every exit path
    if terminal.close().await {
        info!("Camera released");
    }

    // Publish a system shutdown event
    if let Err(e) = message_broker
        .publish(
            messaging::EventType::SystemShutdown,
            None,
            serde_json::json!({"reason": "Normal shutdown"}),
        )
        .await
    {
        error!("Failed to publish shutdown event: {}", e);
    }

    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_app()) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
