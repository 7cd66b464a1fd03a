//! Scan terminal: camera lifecycle, single-flight scan pipeline, and the
//! status the terminal view renders.

use crate::config::{NarrativeConfig, ScanConfig};
use crate::db::models::record_models::{AttendanceRecord, THRESHOLDS};
use crate::error::Error;
use crate::messaging::KioskEvents;
use crate::services::camera_manager::{CameraManager, CapturedFrame};
use crate::services::classifier::classify;
use crate::services::narrative::{resolve_narrative, NarrativeAnnotator};
use crate::services::vitals::VitalsSource;
use crate::state::{SharedKioskState, ViewState};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Gate allowing at most one scan at a time
#[derive(Debug, Default)]
pub struct ScanCoordinator {
    scanning: Arc<AtomicBool>,
}

impl ScanCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the scan slot, or `None` while a scan is in progress
    pub fn try_begin(&self) -> Option<ScanPermit> {
        self.scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanPermit {
                scanning: self.scanning.clone(),
            })
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }
}

/// Held for the whole pipeline; dropping it frees the slot on every path
#[derive(Debug)]
pub struct ScanPermit {
    scanning: Arc<AtomicBool>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.scanning.store(false, Ordering::Release);
    }
}

/// Decides who is in front of the camera
pub trait IdentityResolver: Send + Sync {
    /// Employee id for the captured frame, `None` when nobody is recognised
    fn identify(&self, frame: Option<&CapturedFrame>) -> Option<String>;
}

/// Placeholder resolver: every scan belongs to one configured employee.
/// Stands in for face recognition, which is not implemented.
#[derive(Debug, Clone)]
pub struct DemoIdentityResolver {
    employee_id: String,
}

impl DemoIdentityResolver {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
        }
    }
}

impl IdentityResolver for DemoIdentityResolver {
    fn identify(&self, _frame: Option<&CapturedFrame>) -> Option<String> {
        Some(self.employee_id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub capture_delay: Duration,
    pub result_display: Duration,
    pub narrative_timeout: Duration,
}

impl ScanSettings {
    pub fn from_config(scan: &ScanConfig, narrative: &NarrativeConfig) -> Self {
        Self {
            capture_delay: Duration::from_millis(scan.capture_delay_ms),
            result_display: Duration::from_millis(scan.result_display_ms),
            narrative_timeout: Duration::from_millis(narrative.timeout_ms),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default(), &NarrativeConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalPhase {
    Closed,
    Initializing,
    Ready,
    PermissionDenied,
    Unavailable { reason: String },
    Scanning,
    Completed { record: AttendanceRecord },
}

impl TerminalPhase {
    pub fn feedback(&self) -> String {
        match self {
            TerminalPhase::Closed => "Camera is off".to_string(),
            TerminalPhase::Initializing => "Initializing camera...".to_string(),
            TerminalPhase::Ready => "Align your face within the frame".to_string(),
            TerminalPhase::PermissionDenied => "Camera access denied".to_string(),
            TerminalPhase::Unavailable { reason } => format!("Camera unavailable: {}", reason),
            TerminalPhase::Scanning => "Keep still. Analyzing vital signs...".to_string(),
            TerminalPhase::Completed { record } => {
                format!("Welcome, {}. Scan Complete.", record.employee_name)
            }
        }
    }
}

/// Snapshot of the terminal for the view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalStatus {
    #[serde(flatten)]
    pub phase: TerminalPhase,
    pub feedback: String,
    /// 0-100 while scanning
    pub progress: u8,
    pub camera_active: bool,
    pub scanning: bool,
}

/// Result of a scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Started,
    AlreadyScanning,
    CaptureInactive,
    /// The previous result is still on screen
    ResultShowing,
}

struct PhaseState {
    phase: TerminalPhase,
    scan_started: Option<Instant>,
}

pub struct ScanTerminal {
    camera: Mutex<CameraManager>,
    coordinator: ScanCoordinator,
    phase: RwLock<PhaseState>,
    /// Bumped on every phase change so delayed resets don't clobber newer state
    generation: AtomicU64,
    kiosk: SharedKioskState,
    events: KioskEvents,
    vitals: Arc<dyn VitalsSource>,
    annotator: Arc<dyn NarrativeAnnotator>,
    identity: Arc<dyn IdentityResolver>,
    settings: ScanSettings,
}

impl ScanTerminal {
    pub fn new(
        camera: CameraManager,
        kiosk: SharedKioskState,
        events: KioskEvents,
        vitals: Arc<dyn VitalsSource>,
        annotator: Arc<dyn NarrativeAnnotator>,
        identity: Arc<dyn IdentityResolver>,
        settings: ScanSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            camera: Mutex::new(camera),
            coordinator: ScanCoordinator::new(),
            phase: RwLock::new(PhaseState {
                phase: TerminalPhase::Closed,
                scan_started: None,
            }),
            generation: AtomicU64::new(0),
            kiosk,
            events,
            vitals,
            annotator,
            identity,
            settings,
        })
    }

    async fn set_phase(&self, phase: TerminalPhase) -> u64 {
        let mut state = self.phase.write().await;
        state.scan_started = match phase {
            TerminalPhase::Scanning => Some(Instant::now()),
            _ => None,
        };
        debug!("Terminal phase: {}", phase.feedback());
        state.phase = phase;
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Acquire the camera for the terminal view. The device open runs on the
    /// blocking pool so status reads never wait behind it.
    pub async fn open(&self) -> Result<TerminalStatus, Error> {
        let pending = {
            let camera = self.camera.lock().await;
            if camera.is_active() {
                None
            } else {
                Some(camera.begin_open())
            }
        };
        let pending = match pending {
            Some(pending) => pending,
            None => return Ok(self.status().await),
        };

        self.set_phase(TerminalPhase::Initializing).await;

        let result = match tokio::task::spawn_blocking(move || pending.open()).await {
            Ok(Ok(opened)) => self.camera.lock().await.finish_open(opened),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(Error::Internal(format!("Capture open task failed: {}", e))),
        };

        match result {
            Ok(handle_id) => {
                self.set_phase(TerminalPhase::Ready).await;
                self.events.capture_acquired(handle_id).await;
                Ok(self.status().await)
            }
            Err(e) => {
                let phase = match &e {
                    Error::Conflict(_) => TerminalPhase::Closed,
                    Error::PermissionDenied(_) => TerminalPhase::PermissionDenied,
                    Error::DeviceUnavailable(reason) => TerminalPhase::Unavailable {
                        reason: reason.clone(),
                    },
                    other => TerminalPhase::Unavailable {
                        reason: other.to_string(),
                    },
                };
                self.set_phase(phase).await;
                self.events.capture_failed(&e).await;
                Err(e)
            }
        }
    }

    async fn terminal_visible(&self) -> bool {
        self.kiosk.read().await.view() == ViewState::Terminal
    }

    /// Hold the camera exactly while the kiosk shows the terminal. The view
    /// is checked again after opening, so a navigation that lands while the
    /// device initializes still releases it.
    pub async fn sync_with_view(&self) -> Result<(), Error> {
        if !self.terminal_visible().await {
            self.close().await;
            return Ok(());
        }

        let result = self.open().await.map(|_| ());
        if !self.terminal_visible().await {
            self.close().await;
        }
        result
    }

    /// Release the camera. Safe to call whether or not it is open.
    pub async fn close(&self) -> bool {
        let released = self.camera.lock().await.release();
        self.set_phase(TerminalPhase::Closed).await;
        if released {
            self.events.capture_released().await;
        }
        released
    }

    pub async fn is_camera_active(&self) -> bool {
        self.camera.lock().await.is_active()
    }

    pub async fn status(&self) -> TerminalStatus {
        let camera_active = self.is_camera_active().await;
        let state = self.phase.read().await;

        let progress = match (&state.phase, state.scan_started) {
            (TerminalPhase::Scanning, Some(started)) => {
                let delay = self.settings.capture_delay.as_millis().max(1);
                (started.elapsed().as_millis() * 100 / delay).min(100) as u8
            }
            (TerminalPhase::Completed { .. }, _) => 100,
            _ => 0,
        };

        TerminalStatus {
            feedback: state.phase.feedback(),
            phase: state.phase.clone(),
            progress,
            camera_active,
            scanning: self.coordinator.is_scanning(),
        }
    }

    /// Start a scan unless one is running, the camera is off, or the last
    /// result is still displayed. The pipeline runs in the background;
    /// ignored requests change nothing.
    pub async fn request_scan(self: &Arc<Self>) -> ScanOutcome {
        let permit = match self.coordinator.try_begin() {
            Some(permit) => permit,
            None => {
                debug!("Scan request ignored, scan already in progress");
                self.events.scan_ignored("already scanning").await;
                return ScanOutcome::AlreadyScanning;
            }
        };

        if !self.is_camera_active().await {
            drop(permit);
            warn!("Scan request ignored, camera is not active");
            self.events.scan_ignored("capture inactive").await;
            return ScanOutcome::CaptureInactive;
        }

        if matches!(self.phase.read().await.phase, TerminalPhase::Completed { .. }) {
            drop(permit);
            debug!("Scan request ignored, result still displayed");
            self.events.scan_ignored("result showing").await;
            return ScanOutcome::ResultShowing;
        }

        self.set_phase(TerminalPhase::Scanning).await;
        self.events.scan_started().await;
        info!("Scan started");

        let terminal = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = permit;
            terminal.finish_scan().await;
        });

        ScanOutcome::Started
    }

    async fn finish_scan(self: &Arc<Self>) {
        match self.run_pipeline().await {
            Ok(record) => {
                info!(
                    "Scan completed for {} ({}), status {}",
                    record.employee_name, record.employee_id, record.status
                );
                self.events.scan_completed(&record).await;
                let generation = self.set_phase(TerminalPhase::Completed { record }).await;
                self.schedule_ready(generation);
            }
            Err(e) => {
                error!("Scan failed: {}", e);
                self.events.scan_failed(&e).await;
                self.restore_idle_phase().await;
            }
        }
    }

    /// Return to Ready after the result has been on screen long enough
    fn schedule_ready(self: &Arc<Self>, generation: u64) {
        let terminal = Arc::clone(self);
        let display = self.settings.result_display;
        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            if terminal.generation.load(Ordering::Acquire) == generation {
                terminal.restore_idle_phase().await;
            }
        });
    }

    async fn restore_idle_phase(&self) {
        let phase = if self.is_camera_active().await {
            TerminalPhase::Ready
        } else {
            TerminalPhase::Closed
        };
        self.set_phase(phase).await;
    }

    /// Capture, measure, annotate, then commit. Nothing is stored unless
    /// every step before the commit succeeds.
    async fn run_pipeline(&self) -> Result<AttendanceRecord, Error> {
        tokio::time::sleep(self.settings.capture_delay).await;

        let frame = match self.camera.lock().await.snapshot() {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("No frame captured: {}", e);
                None
            }
        };

        let employee_id = self
            .identity
            .identify(frame.as_ref())
            .ok_or_else(|| Error::NotFound("No employee recognised".to_string()))?;

        let employee = self
            .kiosk
            .read()
            .await
            .employee(&employee_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Unknown employee: {}", employee_id)))?;

        let reading = self.vitals.generate_reading();
        let status = classify(&reading, &THRESHOLDS);
        let narrative = resolve_narrative(
            self.annotator.as_ref(),
            &reading,
            &employee.name,
            self.settings.narrative_timeout,
        )
        .await;

        let photo_url = frame.map(|f| f.to_data_url()).unwrap_or_default();
        let record = AttendanceRecord::new(&employee, photo_url, reading, status, Some(narrative));

        self.kiosk.write().await.append_record(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptureConfig;
    use crate::db::models::record_models::{HealthStatus, VitalsReading};
    use crate::messaging::broker::create_message_broker;
    use crate::services::camera_manager::{
        CaptureBackend, CaptureRequest, CaptureStream, TestPatternBackend,
    };
    use crate::services::narrative::{UnconfiguredAnnotator, TIMED_OUT_TEXT, UNAVAILABLE_TEXT};
    use crate::services::vitals::FixedVitalsSource;
    use crate::state::KioskState;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    const RISKY: VitalsReading = VitalsReading {
        heart_rate: 112,
        respiration_rate: 16,
        spo2: 97,
        blood_pressure_sys: 130,
        blood_pressure_dia: 85,
        stress_level: 60,
    };

    struct DeniedBackend;

    impl CaptureBackend for DeniedBackend {
        fn name(&self) -> &'static str {
            "denied"
        }

        fn open(&self, _request: &CaptureRequest) -> Result<Box<dyn CaptureStream>, Error> {
            Err(Error::PermissionDenied("NotAllowedError".to_string()))
        }
    }

    /// Annotator that answers after a fixed delay
    struct SlowAnnotator(Duration);

    #[async_trait]
    impl NarrativeAnnotator for SlowAnnotator {
        async fn annotate(&self, _reading: &VitalsReading, _employee_name: &str) -> Result<String, Error> {
            tokio::time::sleep(self.0).await;
            Ok("Elevated heart rate noted.".to_string())
        }
    }

    /// Navigates away from the terminal while the device is opening
    struct NavigatingBackend {
        kiosk: SharedKioskState,
        closed: Arc<AtomicUsize>,
    }

    struct NavigatingStream {
        closed: Arc<AtomicUsize>,
        open: bool,
    }

    impl CaptureStream for NavigatingStream {
        fn snapshot(&mut self) -> Result<CapturedFrame, Error> {
            Err(Error::Capture("no frames".to_string()))
        }

        fn close(&mut self) {
            if self.open {
                self.open = false;
                self.closed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl CaptureBackend for NavigatingBackend {
        fn name(&self) -> &'static str {
            "navigating"
        }

        fn open(&self, _request: &CaptureRequest) -> Result<Box<dyn CaptureStream>, Error> {
            self.kiosk.blocking_write().navigate(ViewState::Manager);
            Ok(Box::new(NavigatingStream {
                closed: self.closed.clone(),
                open: true,
            }))
        }
    }

    fn build_terminal(
        kiosk: SharedKioskState,
        backend: Arc<dyn CaptureBackend>,
        annotator: Arc<dyn NarrativeAnnotator>,
        employee_id: &str,
    ) -> Arc<ScanTerminal> {
        let camera = CameraManager::new(backend, CaptureRequest::from_config(&CaptureConfig::default()));
        ScanTerminal::new(
            camera,
            kiosk,
            KioskEvents::new(create_message_broker(16)),
            Arc::new(FixedVitalsSource(RISKY)),
            annotator,
            Arc::new(DemoIdentityResolver::new(employee_id)),
            ScanSettings::default(),
        )
    }

    fn terminal_with(backend: Arc<dyn CaptureBackend>, employee_id: &str) -> (Arc<ScanTerminal>, SharedKioskState) {
        let kiosk = KioskState::new().into_shared();
        let terminal = build_terminal(kiosk.clone(), backend, Arc::new(UnconfiguredAnnotator), employee_id);
        (terminal, kiosk)
    }

    fn terminal_annotated_by(annotator: Arc<dyn NarrativeAnnotator>) -> (Arc<ScanTerminal>, SharedKioskState) {
        let kiosk = KioskState::new().into_shared();
        let terminal = build_terminal(kiosk.clone(), Arc::new(TestPatternBackend), annotator, "E001");
        (terminal, kiosk)
    }

    fn terminal() -> (Arc<ScanTerminal>, SharedKioskState) {
        terminal_with(Arc::new(TestPatternBackend), "E001")
    }

    #[test]
    fn test_coordinator_single_slot() {
        let coordinator = ScanCoordinator::new();
        let permit = coordinator.try_begin().unwrap();
        assert!(coordinator.is_scanning());
        assert!(coordinator.try_begin().is_none());
        drop(permit);
        assert!(!coordinator.is_scanning());
        assert!(coordinator.try_begin().is_some());
    }

    #[test]
    fn test_demo_identity_ignores_frame() {
        let resolver = DemoIdentityResolver::new("E004");
        assert_eq!(resolver.identify(None).as_deref(), Some("E004"));
    }

    #[test]
    fn test_feedback_texts() {
        assert_eq!(TerminalPhase::Initializing.feedback(), "Initializing camera...");
        assert_eq!(TerminalPhase::Ready.feedback(), "Align your face within the frame");
        assert_eq!(TerminalPhase::PermissionDenied.feedback(), "Camera access denied");
        assert_eq!(
            TerminalPhase::Unavailable {
                reason: "busy".to_string()
            }
            .feedback(),
            "Camera unavailable: busy"
        );
        assert_eq!(TerminalPhase::Scanning.feedback(), "Keep still. Analyzing vital signs...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_requires_open_camera() {
        let (terminal, kiosk) = terminal();
        assert_eq!(terminal.request_scan().await, ScanOutcome::CaptureInactive);
        assert!(!terminal.coordinator.is_scanning());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(kiosk.read().await.record_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_while_scanning_is_ignored() {
        let (terminal, kiosk) = terminal();
        terminal.open().await.unwrap();

        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);
        assert_eq!(terminal.request_scan().await, ScanOutcome::AlreadyScanning);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(terminal.request_scan().await, ScanOutcome::AlreadyScanning);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = kiosk.read().await;
        assert_eq!(state.record_count(), 1);

        let record = &state.all_records()[0];
        assert_eq!(record.employee_id, "E001");
        assert_eq!(record.employee_name, "Tony Stark");
        assert_eq!(record.status, HealthStatus::Risk);
        assert_eq!(record.ai_analysis.as_deref(), Some(UNAVAILABLE_TEXT));
        assert!(record.photo_url.starts_with("data:image/svg+xml;base64,"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_through_a_scan() {
        let (terminal, _kiosk) = terminal();
        assert_eq!(terminal.status().await.phase, TerminalPhase::Closed);

        let status = terminal.open().await.unwrap();
        assert_eq!(status.phase, TerminalPhase::Ready);
        assert!(status.camera_active);

        terminal.request_scan().await;
        tokio::time::sleep(Duration::from_millis(1250)).await;
        let status = terminal.status().await;
        assert_eq!(status.phase, TerminalPhase::Scanning);
        assert!(status.scanning);
        assert!((45..=55).contains(&status.progress));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let status = terminal.status().await;
        assert!(matches!(status.phase, TerminalPhase::Completed { .. }));
        assert_eq!(status.feedback, "Welcome, Tony Stark. Scan Complete.");
        assert_eq!(status.progress, 100);
        assert!(!status.scanning);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(terminal.status().await.phase, TerminalPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_new_scan_while_result_is_shown() {
        let (terminal, kiosk) = terminal();
        terminal.open().await.unwrap();
        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(terminal.request_scan().await, ScanOutcome::ResultShowing);
        assert!(!terminal.coordinator.is_scanning());
        assert!(matches!(terminal.status().await.phase, TerminalPhase::Completed { .. }));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(terminal.status().await.phase, TerminalPhase::Ready);
        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(kiosk.read().await.record_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_waits_for_narrative() {
        let (terminal, kiosk) = terminal_annotated_by(Arc::new(SlowAnnotator(Duration::from_secs(4))));
        terminal.open().await.unwrap();
        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);

        // Capture done at 2.5s, annotation pending until 6.5s
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(kiosk.read().await.record_count(), 0);
        let status = terminal.status().await;
        assert_eq!(status.phase, TerminalPhase::Scanning);
        assert!(status.scanning);
        assert_eq!(terminal.request_scan().await, ScanOutcome::AlreadyScanning);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = kiosk.read().await;
        assert_eq!(state.record_count(), 1);
        assert_eq!(
            state.all_records()[0].ai_analysis.as_deref(),
            Some("Elevated heart rate noted.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_narrative_commits_timeout_text() {
        let (terminal, kiosk) = terminal_annotated_by(Arc::new(SlowAnnotator(Duration::from_secs(3600))));
        terminal.open().await.unwrap();
        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);

        // 2.5s capture delay plus the 10s narrative bound
        tokio::time::sleep(Duration::from_millis(12_000)).await;
        assert_eq!(kiosk.read().await.record_count(), 0);
        assert!(terminal.coordinator.is_scanning());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let state = kiosk.read().await;
        assert_eq!(state.record_count(), 1);
        assert_eq!(state.all_records()[0].ai_analysis.as_deref(), Some(TIMED_OUT_TEXT));
        drop(state);
        assert!(!terminal.coordinator.is_scanning());
    }

    #[tokio::test]
    async fn test_navigation_during_open_releases_camera() {
        let kiosk = KioskState::new().into_shared();
        let closed = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(NavigatingBackend {
            kiosk: kiosk.clone(),
            closed: closed.clone(),
        });
        let terminal = build_terminal(kiosk.clone(), backend, Arc::new(UnconfiguredAnnotator), "E001");
        assert_eq!(kiosk.read().await.view(), ViewState::Terminal);

        terminal.sync_with_view().await.unwrap();

        assert_eq!(kiosk.read().await.view(), ViewState::Manager);
        assert!(!terminal.is_camera_active().await);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(terminal.status().await.phase, TerminalPhase::Closed);
    }

    #[tokio::test]
    async fn test_sync_with_view_follows_navigation() {
        let (terminal, kiosk) = terminal();
        terminal.sync_with_view().await.unwrap();
        assert!(terminal.is_camera_active().await);

        kiosk.write().await.navigate(ViewState::Employee);
        terminal.sync_with_view().await.unwrap();
        assert!(!terminal.is_camera_active().await);
        assert_eq!(terminal.status().await.phase, TerminalPhase::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_denied() {
        let (terminal, _kiosk) = terminal_with(Arc::new(DeniedBackend), "E001");
        let err = terminal.open().await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        let status = terminal.status().await;
        assert_eq!(status.phase, TerminalPhase::PermissionDenied);
        assert_eq!(status.feedback, "Camera access denied");
        assert!(!status.camera_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_runs_to_completion_after_close() {
        let (terminal, kiosk) = terminal();
        terminal.open().await.unwrap();
        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);

        assert!(terminal.close().await);
        assert!(!terminal.close().await);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let state = kiosk.read().await;
        assert_eq!(state.record_count(), 1);
        assert!(state.all_records()[0].photo_url.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_identity_commits_nothing() {
        let (terminal, kiosk) = terminal_with(Arc::new(TestPatternBackend), "E999");
        terminal.open().await.unwrap();
        assert_eq!(terminal.request_scan().await, ScanOutcome::Started);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(kiosk.read().await.record_count(), 0);
        assert!(!terminal.coordinator.is_scanning());
        assert_eq!(terminal.status().await.phase, TerminalPhase::Ready);
    }
}
