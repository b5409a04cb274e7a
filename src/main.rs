//! Slouchguard CLI
//!
//! Posture monitoring agent: judges posture from noisy sensor input and
//! drives a small set of application states.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use slouchguard::{
    analytics::create_shared_log_with_persistence,
    config::Settings,
    core::{
        calibration::CalibrationSession,
        compute_config_key,
        events::{AppEvent, Debouncer, ReadingThrottle, UserCommand, RECONFIGURE_DEBOUNCE_WINDOW},
        machine::state_when_enabling,
        resolver,
        state::{AlertKind, Effect},
        AppStateMachine,
    },
    detector::{
        types::{Attitude, DetectorEvent},
        CameraDetector, Detector, MotionDetector, TrackingSource,
    },
    profile::ProfileStore,
    VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "slouchguard")]
#[command(version = VERSION)]
#[command(about = "Posture monitoring agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the monitoring agent
    Start {
        /// Tracking source to use (camera or headset)
        #[arg(long)]
        source: Option<String>,
    },

    /// Pause posture monitoring
    Pause,

    /// Resume posture monitoring
    Resume,

    /// Show current status and cumulative statistics
    Status,

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { source } => cmd_start(source.as_deref()),
        Commands::Pause => cmd_pause(),
        Commands::Resume => cmd_resume(),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

/// Calibration session for whichever source is active.
enum ActiveSession {
    Camera(CalibrationSession<f64>),
    Motion(CalibrationSession<Attitude>),
}

fn default_camera_id() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    format!("builtin-camera@{host}")
}

/// The display collaborator reports the built-in panel with this prefix.
fn is_laptop_only(displays: &[String]) -> bool {
    displays.len() == 1 && displays[0].starts_with("builtin")
}

fn parse_source(value: &str) -> Option<TrackingSource> {
    match value {
        "camera" => Some(TrackingSource::Camera),
        "headset" | "motion" | "motion_headset" => Some(TrackingSource::MotionHeadset),
        _ => None,
    }
}

fn cmd_start(source_override: Option<&str>) -> Result<()> {
    let mut settings = Settings::load().unwrap_or_default();
    settings.ensure_directories()?;

    if let Some(value) = source_override {
        match parse_source(value) {
            Some(source) => settings.tracking_source = source,
            None => anyhow::bail!("unknown tracking source: {value}"),
        }
    }

    tracing::info!("Slouchguard v{VERSION}");
    tracing::info!("Tracking source: {}", settings.tracking_source);

    let analytics =
        create_shared_log_with_persistence(settings.data_path.join("analytics.json"));
    let mut store = ProfileStore::load(settings.data_path.join("profiles.json"))
        .map_err(|e| anyhow::anyhow!("could not load profile store: {e}"))?;

    let mut camera = CameraDetector::new(
        settings
            .selected_device
            .clone()
            .unwrap_or_else(default_camera_id),
    );
    camera.set_dead_zone(settings.posture.dead_zone);
    let mut motion = MotionDetector::new("motion-headset");
    motion.set_dead_zone(settings.posture.dead_zone);
    motion.set_calibration(settings.motion_calibration);

    let source_calibrated = match settings.tracking_source {
        TrackingSource::Camera => false, // until a profile resolves
        TrackingSource::MotionHeadset => settings.motion_calibration.is_some(),
    };
    let mut machine = AppStateMachine::new(
        settings.posture,
        settings.tracking_source,
        source_calibrated,
    );

    // Event channel: platform producers (capture threads, display and
    // hot-plug watchers, hotkeys) push onto it; this thread is the only
    // consumer, so all state mutation stays serialized. The sender half is
    // the handle platform integrations clone.
    let (_platform_events, event_rx) = crossbeam_channel::bounded::<AppEvent>(1_024);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    // Roster of camera devices and the current display arrangement, as
    // reported by hot-plug / display events.
    let mut devices: Vec<String> = Vec::new();
    let mut displays: Vec<String> = Vec::new();
    let mut selected = settings.selected_device.clone();

    let mut session: Option<ActiveSession> = None;
    let mut throttle = ReadingThrottle::default();
    let mut reconfigure: Debouncer<()> = Debouncer::new(RECONFIGURE_DEBOUNCE_WINDOW);
    let mut last_intensity = 0.0_f64;

    let mut paused = settings.paused;
    let mut last_settings_check = Instant::now();
    let mut last_flush = Instant::now();

    if paused {
        tracing::info!("Monitoring is currently paused. Run `slouchguard resume` to start.");
    } else if settings.enabled {
        let effects = machine.enable(device_available(&machine, &camera, &motion));
        run_effects(
            effects,
            &mut machine,
            &mut camera,
            &mut motion,
            &mut store,
            &analytics,
            &mut last_intensity,
        );
    }

    tracing::info!("Press Ctrl+C to stop");

    while running.load(Ordering::SeqCst) {
        // Periodically reload settings so `slouchguard pause/resume` can
        // control a running agent.
        if last_settings_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Settings::load() {
                if cfg.paused != paused {
                    paused = cfg.paused;
                    let effects = if paused {
                        tracing::info!("Pausing monitoring...");
                        machine.disable()
                    } else {
                        tracing::info!("Resuming monitoring...");
                        machine.enable(device_available(&machine, &camera, &motion))
                    };
                    run_effects(
                        effects,
                        &mut machine,
                        &mut camera,
                        &mut motion,
                        &mut store,
                        &analytics,
                        &mut last_intensity,
                    );
                }
            }
            last_settings_check = Instant::now();
        }

        // Drain control events with a timeout so detector polling and
        // deadline checks keep running.
        match event_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                handle_app_event(
                    event,
                    &mut machine,
                    &mut camera,
                    &mut motion,
                    &mut store,
                    &mut settings,
                    &mut devices,
                    &mut displays,
                    &mut selected,
                    &mut session,
                    &mut reconfigure,
                    &mut throttle,
                    &analytics,
                    &mut last_intensity,
                );
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::error!("Event channel disconnected unexpectedly");
                break;
            }
        }

        // Classified detector events.
        let now = Utc::now();
        let mut detector_events = camera.poll_events(now);
        detector_events.extend(motion.poll_events(now));
        for event in detector_events {
            handle_detector_event(
                event,
                &mut machine,
                &mut camera,
                &mut motion,
                &mut store,
                &mut session,
                &mut throttle,
                &analytics,
                &mut last_intensity,
            );
        }

        // Settled display/hot-plug reconciliation.
        if reconfigure.poll(Instant::now()).is_some() {
            reconcile_configuration(
                &mut machine,
                &mut camera,
                &mut motion,
                &mut store,
                &settings,
                &devices,
                &displays,
                &mut selected,
                &analytics,
                &mut last_intensity,
            );
        }

        // Idle flush: only writes when something changed.
        if last_flush.elapsed() >= Duration::from_secs(30) {
            if let Err(e) = store.flush_if_dirty() {
                tracing::warn!("Could not flush profile store: {e}");
            }
            if let Err(e) = analytics.save() {
                tracing::warn!("Could not save analytics: {e}");
            }
            last_flush = Instant::now();
        }
    }

    tracing::info!("Stopping...");
    camera.stop();
    motion.stop();

    settings.selected_device = selected;
    if let Err(e) = settings.save() {
        tracing::warn!("Could not save settings: {e}");
    }
    if let Err(e) = store.flush_if_dirty() {
        tracing::warn!("Could not flush profile store: {e}");
    }
    if let Err(e) = analytics.save() {
        tracing::warn!("Could not save analytics: {e}");
    }

    println!();
    println!("{}", analytics.summary());
    Ok(())
}

/// Whether the active source's device is present.
fn device_available(
    machine: &AppStateMachine,
    camera: &CameraDetector,
    motion: &MotionDetector,
) -> bool {
    match machine.tracking_source() {
        TrackingSource::Camera => camera.is_available(),
        TrackingSource::MotionHeadset => motion.is_available(),
    }
}

/// Execute the effects a state transition requested.
fn run_effects(
    effects: Vec<Effect>,
    machine: &mut AppStateMachine,
    camera: &mut CameraDetector,
    motion: &mut MotionDetector,
    store: &mut ProfileStore,
    analytics: &slouchguard::SharedAnalyticsLog,
    last_intensity: &mut f64,
) {
    for effect in effects {
        match effect {
            Effect::SyncDetectors {
                run_camera,
                run_motion,
            } => {
                // Stop the losing side before starting the other: the two
                // sensor subsystems must never run concurrently.
                if !run_camera && camera.is_running() {
                    camera.stop();
                }
                if !run_motion && motion.is_running() {
                    motion.stop();
                }
                let start_result = if run_camera && !camera.is_running() {
                    Some(camera.start())
                } else if run_motion && !motion.is_running() {
                    Some(motion.start())
                } else {
                    None
                };
                if let Some(Err(e)) = start_result {
                    tracing::warn!("Detector start failed: {e}");
                    let followup = match e {
                        slouchguard::detector::DetectorError::PermissionDenied(_) => {
                            machine.permission_denied()
                        }
                        _ => machine.detector_start_failed(),
                    };
                    run_effects(
                        followup,
                        machine,
                        camera,
                        motion,
                        store,
                        analytics,
                        last_intensity,
                    );
                }
            }
            Effect::UpdateUi => {
                let ui = machine.ui_state(device_available(machine, camera, motion));
                tracing::info!("[{:?}] {}", machine.state(), ui.status_text);
            }
            Effect::UpdateWarningVisual(intensity) => {
                // Stand-in for the overlay: only chatty when it changes.
                if (intensity - *last_intensity).abs() > 0.01 {
                    tracing::debug!("Warning intensity: {intensity:.2}");
                    *last_intensity = intensity;
                }
            }
            Effect::RecordSlouchEvent => {
                analytics.record_slouch_event();
                tracing::info!("Slouching episode started");
            }
            Effect::TrackAnalytics {
                interval,
                was_slouching,
            } => {
                analytics.record_reading();
                analytics.record_interval(
                    interval.num_milliseconds().max(0) as u64,
                    was_slouching,
                );
            }
            Effect::SaveProfile { key, record } => {
                camera.set_calibration(Some(record.calibration));
                camera.set_device_id(record.device_id.clone());
                store.insert(key, record);
                analytics.record_calibration_completed();
            }
            Effect::Alert(AlertKind::PermissionDenied(source)) => {
                tracing::warn!("Sensor access for {source} was denied by the platform");
            }
        }
    }
}

/// Route a classified detector event into the machine.
#[allow(clippy::too_many_arguments)]
fn handle_detector_event(
    event: DetectorEvent,
    machine: &mut AppStateMachine,
    camera: &mut CameraDetector,
    motion: &mut MotionDetector,
    store: &mut ProfileStore,
    session: &mut Option<ActiveSession>,
    throttle: &mut ReadingThrottle,
    analytics: &slouchguard::SharedAnalyticsLog,
    last_intensity: &mut f64,
) {
    match event {
        DetectorEvent::Reading(reading) => {
            let Some(elapsed) =
                throttle.tick(Instant::now(), machine.monitoring().is_slouching)
            else {
                return;
            };
            let elapsed = chrono::Duration::from_std(elapsed)
                .unwrap_or_else(|_| chrono::Duration::milliseconds(0));
            let effects = machine.handle_reading(&reading, elapsed, reading.timestamp);
            run_effects(
                effects,
                machine,
                camera,
                motion,
                store,
                analytics,
                last_intensity,
            );
        }
        DetectorEvent::Presence { is_away } => {
            let effects = machine.handle_away_change(is_away);
            run_effects(
                effects,
                machine,
                camera,
                motion,
                store,
                analytics,
                last_intensity,
            );
        }
        DetectorEvent::Connectivity(connected) => {
            if let Some(ActiveSession::Motion(s)) = session.as_mut() {
                s.device_connectivity_changed(connected);
            }
            let effects = machine.handle_motion_connectivity(connected);
            run_effects(
                effects,
                machine,
                camera,
                motion,
                store,
                analytics,
                last_intensity,
            );
        }
    }
}

/// Route a control event (commands, hot-plug, display changes).
#[allow(clippy::too_many_arguments)]
fn handle_app_event(
    event: AppEvent,
    machine: &mut AppStateMachine,
    camera: &mut CameraDetector,
    motion: &mut MotionDetector,
    store: &mut ProfileStore,
    settings: &mut Settings,
    devices: &mut Vec<String>,
    displays: &mut Vec<String>,
    selected: &mut Option<String>,
    session: &mut Option<ActiveSession>,
    reconfigure: &mut Debouncer<()>,
    throttle: &mut ReadingThrottle,
    analytics: &slouchguard::SharedAnalyticsLog,
    last_intensity: &mut f64,
) {
    match event {
        AppEvent::Reading(_, reading) => {
            // Readings normally arrive through the detector channels; this
            // path exists for replayed/injected input.
            handle_detector_event(
                DetectorEvent::Reading(reading),
                machine,
                camera,
                motion,
                store,
                session,
                throttle,
                analytics,
                last_intensity,
            );
        }
        AppEvent::Connectivity(TrackingSource::MotionHeadset, connected) => {
            handle_detector_event(
                DetectorEvent::Connectivity(connected),
                machine,
                camera,
                motion,
                store,
                session,
                throttle,
                analytics,
                last_intensity,
            );
        }
        AppEvent::Connectivity(TrackingSource::Camera, _) => {
            // Camera connectivity is a hot-plug concern.
        }
        AppEvent::Presence { is_away } => {
            let effects = machine.handle_away_change(is_away);
            run_effects(
                effects,
                machine,
                camera,
                motion,
                store,
                analytics,
                last_intensity,
            );
        }
        AppEvent::DeviceAttached(device) => {
            if !devices.contains(&device) {
                devices.push(device.clone());
            }
            let key = compute_config_key(displays);
            let outcome = resolver::on_device_connected(
                &device,
                selected.as_deref(),
                devices,
                store.get(&key),
                &machine.state(),
            );
            *selected = outcome.selected;
            camera.set_available(true);
            if let Some(ref id) = *selected {
                camera.set_device_id(id.clone());
            }
            if outcome.state.is_some() {
                reconfigure.record((), Instant::now());
            }
        }
        AppEvent::DeviceDetached(device) => {
            devices.retain(|d| d != &device);
            let key = compute_config_key(displays);
            let outcome = resolver::on_device_disconnected(
                &device,
                selected.as_deref(),
                devices,
                store.get(&key),
            );
            let state = outcome.state;
            let selection_changed = outcome.selected != *selected;
            *selected = outcome.selected;
            camera.set_available(!devices.is_empty());
            if let Some(ref id) = *selected {
                camera.set_device_id(id.clone());
            }
            if selection_changed && machine.tracking_source() == TrackingSource::Camera {
                if state == Some(slouchguard::AppState::Monitoring) {
                    // The stored profile matches the new selection.
                    if let Some(record) = store.get(&key) {
                        camera.set_calibration(Some(record.calibration));
                    }
                } else {
                    // Thresholds calibrated against the lost camera are stale.
                    camera.set_calibration(None);
                    machine.invalidate_calibration();
                }
            }
            if state.is_some() {
                reconfigure.record((), Instant::now());
            }
        }
        AppEvent::DisplayConfigurationChanged(ids) => {
            *displays = ids;
            reconfigure.record((), Instant::now());
        }
        AppEvent::ScreenLock(locked) => {
            let effects =
                machine.handle_screen_lock(locked, device_available(machine, camera, motion));
            run_effects(
                effects,
                machine,
                camera,
                motion,
                store,
                analytics,
                last_intensity,
            );
        }
        AppEvent::Command(command) => {
            handle_command(
                command,
                machine,
                camera,
                motion,
                store,
                settings,
                devices,
                displays,
                session,
                analytics,
                last_intensity,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_command(
    command: UserCommand,
    machine: &mut AppStateMachine,
    camera: &mut CameraDetector,
    motion: &mut MotionDetector,
    store: &mut ProfileStore,
    settings: &mut Settings,
    devices: &[String],
    displays: &[String],
    session: &mut Option<ActiveSession>,
    analytics: &slouchguard::SharedAnalyticsLog,
    last_intensity: &mut f64,
) {
    let effects = match command {
        UserCommand::Enable => {
            settings.enabled = true;
            machine.enable(device_available(machine, camera, motion))
        }
        UserCommand::Disable => {
            settings.enabled = false;
            *session = None;
            machine.disable()
        }
        UserCommand::SelectSource(source) => {
            settings.tracking_source = source;
            let (source_calibrated, available) = match source {
                TrackingSource::Camera => {
                    // Only a profile recorded with a present camera counts
                    // as calibrated; anything else fails closed.
                    let record = store
                        .get(&compute_config_key(displays))
                        .filter(|r| devices.contains(&r.device_id))
                        .cloned();
                    if let Some(ref record) = record {
                        camera.set_calibration(Some(record.calibration));
                        camera.set_device_id(record.device_id.clone());
                    }
                    (record.is_some(), camera.is_available())
                }
                TrackingSource::MotionHeadset => {
                    (settings.motion_calibration.is_some(), motion.is_available())
                }
            };
            machine.set_tracking_source(source, source_calibrated, available)
        }
        UserCommand::StartCalibration => {
            let available = device_available(machine, camera, motion);
            let effects = machine.begin_calibration(available);
            if !effects.is_empty() || machine.state() == slouchguard::AppState::Calibrating {
                *session = Some(match machine.tracking_source() {
                    TrackingSource::Camera => {
                        ActiveSession::Camera(CalibrationSession::new(displays, camera.is_connected()))
                    }
                    TrackingSource::MotionHeadset => ActiveSession::Motion(
                        CalibrationSession::new(displays, motion.is_connected()),
                    ),
                });
            }
            effects
        }
        UserCommand::CaptureCalibrationSample => {
            capture_calibration_sample(machine, camera, motion, settings, displays, session)
        }
        UserCommand::CancelCalibration => {
            *session = None;
            machine.cancel_calibration()
        }
    };
    run_effects(
        effects,
        machine,
        camera,
        motion,
        store,
        analytics,
        last_intensity,
    );
}

/// Capture one sample for the active session, completing it on the final
/// step. A session that cannot reduce falls back like a cancellation.
fn capture_calibration_sample(
    machine: &mut AppStateMachine,
    camera: &CameraDetector,
    motion: &MotionDetector,
    settings: &mut Settings,
    displays: &[String],
    session: &mut Option<ActiveSession>,
) -> Vec<Effect> {
    use slouchguard::core::calibration::CaptureOutcome;

    match session.as_mut() {
        None => Vec::new(),
        Some(ActiveSession::Camera(s)) => {
            let Some(sample) = camera.current_sample() else {
                tracing::warn!("No camera sample available yet");
                return Vec::new();
            };
            match s.capture_sample(sample) {
                Ok(CaptureOutcome::Advanced) => Vec::new(),
                Ok(CaptureOutcome::Complete) => {
                    let reduced = slouchguard::core::calibration::reduce_camera_samples(
                        s.samples(),
                    )
                    .filter(|c| c.is_valid());
                    *session = None;
                    match reduced {
                        Some(calibration) => machine.complete_camera_calibration(
                            calibration,
                            compute_config_key(displays),
                            camera.device_id().to_string(),
                            Utc::now(),
                        ),
                        None => machine.cancel_calibration(),
                    }
                }
                Err(e) => {
                    tracing::warn!("Sample capture refused: {e}");
                    Vec::new()
                }
            }
        }
        Some(ActiveSession::Motion(s)) => {
            let Some(sample) = motion.current_sample() else {
                tracing::warn!("No attitude sample available yet");
                return Vec::new();
            };
            match s.capture_sample(sample) {
                Ok(CaptureOutcome::Advanced) => Vec::new(),
                Ok(CaptureOutcome::Complete) => {
                    let reduced = slouchguard::core::calibration::reduce_motion_samples(
                        s.samples(),
                    )
                    .filter(|c| c.is_valid());
                    *session = None;
                    match reduced {
                        Some(calibration) => {
                            settings.motion_calibration = Some(calibration);
                            if let Err(e) = settings.save() {
                                tracing::warn!("Could not save settings: {e}");
                            }
                            machine.complete_motion_calibration(calibration)
                        }
                        None => machine.cancel_calibration(),
                    }
                }
                Err(e) => {
                    tracing::warn!("Sample capture refused: {e}");
                    Vec::new()
                }
            }
        }
    }
}

/// Apply the settled outcome of a display/hot-plug burst.
#[allow(clippy::too_many_arguments)]
fn reconcile_configuration(
    machine: &mut AppStateMachine,
    camera: &mut CameraDetector,
    motion: &mut MotionDetector,
    store: &mut ProfileStore,
    settings: &Settings,
    devices: &[String],
    displays: &[String],
    selected: &mut Option<String>,
    analytics: &slouchguard::SharedAnalyticsLog,
    last_intensity: &mut f64,
) {
    let laptop_only = is_laptop_only(displays);

    let (resolved, profile_applied) = match machine.tracking_source() {
        TrackingSource::Camera => {
            let key = compute_config_key(displays);
            let stored = store.get(&key);
            let resolved = resolver::resolve_on_configuration_change(
                stored,
                devices,
                settings.pause_on_the_go,
                laptop_only,
            );
            let applied = resolved == slouchguard::AppState::Monitoring;
            if applied {
                if let Some(record) = stored {
                    camera.set_calibration(Some(record.calibration));
                    camera.set_device_id(record.device_id.clone());
                    *selected = Some(record.device_id.clone());
                }
            }
            (resolved, applied)
        }
        TrackingSource::MotionHeadset => {
            // Headset calibration is display-independent; only the
            // on-the-go rule applies here.
            let resolved = if settings.pause_on_the_go && laptop_only {
                slouchguard::AppState::Paused(slouchguard::PauseReason::OnTheGo)
            } else {
                state_when_enabling(machine.is_calibrated(), motion.is_available())
            };
            (resolved, false)
        }
    };

    let effects = machine.apply_resolved_state(resolved, profile_applied);
    run_effects(
        effects,
        machine,
        camera,
        motion,
        store,
        analytics,
        last_intensity,
    );
}

fn cmd_pause() -> Result<()> {
    let mut settings = Settings::load().unwrap_or_default();
    settings.paused = true;
    settings
        .save()
        .map_err(|e| anyhow::anyhow!("error saving settings: {e}"))?;
    println!("Monitoring paused. Use 'slouchguard resume' to continue.");
    Ok(())
}

fn cmd_resume() -> Result<()> {
    let mut settings = Settings::load().unwrap_or_default();
    settings.paused = false;
    settings
        .save()
        .map_err(|e| anyhow::anyhow!("error saving settings: {e}"))?;
    println!("Monitoring resumed.");
    Ok(())
}

fn cmd_status() -> Result<()> {
    let settings = Settings::load().unwrap_or_default();

    println!("Slouchguard Status");
    println!("==================");
    println!();
    println!("Configuration:");
    println!("  Enabled: {}", settings.enabled);
    println!("  Paused: {}", settings.paused);
    println!("  Tracking source: {}", settings.tracking_source);
    println!(
        "  Selected device: {}",
        settings.selected_device.as_deref().unwrap_or("(none)")
    );
    println!("  Pause on the go: {}", settings.pause_on_the_go);
    println!(
        "  Headset calibrated: {}",
        settings.motion_calibration.is_some()
    );
    println!();

    // Load and show cumulative analytics if available
    let stats_path = settings.data_path.join("analytics.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(v) = stats.get("readings_processed") {
                    println!("  Readings evaluated: {v}");
                }
                if let Some(v) = stats.get("slouch_events") {
                    println!("  Slouching episodes: {v}");
                }
                if let Some(v) = stats.get("slouching_ms") {
                    println!("  Time slouching: {v} ms");
                }
                if let Some(v) = stats.get("calibrations_completed") {
                    println!("  Calibrations completed: {v}");
                }
            }
        }
    } else {
        println!("No statistics recorded yet.");
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let settings = Settings::load().unwrap_or_default();
    println!("Configuration file: {:?}", Settings::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&settings)
            .unwrap_or_else(|_| "<unserializable>".to_string())
    );
    Ok(())
}
