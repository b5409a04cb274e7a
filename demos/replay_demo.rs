//! Demonstration of the Slouchguard decision core on replayed samples.
//!
//! This example shows how to:
//! 1. Calibrate a camera detector from four corner samples
//! 2. Stream scripted head-height observations through classification
//! 3. Drive the state machine and watch slouch/recovery transitions
//!
//! Run with: cargo run --example replay_demo

use chrono::{Duration, Utc};
use slouchguard::analytics::AnalyticsLog;
use slouchguard::config::PostureConfig;
use slouchguard::core::{
    calibration::reduce_camera_samples, compute_config_key, AppStateMachine, Effect,
};
use slouchguard::detector::{CameraDetector, CameraObservation, Detector, TrackingSource};

fn main() {
    println!("Slouchguard - Replay Demo");
    println!("=========================");
    println!();

    let config = PostureConfig {
        frame_threshold: 3,
        good_frame_threshold: 2,
        onset_delay_ms: 0,
        intensity_exponent: 2.0,
        dead_zone: 0.1,
    };

    let mut camera = CameraDetector::new("demo-camera");
    camera.set_available(true);
    camera.set_dead_zone(config.dead_zone);
    camera.start().expect("Failed to start camera detector");

    let analytics = AnalyticsLog::new();
    let mut machine = AppStateMachine::new(config, TrackingSource::Camera, false);
    machine.enable(true);
    println!("Enabled -> {:?}", machine.state());

    // Calibrate from four corner samples.
    machine.begin_calibration(true);
    let corner_samples = [0.62, 0.70, 0.55, 0.63];
    let calibration = reduce_camera_samples(&corner_samples).expect("Calibration failed");
    println!(
        "Calibrated: neutral={:.2} range={:.2}",
        calibration.neutral_y, calibration.range
    );

    let key = compute_config_key(&["demo-display".to_string()]);
    let effects = machine.complete_camera_calibration(
        calibration,
        key,
        camera.device_id().to_string(),
        Utc::now(),
    );
    for effect in &effects {
        if let Effect::SaveProfile { record, .. } = effect {
            camera.set_calibration(Some(record.calibration));
            analytics.record_calibration_completed();
        }
    }
    println!("Calibration complete -> {:?}", machine.state());
    println!();

    // Scripted replay: upright, slow droop into a slouch, recovery, and a
    // stretch where the user leaves the frame.
    let script: &[Option<f64>] = &[
        Some(0.63),
        Some(0.62),
        Some(0.61),
        Some(0.50),
        Some(0.47),
        Some(0.45),
        Some(0.44),
        Some(0.46),
        Some(0.62),
        Some(0.63),
        None,
        None,
        Some(0.62),
    ];

    let ingress = camera.sample_ingress();
    for (i, head_y) in script.iter().enumerate() {
        ingress
            .send(CameraObservation { head_y: *head_y })
            .expect("Ingress closed");

        let now = Utc::now();
        for event in camera.poll_events(now) {
            let effects = match event {
                slouchguard::detector::DetectorEvent::Reading(reading) => {
                    machine.handle_reading(&reading, Duration::milliseconds(100), now)
                }
                slouchguard::detector::DetectorEvent::Presence { is_away } => {
                    machine.handle_away_change(is_away)
                }
                slouchguard::detector::DetectorEvent::Connectivity(_) => Vec::new(),
            };

            for effect in effects {
                match effect {
                    Effect::RecordSlouchEvent => {
                        analytics.record_slouch_event();
                        println!("  [frame {i:2}] slouching episode started");
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
                    Effect::UpdateUi => {
                        let ui = machine.ui_state(true);
                        println!("  [frame {i:2}] {}", ui.status_text);
                    }
                    _ => {}
                }
            }
        }
    }

    println!();
    println!("{}", analytics.summary());
    println!();
    println!("Demo complete!");
}
