//! Motion-headset posture detector.
//!
//! Platform attitude callbacks push [`MotionSignal`]s through the ingress
//! channel: attitude samples while worn, plus in-ear connectivity flips.
//! Connectivity events keep flowing while the app is paused for a removed
//! headset, which is what lets re-insertion resume monitoring.

use crate::core::calibration::{reduce_motion_samples, CalibrationData, MotionCalibration};
use crate::detector::types::{Attitude, DetectorError, DetectorEvent, PostureReading};
use crate::detector::{Detector, TrackingSource};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};

/// Forward head droop at which severity saturates, in radians.
const FULL_SCALE_PITCH: f64 = 0.5;

/// Raw signal from the headset attitude pipeline.
#[derive(Debug, Clone, Copy)]
pub enum MotionSignal {
    Attitude(Attitude),
    /// The headset went into (true) or out of (false) the ear
    InEar(bool),
}

/// Classify an attitude sample against the calibrated neutral attitude.
///
/// Forward droop lowers pitch relative to neutral; the dead zone is a
/// fraction of the full-scale droop.
pub fn classify_motion_sample(
    sample: &Attitude,
    calibration: &MotionCalibration,
    dead_zone: f64,
    now: DateTime<Utc>,
) -> PostureReading {
    if !calibration.is_valid() {
        return PostureReading::good(now);
    }
    let deviation = calibration.pitch - sample.pitch;
    let tolerance = dead_zone.clamp(0.0, 1.0) * FULL_SCALE_PITCH;
    if deviation <= tolerance {
        return PostureReading::good(now);
    }
    let span = (FULL_SCALE_PITCH - tolerance).max(f64::EPSILON);
    PostureReading::bad(now, (deviation - tolerance) / span)
}

pub struct MotionDetector {
    device_id: String,
    dead_zone: f64,
    calibration: Option<MotionCalibration>,
    available: bool,
    in_ear: bool,
    running: bool,
    last_sample: Option<Attitude>,
    ingress_tx: Sender<MotionSignal>,
    ingress_rx: Receiver<MotionSignal>,
}

impl MotionDetector {
    pub fn new(device_id: impl Into<String>) -> Self {
        let (ingress_tx, ingress_rx) = bounded(10_000);
        Self {
            device_id: device_id.into(),
            dead_zone: 0.0,
            calibration: None,
            available: false,
            in_ear: false,
            running: false,
            last_sample: None,
            ingress_tx,
            ingress_rx,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Handle for the attitude pipeline to push signals through.
    pub fn sample_ingress(&self) -> Sender<MotionSignal> {
        self.ingress_tx.clone()
    }

    pub fn set_calibration(&mut self, calibration: Option<MotionCalibration>) {
        self.calibration = calibration;
    }

    pub fn set_dead_zone(&mut self, dead_zone: f64) {
        self.dead_zone = dead_zone.clamp(0.0, 1.0);
    }

    /// Reflect pairing state for the headset.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
        if !available {
            self.in_ear = false;
        }
    }
}

impl Detector for MotionDetector {
    type Sample = Attitude;

    fn source(&self) -> TrackingSource {
        TrackingSource::MotionHeadset
    }

    fn start(&mut self) -> Result<(), DetectorError> {
        if self.running {
            return Err(DetectorError::AlreadyRunning);
        }
        if !self.available {
            return Err(DetectorError::NotAvailable);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.last_sample = None;
        while self.ingress_rx.try_recv().is_ok() {}
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_connected(&self) -> bool {
        self.available && self.in_ear
    }

    fn poll_events(&mut self, now: DateTime<Utc>) -> Vec<DetectorEvent> {
        if !self.running {
            while self.ingress_rx.try_recv().is_ok() {}
            return Vec::new();
        }

        let mut events = Vec::new();
        while let Ok(signal) = self.ingress_rx.try_recv() {
            match signal {
                MotionSignal::InEar(in_ear) => {
                    if in_ear != self.in_ear {
                        self.in_ear = in_ear;
                        events.push(DetectorEvent::Connectivity(in_ear));
                    }
                }
                MotionSignal::Attitude(attitude) => {
                    if !self.in_ear {
                        // Attitude noise from a pocketed headset is garbage.
                        continue;
                    }
                    self.last_sample = Some(attitude);
                    if let Some(calibration) = &self.calibration {
                        events.push(DetectorEvent::Reading(classify_motion_sample(
                            &attitude,
                            calibration,
                            self.dead_zone,
                            now,
                        )));
                    }
                }
            }
        }
        events
    }

    fn current_sample(&self) -> Option<Attitude> {
        self.last_sample
    }

    fn reduce_samples(&self, samples: &[Attitude]) -> Option<CalibrationData> {
        reduce_motion_samples(samples)
            .filter(|c| c.is_valid())
            .map(CalibrationData::Motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration() -> MotionCalibration {
        MotionCalibration {
            pitch: 0.1,
            roll: 0.0,
            yaw: 0.0,
        }
    }

    fn worn_detector() -> MotionDetector {
        let mut detector = MotionDetector::new("headset-1");
        detector.set_available(true);
        detector.set_calibration(Some(calibration()));
        detector.set_dead_zone(0.1);
        detector.start().unwrap();
        detector
            .sample_ingress()
            .send(MotionSignal::InEar(true))
            .unwrap();
        detector
    }

    #[test]
    fn test_classify_upright_is_good() {
        let reading = classify_motion_sample(
            &Attitude::new(0.08, 0.0, 0.0),
            &calibration(),
            0.1,
            Utc::now(),
        );
        assert!(!reading.is_bad_posture);
    }

    #[test]
    fn test_classify_forward_droop_is_bad() {
        let reading = classify_motion_sample(
            &Attitude::new(-0.3, 0.0, 0.0),
            &calibration(),
            0.1,
            Utc::now(),
        );
        assert!(reading.is_bad_posture);
        assert!(reading.severity > 0.5);
    }

    #[test]
    fn test_connectivity_flips_emit_once() {
        let mut detector = worn_detector();
        let events = detector.poll_events(Utc::now());
        assert!(matches!(events[0], DetectorEvent::Connectivity(true)));

        let ingress = detector.sample_ingress();
        ingress.send(MotionSignal::InEar(true)).unwrap();
        assert!(detector.poll_events(Utc::now()).is_empty());

        ingress.send(MotionSignal::InEar(false)).unwrap();
        let events = detector.poll_events(Utc::now());
        assert!(matches!(events[0], DetectorEvent::Connectivity(false)));
    }

    #[test]
    fn test_attitude_ignored_while_out_of_ear() {
        let mut detector = worn_detector();
        detector.poll_events(Utc::now());

        let ingress = detector.sample_ingress();
        ingress.send(MotionSignal::InEar(false)).unwrap();
        ingress
            .send(MotionSignal::Attitude(Attitude::new(-0.4, 0.0, 0.0)))
            .unwrap();
        let events = detector.poll_events(Utc::now());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DetectorEvent::Connectivity(false)));
    }

    #[test]
    fn test_readings_flow_while_worn() {
        let mut detector = worn_detector();
        detector.poll_events(Utc::now());

        detector
            .sample_ingress()
            .send(MotionSignal::Attitude(Attitude::new(-0.3, 0.0, 0.0)))
            .unwrap();
        let events = detector.poll_events(Utc::now());
        assert!(matches!(events[0], DetectorEvent::Reading(r) if r.is_bad_posture));
        assert!(detector.current_sample().is_some());
    }

    #[test]
    fn test_reduce_needs_four_samples() {
        let detector = MotionDetector::new("headset-1");
        let samples = vec![
            Attitude::new(0.1, 0.0, 0.0),
            Attitude::new(0.2, 0.0, 0.0),
            Attitude::new(0.1, 0.0, 0.0),
        ];
        assert!(detector.reduce_samples(&samples).is_none());
    }
}
