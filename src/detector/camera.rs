//! Camera-based posture detector.
//!
//! The platform capture pipeline (frame acquisition and landmark
//! extraction) lives outside this crate and pushes one
//! [`CameraObservation`] per processed frame through the ingress channel.
//! This detector tracks presence, keeps the latest raw sample for
//! calibration capture, and classifies samples against the active
//! calibration.

use crate::core::calibration::{reduce_camera_samples, CalibrationData, CameraCalibration};
use crate::detector::types::{DetectorError, DetectorEvent, PostureReading};
use crate::detector::{Detector, TrackingSource};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};

/// One processed camera frame. `head_y` is the normalized head height
/// (0.0 bottom of frame, 1.0 top); `None` means nobody was found.
#[derive(Debug, Clone, Copy)]
pub struct CameraObservation {
    pub head_y: Option<f64>,
}

/// Classify a raw head-height sample against a calibration.
///
/// The dead zone is a fraction of the calibrated range subtracted from
/// the deviation before anything counts as bad; severity measures how far
/// past the tolerance the sample fell, normalized to the remaining range.
pub fn classify_camera_sample(
    sample: f64,
    calibration: &CameraCalibration,
    dead_zone: f64,
    now: DateTime<Utc>,
) -> PostureReading {
    if !calibration.is_valid() {
        return PostureReading::good(now);
    }
    let deviation = calibration.neutral_y - sample;
    let tolerance = dead_zone.clamp(0.0, 1.0) * calibration.range;
    if deviation <= tolerance {
        return PostureReading::good(now);
    }
    let span = (calibration.range - tolerance).max(f64::EPSILON);
    PostureReading::bad(now, (deviation - tolerance) / span)
}

pub struct CameraDetector {
    device_id: String,
    dead_zone: f64,
    calibration: Option<CameraCalibration>,
    available: bool,
    running: bool,
    user_away: bool,
    last_sample: Option<f64>,
    ingress_tx: Sender<CameraObservation>,
    ingress_rx: Receiver<CameraObservation>,
}

impl CameraDetector {
    pub fn new(device_id: impl Into<String>) -> Self {
        let (ingress_tx, ingress_rx) = bounded(10_000);
        Self {
            device_id: device_id.into(),
            dead_zone: 0.0,
            calibration: None,
            available: false,
            running: false,
            user_away: false,
            last_sample: None,
            ingress_tx,
            ingress_rx,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn set_device_id(&mut self, device_id: impl Into<String>) {
        self.device_id = device_id.into();
    }

    /// Handle for the capture pipeline to push observations through.
    pub fn sample_ingress(&self) -> Sender<CameraObservation> {
        self.ingress_tx.clone()
    }

    pub fn set_calibration(&mut self, calibration: Option<CameraCalibration>) {
        self.calibration = calibration;
    }

    pub fn set_dead_zone(&mut self, dead_zone: f64) {
        self.dead_zone = dead_zone.clamp(0.0, 1.0);
    }

    /// Reflect a hot-plug event for this device.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }
}

impl Detector for CameraDetector {
    type Sample = f64;

    fn source(&self) -> TrackingSource {
        TrackingSource::Camera
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
        self.user_away = false;
        self.last_sample = None;
        // Stale frames must not leak into the next start.
        while self.ingress_rx.try_recv().is_ok() {}
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_connected(&self) -> bool {
        self.available
    }

    fn poll_events(&mut self, now: DateTime<Utc>) -> Vec<DetectorEvent> {
        if !self.running {
            while self.ingress_rx.try_recv().is_ok() {}
            return Vec::new();
        }

        let mut events = Vec::new();
        while let Ok(observation) = self.ingress_rx.try_recv() {
            match observation.head_y {
                None => {
                    if !self.user_away {
                        self.user_away = true;
                        events.push(DetectorEvent::Presence { is_away: true });
                    }
                }
                Some(head_y) => {
                    if self.user_away {
                        self.user_away = false;
                        events.push(DetectorEvent::Presence { is_away: false });
                    }
                    self.last_sample = Some(head_y);
                    if let Some(calibration) = &self.calibration {
                        events.push(DetectorEvent::Reading(classify_camera_sample(
                            head_y,
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

    fn current_sample(&self) -> Option<f64> {
        self.last_sample
    }

    fn reduce_samples(&self, samples: &[f64]) -> Option<CalibrationData> {
        reduce_camera_samples(samples)
            .filter(|c| c.is_valid())
            .map(CalibrationData::Camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration() -> CameraCalibration {
        CameraCalibration {
            good_y: 0.7,
            bad_y: 0.5,
            neutral_y: 0.6,
            range: 0.2,
        }
    }

    #[test]
    fn test_classify_within_dead_zone_is_good() {
        let now = Utc::now();
        // Deviation 0.01 against tolerance 0.1 * 0.2 = 0.02.
        let reading = classify_camera_sample(0.59, &calibration(), 0.1, now);
        assert!(!reading.is_bad_posture);
        assert_eq!(reading.severity, 0.0);
    }

    #[test]
    fn test_classify_above_neutral_is_good() {
        let reading = classify_camera_sample(0.72, &calibration(), 0.1, Utc::now());
        assert!(!reading.is_bad_posture);
    }

    #[test]
    fn test_classify_severity_scales_with_deviation() {
        let now = Utc::now();
        let mild = classify_camera_sample(0.56, &calibration(), 0.1, now);
        let severe = classify_camera_sample(0.38, &calibration(), 0.1, now);
        assert!(mild.is_bad_posture);
        assert!(severe.is_bad_posture);
        assert!(severe.severity > mild.severity);
        assert_eq!(severe.severity, 1.0);
    }

    #[test]
    fn test_start_requires_availability() {
        let mut detector = CameraDetector::new("camA");
        assert!(matches!(detector.start(), Err(DetectorError::NotAvailable)));

        detector.set_available(true);
        assert!(detector.start().is_ok());
        assert!(matches!(detector.start(), Err(DetectorError::AlreadyRunning)));
    }

    #[test]
    fn test_poll_classifies_and_tracks_presence() {
        let mut detector = CameraDetector::new("camA");
        detector.set_available(true);
        detector.set_calibration(Some(calibration()));
        detector.set_dead_zone(0.1);
        detector.start().unwrap();

        let ingress = detector.sample_ingress();
        ingress.send(CameraObservation { head_y: Some(0.60) }).unwrap();
        ingress.send(CameraObservation { head_y: None }).unwrap();
        ingress.send(CameraObservation { head_y: Some(0.50) }).unwrap();

        let events = detector.poll_events(Utc::now());
        assert!(matches!(events[0], DetectorEvent::Reading(r) if !r.is_bad_posture));
        assert!(matches!(events[1], DetectorEvent::Presence { is_away: true }));
        assert!(matches!(events[2], DetectorEvent::Presence { is_away: false }));
        assert!(matches!(events[3], DetectorEvent::Reading(r) if r.is_bad_posture));
        assert_eq!(detector.current_sample(), Some(0.50));
    }

    #[test]
    fn test_no_readings_without_calibration() {
        let mut detector = CameraDetector::new("camA");
        detector.set_available(true);
        detector.start().unwrap();

        detector
            .sample_ingress()
            .send(CameraObservation { head_y: Some(0.55) })
            .unwrap();
        let events = detector.poll_events(Utc::now());
        assert!(events.is_empty());
        // The raw sample is still captured for calibration.
        assert_eq!(detector.current_sample(), Some(0.55));
    }

    #[test]
    fn test_stop_discards_stale_frames() {
        let mut detector = CameraDetector::new("camA");
        detector.set_available(true);
        detector.set_calibration(Some(calibration()));
        detector.start().unwrap();

        detector
            .sample_ingress()
            .send(CameraObservation { head_y: Some(0.55) })
            .unwrap();
        detector.stop();
        assert!(detector.poll_events(Utc::now()).is_empty());
        assert!(detector.current_sample().is_none());
    }

    #[test]
    fn test_reduce_rejects_degenerate_sessions() {
        let detector = CameraDetector::new("camA");
        assert!(detector.reduce_samples(&[0.5, 0.6, 0.7]).is_none());
        assert!(detector.reduce_samples(&[0.5, 0.5, 0.5, 0.5]).is_none());
        assert!(matches!(
            detector.reduce_samples(&[0.5, 0.6, 0.7, 0.65]),
            Some(CalibrationData::Camera(_))
        ));
    }
}
