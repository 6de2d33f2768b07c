//! Time-series chart over a session's vitals history
//!
//! The chart is a viewport over the time axis of the history: it starts at
//! the full extent of the data and can be zoomed around a focus instant,
//! panned, and reset. While not zoomed it follows the data as the ring
//! buffer moves; once zoomed it keeps its span and stays inside the data.

mod render;

pub use render::{sparkline, ChartError, ChartRenderer};

use chrono::{DateTime, Duration, Utc};

use crate::monitor::Thresholds;
use crate::types::vitals::{VitalsReading, VitalsSample};

pub const DEFAULT_MIN_SPAN_SECS: i64 = 4;
pub const DEFAULT_ZOOM_STEP: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    HeartRate,
    Systolic,
    Diastolic,
    Spo2,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::HeartRate, Metric::Systolic, Metric::Diastolic, Metric::Spo2];

    pub fn value(&self, reading: &VitalsReading) -> f64 {
        match self {
            Metric::HeartRate => f64::from(reading.heart_rate),
            Metric::Systolic => f64::from(reading.blood_pressure.systolic),
            Metric::Diastolic => f64::from(reading.blood_pressure.diastolic),
            Metric::Spo2 => f64::from(reading.spo2),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::HeartRate => "Heart rate",
            Metric::Systolic => "Systolic",
            Metric::Diastolic => "Diastolic",
            Metric::Spo2 => "SpO2",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::HeartRate => "bpm",
            Metric::Systolic | Metric::Diastolic => "mmHg",
            Metric::Spo2 => "%",
        }
    }

    /// Line colour, RGBA
    pub fn color(&self) -> [u8; 4] {
        match self {
            Metric::HeartRate => [220, 53, 69, 255],
            Metric::Systolic => [13, 110, 253, 255],
            Metric::Diastolic => [111, 66, 193, 255],
            Metric::Spo2 => [25, 135, 84, 255],
        }
    }

    /// Threshold values drawn as horizontal reference lines
    pub fn reference_lines(&self, thresholds: &Thresholds) -> Vec<f64> {
        match self {
            Metric::HeartRate => vec![
                f64::from(thresholds.heart_rate_min),
                f64::from(thresholds.heart_rate_max),
            ],
            Metric::Systolic => vec![f64::from(thresholds.systolic_max)],
            Metric::Diastolic => vec![f64::from(thresholds.diastolic_max)],
            Metric::Spo2 => vec![f64::from(thresholds.spo2_min)],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One metric of the samples as chart points, in sample order
pub fn series(samples: &[VitalsSample], metric: Metric) -> Vec<ChartPoint> {
    samples
        .iter()
        .map(|s| ChartPoint {
            timestamp: s.timestamp,
            value: metric.value(&s.reading),
        })
        .collect()
}

/// Value range covering the points and optional reference lines, padded
/// by a tenth of the span (at least one unit) on each side
pub fn value_range(points: &[ChartPoint], references: &[f64]) -> Option<(f64, f64)> {
    let values = points.iter().map(|p| p.value).chain(references.iter().copied());
    let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;
    let pad = ((max - min) * 0.1).max(1.0);
    Some((min - pad, max + pad))
}

type Window = (DateTime<Utc>, DateTime<Utc>);

#[derive(Clone, Debug)]
pub struct ChartViewport {
    extent: Option<Window>,
    window: Option<Window>,
    min_span: Duration,
}

impl Default for ChartViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartViewport {
    pub fn new() -> Self {
        Self {
            extent: None,
            window: None,
            min_span: Duration::seconds(DEFAULT_MIN_SPAN_SECS),
        }
    }

    pub fn with_min_span(mut self, min_span: Duration) -> Self {
        self.min_span = min_span.max(Duration::milliseconds(1));
        self
    }

    /// Viewport already fitted to the samples
    pub fn fitted(samples: &[VitalsSample]) -> Self {
        let mut viewport = Self::new();
        viewport.set_data(samples);
        viewport
    }

    /// Update the data extent from a history snapshot
    pub fn set_data(&mut self, samples: &[VitalsSample]) {
        let zoomed = self.is_zoomed();
        self.extent = samples
            .iter()
            .map(|s| s.timestamp)
            .fold(None, |acc: Option<Window>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            });

        self.window = match (self.window, zoomed) {
            (Some((start, end)), true) => self.clamp(start, end - start, None),
            _ => self.extent,
        };
    }

    pub fn extent(&self) -> Option<Window> {
        self.extent
    }

    /// Visible time window, None without data
    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn is_zoomed(&self) -> bool {
        self.window.is_some() && self.window != self.extent
    }

    /// Scale the window span by `1 / factor` keeping `focus` (default: the
    /// window centre) at the same relative position. Factors above one
    /// zoom in.
    pub fn zoom(&mut self, factor: f64, focus: Option<DateTime<Utc>>) {
        let Some((start, end)) = self.window else {
            return;
        };
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let span_ms = (end - start).num_milliseconds().max(1) as f64;
        let focus = focus.unwrap_or(start + Duration::milliseconds(span_ms as i64 / 2));
        let ratio = ((focus - start).num_milliseconds() as f64 / span_ms).clamp(0.0, 1.0);

        let new_span = Duration::milliseconds((span_ms / factor).round() as i64).max(self.min_span);
        let new_start = focus - Duration::milliseconds((ratio * new_span.num_milliseconds() as f64) as i64);
        self.window = self.clamp(new_start, new_span, self.window);
    }

    pub fn zoom_in(&mut self) {
        self.zoom(DEFAULT_ZOOM_STEP, None);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(1.0 / DEFAULT_ZOOM_STEP, None);
    }

    /// Shift the window; stops at the data edges
    pub fn pan(&mut self, delta: Duration) {
        if let Some((start, end)) = self.window {
            self.window = self.clamp(start + delta, end - start, self.window);
        }
    }

    pub fn reset(&mut self) {
        self.window = self.extent;
    }

    /// Points inside the window
    pub fn visible(&self, points: &[ChartPoint]) -> Vec<ChartPoint> {
        match self.window {
            Some((start, end)) => points
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp <= end)
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Fit a window of `span` starting at `start` inside the extent
    fn clamp(&self, start: DateTime<Utc>, span: Duration, fallback: Option<Window>) -> Option<Window> {
        let Some((ext_start, ext_end)) = self.extent else {
            return fallback;
        };
        let ext_span = ext_end - ext_start;
        if span >= ext_span {
            return self.extent;
        }

        let start = start.max(ext_start).min(ext_end - span);
        Some((start, start + span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(count: i64, step_secs: i64) -> Vec<VitalsSample> {
        let base = DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        (0..count)
            .map(|i| {
                VitalsSample::at(
                    VitalsReading::new(60 + i as u16, 120, 80, 98),
                    base + Duration::seconds(i * step_secs),
                )
            })
            .collect()
    }

    fn span(window: Option<Window>) -> i64 {
        let (start, end) = window.unwrap();
        (end - start).num_seconds()
    }

    #[test]
    fn series_and_range() {
        let data = samples(3, 2);
        let hr = series(&data, Metric::HeartRate);
        assert_eq!(hr.iter().map(|p| p.value).collect::<Vec<_>>(), vec![60.0, 61.0, 62.0]);

        let (lo, hi) = value_range(&hr, &[50.0, 130.0]).unwrap();
        assert!(lo < 50.0 && hi > 130.0);
        assert!(value_range(&[], &[]).is_none());
    }

    #[test]
    fn zoom_in_halves_span_and_never_goes_below_minimum() {
        let data = samples(20, 2);
        let mut viewport = ChartViewport::fitted(&data);
        assert_eq!(span(viewport.window()), 38);
        assert!(!viewport.is_zoomed());

        viewport.zoom_in();
        assert_eq!(span(viewport.window()), 19);
        assert!(viewport.is_zoomed());

        for _ in 0..10 {
            viewport.zoom_in();
        }
        assert_eq!(span(viewport.window()), DEFAULT_MIN_SPAN_SECS);
    }

    #[test]
    fn zoom_out_is_capped_at_extent() {
        let data = samples(10, 2);
        let mut viewport = ChartViewport::fitted(&data);
        viewport.zoom_in();
        viewport.zoom_out();
        viewport.zoom_out();
        assert_eq!(viewport.window(), viewport.extent());
        assert!(!viewport.is_zoomed());
    }

    #[test]
    fn zoom_keeps_focus_position() {
        let data = samples(11, 1);
        let mut viewport = ChartViewport::fitted(&data);
        let focus = data[2].timestamp;

        viewport.zoom(2.0, Some(focus));
        let (start, end) = viewport.window().unwrap();
        assert_eq!((end - start).num_seconds(), 5);
        assert_eq!(start, data[1].timestamp);
    }

    #[test]
    fn pan_stops_at_edges() {
        let data = samples(20, 1);
        let mut viewport = ChartViewport::fitted(&data);
        viewport.zoom(4.0, None);
        let zoomed_span = span(viewport.window());

        viewport.pan(Duration::seconds(-1000));
        assert_eq!(viewport.window().unwrap().0, data[0].timestamp);
        viewport.pan(Duration::seconds(1000));
        assert_eq!(viewport.window().unwrap().1, data[19].timestamp);
        assert_eq!(span(viewport.window()), zoomed_span);

        viewport.reset();
        assert!(!viewport.is_zoomed());
    }

    #[test]
    fn follows_new_data_unless_zoomed() {
        let data = samples(30, 1);
        let mut viewport = ChartViewport::fitted(&data[..20]);
        viewport.set_data(&data[5..25]);
        assert_eq!(viewport.window(), Some((data[5].timestamp, data[24].timestamp)));

        viewport.zoom(2.0, Some(data[5].timestamp));
        let before = span(viewport.window());
        viewport.set_data(&data[10..30]);
        let (start, _) = viewport.window().unwrap();
        assert_eq!(start, data[10].timestamp);
        assert_eq!(span(viewport.window()), before);
    }

    #[test]
    fn visible_filters_to_window() {
        let data = samples(10, 1);
        let mut viewport = ChartViewport::fitted(&data);
        viewport.zoom(3.0, Some(data[0].timestamp));

        let visible = viewport.visible(&series(&data, Metric::Spo2));
        assert_eq!(visible.len(), 4);
        assert!(ChartViewport::new().visible(&series(&data, Metric::Spo2)).is_empty());
    }
}
