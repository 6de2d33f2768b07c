//! Bounded history of vitals samples for one monitoring session

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::vitals::VitalsSample;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Ring buffer of samples, oldest first. Pushing past capacity evicts the oldest.
#[derive(Clone, Debug)]
pub struct VitalsHistory {
    samples: VecDeque<VitalsSample>,
    capacity: usize,
}

impl Default for VitalsHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl VitalsHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one if the buffer was full
    pub fn push(&mut self, sample: VitalsSample) -> Option<VitalsSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn latest(&self) -> Option<&VitalsSample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&VitalsSample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &VitalsSample> {
        self.samples.iter()
    }

    /// Owned copy of the samples, oldest first
    pub fn snapshot(&self) -> Vec<VitalsSample> {
        self.samples.iter().cloned().collect()
    }

    /// Timestamps of the oldest and newest samples
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.oldest(), self.latest()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::vitals::VitalsReading;
    use chrono::Duration;

    fn sample(hr: u16, offset_secs: i64) -> VitalsSample {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        VitalsSample::at(VitalsReading::new(hr, 120, 80, 98), base + Duration::seconds(offset_secs))
    }

    #[test]
    fn caps_at_capacity_and_evicts_oldest() {
        let mut history = VitalsHistory::new(3);
        for i in 0..3 {
            assert!(history.push(sample(60 + i, i as i64)).is_none());
        }
        assert_eq!(history.len(), 3);

        let evicted = history.push(sample(99, 10)).unwrap();
        assert_eq!(evicted.reading.heart_rate, 60);
        assert_eq!(history.len(), 3);

        let rates: Vec<u16> = history.iter().map(|s| s.reading.heart_rate).collect();
        assert_eq!(rates, vec![61, 62, 99]);
        assert_eq!(history.latest().unwrap().reading.heart_rate, 99);
    }

    #[test]
    fn default_capacity() {
        let mut history = VitalsHistory::default();
        for i in 0..50 {
            history.push(sample(70, i));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(history.oldest().unwrap().timestamp, sample(70, 30).timestamp);
    }

    #[test]
    fn zero_capacity_keeps_latest_sample() {
        let mut history = VitalsHistory::new(0);
        history.push(sample(70, 0));
        history.push(sample(71, 1));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.snapshot(), vec![sample(71, 1)]);
    }

    #[test]
    fn clear_and_time_span() {
        let mut history = VitalsHistory::new(5);
        assert!(history.time_span().is_none());
        history.push(sample(70, 0));
        history.push(sample(70, 4));
        let (start, end) = history.time_span().unwrap();
        assert_eq!(end - start, Duration::seconds(4));

        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
