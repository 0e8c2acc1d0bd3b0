//! Per-run processing metrics.
//!
//! Every pipeline run produces one [`ProcessingMetrics`] record that is handed
//! to a [`MetricsSink`]. The default sink, [`MetricsLog`], keeps the most
//! recent records in a bounded ring buffer shared by concurrent runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Metrics of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub run_id: Uuid,
    pub source_document: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Source length in characters
    pub content_length: usize,
    pub articles_generated: usize,
    pub articles_persisted: usize,
    pub processing_approach: Option<String>,
    pub engine_version: String,
}

impl ProcessingMetrics {
    /// Start a run now.
    pub fn start(
        source_document: impl Into<String>,
        content_length: usize,
        engine_version: impl Into<String>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source_document: source_document.into(),
            start_time: Utc::now(),
            end_time: None,
            content_length,
            articles_generated: 0,
            articles_persisted: 0,
            processing_approach: None,
            engine_version: engine_version.into(),
        }
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Elapsed seconds, measured up to now while the run is still open.
    pub fn processing_time(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        let millis = (end - self.start_time).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }

    pub fn chars_per_second(&self) -> f64 {
        let seconds = self.processing_time();
        if seconds > 0.0 {
            self.content_length as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Receiver of finished run metrics.
pub trait MetricsSink: Send + Sync {
    fn record(&self, metrics: ProcessingMetrics);
}

/// Aggregate view over the recorded runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub runs: usize,
    pub total_articles_generated: usize,
    pub total_articles_persisted: usize,
    pub avg_processing_time: f64,
    pub avg_chars_per_second: f64,
}

/// Bounded in-memory metrics history; the oldest record is dropped when full.
#[derive(Debug)]
pub struct MetricsLog {
    capacity: usize,
    entries: Mutex<VecDeque<ProcessingMetrics>>,
}

impl Default for MetricsLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl MetricsLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<ProcessingMetrics>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Metrics log mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the recorded runs, oldest first.
    pub fn snapshot(&self) -> Vec<ProcessingMetrics> {
        self.entries().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn reset(&self) {
        self.entries().clear();
    }

    pub fn summary(&self) -> MetricsSummary {
        let entries = self.entries();
        let runs = entries.len();
        if runs == 0 {
            return MetricsSummary::default();
        }

        MetricsSummary {
            runs,
            total_articles_generated: entries.iter().map(|m| m.articles_generated).sum(),
            total_articles_persisted: entries.iter().map(|m| m.articles_persisted).sum(),
            avg_processing_time: entries.iter().map(|m| m.processing_time()).sum::<f64>()
                / runs as f64,
            avg_chars_per_second: entries.iter().map(|m| m.chars_per_second()).sum::<f64>()
                / runs as f64,
        }
    }
}

impl MetricsSink for MetricsLog {
    fn record(&self, metrics: ProcessingMetrics) {
        tracing::debug!(
            run_id = %metrics.run_id,
            articles = metrics.articles_persisted,
            seconds = metrics.processing_time(),
            "Recorded processing metrics"
        );

        let mut entries = self.entries();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn finished(content_length: usize, seconds: i64, articles: usize) -> ProcessingMetrics {
        let mut metrics = ProcessingMetrics::start("doc.md", content_length, "2.0");
        metrics.end_time = Some(metrics.start_time + Duration::seconds(seconds));
        metrics.articles_generated = articles;
        metrics.articles_persisted = articles;
        metrics
    }

    #[test]
    fn test_derived_rates() {
        let metrics = finished(1000, 4, 1);
        assert_eq!(metrics.processing_time(), 4.0);
        assert_eq!(metrics.chars_per_second(), 250.0);

        let instant = finished(1000, 0, 1);
        assert_eq!(instant.chars_per_second(), 0.0);
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let log = MetricsLog::new(2);
        let first = finished(10, 1, 1);
        let first_id = first.run_id;

        log.record(first);
        log.record(finished(20, 1, 2));
        log.record(finished(30, 1, 3));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|m| m.run_id != first_id));
        assert_eq!(snapshot[1].content_length, 30);

        log.reset();
        assert!(log.is_empty());
    }

    #[test]
    fn test_summary() {
        let log = MetricsLog::default();
        assert_eq!(log.summary(), MetricsSummary::default());

        log.record(finished(1000, 2, 1));
        log.record(finished(3000, 2, 3));

        let summary = log.summary();
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.total_articles_generated, 4);
        assert_eq!(summary.avg_processing_time, 2.0);
        assert_eq!(summary.avg_chars_per_second, 1000.0);
    }

    #[test]
    fn test_concurrent_records() {
        let log = Arc::new(MetricsLog::new(100));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        log.record(finished(1, 1, 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(log.len(), 80);
    }
}
