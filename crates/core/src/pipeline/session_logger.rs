use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Cross-cutting logger for live session events.
///
/// Decouples the overlay pipeline from where its numbers end up (stdout,
/// a GUI status line, nowhere).
pub trait SessionLogger: Send {
    /// One admitted frame finished detection.
    fn frame_processed(&mut self, frame_index: usize, faces: usize);

    /// How long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A point-in-time metric (dropped frames, face count).
    fn metric(&mut self, name: &str, value: f64);

    /// End-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Shared between the session queue (which records) and the owner of the
/// session (which asks for the summary).
pub type SharedSessionLogger = Arc<Mutex<Box<dyn SessionLogger>>>;

pub fn shared(logger: impl SessionLogger + 'static) -> SharedSessionLogger {
    Arc::new(Mutex::new(Box::new(logger)))
}

/// Discards everything. Used by the desktop app and by tests.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame_processed(&mut self, _frame_index: usize, _faces: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

/// Running count, sum, max and last value of one timing or metric.
///
/// Fixed size, so a session that never ends does not grow it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
    pub last: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Terminal logger: per-stage timings, metrics, throttled progress lines and
/// a summary when the session ends.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    timings: HashMap<String, Aggregate>,
    metrics: HashMap<String, Aggregate>,
    start_time: Instant,
    frames: usize,
    faces: usize,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            faces: 0,
        }
    }

    /// The formatted summary, or `None` if nothing was processed.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Session summary ({} frames, {} faces, {:.1}s):",
            self.frames,
            self.faces,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, durations) in stages {
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                durations.average(),
                durations.max,
                durations.sum
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, values) in metrics {
            lines.push(format!(
                "  {name}: avg {:.1}, last {:.0}",
                values.average(),
                values.last
            ));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Detection rate: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<Aggregate> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<Aggregate> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame_processed(&mut self, frame_index: usize, faces: usize) {
        self.frames += 1;
        self.faces += faces;
        if self.frames % self.throttle_frames == 0 {
            log::info!(
                "Processed {} frames (frame {frame_index}: {faces} faces)",
                self.frames
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        if let Some(aggregate) = self.timings.get_mut(stage) {
            aggregate.record(duration_ms);
        } else {
            let mut aggregate = Aggregate::default();
            aggregate.record(duration_ms);
            self.timings.insert(stage.to_string(), aggregate);
        }
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
