use std::sync::Mutex;

/// Counters for the products built during a session.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub products: usize,
    pub masked_cells: usize,
    pub errors: usize,
}

type Metrics = MetricsSnapshot;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_product(&self, masked_cells: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.products += 1;
            metrics.masked_cells += masked_cells;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
