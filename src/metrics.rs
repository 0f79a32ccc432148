use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use serde::Serialize;

use crate::storage::Service;

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub uptime_seconds: u64,
    pub total_compressions: u64,
    pub total_decompressions: u64,
    pub total_downloads: u64,
    pub failed_requests: u64,
    pub total_bytes_received: u64,
    pub total_bytes_stored: u64,
    pub total_bytes_served: u64,
    pub active_connections: u64,
    pub compression_ratio_avg: f64,
}

pub struct MetricsCollector {
    start_time: std::time::SystemTime,
    compressions: AtomicU64,
    decompressions: AtomicU64,
    downloads: AtomicU64,
    failures: AtomicU64,
    bytes_received: AtomicU64,
    bytes_stored: AtomicU64,
    bytes_served: AtomicU64,
    active_connections: AtomicU64,
    compression_ratios: Mutex<Vec<f64>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: std::time::SystemTime::now(),
            compressions: AtomicU64::new(0),
            decompressions: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_stored: AtomicU64::new(0),
            bytes_served: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            compression_ratios: Mutex::new(Vec::new()),
        }
    }

    /// `ratio` is the header's compression ratio, recorded for compressions only.
    pub fn record_upload(&self, service: Service, input: u64, output: u64, ratio: Option<f64>) {
        match service {
            Service::Compress => self.compressions.fetch_add(1, Ordering::Relaxed),
            Service::Decompress => self.decompressions.fetch_add(1, Ordering::Relaxed),
        };
        self.bytes_received.fetch_add(input, Ordering::Relaxed);
        self.bytes_stored.fetch_add(output, Ordering::Relaxed);

        if let (Some(ratio), Ok(mut ratios)) = (ratio, self.compression_ratios.lock()) {
            ratios.push(ratio);
            if ratios.len() > 1000 { // Keep last 1000 ratios
                ratios.remove(0);
            }
        }
    }

    pub fn record_download(&self, bytes: u64) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> Metrics {
        let uptime = self.start_time.elapsed().unwrap_or_default().as_secs();
        let avg_ratio = if let Ok(ratios) = self.compression_ratios.lock() {
            if ratios.is_empty() { 0.0 } else { ratios.iter().sum::<f64>() / ratios.len() as f64 }
        } else { 0.0 };

        Metrics {
            uptime_seconds: uptime,
            total_compressions: self.compressions.load(Ordering::Relaxed),
            total_decompressions: self.decompressions.load(Ordering::Relaxed),
            total_downloads: self.downloads.load(Ordering::Relaxed),
            failed_requests: self.failures.load(Ordering::Relaxed),
            total_bytes_received: self.bytes_received.load(Ordering::Relaxed),
            total_bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
            total_bytes_served: self.bytes_served.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            compression_ratio_avg: avg_ratio,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
