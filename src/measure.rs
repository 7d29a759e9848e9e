use crate::traffic::TrafficMonitor;
use anyhow::Result;
use std::time::SystemTime;

/// Wall clock time and memory traffic spent in a measured region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Difference of the two counter readings. Negative if the counter went backwards.
    pub traffic_bytes: f64,
    pub elapsed_ms: f64,
}

impl Measurement {
    pub fn bandwidth_mbps(&self) -> Option<f64> {
        bandwidth_mbps(self.traffic_bytes, self.elapsed_ms)
    }
}

/// Runs `f`, bracketed by a wall clock sample followed by a traffic sample for `rmid` on each side.
pub fn measure<R>(
    monitor: &mut dyn TrafficMonitor,
    rmid: u32,
    f: impl FnOnce() -> R,
) -> Result<(R, Measurement)> {
    let begin = SystemTime::now();
    let bytes_begin = monitor.local_mem_traffic(rmid)?;
    let ret = f();
    let end = SystemTime::now();
    let bytes_end = monitor.local_mem_traffic(rmid)?;
    Ok((
        ret,
        Measurement {
            traffic_bytes: traffic_delta(bytes_begin, bytes_end),
            elapsed_ms: elapsed_ms(begin, end),
        },
    ))
}

fn traffic_delta(begin: u64, end: u64) -> f64 {
    end as f64 - begin as f64
}

/// Milliseconds from `begin` to `end`, negative if the clock was stepped back in between.
pub fn elapsed_ms(begin: SystemTime, end: SystemTime) -> f64 {
    let ms = |d: std::time::Duration| d.as_secs() as f64 * 1e3 + d.subsec_nanos() as f64 * 1e-6;
    match end.duration_since(begin) {
        Ok(d) => ms(d),
        Err(e) => -ms(e.duration()),
    }
}

/// Bandwidth in MB/s for `bytes` transferred in `elapsed_ms` milliseconds.
///
/// Returns `None` if no (or negative) time has passed.
pub fn bandwidth_mbps(bytes: f64, elapsed_ms: f64) -> Option<f64> {
    if elapsed_ms <= 0.0 || !elapsed_ms.is_finite() {
        return None;
    }
    Some(bytes / elapsed_ms * 1e-3)
}
