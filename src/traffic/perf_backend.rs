use super::TrafficMonitor;
use anyhow::{Context, Result};
use perf_event::{Builder, Counter, events::Hardware};

const CACHE_LINE: u64 = 64;

/// A [`TrafficMonitor`] estimating memory traffic from last level cache misses.
///
/// Note that this crate uses the `perf-event` crate from the `perf-event2` package.
///
/// Useful where RDT monitoring is not available. Every LLC miss of this
/// process (and its children) is counted as one cache line of traffic.
/// Write-backs and prefetches are not included. The RMID is ignored.
pub struct PerfTraffic {
    counter: Counter,
}

impl PerfTraffic {
    pub fn new() -> Result<Self> {
        let mut builder = Builder::new(Hardware::CACHE_MISSES);
        builder.inherit(true);
        let mut counter = builder.build().context("failed to create llc-miss counter")?;
        counter.enable().context("failed to enable llc-miss counter")?;
        Ok(PerfTraffic { counter })
    }
}

impl TrafficMonitor for PerfTraffic {
    fn set_global_rmid(&mut self, rmid: u32) -> Result<()> {
        log::debug!("perf traffic monitor ignores rmid {rmid}");
        Ok(())
    }

    fn local_mem_traffic(&mut self, _rmid: u32) -> Result<u64> {
        Ok(self.counter.read().context("failed to read llc-miss counter")? * CACHE_LINE)
    }
}
