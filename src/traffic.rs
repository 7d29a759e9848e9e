#[cfg(target_os = "linux")]
mod msr_backend;
#[cfg(target_os = "linux")]
mod perf_backend;
mod resctrl_backend;

#[cfg(target_os = "linux")]
pub use msr_backend::MsrTraffic;
#[cfg(target_os = "linux")]
pub use perf_backend::PerfTraffic;
pub use resctrl_backend::ResctrlTraffic;

use crate::config::{Config, TrafficKind};
use anyhow::Result;

/// A source of memory traffic readings for a monitoring identifier (RMID).
///
/// Readings are running totals in bytes. Only the difference between two
/// readings is meaningful.
pub trait TrafficMonitor {
    /// Makes `rmid` the identifier that traffic of every cpu is accounted to.
    fn set_global_rmid(&mut self, rmid: u32) -> Result<()>;
    /// Reads the accumulated local memory traffic of `rmid` in bytes.
    fn local_mem_traffic(&mut self, rmid: u32) -> Result<u64>;
}

impl TrafficMonitor for Box<dyn TrafficMonitor> {
    fn set_global_rmid(&mut self, rmid: u32) -> Result<()> {
        (**self).set_global_rmid(rmid)
    }

    fn local_mem_traffic(&mut self, rmid: u32) -> Result<u64> {
        (**self).local_mem_traffic(rmid)
    }
}

/// Constructs the traffic monitor selected by `config`.
pub fn traffic_monitor(config: &Config) -> Result<Box<dyn TrafficMonitor>> {
    let kind = config.traffic;
    log::debug!("using {kind:?} traffic monitor");
    Ok(match kind {
        #[cfg(target_os = "linux")]
        TrafficKind::Msr => {
            let sys = crate::cpus::SysCpu::with_root(&config.cpu_root);
            Box::new(MsrTraffic::new(&sys)?)
        }
        #[cfg(target_os = "linux")]
        TrafficKind::Perf => Box::new(PerfTraffic::new()?),
        #[cfg(not(target_os = "linux"))]
        TrafficKind::Msr | TrafficKind::Perf => {
            anyhow::bail!("{kind:?} traffic monitor is only available on linux")
        }
        TrafficKind::Resctrl => Box::new(ResctrlTraffic::with_root(&config.resctrl_root)),
    })
}

#[cfg(test)]
pub(crate) mod fake {
    use super::TrafficMonitor;
    use anyhow::{Result, bail};

    /// Replays a fixed sequence of counter values.
    pub struct ScriptedTraffic {
        pub rmid: Option<u32>,
        pub readings: Vec<u64>,
        pub reads: usize,
    }

    impl ScriptedTraffic {
        pub fn new(readings: &[u64]) -> Self {
            ScriptedTraffic {
                rmid: None,
                readings: readings.to_vec(),
                reads: 0,
            }
        }
    }

    impl TrafficMonitor for ScriptedTraffic {
        fn set_global_rmid(&mut self, rmid: u32) -> Result<()> {
            self.rmid = Some(rmid);
            Ok(())
        }

        fn local_mem_traffic(&mut self, rmid: u32) -> Result<u64> {
            if self.rmid != Some(rmid) {
                bail!("rmid {rmid} was never set");
            }
            let Some(&value) = self.readings.get(self.reads) else {
                bail!("out of readings");
            };
            self.reads += 1;
            Ok(value)
        }
    }
}
