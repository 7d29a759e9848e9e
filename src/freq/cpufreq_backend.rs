use super::{FreqControl, khz_to_mhz};
use crate::cpus::{SysCpu, read_number};
use anyhow::{Context, Result};
use std::fs;

/// A [`FreqControl`] backed by the cpufreq sysfs interface.
///
/// The target is `scaling_setspeed`, which is only meaningful with the
/// `userspace` governor. Other governors report `<unsupported>` there, in
/// which case `scaling_max_freq` is the closest thing to a target.
pub struct CpufreqFreq {
    sys: SysCpu,
    cores: usize,
}

impl CpufreqFreq {
    pub fn with_sys(sys: SysCpu) -> Result<Self> {
        let cores = sys.online()?.len();
        Ok(CpufreqFreq { sys, cores })
    }

    fn read_khz(&self, core: usize, file: &str) -> Result<u64> {
        read_number(&self.sys.cpu_file(core, &format!("cpufreq/{file}")))
    }
}

impl FreqControl for CpufreqFreq {
    fn num_cores(&self) -> usize {
        self.cores
    }

    fn freqs_mhz(&mut self) -> Result<Vec<u32>> {
        let path = self.sys.cpu_file(0, "cpufreq/scaling_available_frequencies");
        let Ok(list) = fs::read_to_string(&path) else {
            // intel_pstate and amd-pstate do not publish a list
            log::debug!("{path:?} not readable");
            return Ok(Vec::new());
        };
        let mut freqs = list
            .split_whitespace()
            .map(|x| {
                x.parse()
                    .map(khz_to_mhz)
                    .with_context(|| format!("bad frequency {x:?} in {path:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        freqs.sort_unstable();
        Ok(freqs)
    }

    fn freq_target_mhz(&mut self, core: usize) -> Result<u32> {
        self.read_khz(core, "scaling_setspeed")
            .or_else(|_| self.read_khz(core, "scaling_max_freq"))
            .map(khz_to_mhz)
    }

    fn freq_mhz(&mut self, core: usize) -> Result<u32> {
        self.read_khz(core, "scaling_cur_freq").map(khz_to_mhz)
    }
}
