mod cpufreq_backend;
#[cfg(target_os = "linux")]
mod msr_backend;

pub use cpufreq_backend::CpufreqFreq;
#[cfg(target_os = "linux")]
pub use msr_backend::MsrFreq;

use crate::{
    config::{Config, FreqKind},
    cpus::SysCpu,
    formats::Format,
    struct_record,
};
use anyhow::Result;
use std::{fmt, io::Write};

/// Per-core frequency control and readout.
pub trait FreqControl {
    /// Number of cores. Valid core indices are `0..num_cores()`.
    fn num_cores(&self) -> usize;
    /// Frequencies the cores can be set to, in MHz.
    fn freqs_mhz(&mut self) -> Result<Vec<u32>>;
    /// The frequency currently requested for `core`, in MHz.
    fn freq_target_mhz(&mut self, core: usize) -> Result<u32>;
    /// The frequency `core` is currently running at, in MHz.
    fn freq_mhz(&mut self, core: usize) -> Result<u32>;
}

impl FreqControl for Box<dyn FreqControl> {
    fn num_cores(&self) -> usize {
        (**self).num_cores()
    }

    fn freqs_mhz(&mut self) -> Result<Vec<u32>> {
        (**self).freqs_mhz()
    }

    fn freq_target_mhz(&mut self, core: usize) -> Result<u32> {
        (**self).freq_target_mhz(core)
    }

    fn freq_mhz(&mut self, core: usize) -> Result<u32> {
        (**self).freq_mhz(core)
    }
}

/// Constructs the frequency controller selected by `config`.
pub fn freq_control(config: &Config) -> Result<Box<dyn FreqControl>> {
    let kind = config.freq;
    log::debug!("using {kind:?} frequency control");
    let sys = SysCpu::with_root(&config.cpu_root);
    Ok(match kind {
        #[cfg(target_os = "linux")]
        FreqKind::Msr => Box::new(MsrFreq::new(&sys)?),
        #[cfg(not(target_os = "linux"))]
        FreqKind::Msr => anyhow::bail!("msr frequency control is only available on linux"),
        FreqKind::Cpufreq => Box::new(CpufreqFreq::with_sys(sys)?),
    })
}

struct_record! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct FreqRecord {
        pub core: usize,
        pub target_mhz: u32,
        pub freq_mhz: u32,
    }
}

impl fmt::Display for FreqRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Core {} | Freq Target = {} MHz | Freq = {} MHz",
            self.core, self.target_mhz, self.freq_mhz
        )
    }
}

/// Reads target and current frequency of every core in `cores` and emits one record per core.
pub fn report(
    ctrl: &mut dyn FreqControl,
    cores: &[usize],
    format: &mut dyn Format<FreqRecord>,
    out: &mut dyn Write,
) -> Result<()> {
    let freqs = ctrl.freqs_mhz()?;
    log::debug!("supported frequencies: {freqs:?} MHz");
    for &core in cores {
        let record = FreqRecord {
            core,
            target_mhz: ctrl.freq_target_mhz(core)?,
            freq_mhz: ctrl.freq_mhz(core)?,
        };
        format.push(out, &record)?;
    }
    format.finish(out)
}

/// Converts a kHz reading as reported by cpufreq to MHz.
pub(crate) fn khz_to_mhz(khz: u64) -> u32 {
    (khz / 1000) as u32
}
