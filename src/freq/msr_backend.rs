use super::FreqControl;
use crate::{
    cpus::SysCpu,
    msr::{Msr, MsrAccess, bits, regs},
};
use anyhow::Result;

/// Bus clock the performance state ratios are multiplied with.
const BUS_MHZ: u32 = 100;

/// A [`FreqControl`] reading the performance state registers directly.
///
/// The target is the ratio last written to `IA32_PERF_CTL`, the current
/// frequency is the ratio reported by `IA32_PERF_STATUS`.
pub struct MsrFreq<M = Msr> {
    msr: M,
    cores: usize,
}

impl MsrFreq {
    pub fn new(sys: &SysCpu) -> Result<Self> {
        Ok(Self::with_parts(Msr::new(), sys.online()?.len()))
    }
}

impl<M: MsrAccess> MsrFreq<M> {
    pub fn with_parts(msr: M, cores: usize) -> Self {
        MsrFreq { msr, cores }
    }

    fn ratio_mhz(&self, core: usize, reg: u32) -> Result<u32> {
        Ok(ratio_to_mhz(bits(self.msr.read(core, reg)?, 15, 8)))
    }
}

fn ratio_to_mhz(ratio: u64) -> u32 {
    ratio as u32 * BUS_MHZ
}

impl<M: MsrAccess> FreqControl for MsrFreq<M> {
    fn num_cores(&self) -> usize {
        self.cores
    }

    /// Every ratio from the minimum efficiency ratio up to the maximum non-turbo ratio.
    fn freqs_mhz(&mut self) -> Result<Vec<u32>> {
        let info = self.msr.read(0, regs::MSR_PLATFORM_INFO)?;
        let min = bits(info, 47, 40);
        let max = bits(info, 15, 8);
        Ok((min..=max).map(ratio_to_mhz).collect())
    }

    fn freq_target_mhz(&mut self, core: usize) -> Result<u32> {
        self.ratio_mhz(core, regs::IA32_PERF_CTL)
    }

    fn freq_mhz(&mut self, core: usize) -> Result<u32> {
        self.ratio_mhz(core, regs::IA32_PERF_STATUS)
    }
}
