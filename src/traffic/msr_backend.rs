use super::TrafficMonitor;
use crate::{
    cpus::SysCpu,
    msr::{Msr, MsrAccess, bits, regs},
};
use anyhow::{Context, Result, bail};

/// Event id of local memory bandwidth in `IA32_QM_EVTSEL`.
const EVENT_LOCAL_MEM_BW: u64 = 3;
const RMID_MASK: u64 = 0x3ff;
const QM_CTR_ERROR: u64 = 1 << 63;
const QM_CTR_UNAVAILABLE: u64 = 1 << 62;

/// A [`TrafficMonitor`] programming Intel RDT monitoring registers directly.
///
/// The RMID is written into `IA32_PQR_ASSOC` of every online cpu.
/// Local memory bandwidth is counted per package, so readings are taken on
/// one cpu per package and summed. Raw counter values are converted to bytes
/// with the upscaling factor reported by cpuid leaf `0xF`.
pub struct MsrTraffic<M = Msr> {
    msr: M,
    cpus: Vec<usize>,
    package_cpus: Vec<usize>,
    upscale: u64,
}

impl MsrTraffic {
    pub fn new(sys: &SysCpu) -> Result<Self> {
        Ok(Self::with_parts(
            Msr::new(),
            sys.online()?,
            sys.one_per_package()?,
            cpuid_upscale_factor()?,
        ))
    }
}

impl<M: MsrAccess> MsrTraffic<M> {
    pub fn with_parts(msr: M, cpus: Vec<usize>, package_cpus: Vec<usize>, upscale: u64) -> Self {
        MsrTraffic {
            msr,
            cpus,
            package_cpus,
            upscale,
        }
    }

    fn read_package(&self, cpu: usize, rmid: u32) -> Result<u64> {
        let evtsel = (u64::from(rmid) & RMID_MASK) << 32 | EVENT_LOCAL_MEM_BW;
        self.msr.write(cpu, regs::IA32_QM_EVTSEL, evtsel)?;
        let ctr = self.msr.read(cpu, regs::IA32_QM_CTR)?;
        Ok(qm_ctr_data(ctr).with_context(|| format!("cpu {cpu}, rmid {rmid}"))? * self.upscale)
    }
}

impl<M: MsrAccess> TrafficMonitor for MsrTraffic<M> {
    fn set_global_rmid(&mut self, rmid: u32) -> Result<()> {
        if u64::from(rmid) > RMID_MASK {
            bail!("rmid {rmid} does not fit into IA32_PQR_ASSOC");
        }
        for &cpu in &self.cpus {
            let assoc = self.msr.read(cpu, regs::IA32_PQR_ASSOC)?;
            self.msr
                .write(cpu, regs::IA32_PQR_ASSOC, (assoc & !RMID_MASK) | u64::from(rmid))?;
        }
        log::debug!("rmid {rmid} assigned to {} cpus", self.cpus.len());
        Ok(())
    }

    fn local_mem_traffic(&mut self, rmid: u32) -> Result<u64> {
        self.package_cpus
            .iter()
            .map(|&cpu| self.read_package(cpu, rmid))
            .sum()
    }
}

/// Checks the status bits of an `IA32_QM_CTR` value and returns its data field.
fn qm_ctr_data(ctr: u64) -> Result<u64> {
    if ctr & QM_CTR_ERROR != 0 {
        bail!("monitoring counter reported an error");
    }
    if ctr & QM_CTR_UNAVAILABLE != 0 {
        bail!("monitoring data unavailable");
    }
    Ok(bits(ctr, 61, 0))
}

#[cfg(target_arch = "x86_64")]
fn cpuid_upscale_factor() -> Result<u64> {
    let l3 = raw_cpuid::CpuId::new()
        .get_rdt_monitoring_info()
        .and_then(|info| info.l3_monitoring())
        .context("cpu does not support L3 resource monitoring")?;
    if !l3.has_local_bandwidth_monitoring() {
        bail!("cpu does not support local memory bandwidth monitoring");
    }
    match l3.conversion_factor() {
        0 => bail!("cpu does not report an L3 monitoring upscaling factor"),
        factor => Ok(factor.into()),
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn cpuid_upscale_factor() -> Result<u64> {
    bail!("memory bandwidth monitoring through msr requires x86_64")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::fake::FakeMsr;

    #[test]
    fn counter_status_bits() {
        assert_eq!(qm_ctr_data(1234).unwrap(), 1234);
        assert!(qm_ctr_data(QM_CTR_ERROR | 5).is_err());
        assert!(qm_ctr_data(QM_CTR_UNAVAILABLE).is_err());
    }

    #[test]
    fn rmid_keeps_class_of_service() {
        let fake = FakeMsr::new(2);
        fake.set(0, regs::IA32_PQR_ASSOC, 3 << 32 | 7);
        fake.set(1, regs::IA32_PQR_ASSOC, 0);
        let mut mon = MsrTraffic::with_parts(fake.clone(), vec![0, 1], vec![0], 64);
        mon.set_global_rmid(5).unwrap();
        assert_eq!(fake.get(0, regs::IA32_PQR_ASSOC), 3 << 32 | 5);
        assert_eq!(fake.get(1, regs::IA32_PQR_ASSOC), 5);
        assert!(mon.set_global_rmid(1024).is_err());
    }

    #[test]
    fn traffic_is_summed_over_packages() {
        let fake = FakeMsr::new(4);
        fake.set(0, regs::IA32_QM_CTR, 10);
        fake.set(2, regs::IA32_QM_CTR, 32);
        let mut mon = MsrTraffic::with_parts(fake.clone(), vec![0, 1, 2, 3], vec![0, 2], 64);
        assert_eq!(mon.local_mem_traffic(9).unwrap(), 42 * 64);
        assert_eq!(fake.get(2, regs::IA32_QM_EVTSEL), 9 << 32 | EVENT_LOCAL_MEM_BW);
        assert_eq!(fake.get(1, regs::IA32_QM_EVTSEL), 0);
        assert_eq!(fake.get(0, regs::IA32_QM_CTR), 10);
    }
}
