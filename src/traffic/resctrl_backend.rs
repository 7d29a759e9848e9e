use super::TrafficMonitor;
use crate::cpus::read_number;
use anyhow::{Context, Result, bail};
use std::{fs, path::PathBuf};

/// A [`TrafficMonitor`] reading memory bandwidth monitoring data from the resctrl filesystem.
///
/// The kernel owns RMID assignment when resctrl is mounted, so only the
/// default group (RMID 0) is supported. Its `mbm_local_bytes` files, one per
/// L3 domain, are summed.
pub struct ResctrlTraffic {
    root: PathBuf,
}

impl ResctrlTraffic {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        ResctrlTraffic { root: root.into() }
    }

    fn check_rmid(rmid: u32) -> Result<()> {
        if rmid != 0 {
            bail!("resctrl assigns rmids itself; only the default group (rmid 0) is supported, got {rmid}");
        }
        Ok(())
    }
}

impl TrafficMonitor for ResctrlTraffic {
    fn set_global_rmid(&mut self, rmid: u32) -> Result<()> {
        Self::check_rmid(rmid)
    }

    fn local_mem_traffic(&mut self, rmid: u32) -> Result<u64> {
        Self::check_rmid(rmid)?;
        let mon_data = self.root.join("mon_data");
        let mut total = 0;
        let mut domains = 0;
        for entry in fs::read_dir(&mon_data).with_context(|| format!("failed to list {mon_data:?}"))? {
            let entry = entry?;
            if !entry.file_name().to_string_lossy().starts_with("mon_L3_") {
                continue;
            }
            total += read_number::<u64>(&entry.path().join("mbm_local_bytes"))?;
            domains += 1;
        }
        if domains == 0 {
            bail!("no L3 monitoring domains in {mon_data:?}");
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpus::fake::FakeSysfs;

    #[test]
    fn sums_l3_domains() {
        let dir = FakeSysfs::new("resctrl");
        dir.write("mon_data/mon_L3_00/mbm_local_bytes", "1000\n");
        dir.write("mon_data/mon_L3_01/mbm_local_bytes", "234\n");
        dir.write("mon_data/mon_MB_00/other", "999\n");
        let mut mon = ResctrlTraffic::with_root(&dir.root);
        mon.set_global_rmid(0).unwrap();
        assert_eq!(mon.local_mem_traffic(0).unwrap(), 1234);
    }

    #[test]
    fn only_default_group() {
        let dir = FakeSysfs::new("resctrl-rmid");
        dir.write("mon_data/mon_L3_00/mbm_local_bytes", "1\n");
        let mut mon = ResctrlTraffic::with_root(&dir.root);
        assert!(mon.set_global_rmid(2).is_err());
        assert!(mon.local_mem_traffic(2).is_err());
    }

    #[test]
    fn no_domains() {
        let dir = FakeSysfs::new("resctrl-empty");
        dir.write("mon_data/README", "");
        let err = ResctrlTraffic::with_root(&dir.root)
            .local_mem_traffic(0)
            .unwrap_err();
        assert!(err.to_string().contains("no L3 monitoring domains"));
    }
}
