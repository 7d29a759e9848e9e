use anyhow::{Context, Result};
use std::{
    fs::{File, OpenOptions},
    os::unix::fs::FileExt,
    path::PathBuf,
};

/// Model specific registers used by the traffic and frequency backends.
pub mod regs {
    pub const IA32_PERF_STATUS: u32 = 0x198;
    pub const IA32_PERF_CTL: u32 = 0x199;
    pub const MSR_PLATFORM_INFO: u32 = 0xCE;
    pub const IA32_QM_EVTSEL: u32 = 0xC8D;
    pub const IA32_QM_CTR: u32 = 0xC8E;
    pub const IA32_PQR_ASSOC: u32 = 0xC8F;
}

/// Register level access to model specific registers.
pub trait MsrAccess {
    fn read(&self, cpu: usize, reg: u32) -> Result<u64>;
    fn write(&self, cpu: usize, reg: u32, value: u64) -> Result<()>;
}

/// Access to model specific registers through the `msr` kernel driver.
///
/// Each CPU has a device file `<root>/<cpu>/msr`. A register is read or
/// written as 8 little-endian bytes at the offset equal to its address.
/// Requires the `msr` module to be loaded and usually root privileges.
#[derive(Clone, Debug)]
pub struct Msr {
    root: PathBuf,
}

impl Default for Msr {
    fn default() -> Self {
        Self::new()
    }
}

impl Msr {
    pub fn new() -> Self {
        Self::with_root("/dev/cpu")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Msr { root: root.into() }
    }

    fn device(&self, cpu: usize) -> PathBuf {
        self.root.join(cpu.to_string()).join("msr")
    }
}

impl MsrAccess for Msr {
    fn read(&self, cpu: usize, reg: u32) -> Result<u64> {
        let path = self.device(cpu);
        let file = File::open(&path).with_context(|| format!("failed to open {path:?}"))?;
        let mut buf = [0u8; 8];
        file.read_exact_at(&mut buf, reg.into())
            .with_context(|| format!("failed to read msr {reg:#x} on cpu {cpu}"))?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write(&self, cpu: usize, reg: u32, value: u64) -> Result<()> {
        let path = self.device(cpu);
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open {path:?} for writing"))?;
        file.write_all_at(&value.to_le_bytes(), reg.into())
            .with_context(|| format!("failed to write msr {reg:#x} on cpu {cpu}"))
    }
}

/// Extracts bits `lo..=hi` of `value`.
pub fn bits(value: u64, hi: u32, lo: u32) -> u64 {
    let width = hi - lo + 1;
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    (value >> lo) & mask
}

#[cfg(test)]
pub(crate) mod fake {
    use super::MsrAccess;
    use anyhow::{Result, bail};
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    /// In-memory registers of `cpus` cpus. Clones share the same registers.
    ///
    /// Registers never written read as 0.
    #[derive(Clone, Default)]
    pub struct FakeMsr {
        cpus: usize,
        regs: Rc<RefCell<HashMap<(usize, u32), u64>>>,
    }

    impl FakeMsr {
        pub fn new(cpus: usize) -> Self {
            FakeMsr {
                cpus,
                regs: Rc::default(),
            }
        }

        pub fn set(&self, cpu: usize, reg: u32, value: u64) {
            self.regs.borrow_mut().insert((cpu, reg), value);
        }

        pub fn get(&self, cpu: usize, reg: u32) -> u64 {
            self.regs.borrow().get(&(cpu, reg)).copied().unwrap_or(0)
        }

        fn check_cpu(&self, cpu: usize) -> Result<()> {
            if cpu >= self.cpus {
                bail!("no msr device for cpu {cpu}");
            }
            Ok(())
        }
    }

    impl MsrAccess for FakeMsr {
        fn read(&self, cpu: usize, reg: u32) -> Result<u64> {
            self.check_cpu(cpu)?;
            Ok(self.get(cpu, reg))
        }

        fn write(&self, cpu: usize, reg: u32, value: u64) -> Result<()> {
            self.check_cpu(cpu)?;
            self.set(cpu, reg, value);
            Ok(())
        }
    }
}
