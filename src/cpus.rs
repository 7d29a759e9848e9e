use anyhow::{Context, Result, bail};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Parses a kernel cpu list such as `0-3,8,10-11`.
pub fn parse_cpu_list(list: &str) -> Result<Vec<usize>> {
    let mut cpus = Vec::new();
    for part in list.trim().split(',').filter(|x| !x.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: usize = lo.parse().with_context(|| format!("bad cpu range {part:?}"))?;
                let hi: usize = hi.parse().with_context(|| format!("bad cpu range {part:?}"))?;
                if hi < lo {
                    bail!("bad cpu range {part:?}");
                }
                cpus.extend(lo..=hi);
            }
            None => cpus.push(part.parse().with_context(|| format!("bad cpu {part:?}"))?),
        }
    }
    Ok(cpus)
}

/// The cpu topology as exposed by sysfs.
#[derive(Clone, Debug)]
pub struct SysCpu {
    root: PathBuf,
}

impl Default for SysCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl SysCpu {
    pub fn new() -> Self {
        Self::with_root("/sys/devices/system/cpu")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        SysCpu { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file below `cpu<n>/`.
    pub fn cpu_file(&self, cpu: usize, rel: &str) -> PathBuf {
        self.root.join(format!("cpu{cpu}")).join(rel)
    }

    pub fn online(&self) -> Result<Vec<usize>> {
        let path = self.root.join("online");
        let list =
            fs::read_to_string(&path).with_context(|| format!("failed to read {path:?}"))?;
        parse_cpu_list(&list)
    }

    pub fn package_id(&self, cpu: usize) -> Result<usize> {
        read_number(&self.cpu_file(cpu, "topology/physical_package_id"))
    }

    /// The lowest numbered online cpu of every package.
    pub fn one_per_package(&self) -> Result<Vec<usize>> {
        let mut packages = BTreeMap::new();
        for cpu in self.online()? {
            packages.entry(self.package_id(cpu)?).or_insert(cpu);
        }
        Ok(packages.into_values().collect())
    }
}

/// Reads a file holding a single decimal number.
pub fn read_number<T: std::str::FromStr>(path: &Path) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
    text.trim()
        .parse()
        .with_context(|| format!("unexpected content in {path:?}: {:?}", text.trim()))
}
