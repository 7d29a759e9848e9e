//! Runtime configuration read from `LLT_*` environment variables.
//!
//! | variable           | values                   | default                   |
//! |--------------------|--------------------------|---------------------------|
//! | `LLT_FORMAT`       | `text`, `csv`, `md`      | `text`                    |
//! | `LLT_TRAFFIC`      | `msr`, `resctrl`, `perf` | `msr`                     |
//! | `LLT_FREQ`         | `msr`, `cpufreq`         | `msr`                     |
//! | `LLT_RMID`         | integer                  | `0`                       |
//! | `LLT_RESCTRL_ROOT` | path                     | `/sys/fs/resctrl`         |
//! | `LLT_SYSFS_CPU`    | path                     | `/sys/devices/system/cpu` |
//!
//! Unrecognized values are reported with a warning and replaced by the default.

use std::{env, path::PathBuf, str::FromStr};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatKind {
    #[default]
    Text,
    Csv,
    Markdown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrafficKind {
    #[default]
    Msr,
    Resctrl,
    Perf,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FreqKind {
    #[default]
    Msr,
    Cpufreq,
}

/// Error for a value not in the list of supported choices.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownChoice {
    pub supported: &'static str,
}

impl FromStr for FormatKind {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FormatKind::Text),
            "csv" => Ok(FormatKind::Csv),
            "md" => Ok(FormatKind::Markdown),
            _ => Err(UnknownChoice {
                supported: "text, csv, md",
            }),
        }
    }
}

impl FromStr for TrafficKind {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msr" => Ok(TrafficKind::Msr),
            "resctrl" => Ok(TrafficKind::Resctrl),
            "perf" => Ok(TrafficKind::Perf),
            _ => Err(UnknownChoice {
                supported: "msr, resctrl, perf",
            }),
        }
    }
}

impl FromStr for FreqKind {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msr" => Ok(FreqKind::Msr),
            "cpufreq" => Ok(FreqKind::Cpufreq),
            _ => Err(UnknownChoice {
                supported: "msr, cpufreq",
            }),
        }
    }
}

/// Parses `value`, falling back to the default with a warning if it is not a supported choice.
fn choice_or_default<T: FromStr<Err = UnknownChoice> + Default>(var: &str, value: Option<&str>) -> T {
    match value {
        None => T::default(),
        Some(requested) => requested.parse().unwrap_or_else(|e: UnknownChoice| {
            log::warn!(
                "unrecognized value for {var}: {requested:?}. Supported values: {}",
                e.supported
            );
            T::default()
        }),
    }
}

const DEFAULT_RESCTRL_ROOT: &str = "/sys/fs/resctrl";
const DEFAULT_CPU_ROOT: &str = "/sys/devices/system/cpu";

fn path_or_default(value: Option<String>, default: &str) -> PathBuf {
    value
        .filter(|path| !path.is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}

/// Everything the binaries read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub format: FormatKind,
    pub traffic: TrafficKind,
    pub freq: FreqKind,
    pub rmid: u32,
    /// Mount point of the resctrl filesystem, used by [`TrafficKind::Resctrl`].
    pub resctrl_root: PathBuf,
    /// Sysfs cpu directory the online cpus and cpufreq files are read from.
    pub cpu_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            format: FormatKind::default(),
            traffic: TrafficKind::default(),
            freq: FreqKind::default(),
            rmid: 0,
            resctrl_root: PathBuf::from(DEFAULT_RESCTRL_ROOT),
            cpu_root: PathBuf::from(DEFAULT_CPU_ROOT),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let rmid = match lookup("LLT_RMID") {
            None => 0,
            Some(x) => x.trim().parse().unwrap_or_else(|_| {
                log::warn!("failed to parse LLT_RMID: {x:?}, using 0");
                0
            }),
        };
        Config {
            format: choice_or_default("LLT_FORMAT", lookup("LLT_FORMAT").as_deref()),
            traffic: choice_or_default("LLT_TRAFFIC", lookup("LLT_TRAFFIC").as_deref()),
            freq: choice_or_default("LLT_FREQ", lookup("LLT_FREQ").as_deref()),
            rmid,
            resctrl_root: path_or_default(lookup("LLT_RESCTRL_ROOT"), DEFAULT_RESCTRL_ROOT),
            cpu_root: path_or_default(lookup("LLT_SYSFS_CPU"), DEFAULT_CPU_ROOT),
        }
    }
}

#[test]
fn parse_choices() {
    assert_eq!("csv".parse(), Ok(FormatKind::Csv));
    assert_eq!("md".parse(), Ok(FormatKind::Markdown));
    assert_eq!("perf".parse(), Ok(TrafficKind::Perf));
    assert_eq!("cpufreq".parse(), Ok(FreqKind::Cpufreq));
    assert!("CSV".parse::<FormatKind>().is_err());
}

#[test]
fn config_defaults() {
    assert_eq!(Config::from_lookup(|_| None), Config::default());
    assert_eq!(Config::default().traffic, TrafficKind::Msr);
    assert_eq!(Config::default().resctrl_root, PathBuf::from("/sys/fs/resctrl"));
}

#[test]
fn config_from_lookup() {
    let config = Config::from_lookup(|var| {
        match var {
            "LLT_FORMAT" => Some("csv"),
            "LLT_TRAFFIC" => Some("resctrl"),
            "LLT_FREQ" => Some("bogus"),
            "LLT_RMID" => Some(" 3 "),
            "LLT_RESCTRL_ROOT" => Some("/mnt/resctrl"),
            _ => None,
        }
        .map(String::from)
    });
    assert_eq!(
        config,
        Config {
            format: FormatKind::Csv,
            traffic: TrafficKind::Resctrl,
            freq: FreqKind::Msr,
            rmid: 3,
            resctrl_root: PathBuf::from("/mnt/resctrl"),
            cpu_root: PathBuf::from("/sys/devices/system/cpu"),
        }
    );
    assert_eq!(Config::from_lookup(|_| Some("x".into())).rmid, 0);
}
