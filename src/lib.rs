//! Probes for cache partitioning and memory bandwidth experiments.
//!
//! This crate backs two command line tools:
//!
//! - `traverse_list <list size in KB>` walks a randomized circular list and
//!   reports the memory bandwidth it generated, measured with a hardware
//!   memory traffic counter ([`TrafficMonitor`]).
//! - `get_freq [-a] [-c <core>]` prints the target and current frequency of
//!   the selected cores ([`FreqControl`]).
//!
//! Both tools are configured through `LLT_*` environment variables, see [`config`].
//! Hardware access sits behind the [`TrafficMonitor`] and [`FreqControl`]
//! traits so other sources can be substituted.

mod record;

pub mod config;
pub mod cpus;
pub mod formats;
pub mod freq;
pub mod list;
pub mod measure;
#[cfg(target_os = "linux")]
pub mod msr;
pub mod select;
pub mod traffic;
pub mod traverse;

pub use config::Config;
pub use formats::{Format, format_for};
pub use freq::{FreqControl, FreqRecord, freq_control};
pub use list::CircularList;
pub use record::Record;
pub use select::{SelectionError, parse_core_selection};
pub use traffic::{TrafficMonitor, traffic_monitor};
pub use traverse::TraversalRecord;
