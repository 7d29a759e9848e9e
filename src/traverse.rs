//! The pointer chasing bandwidth benchmark.
//!
//! The total number of nodes visited is roughly constant: smaller lists are
//! walked more often, so every run covers [`TRAVERSAL_BUDGET_KB`] kilobytes of
//! node storage.

use crate::{
    list::{CircularList, ListElem},
    measure::{Measurement, measure},
    struct_record,
    traffic::TrafficMonitor,
};
use anyhow::{Result, bail};
use std::{fmt, mem};

pub const TRAVERSAL_BUDGET_KB: usize = 1000 * 12 * 1024;

/// Number of full walks over a list of `list_kb` kilobytes.
pub fn rounds_for(list_kb: usize) -> usize {
    rounds_within(TRAVERSAL_BUDGET_KB, list_kb)
}

fn rounds_within(budget_kb: usize, list_kb: usize) -> usize {
    budget_kb / list_kb
}

/// The usage line, naming the program by its `argv[0]` if there is one.
pub fn usage(args: &[String]) -> String {
    let prog = args.first().map_or("traverse_list", String::as_str);
    format!("Usage: {prog} <list size in KB>")
}

/// Parses the list size argument.
pub fn parse_list_kb(arg: &str) -> Result<usize> {
    let Ok(kb) = arg.trim().parse::<usize>() else {
        bail!("list size must be a positive number of KB, got {arg:?}");
    };
    if kb == 0 {
        bail!("list size must be at least 1 KB");
    }
    if kb.checked_mul(1024).is_none() {
        bail!("list size of {kb} KB is too large");
    }
    Ok(kb)
}

/// Formats an optional bandwidth, `n/a` when it could not be computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mbps(pub Option<f64>);

impl fmt::Display for Mbps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(x) => write!(f, "{x}"),
            None => write!(f, "n/a"),
        }
    }
}

struct_record! {
    #[derive(Clone, Debug, PartialEq)]
    pub struct TraversalRecord {
        pub list_kb: usize,
        pub list_elems: usize,
        pub elem_size: usize,
        pub rounds: usize,
        pub traffic_bytes: f64,
        pub elapsed_ms: f64,
        pub bandwidth_mbps: Mbps,
        pub cur: usize,
    }
}

impl fmt::Display for TraversalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "listElems = {} (ListElem size = {})",
            self.list_elems, self.elem_size
        )?;
        writeln!(f, "Local Memory Traffic = {} bytes", self.traffic_bytes)?;
        writeln!(f, "Elapsed Time = {} msec", self.elapsed_ms)?;
        writeln!(f, "Bandwidth = {} mbps", self.bandwidth_mbps)?;
        write!(f, "Cur: {}", self.cur)
    }
}

/// Builds a list of `list_kb` kilobytes and measures the bandwidth of walking it.
///
/// Traffic is accounted to `rmid`, which is made the global monitoring id first.
pub fn run(list_kb: usize, rmid: u32, monitor: &mut dyn TrafficMonitor) -> Result<TraversalRecord> {
    run_with_budget(list_kb, TRAVERSAL_BUDGET_KB, rmid, monitor)
}

fn run_with_budget(
    list_kb: usize,
    budget_kb: usize,
    rmid: u32,
    monitor: &mut dyn TrafficMonitor,
) -> Result<TraversalRecord> {
    monitor.set_global_rmid(rmid)?;
    let list = CircularList::with_footprint_kb(list_kb);
    log::info!(
        "listElems = {} (ListElem size = {})",
        list.len(),
        mem::size_of::<ListElem>()
    );
    log::debug!(
        "list order starts with {:?}",
        list.successors(0).take(8).collect::<Vec<_>>()
    );
    let rounds = rounds_within(budget_kb, list_kb);
    let (cur, m): (usize, Measurement) = measure(monitor, rmid, || list.traverse(rounds))?;
    Ok(TraversalRecord {
        list_kb,
        list_elems: list.len(),
        elem_size: mem::size_of::<ListElem>(),
        rounds,
        traffic_bytes: m.traffic_bytes,
        elapsed_ms: m.elapsed_ms,
        bandwidth_mbps: Mbps(m.bandwidth_mbps()),
        cur,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        formats::{Csv, Format, Text},
        record::Record,
        traffic::fake::ScriptedTraffic,
    };

    #[test]
    fn usage_line() {
        assert_eq!(
            usage(&["./traverse_list".to_string()]),
            "Usage: ./traverse_list <list size in KB>"
        );
        assert_eq!(usage(&[]), "Usage: traverse_list <list size in KB>");
    }

    #[test]
    fn rounds_scale_inversely() {
        assert_eq!(rounds_for(1), 12_288_000);
        assert_eq!(rounds_for(1024), 12_000);
        assert_eq!(rounds_for(TRAVERSAL_BUDGET_KB + 1), 0);
    }

    #[test]
    fn list_size_argument() {
        assert_eq!(parse_list_kb("256").unwrap(), 256);
        assert_eq!(parse_list_kb(" 8\n").unwrap(), 8);
        assert!(parse_list_kb("0").is_err());
        assert!(parse_list_kb("-4").is_err());
        assert!(parse_list_kb("4k").is_err());
        assert!(parse_list_kb("").is_err());
        assert!(parse_list_kb(&usize::MAX.to_string()).is_err());
    }

    #[test]
    fn run_reports_traffic() {
        let list_kb = 16;
        let mut monitor = ScriptedTraffic::new(&[5_000, 5_000 + (1 << 20)]);
        let record = run_with_budget(list_kb, 16 * 40, 0, &mut monitor).unwrap();
        assert_eq!(monitor.rmid, Some(0));
        assert_eq!(record.rounds, 40);
        assert_eq!(record.list_elems, list_kb * 1024 / mem::size_of::<usize>());
        assert_eq!(record.elem_size, mem::size_of::<usize>());
        assert_eq!(record.traffic_bytes, (1 << 20) as f64);
        assert_eq!(record.cur, 0);
        match record.bandwidth_mbps.0 {
            Some(bw) => assert!((bw - record.traffic_bytes / record.elapsed_ms * 1e-3).abs() < 1e-6),
            None => assert!(record.elapsed_ms <= 0.0),
        }
    }

    #[test]
    fn run_requires_rmid() {
        struct Refuse;
        impl TrafficMonitor for Refuse {
            fn set_global_rmid(&mut self, rmid: u32) -> Result<()> {
                bail!("cannot assign rmid {rmid}")
            }
            fn local_mem_traffic(&mut self, _rmid: u32) -> Result<u64> {
                unreachable!()
            }
        }
        assert!(run(4, 1, &mut Refuse).is_err());
    }

    fn sample() -> TraversalRecord {
        TraversalRecord {
            list_kb: 4,
            list_elems: 512,
            elem_size: 8,
            rounds: 3_072_000,
            traffic_bytes: 1024.0,
            elapsed_ms: 2.5,
            bandwidth_mbps: Mbps(Some(0.4096)),
            cur: 0,
        }
    }

    #[test]
    fn text_output() {
        let mut out: Vec<u8> = Vec::new();
        Text.push(&mut out, &sample()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "listElems = 512 (ListElem size = 8)\n\
             Local Memory Traffic = 1024 bytes\n\
             Elapsed Time = 2.5 msec\n\
             Bandwidth = 0.4096 mbps\n\
             Cur: 0\n"
        );
    }

    #[test]
    fn zero_duration_text() {
        let record = TraversalRecord {
            elapsed_ms: 0.0,
            bandwidth_mbps: Mbps(None),
            ..sample()
        };
        assert!(record.to_string().contains("Bandwidth = n/a mbps"));
    }

    #[test]
    fn csv_output() {
        let mut out: Vec<u8> = Vec::new();
        let mut csv = Csv::new();
        csv.push(&mut out, &sample()).unwrap();
        Format::<TraversalRecord>::finish(&mut csv, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            format!(
                "{}\n4,512,8,3072000,1024,2.5,0.4096,0\n",
                TraversalRecord::names().join(",")
            )
        );
    }
}
