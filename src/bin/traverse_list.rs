//! Walks a randomized circular list of the given size and reports the memory
//! bandwidth measured by the traffic monitor.

use lltools::{Config, Format, TraversalRecord, format_for, traffic_monitor, traverse};
use std::{env, io::stdout, process};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args: Vec<String> = env::args().collect();
    let Some(size) = args.get(1) else {
        println!("{}", traverse::usage(&args));
        process::exit(1);
    };
    let list_kb = traverse::parse_list_kb(size)?;

    let config = Config::from_env();
    let mut monitor = traffic_monitor(&config)?;
    let record = traverse::run(list_kb, config.rmid, &mut *monitor)?;

    let mut format = format_for::<TraversalRecord>(config.format);
    let mut out = stdout().lock();
    format.push(&mut out, &record)?;
    format.finish(&mut out)
}
