//! Prints target and current frequency of the cores selected with `-a` or `-c <core>`.

use lltools::{Config, FreqRecord, format_for, freq, freq_control, parse_core_selection};
use std::{env, io::stdout};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::from_env();
    let mut ctrl = freq_control(&config)?;
    let args: Vec<String> = env::args().skip(1).collect();
    let cores = parse_core_selection(&args, ctrl.num_cores())?;

    let mut format = format_for::<FreqRecord>(config.format);
    freq::report(&mut *ctrl, &cores, &mut *format, &mut stdout().lock())
}
