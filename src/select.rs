//! Core selection from `-a` / `-c <core>` flags.
//!
//! Parsing follows getopt with the option string `"ac:"`: flags may be
//! clustered (`-ac 3`), the core may be attached (`-c3`), `--` ends option
//! parsing, and words that are not options are skipped. Unknown option
//! characters are ignored with a warning. Every `-a` or `-c` replaces the
//! selection made so far.

use std::{error::Error, fmt};

#[derive(Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// `-c` was the last argument.
    MissingValue,
    /// The argument of `-c` is not a core index.
    InvalidCore(String),
    CoreOutOfRange { core: usize, num_cores: usize },
    NoCoresSelected,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::MissingValue => write!(f, "option -c requires a core index"),
            SelectionError::InvalidCore(x) => write!(f, "invalid core index {x:?}"),
            SelectionError::CoreOutOfRange { core, num_cores } => {
                write!(f, "core {core} out of range, this system has {num_cores} cores")
            }
            SelectionError::NoCoresSelected => {
                write!(f, "no cores selected, use -a for all cores or -c <core>")
            }
        }
    }
}

impl Error for SelectionError {}

/// Returns the selected core indices in the order they will be reported.
pub fn parse_core_selection<S: AsRef<str>>(
    args: &[S],
    num_cores: usize,
) -> Result<Vec<usize>, SelectionError> {
    let mut cores = Vec::new();
    let mut args = args.iter().map(AsRef::as_ref);
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        let Some(flags) = arg.strip_prefix('-').filter(|x| !x.is_empty()) else {
            continue;
        };
        for (i, flag) in flags.char_indices() {
            match flag {
                'a' => cores = (0..num_cores).collect(),
                'c' => {
                    let attached = &flags[i + 1..];
                    let value = if attached.is_empty() {
                        args.next().ok_or(SelectionError::MissingValue)?
                    } else {
                        attached
                    };
                    let core = value
                        .parse()
                        .map_err(|_| SelectionError::InvalidCore(value.to_string()))?;
                    if core >= num_cores {
                        return Err(SelectionError::CoreOutOfRange { core, num_cores });
                    }
                    cores = vec![core];
                    break;
                }
                other => log::warn!("invalid option -- '{other}'"),
            }
        }
    }
    if cores.is_empty() {
        return Err(SelectionError::NoCoresSelected);
    }
    Ok(cores)
}
