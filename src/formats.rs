mod csv;
mod tabled;
mod text;

pub use self::csv::Csv;
pub use self::tabled::Tabled;
pub use text::Text;

use crate::{config::FormatKind, record::Record};
use anyhow::Result;
use std::io::Write;

/// An output format for a stream of records of type `R`.
///
/// Formats may write as records arrive or buffer them until [`finish`](Format::finish).
pub trait Format<R: Record> {
    fn push(&mut self, out: &mut dyn Write, record: &R) -> Result<()>;
    /// Called once after the last record.
    fn finish(&mut self, out: &mut dyn Write) -> Result<()>;
}

impl<R: Record> Format<R> for Box<dyn Format<R>> {
    fn push(&mut self, out: &mut dyn Write, record: &R) -> Result<()> {
        (**self).push(out, record)
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        (**self).finish(out)
    }
}

pub fn format_for<R: Record + 'static>(kind: FormatKind) -> Box<dyn Format<R>> {
    match kind {
        FormatKind::Text => Box::new(Text),
        FormatKind::Csv => Box::new(Csv::new()),
        FormatKind::Markdown => Box::new(Tabled::new()),
    }
}
