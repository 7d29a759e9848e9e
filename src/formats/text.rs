use super::Format;
use crate::record::Record;
use anyhow::Result;
use std::io::Write;

/// Prints every record with its [`Display`](std::fmt::Display) impl, one per line.
pub struct Text;

impl<R: Record> Format<R> for Text {
    fn push(&mut self, out: &mut dyn Write, record: &R) -> Result<()> {
        writeln!(out, "{record}")?;
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        out.flush()?;
        Ok(())
    }
}
