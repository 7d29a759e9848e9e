use super::Format;
use crate::record::{Record, value_strings};
use anyhow::Result;
use std::io::Write;

/// Comma separated values with a header row before the first record.
pub struct Csv {
    header_written: bool,
}

impl Default for Csv {
    fn default() -> Self {
        Self::new()
    }
}

impl Csv {
    pub fn new() -> Self {
        Csv {
            header_written: false,
        }
    }
}

impl<R: Record> Format<R> for Csv {
    fn push(&mut self, out: &mut dyn Write, record: &R) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        if !self.header_written {
            self.header_written = true;
            writer.write_record(R::names())?;
        }
        writer.write_record(value_strings(record))?;
        writer.flush()?;
        Ok(())
    }

    fn finish(&mut self, _out: &mut dyn Write) -> Result<()> {
        self.header_written = false;
        Ok(())
    }
}
