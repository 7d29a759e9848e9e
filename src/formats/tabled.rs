use super::Format;
use crate::record::{Record, value_strings};
use anyhow::Result;
use std::{io::Write, mem};
use tabled::settings::Style;

/// A markdown table, printed once all records have arrived.
pub struct Tabled {
    rows: Vec<Vec<String>>,
}

impl Default for Tabled {
    fn default() -> Self {
        Self::new()
    }
}

impl Tabled {
    pub fn new() -> Self {
        Tabled { rows: Vec::new() }
    }
}

impl<R: Record> Format<R> for Tabled {
    fn push(&mut self, _out: &mut dyn Write, record: &R) -> Result<()> {
        self.rows.push(value_strings(record));
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        let mut table = tabled::builder::Builder::new();
        table.push_record(R::names().iter().copied());
        for row in mem::take(&mut self.rows) {
            table.push_record(row);
        }
        let mut table = table.build();
        table.with(Style::markdown());
        writeln!(out, "{table}")?;
        Ok(())
    }
}
