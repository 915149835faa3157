// JSON Lines persistence for generated records.
//
// One record per line, in the order given. Records carry no version field:
// they can always be regenerated from the configuration, so a file is a
// snapshot, not a source of truth.

use crate::record::ContentRecord;
use std::io::{self, BufRead, Write};

/// Write each record as one JSON line. Returns the number written.
pub fn write_jsonl<I, W>(records: I, out: &mut W) -> io::Result<usize>
where
    I: IntoIterator,
    I::Item: AsRef<ContentRecord>,
    W: Write,
{
    let mut written = 0;
    for record in records {
        serde_json::to_writer(&mut *out, record.as_ref())?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// Read records written by `write_jsonl`. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(input: R) -> io::Result<Vec<ContentRecord>> {
    let mut records = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("line {}: {e}", number + 1))
        })?;
        records.push(record);
    }
    Ok(records)
}
