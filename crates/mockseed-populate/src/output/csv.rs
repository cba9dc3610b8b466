use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mockseed_core::{Field, Record};

/// Write the records of one composite as CSV.
///
/// Columns follow the field declaration order. System fields take the
/// record identity and multi-valued relations are written as `;`-joined ids.
pub fn write_composite_csv(
    path: &Path,
    fields: &[Field],
    records: &[Record],
) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    let header: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    writer.write_record(&header)?;

    for record in records {
        let row: Vec<String> = fields.iter().map(|field| cell(field, record)).collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

fn cell(field: &Field, record: &Record) -> String {
    if field.is_system() {
        return record.id.map(|id| id.to_string()).unwrap_or_default();
    }
    if field.is_multi_valued() {
        let ids: Vec<String> = record
            .related(&field.name)
            .iter()
            .map(|id| id.to_string())
            .collect();
        return ids.join(";");
    }
    record
        .get(&field.name)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
