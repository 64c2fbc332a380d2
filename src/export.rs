use std::io::Write;

use crate::analysis::SlideDwell;
use crate::error::PersistenceError;
use crate::session::SessionRecord;

/// Write every sample of `record` as a CSV row, header included.
pub fn write_entries_csv<W: Write>(record: &SessionRecord, writer: W) -> Result<(), PersistenceError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in &record.entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `slide,seconds` rows in slide order.
pub fn write_dwell_csv<W: Write>(dwell: &SlideDwell, writer: W) -> Result<(), PersistenceError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["slide", "seconds"])?;
    for (slide, secs) in dwell {
        wtr.write_record([slide.to_string(), secs.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
