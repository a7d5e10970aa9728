//! CSV export for dispatch records and price series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::market::PricePoint;
use crate::sim::types::DispatchRecord;

/// Column header for dispatch result export.
const DISPATCH_HEADER: &str =
    "timestamp,battery_id,action,mw,price,revenue,soe_before,soe_after";

/// Column header for price series export.
const PRICE_HEADER: &str = "timestamp,price_mwh";

/// Exports dispatch records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per record, in record order.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_dispatch_csv(records: &[DispatchRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_dispatch_csv(records, buf)
}

/// Writes dispatch records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_dispatch_csv(records: &[DispatchRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(DISPATCH_HEADER.split(','))?;

    for r in records {
        wtr.write_record(&[
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.battery_id.clone(),
            r.action.as_str().to_string(),
            format!("{:.4}", r.mw),
            format!("{:.2}", r.price_mwh),
            format!("{:.4}", r.revenue),
            format!("{:.4}", r.soe_before_mwh),
            format!("{:.4}", r.soe_after_mwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a price series to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_price_csv(prices: &[PricePoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_price_csv(prices, buf)
}

/// Writes a price series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_price_csv(prices: &[PricePoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(PRICE_HEADER.split(','))?;

    for p in prices {
        wtr.write_record(&[
            p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.2}", p.price_mwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
