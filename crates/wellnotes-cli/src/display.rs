//! Terminal rendering for comment tables.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

/// Print `batch` as a boxed table under a heading.
pub fn print_table(title: &str, batch: &RecordBatch) -> anyhow::Result<()> {
    println!("{title} ({} rows)", batch.num_rows());
    if batch.num_rows() == 0 {
        return Ok(());
    }
    println!("{}", pretty_format_batches(std::slice::from_ref(batch))?);
    Ok(())
}
