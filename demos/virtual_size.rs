//! Example: sizing a large schema before any data exists
//!
//! Declares thousands of variables, reports the layout without allocating
//! data, and shows where the 32-bit offset range runs out.
//!
//! Run with: cargo run --example virtual_size

use cdf1_rs::{AttributeList, Dataset, Error, NcType, Result};

fn main() -> Result<()> {
    let mut ds = Dataset::new();
    ds.add_dimension("time", 0)?;
    ds.add_dimension("lat", 180)?;
    ds.add_dimension("lon", 360)?;

    for i in 0..5_000 {
        ds.declare_variable(&format!("static_{i}"), &["lat"], NcType::Short, AttributeList::new())?;
    }
    ds.declare_variable("field", &["time", "lat", "lon"], NcType::Float, AttributeList::new())?;

    let layout = ds.layout()?;
    println!("Header size:      {} bytes", layout.header_size);
    println!("Nonrecord end:    {} bytes", layout.nonrecord_end);
    println!("Record stride:    {} bytes", layout.record_stride);
    println!("Buffers allocated: {} bytes", ds.allocated_bytes());

    let max = ds.max_records()?;
    println!("Max records:      {}", max);

    ds.set_numrecs(max as usize)?;
    println!("Size at max:      {} bytes", ds.virtual_size()?);

    match ds.set_numrecs(max as usize + 1) {
        Err(Error::Overflow(what)) => println!("One more record: {what} overflows"),
        other => println!("Unexpected: {other:?}"),
    }

    if let Some(path) = std::env::args().nth(1) {
        layout.save_to_file(&path)?;
        println!("Layout saved to {}", path);
    }
    Ok(())
}
