//! Example: writing a CDF-1 file and reading its header back
//!
//! Run with: cargo run --example write_file

use cdf1_rs::{Attribute, AttributeList, Dataset, HeaderInfo, NcType, NcWriter, Result, Values};

fn main() -> Result<()> {
    let path = std::env::temp_dir().join("example.nc");
    let path_str = path.to_str().unwrap();

    let mut ds = Dataset::new();
    ds.set_attribute(Attribute::text("title", "weather stations"))?;
    ds.add_dimension("time", 0)?;
    ds.add_dimension("station", 3)?;

    let elevation = ds.declare_variable(
        "elevation",
        &["station"],
        NcType::Float,
        AttributeList::new().with(Attribute::text("units", "m")),
    )?;
    let time = ds.declare_variable(
        "time",
        &["time"],
        NcType::Double,
        AttributeList::new().with(Attribute::text("units", "hours since 2024-01-01")),
    )?;
    let temp = ds.declare_variable(
        "temp",
        &["time", "station"],
        NcType::Float,
        AttributeList::new()
            .with(Attribute::text("units", "degC"))
            .with(Attribute::new("valid_range", vec![-60.0f32, 60.0])),
    )?;
    // Declared but never written: stored as zeros.
    ds.declare_variable("quality", &["station"], NcType::Byte, AttributeList::new())?;

    ds.write(elevation, 0, &Values::Float(vec![12.0, 250.5, 1800.0]))?;
    for hour in 0..24 {
        ds.write(time, hour, &Values::Double(vec![hour as f64]))?;
        let base = 10.0 + (hour as f32 / 4.0);
        ds.write(temp, hour, &Values::Float(vec![base, base - 2.0, base - 11.5]))?;
    }

    println!("Records: {}", ds.numrecs());
    println!("Expected size: {} bytes", ds.virtual_size()?);

    let mut writer = NcWriter::new(path_str)?;
    let written = writer.write_dataset(&mut ds)?;
    drop(writer);
    println!("Wrote {} bytes to {}", written, path_str);

    let bytes = std::fs::read(&path)?;
    let info = HeaderInfo::parse(&bytes)?;
    println!("Header: {} bytes, numrecs {:?}", info.header_size, info.numrecs);
    for var in &info.variables {
        println!(
            "  {:<10} {:<6} dims {:?} vsize {:>4} begin {}",
            var.name, var.nc_type.to_string(), var.dim_ids, var.vsize, var.begin
        );
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
