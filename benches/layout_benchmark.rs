//! Layout and write throughput for wide schemas.
//!
//! Run with: cargo bench --bench layout_benchmark

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use cdf1_rs::{AttributeList, Dataset, NcType, NcWriter, Values, VecWriter};

/// A dataset with `count` variables of mixed types and sizes, a fifth of
/// them record variables.
fn wide_dataset(count: usize) -> Dataset {
    let mut ds = Dataset::new();
    ds.add_dimension("time", 0).unwrap();
    ds.add_dimension("x", 16).unwrap();
    ds.add_dimension("y", 9).unwrap();
    for i in 0..count {
        let nc_type = NcType::ALL[i % NcType::ALL.len()];
        let dims: &[&str] = match i % 5 {
            0 => &["time", "x"],
            1 => &["x"],
            2 => &["x", "y"],
            3 => &["y"],
            _ => &[],
        };
        ds.declare_variable(&format!("var_{i}"), dims, nc_type, AttributeList::new())
            .unwrap();
    }
    ds
}

fn layout_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for count in [100, 1_000, 10_000] {
        let ds = wide_dataset(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("compute", count), &ds, |b, ds| {
            b.iter(|| black_box(ds.layout().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("virtual_size", count), &ds, |b, ds| {
            b.iter(|| black_box(ds.virtual_size().unwrap()))
        });
    }
    group.finish();
}

fn write_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    let count = 10_000;
    let mut ds = wide_dataset(count);
    let first = ds.variable("var_0").unwrap();
    for record in 0..8 {
        ds.write(first, record, &Values::Byte(vec![1; 16])).unwrap();
    }
    let size = ds.virtual_size().unwrap();
    group.throughput(Throughput::Bytes(size));
    group.bench_function(BenchmarkId::new("write_dataset", count), |b| {
        b.iter(|| {
            let mut writer = NcWriter::from_writer(VecWriter::with_capacity(size as usize));
            black_box(writer.write_dataset(&mut ds).unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, layout_benchmarks, write_benchmarks);
criterion_main!(benches);
