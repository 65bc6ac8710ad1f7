//! Property-based tests for the layout engine.
//!
//! Random schemas are laid out and checked against the alignment, ordering
//! and contiguity rules every CDF-1 file must satisfy.

use proptest::prelude::*;

use cdf1_rs::{AttributeList, Dataset, HeaderInfo, NcType, NumRecs};

const FIXED_DIMS: [(&str, usize); 4] = [("one", 1), ("three", 3), ("five", 5), ("seven", 7)];

#[derive(Debug, Clone)]
struct VarSpec {
    nc_type: NcType,
    is_record: bool,
    dims: Vec<usize>,
}

fn nc_type_strategy() -> impl Strategy<Value = NcType> {
    prop::sample::select(NcType::ALL.to_vec())
}

fn var_strategy() -> impl Strategy<Value = VarSpec> {
    (
        nc_type_strategy(),
        any::<bool>(),
        prop::collection::vec(0..FIXED_DIMS.len(), 0..3),
    )
        .prop_map(|(nc_type, is_record, dims)| VarSpec {
            nc_type,
            is_record,
            dims,
        })
}

fn build(specs: &[VarSpec]) -> Dataset {
    let mut ds = Dataset::new();
    ds.add_dimension("time", 0).unwrap();
    for (name, size) in FIXED_DIMS {
        ds.add_dimension(name, size).unwrap();
    }
    for (i, spec) in specs.iter().enumerate() {
        let mut dims: Vec<&str> = Vec::new();
        if spec.is_record {
            dims.push("time");
        }
        dims.extend(spec.dims.iter().map(|&d| FIXED_DIMS[d].0));
        ds.declare_variable(&format!("v{i}"), &dims, spec.nc_type, AttributeList::new())
            .unwrap();
    }
    ds
}

proptest! {
    /// Every variable starts on a 4-byte boundary and only the exempt
    /// variable may carry an unpadded size.
    #[test]
    fn offsets_are_aligned(specs in prop::collection::vec(var_strategy(), 0..24)) {
        let ds = build(&specs);
        let layout = ds.layout().unwrap();
        prop_assert_eq!(layout.header_size % 4, 0);

        let record_count = layout.record_variables().count();
        let last_nonrecord = layout
            .serialization_order()
            .filter(|v| !v.is_record)
            .last()
            .map(|v| v.var);

        for v in layout.variables() {
            prop_assert_eq!(v.begin % 4, 0, "variable {} misaligned", v.name);
            prop_assert!(v.padding() < 4);
            let exempt = if v.is_record {
                record_count == 1
            } else {
                record_count == 0 && Some(v.var) == last_nonrecord
            };
            if exempt {
                prop_assert_eq!(v.padded_size, v.vsize);
            } else {
                prop_assert_eq!(v.padded_size % 4, 0);
            }
        }
    }

    /// Variables are contiguous in serialization order, nonrecord ones
    /// sorted by descending size.
    #[test]
    fn offsets_are_contiguous(specs in prop::collection::vec(var_strategy(), 0..24)) {
        let ds = build(&specs);
        let layout = ds.layout().unwrap();

        let mut offset = layout.header_size;
        let mut previous_size = u64::MAX;
        for v in layout.serialization_order().filter(|v| !v.is_record) {
            prop_assert_eq!(v.begin, offset);
            prop_assert!(v.vsize <= previous_size);
            previous_size = v.vsize;
            offset += v.padded_size;
        }
        prop_assert_eq!(layout.nonrecord_end, offset);

        for v in layout.record_variables() {
            prop_assert_eq!(v.begin, offset);
            offset += v.padded_size;
        }
        prop_assert_eq!(layout.nonrecord_end + layout.record_stride, offset);
    }

    /// Querying the layout has no side effects and always agrees with itself.
    #[test]
    fn virtual_mode_is_idempotent(
        specs in prop::collection::vec(var_strategy(), 0..24),
        numrecs in 0usize..50,
    ) {
        let mut ds = build(&specs);
        ds.set_numrecs(numrecs).unwrap();

        let first = ds.layout().unwrap();
        let second = ds.layout().unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(!ds.is_frozen());
        prop_assert_eq!(ds.allocated_bytes(), 0);

        let expected = if first.has_records() {
            first.nonrecord_end + numrecs as u64 * first.record_stride
        } else {
            first.nonrecord_end
        };
        prop_assert_eq!(ds.virtual_size().unwrap(), expected);

        let frozen = ds.finalize().unwrap().clone();
        prop_assert_eq!(first, frozen);
    }

    /// The header records exactly the offsets the layout computed.
    #[test]
    fn header_matches_layout(specs in prop::collection::vec(var_strategy(), 1..16)) {
        let ds = build(&specs);
        let layout = ds.layout().unwrap();
        let info = HeaderInfo::parse(&ds.header_bytes(NumRecs::Count(0)).unwrap()).unwrap();

        prop_assert_eq!(info.header_size, layout.header_size);
        for (placement, var) in layout.serialization_order().zip(&info.variables) {
            prop_assert_eq!(&var.name, &placement.name);
            prop_assert_eq!(var.begin, placement.begin);
            prop_assert_eq!(u64::from(var.vsize), placement.header_vsize());
        }
    }
}
