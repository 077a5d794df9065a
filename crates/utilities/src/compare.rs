use scroll_lattice_storage::Array3;

/// The largest absolute difference between corresponding voxels. Panics if the extents differ.
pub fn max_abs_difference(a: &Array3<u16>, b: &Array3<u16>) -> u16 {
    assert_eq!(a.extent(), b.extent());

    a.values_slice()
        .iter()
        .zip(b.values_slice().iter())
        .map(|(&x, &y)| if x > y { x - y } else { y - x })
        .max()
        .unwrap_or(0)
}
