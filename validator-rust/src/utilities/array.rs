use ndarray::Array1;


/// Gathers the elements of `data` at `indices`, in the order given.
///
/// Cells of string columns are not `Copy`, so they are cloned one at a time.
/// Panics if an index is out of bounds; callers validate indices first.
///
/// # Example
/// ```
/// use ndarray::arr1;
/// use flightanon_validator::utilities::array::select_rows;
///
/// let data = arr1(&["a".to_string(), "b".to_string(), "c".to_string()]);
/// assert_eq!(select_rows(&data, &[2, 0]), arr1(&["c".to_string(), "a".to_string()]));
/// ```
pub fn select_rows<A: Clone>(data: &Array1<A>, indices: &[usize]) -> Array1<A> {
    indices.iter().map(|&index| data[index].clone()).collect()
}
