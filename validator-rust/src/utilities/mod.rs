pub mod array;
pub mod json;
pub mod partition;
pub mod privacy;

use indexmap::IndexMap;


/// Returns the value shared by every element of `values`, or None if they disagree or there are none.
///
/// # Example
/// ```
/// use flightanon_validator::utilities::get_common_value;
/// assert_eq!(get_common_value(&[3, 3, 3]), Some(3));
/// assert_eq!(get_common_value(&[3, 4]), None);
/// assert_eq!(get_common_value::<i64>(&[]), None);
/// ```
pub fn get_common_value<T: Clone + Eq>(values: &[T]) -> Option<T> {
    let first = values.first()?;
    if values.iter().all(|value| value == first) { Some(first.clone()) } else { None }
}

/// Adds every count in `other` into `counts`.
pub fn merge_counts(counts: &mut IndexMap<String, usize>, other: &IndexMap<String, usize>) {
    other.iter().for_each(|(category, count)| {
        *counts.entry(category.clone()).or_insert(0) += count;
    })
}
