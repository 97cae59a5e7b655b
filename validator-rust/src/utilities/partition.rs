use crate::errors::*;

use crate::base::{Array, Dataframe, IndexKey, QuasiIdentifiers, YearMonth};
use crate::utilities::merge_counts;
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::BTreeMap;


/// Groups row indices by every distinct combination of values in the `by` columns.
///
/// Keys are returned in ascending lexicographic order, and row indices within a group keep their original order.
///
/// # Arguments
/// * `data` - Dataframe to be grouped.
/// * `by` - Names of the columns whose values form the grouping key.
///
/// # Return
/// Ordered map from grouping key to the row indices sharing it.
///
/// # Example
/// ```
/// use flightanon_validator::base::{Array, Dataframe, IndexKey};
/// use flightanon_validator::utilities::partition::partition_by;
///
/// let data = Dataframe::from_columns(vec![
///     ("Gender", Array::from(vec!["Male", "Female", "Male"])),
///     ("Age", Array::from(vec![30_i64, 30, 30])),
/// ]).unwrap();
/// let groups = partition_by(&data, &["Gender".to_string(), "Age".to_string()]).unwrap();
///
/// let keys = groups.keys().cloned().collect::<Vec<Vec<IndexKey>>>();
/// assert_eq!(keys, vec![
///     vec![IndexKey::from("Female"), IndexKey::from(30_i64)],
///     vec![IndexKey::from("Male"), IndexKey::from(30_i64)]]);
/// assert_eq!(groups.values().cloned().collect::<Vec<Vec<usize>>>(), vec![vec![1], vec![0, 2]]);
/// ```
pub fn partition_by(data: &Dataframe, by: &[String]) -> Result<BTreeMap<Vec<IndexKey>, Vec<usize>>> {
    let columns = by.iter()
        .map(|name| data.column(name))
        .collect::<Result<Vec<&Array>>>()?;

    let mut groups = BTreeMap::<Vec<IndexKey>, Vec<usize>>::new();
    (0..data.num_records()).for_each(|idx| groups
        .entry(columns.iter().map(|column| column.key(idx)).collect())
        .or_insert_with(Vec::new)
        .push(idx));
    Ok(groups)
}

/// Number of occurrences of each distinct value of `column` among `rows`, in order of first occurrence.
pub fn count_categories(column: &Array, rows: &[usize]) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    rows.iter().for_each(|&idx| *counts.entry(column.display(idx)).or_insert(0) += 1);
    counts
}


/// Records of one partition sharing an exact (temporal, numeric) quasi-identifier pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub temporal: YearMonth,
    pub numeric: i64,
    /// row indices into the dataframe the bucket was built from, in original order
    pub rows: Vec<usize>,
    /// occurrences of each sensitive value among `rows`
    pub categories: IndexMap<String, usize>,
}

impl Bucket {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// Records sharing every non-ordered quasi-identifier, split into ordered buckets.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    pub key: Vec<IndexKey>,
    /// ordered by (temporal ascending, numeric ascending)
    pub buckets: Vec<Bucket>,
}

impl Partition {
    pub fn count(&self) -> usize {
        self.buckets.iter().map(Bucket::count).sum()
    }

    /// Occurrences of each sensitive value over the whole partition.
    pub fn categories(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        self.buckets.iter().for_each(|bucket| merge_counts(&mut counts, &bucket.categories));
        counts
    }

    /// Human-readable partition key, e.g. `Female/Asia`.
    pub fn name(&self) -> String {
        self.key.iter().join("/")
    }
}

/// Splits the rows of a single partition into buckets ordered by (temporal, numeric).
///
/// The temporal column must already be coarsened to months, and the numeric column must be integer.
pub fn make_buckets(
    data: &Dataframe, rows: &[usize], identifiers: &QuasiIdentifiers,
) -> Result<Vec<Bucket>> {
    let temporal = data.column(&identifiers.temporal)?.month()
        .chain_err(|| format!("temporal quasi-identifier {:?}", identifiers.temporal))?;
    let numeric = data.column(&identifiers.numeric)?.int()
        .chain_err(|| format!("numeric quasi-identifier {:?}", identifiers.numeric))?;
    let sensitive = data.column(&identifiers.sensitive)?;

    let mut buckets = BTreeMap::<(YearMonth, i64), Vec<usize>>::new();
    rows.iter().for_each(|&idx| buckets
        .entry((temporal[idx], numeric[idx]))
        .or_insert_with(Vec::new)
        .push(idx));

    Ok(buckets.into_iter()
        .map(|((temporal, numeric), rows)| Bucket {
            temporal,
            numeric,
            categories: count_categories(sensitive, &rows),
            rows,
        })
        .collect())
}

/// Partitions the dataframe by the non-ordered quasi-identifiers and buckets each partition.
///
/// Partitions are disjoint, cover every row, and are returned in ascending key order.
pub fn make_partitions(data: &Dataframe, identifiers: &QuasiIdentifiers) -> Result<Vec<Partition>> {
    partition_by(data, &identifiers.partition)?.into_iter()
        .map(|(key, rows)| Ok(Partition {
            buckets: make_buckets(data, &rows, identifiers)?,
            key,
        }))
        .collect()
}


#[cfg(test)]
mod test_partition {
    use crate::base::{Array, Dataframe, QuasiIdentifiers, YearMonth};
    use crate::counts;
    use crate::utilities::partition::make_partitions;

    fn month(value: &str) -> YearMonth {
        value.parse().unwrap()
    }

    fn flights() -> Dataframe {
        Dataframe::from_columns(vec![
            ("Gender", Array::from(vec!["Male", "Female", "Male", "Male", "Male"])),
            ("Airport Continent", Array::from(vec!["Asia", "Asia", "Asia", "Asia", "Europe"])),
            ("Departure Date", Array::from(vec![
                month("2022-03"), month("2022-01"), month("2022-01"), month("2022-03"), month("2022-01")])),
            ("Age", Array::from(vec![40_i64, 22, 61, 40, 35])),
            ("Flight Status", Array::from(vec!["Delayed", "On Time", "On Time", "Cancelled", "Delayed"])),
        ]).unwrap()
    }

    #[test]
    fn partitions_cover_rows_in_key_order() {
        let partitions = make_partitions(&flights(), &QuasiIdentifiers::default()).unwrap();

        let names = partitions.iter().map(|p| p.name()).collect::<Vec<String>>();
        assert_eq!(names, vec!["Female/Asia", "Male/Asia", "Male/Europe"]);
        assert_eq!(partitions.iter().map(|p| p.count()).sum::<usize>(), 5);
    }

    #[test]
    fn buckets_are_ordered_by_month_then_age() {
        let partitions = make_partitions(&flights(), &QuasiIdentifiers::default()).unwrap();
        let male_asia = &partitions[1];

        let keys = male_asia.buckets.iter()
            .map(|bucket| (bucket.temporal.to_string(), bucket.numeric))
            .collect::<Vec<(String, i64)>>();
        assert_eq!(keys, vec![("2022-01".to_string(), 61), ("2022-03".to_string(), 40)]);

        let merged = &male_asia.buckets[1];
        assert_eq!(merged.rows, vec![0, 3]);
        assert_eq!(merged.categories, counts!("Delayed" => 1, "Cancelled" => 1));
        assert_eq!(male_asia.categories(), counts!("On Time" => 1, "Delayed" => 1, "Cancelled" => 1));
    }

    #[test]
    fn uncoarsened_dates_are_rejected() {
        let mut data = flights();
        data.insert("Departure Date", Array::from(vec!["2022-03-01"; 5])).unwrap();
        assert!(make_partitions(&data, &QuasiIdentifiers::default()).is_err());
    }
}
