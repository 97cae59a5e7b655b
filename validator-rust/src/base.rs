use crate::errors::*;

use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utilities::array::select_rows;
use crate::utilities::get_common_value;


/// A calendar month, the granularity of the coarsened temporal quasi-identifier.
///
/// Ordering is chronological: year first, then month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<YearMonth> {
        if !(1..=12).contains(&month) {
            return Err(ErrorKind::MalformedDate(format!("{}-{}", year, month)).into());
        }
        Ok(YearMonth { year, month })
    }

    /// Number of calendar months from `self` to `other`. Negative if `other` is earlier.
    ///
    /// # Example
    /// ```
    /// use flightanon_validator::base::YearMonth;
    /// let start = YearMonth::new(2022, 11).unwrap();
    /// let end = YearMonth::new(2023, 2).unwrap();
    /// assert_eq!(start.months_until(&end), 3);
    /// assert_eq!(end.months_until(&start), -3);
    /// ```
    pub fn months_until(&self, other: &YearMonth) -> i64 {
        (other.year as i64 - self.year as i64) * 12 + (other.month as i64 - self.month as i64)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(value: &str) -> Result<YearMonth> {
        let malformed = || Error::from(ErrorKind::MalformedDate(value.to_string()));
        let (year, month) = value.trim().splitn(2, '-').collect_tuple()
            .ok_or_else(malformed)?;
        YearMonth::new(
            year.parse().map_err(|_| malformed())?,
            month.parse().map_err(|_| malformed())?)
    }
}


/// A hashable, totally ordered view of a single cell, used to group rows.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Int(i64),
    Str(String),
    Month(YearMonth),
    Tuple(Vec<IndexKey>),
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self { IndexKey::Int(value) }
}
impl From<&str> for IndexKey {
    fn from(value: &str) -> Self { IndexKey::Str(value.to_string()) }
}
impl From<String> for IndexKey {
    fn from(value: String) -> Self { IndexKey::Str(value) }
}
impl From<YearMonth> for IndexKey {
    fn from(value: YearMonth) -> Self { IndexKey::Month(value) }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Int(value) => write!(f, "{}", value),
            IndexKey::Str(value) => write!(f, "{}", value),
            IndexKey::Month(value) => write!(f, "{}", value),
            IndexKey::Tuple(values) => write!(f, "({})", values.iter().join(", ")),
        }
    }
}


/// A single homogeneously typed column.
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
    Int(Array1<i64>),
    Str(Array1<String>),
    Month(Array1<YearMonth>),
}

impl Array {
    pub fn num_records(&self) -> usize {
        match self {
            Array::Int(array) => array.len(),
            Array::Str(array) => array.len(),
            Array::Month(array) => array.len(),
        }
    }
    pub fn int(&self) -> Result<&Array1<i64>> {
        match self {
            Array::Int(array) => Ok(array),
            _ => Err("column must be integer".into())
        }
    }
    pub fn string(&self) -> Result<&Array1<String>> {
        match self {
            Array::Str(array) => Ok(array),
            _ => Err("column must be string".into())
        }
    }
    pub fn month(&self) -> Result<&Array1<YearMonth>> {
        match self {
            Array::Month(array) => Ok(array),
            _ => Err("column must be coarsened to months".into())
        }
    }

    /// Grouping key of the cell at `index`. Panics if `index` is out of bounds.
    pub fn key(&self, index: usize) -> IndexKey {
        match self {
            Array::Int(array) => IndexKey::Int(array[index]),
            Array::Str(array) => IndexKey::Str(array[index].clone()),
            Array::Month(array) => IndexKey::Month(array[index]),
        }
    }

    /// Textual form of the cell at `index`, as it is written to CSV.
    pub fn display(&self, index: usize) -> String {
        match self {
            Array::Int(array) => array[index].to_string(),
            Array::Str(array) => array[index].clone(),
            Array::Month(array) => array[index].to_string(),
        }
    }

    pub fn select(&self, indices: &[usize]) -> Array {
        match self {
            Array::Int(array) => Array::Int(select_rows(array, indices)),
            Array::Str(array) => Array::Str(select_rows(array, indices)),
            Array::Month(array) => Array::Month(select_rows(array, indices)),
        }
    }
}

impl From<Vec<i64>> for Array {
    fn from(values: Vec<i64>) -> Self { Array::Int(Array1::from(values)) }
}
impl From<Vec<String>> for Array {
    fn from(values: Vec<String>) -> Self { Array::Str(Array1::from(values)) }
}
impl From<Vec<&str>> for Array {
    fn from(values: Vec<&str>) -> Self {
        Array::Str(values.into_iter().map(String::from).collect())
    }
}
impl From<Vec<YearMonth>> for Array {
    fn from(values: Vec<YearMonth>) -> Self { Array::Month(Array1::from(values)) }
}


/// An insertion-ordered collection of equal-length named columns.
///
/// Row `i` of every column together forms one record.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dataframe {
    columns: IndexMap<String, Array>,
}

impl Dataframe {
    pub fn new(columns: IndexMap<String, Array>) -> Result<Dataframe> {
        let lengths = columns.values().map(Array::num_records).collect::<Vec<usize>>();
        if !lengths.is_empty() && get_common_value(&lengths).is_none() {
            return Err("columns of a dataframe must share the same length".into());
        }
        Ok(Dataframe { columns })
    }

    /// # Example
    /// ```
    /// use flightanon_validator::base::{Array, Dataframe};
    /// let data = Dataframe::from_columns(vec![
    ///     ("Gender", Array::from(vec!["Female", "Male"])),
    ///     ("Age", Array::from(vec![31_i64, 47])),
    /// ]).unwrap();
    /// assert_eq!(data.num_records(), 2);
    /// assert_eq!(data.record(1), vec!["Male".to_string(), "47".to_string()]);
    ///
    /// let ragged = Dataframe::from_columns(vec![
    ///     ("Gender", Array::from(vec!["Female"])),
    ///     ("Age", Array::from(vec![31_i64, 47])),
    /// ]);
    /// assert!(ragged.is_err());
    /// ```
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item=(S, Array)>
    ) -> Result<Dataframe> {
        Dataframe::new(columns.into_iter()
            .map(|(name, column)| (name.into(), column))
            .collect())
    }

    pub fn num_records(&self) -> usize {
        self.columns.values().next().map(Array::num_records).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item=&String> {
        self.columns.keys()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&Array> {
        self.columns.get(name)
            .ok_or_else(|| format!("column not found: {:?}", name).into())
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Array> {
        self.columns.iter()
    }

    /// Adds or replaces a column. A replaced column keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, column: Array) -> Result<()> {
        let name = name.into();
        let expected = self.columns.iter()
            .find(|(other, _)| **other != name)
            .map(|(_, other)| other.num_records());
        if let Some(expected) = expected {
            if expected != column.num_records() {
                return Err(format!(
                    "column {:?} has {} records, but the dataframe has {}",
                    name, column.num_records(), expected).into());
            }
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Removes a column, preserving the order of the remaining columns.
    pub fn remove(&mut self, name: &str) -> Option<Array> {
        self.columns.shift_remove(name)
    }

    /// Builds a new dataframe from the rows at `indices`, in the order given.
    pub fn select(&self, indices: &[usize]) -> Result<Dataframe> {
        let num_records = self.num_records();
        if let Some(index) = indices.iter().find(|&&index| index >= num_records) {
            return Err(format!("row index {} is out of bounds for {} records", index, num_records).into());
        }
        Ok(Dataframe {
            columns: self.columns.iter()
                .map(|(name, column)| (name.clone(), column.select(indices)))
                .collect()
        })
    }

    /// Textual form of every cell in row `index`, in column order.
    pub fn record(&self, index: usize) -> Vec<String> {
        self.columns.values().map(|column| column.display(index)).collect()
    }
}


/// Thresholds a release must meet, and the fixed set of sensitive categories l is checked against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivacyDefinition {
    /// minimum number of records sharing a quasi-identifier combination
    pub k: usize,
    /// minimum occurrences of each checked sensitive category within a group
    pub l: usize,
    pub sensitive_categories: Vec<String>,
    /// exempt categories that never occur in the enclosing partition from the l check
    #[serde(default)]
    pub exempt_absent_categories: bool,
}

impl PrivacyDefinition {
    pub fn new(k: usize, l: usize, sensitive_categories: Vec<String>) -> Self {
        PrivacyDefinition { k, l, sensitive_categories, exempt_absent_categories: false }
    }

    pub fn exempt_absent_categories(mut self, exempt: bool) -> Self {
        self.exempt_absent_categories = exempt;
        self
    }

    pub fn is_k_anonymous(&self, count: usize) -> bool {
        count >= self.k
    }

    /// Checked categories in `counts` with fewer than l occurrences.
    ///
    /// A category missing from `counts` has zero occurrences. When absent categories are exempt,
    /// categories missing from `partition` (the counts of the enclosing partition) are skipped.
    pub fn diversity_violations(
        &self, counts: &IndexMap<String, usize>, partition: &IndexMap<String, usize>,
    ) -> Vec<String> {
        self.sensitive_categories.iter()
            .filter(|category| !(self.exempt_absent_categories
                && partition.get(*category).cloned().unwrap_or(0) == 0))
            .filter(|category| counts.get(*category).cloned().unwrap_or(0) < self.l)
            .cloned()
            .collect()
    }

    /// Whether a group meets both thresholds.
    ///
    /// # Example
    /// ```
    /// use flightanon_validator::base::PrivacyDefinition;
    /// use flightanon_validator::counts;
    ///
    /// let definition = PrivacyDefinition::new(3, 1, vec!["Delayed".to_string(), "On Time".to_string()]);
    /// let partition = counts!("Delayed" => 5);
    ///
    /// assert!(!definition.is_satisfied(3, &counts!("Delayed" => 3), &partition));
    /// assert!(definition.clone().exempt_absent_categories(true)
    ///     .is_satisfied(3, &counts!("Delayed" => 3), &partition));
    /// ```
    pub fn is_satisfied(
        &self, count: usize, counts: &IndexMap<String, usize>, partition: &IndexMap<String, usize>,
    ) -> bool {
        self.is_k_anonymous(count) && self.diversity_violations(counts, partition).is_empty()
    }
}


/// Column roles of the quasi-identifiers and the sensitive attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuasiIdentifiers {
    /// non-ordered quasi-identifiers; records sharing all of them form a partition
    pub partition: Vec<String>,
    /// ordered temporal quasi-identifier
    pub temporal: String,
    /// ordered numeric quasi-identifier
    pub numeric: String,
    pub sensitive: String,
}

impl Default for QuasiIdentifiers {
    fn default() -> Self {
        QuasiIdentifiers {
            partition: vec!["Gender".to_string(), "Airport Continent".to_string()],
            temporal: "Departure Date".to_string(),
            numeric: "Age".to_string(),
            sensitive: "Flight Status".to_string(),
        }
    }
}

impl QuasiIdentifiers {
    /// The full quasi-identifier tuple: partition columns, then temporal, then numeric.
    pub fn full(&self) -> Vec<String> {
        self.partition.iter().cloned()
            .chain(vec![self.temporal.clone(), self.numeric.clone()])
            .collect()
    }
}


/// Non-fatal problems found while producing a release.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An emitted group still falls below k or l after all of its partition's buckets were used.
    UnsatisfiableGroup {
        partition: String,
        temporal: String,
        numeric: String,
        count: usize,
        k: usize,
        l: usize,
        /// checked categories with fewer than l occurrences
        categories: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsatisfiableGroup { partition, temporal, numeric, count, k, l, categories } => write!(
                f, "partition {} range ({}, {}) has {} records (k = {}) and categories {:?} below l = {}",
                partition, temporal, numeric, count, k, categories, l)
        }
    }
}


#[cfg(test)]
mod test_base {
    use crate::base::{Array, Dataframe, IndexKey, YearMonth};

    #[test]
    fn year_month_parse_and_order() {
        let early: YearMonth = "2022-09".parse().unwrap();
        let late: YearMonth = "2022-10".parse().unwrap();
        assert!(early < late);
        assert!("2021-12".parse::<YearMonth>().unwrap() < early);
        assert_eq!(late.to_string(), "2022-10");
        assert!("2022-13".parse::<YearMonth>().is_err());
        assert!("2022".parse::<YearMonth>().is_err());
        assert!("June 2022".parse::<YearMonth>().is_err());
    }

    #[test]
    fn index_keys_order_within_variant() {
        assert!(IndexKey::from(9_i64) < IndexKey::from(10_i64));
        assert!(IndexKey::from("Africa") < IndexKey::from("Asia"));
        let tuple = IndexKey::Tuple(vec!["Male".into(), 30_i64.into()]);
        assert_eq!(tuple.to_string(), "(Male, 30)");
    }

    #[test]
    fn insert_replaces_in_place_and_checks_length() {
        let mut data = Dataframe::from_columns(vec![
            ("a", Array::from(vec![1_i64, 2])),
            ("b", Array::from(vec!["x", "y"])),
            ("c", Array::from(vec![3_i64, 4])),
        ]).unwrap();

        data.insert("b", Array::from(vec![5_i64, 6])).unwrap();
        assert_eq!(data.column_names().cloned().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(data.column("b").unwrap(), &Array::from(vec![5_i64, 6]));

        assert!(data.insert("d", Array::from(vec![1_i64])).is_err());

        data.remove("a");
        assert_eq!(data.column_names().cloned().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn select_reorders_rows() {
        let data = Dataframe::from_columns(vec![
            ("a", Array::from(vec![1_i64, 2, 3])),
            ("b", Array::from(vec!["x", "y", "z"])),
        ]).unwrap();

        let selected = data.select(&[2, 0, 1]).unwrap();
        assert_eq!(selected.record(0), vec!["3".to_string(), "z".to_string()]);
        assert_eq!(selected.record(2), vec!["2".to_string(), "y".to_string()]);
        assert!(data.select(&[3]).is_err());
    }
}
