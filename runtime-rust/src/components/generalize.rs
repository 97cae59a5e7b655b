use flightanon_validator::errors::*;

use flightanon_validator::base::{Array, Dataframe, PrivacyDefinition, QuasiIdentifiers, Warning, YearMonth};
use flightanon_validator::utilities::merge_counts;
use flightanon_validator::utilities::partition::{make_partitions, Bucket, Partition};
use crate::components::{Evaluable, ReleaseNode};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Scale of the heuristic utility lost per unit of range width.
const SPAN_NORMALIZER: f64 = 1700.;
const NUMERIC_SPAN_WEIGHT: f64 = 0.0001;
const TEMPORAL_SPAN_WEIGHT: f64 = 0.001;


/// Level-2 generalization: merges adjacent buckets of each partition into ranges until k and l hold.
#[derive(Clone, Debug, PartialEq)]
pub struct Generalize {
    pub identifiers: QuasiIdentifiers,
    pub definition: PrivacyDefinition,
}

impl Evaluable for Generalize {
    fn evaluate(&self, data: Dataframe) -> Result<ReleaseNode> {
        let (value, ranges) = generalize(&data, &self.identifiers, &self.definition)?;
        let warnings = ranges.iter()
            .filter_map(|(partition, range)| range.unsatisfied(partition, &self.definition))
            .collect::<Vec<Warning>>();
        warnings.iter().for_each(|warning| warn!("{}", warning));

        let ranges = ranges.into_iter()
            .map(|(_, range)| range)
            .collect::<Vec<Range>>();
        let utility_loss = ranges.iter()
            .map(|range| range.utility_loss(&self.definition))
            .sum::<f64>();

        Ok(ReleaseNode { value, utility_loss, ranges, warnings })
    }
}


/// A run of consecutive buckets whose records are released under one label.
#[derive(Clone, Debug, PartialEq)]
pub struct Range {
    pub start: YearMonth,
    pub end: YearMonth,
    pub min_numeric: i64,
    pub max_numeric: i64,
    /// row indices into the input dataframe, in bucket order
    pub rows: Vec<usize>,
    /// aggregated occurrences of each sensitive value
    pub categories: IndexMap<String, usize>,
    /// occurrences of each sensitive value in the whole enclosing partition
    pub partition_categories: IndexMap<String, usize>,
    /// a single bucket that met the thresholds on its own, released with its original values
    pub standalone: bool,
    /// produced by folding an underfull tail into the previous range
    pub tail_corrected: bool,
}

impl Range {
    fn open(bucket: &Bucket, partition_categories: &IndexMap<String, usize>, standalone: bool) -> Range {
        Range {
            start: bucket.temporal,
            end: bucket.temporal,
            min_numeric: bucket.numeric,
            max_numeric: bucket.numeric,
            rows: bucket.rows.clone(),
            categories: bucket.categories.clone(),
            partition_categories: partition_categories.clone(),
            standalone,
            tail_corrected: false,
        }
    }

    /// Folds the next bucket into the range.
    fn extend(&mut self, bucket: &Bucket) {
        self.end = bucket.temporal;
        self.min_numeric = self.min_numeric.min(bucket.numeric);
        self.max_numeric = self.max_numeric.max(bucket.numeric);
        self.rows.extend(bucket.rows.iter().cloned());
        merge_counts(&mut self.categories, &bucket.categories);
    }

    /// Retracts `self`, the previously emitted range, and releases it together with the underfull `tail`.
    fn absorb(mut self, tail: Range) -> Range {
        self.end = tail.end;
        self.min_numeric = self.min_numeric.min(tail.min_numeric);
        self.max_numeric = self.max_numeric.max(tail.max_numeric);
        self.rows.extend(tail.rows);
        merge_counts(&mut self.categories, &tail.categories);
        self.standalone = false;
        self.tail_corrected = true;
        self
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_satisfied(&self, definition: &PrivacyDefinition) -> bool {
        definition.is_satisfied(self.count(), &self.categories, &self.partition_categories)
    }

    /// `YYYY-MM` for a standalone bucket, otherwise `YYYY-MM--YYYY-MM`.
    pub fn temporal_label(&self) -> String {
        match self.standalone {
            true => self.start.to_string(),
            false => format!("{}--{}", self.start, self.end)
        }
    }

    /// The original value for a standalone bucket, otherwise `min--max`.
    pub fn numeric_label(&self) -> String {
        match self.standalone {
            true => self.min_numeric.to_string(),
            false => format!("{}--{}", self.min_numeric, self.max_numeric)
        }
    }

    /// Heuristic utility given up by releasing this range.
    ///
    /// Only merged ranges that reach k cost utility, in proportion to their numeric and temporal width.
    pub fn utility_loss(&self, definition: &PrivacyDefinition) -> f64 {
        if self.standalone || !definition.is_k_anonymous(self.count()) {
            return 0.;
        }
        let numeric_span = (self.max_numeric - self.min_numeric) as f64;
        let temporal_span = self.start.months_until(&self.end) as f64;
        numeric_span / SPAN_NORMALIZER * NUMERIC_SPAN_WEIGHT
            + temporal_span / SPAN_NORMALIZER * TEMPORAL_SPAN_WEIGHT
    }

    fn unsatisfied(&self, partition: &str, definition: &PrivacyDefinition) -> Option<Warning> {
        if self.is_satisfied(definition) {
            return None;
        }
        Some(Warning::UnsatisfiableGroup {
            partition: partition.to_string(),
            temporal: self.temporal_label(),
            numeric: self.numeric_label(),
            count: self.count(),
            k: definition.k,
            l: definition.l,
            categories: definition.diversity_violations(&self.categories, &self.partition_categories),
        })
    }
}


/// Greedy left-to-right walk over the ordered buckets of one partition.
///
/// `previous` is the most recently emitted range. It stays retractable until the next range is emitted,
/// so that an underfull tail can be folded back into it.
struct Walker<'a> {
    buckets: &'a [Bucket],
    definition: &'a PrivacyDefinition,
    partition_categories: IndexMap<String, usize>,
    cursor: usize,
    previous: Option<Range>,
    emitted: Vec<Range>,
}

impl<'a> Walker<'a> {
    fn new(partition: &'a Partition, definition: &'a PrivacyDefinition) -> Walker<'a> {
        Walker {
            buckets: &partition.buckets,
            definition,
            partition_categories: partition.categories(),
            cursor: 0,
            previous: None,
            emitted: Vec::new(),
        }
    }

    fn satisfied(&self, count: usize, categories: &IndexMap<String, usize>) -> bool {
        self.definition.is_satisfied(count, categories, &self.partition_categories)
    }

    fn emit(&mut self, range: Range) {
        if let Some(previous) = self.previous.replace(range) {
            self.emitted.push(previous);
        }
    }

    /// Consumes the bucket at the cursor, and every bucket folded into it.
    fn step(&mut self) {
        let buckets = self.buckets;
        let bucket = &buckets[self.cursor];

        if self.satisfied(bucket.count(), &bucket.categories) {
            self.emit(Range::open(bucket, &self.partition_categories, true));
            self.cursor += 1;
            return;
        }

        let last = buckets.len() - 1;
        let mut current = Range::open(bucket, &self.partition_categories, false);
        while !self.satisfied(current.count(), &current.categories) && self.cursor < last {
            self.cursor += 1;
            current.extend(&buckets[self.cursor]);
        }

        if self.cursor == last && !self.satisfied(current.count(), &current.categories) {
            if let Some(previous) = self.previous.take() {
                current = previous.absorb(current);
            }
        }

        self.emit(current);
        self.cursor += 1;
    }

    fn walk(mut self) -> Vec<Range> {
        while self.cursor < self.buckets.len() {
            self.step();
        }
        self.emitted.extend(self.previous.take());
        self.emitted
    }
}

/// Merges the buckets of a single partition into ranges.
///
/// Buckets meeting k and l on their own are released unchanged. Otherwise a range is opened and the
/// following buckets are folded in until both thresholds hold. If the partition runs out first, the
/// underfull range is folded back into the previous one. A partition too small to ever meet the
/// thresholds still yields a range, which the caller must treat as unsatisfied.
pub fn generalize_partition(partition: &Partition, definition: &PrivacyDefinition) -> Vec<Range> {
    if partition.buckets.is_empty() {
        return Vec::new();
    }
    Walker::new(partition, definition).walk()
}

/// Generalizes the temporal and numeric quasi-identifiers of every record.
///
/// The released dataframe is sorted by (partition columns, month, numeric value), with ties kept in
/// their original order, and its temporal and numeric columns hold the string labels of each record's range.
///
/// # Arguments
/// * `data` - Suppressed and coarsened dataframe, with an integer numeric column.
/// * `identifiers` - Column roles of the quasi-identifiers and the sensitive attribute.
/// * `definition` - The k and l thresholds, and the sensitive categories l is checked against.
///
/// # Return
/// * `0` - The re-sorted, relabelled dataframe
/// * `1` - Every emitted range, in output order, with the name of its partition
///
/// # Example
/// ```
/// use flightanon_validator::base::{Array, Dataframe, PrivacyDefinition, QuasiIdentifiers, YearMonth};
/// use flightanon_runtime::components::generalize::generalize;
///
/// let months = vec!["2022-01", "2022-01", "2022-02", "2022-02", "2022-03", "2022-03"].into_iter()
///     .map(|month| month.parse().unwrap())
///     .collect::<Vec<YearMonth>>();
/// let data = Dataframe::from_columns(vec![
///     ("Gender", Array::from(vec!["Male"; 6])),
///     ("Airport Continent", Array::from(vec!["Asia"; 6])),
///     ("Departure Date", Array::from(months)),
///     ("Age", Array::from(vec![30_i64, 30, 41, 41, 52, 52])),
///     ("Flight Status", Array::from(vec!["On Time"; 6])),
/// ]).unwrap();
///
/// let definition = PrivacyDefinition::new(5, 1, vec!["On Time".to_string()]);
/// let (released, ranges) = generalize(&data, &QuasiIdentifiers::default(), &definition).unwrap();
///
/// assert_eq!(ranges.len(), 1);
/// assert_eq!(released.record(0), vec!["Male", "Asia", "2022-01--2022-03", "30--52", "On Time"]);
/// ```
pub fn generalize(
    data: &Dataframe, identifiers: &QuasiIdentifiers, definition: &PrivacyDefinition,
) -> Result<(Dataframe, Vec<(String, Range)>)> {
    let ranges = make_partitions(data, identifiers)?.iter()
        .flat_map(|partition| {
            let ranges = generalize_partition(partition, definition);
            debug!(partition = %partition.name(), records = partition.count(),
                   buckets = partition.buckets.len(), ranges = ranges.len(), "generalized partition");
            let name = partition.name();
            ranges.into_iter().map(move |range| (name.clone(), range))
        })
        .collect::<Vec<(String, Range)>>();

    let mut order = Vec::with_capacity(data.num_records());
    let mut temporal_labels = Vec::with_capacity(data.num_records());
    let mut numeric_labels = Vec::with_capacity(data.num_records());
    ranges.iter().for_each(|(_, range)| {
        let (temporal, numeric) = (range.temporal_label(), range.numeric_label());
        range.rows.iter().for_each(|&row| {
            order.push(row);
            temporal_labels.push(temporal.clone());
            numeric_labels.push(numeric.clone());
        });
    });

    if order.len() != data.num_records() {
        return Err(format!(
            "generalization released {} of {} records", order.len(), data.num_records()).into());
    }

    let mut released = data.select(&order)?;
    released.insert(identifiers.temporal.clone(), Array::from(temporal_labels))?;
    released.insert(identifiers.numeric.clone(), Array::from(numeric_labels))?;
    Ok((released, ranges))
}
