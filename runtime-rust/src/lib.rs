//! Anonymization runtime
//!
//! Runs the stages of a release over a materialized dataframe:
//! suppression, numeric casting, temporal coarsening, the privacy audit and,
//! when the audit finds a violation, Level-2 generalization.

use flightanon_validator::errors::*;

pub mod components;
pub mod config;
pub mod utilities;

use flightanon_validator::audit;
use flightanon_validator::base::{Dataframe, PrivacyDefinition, Warning};
use flightanon_validator::utilities::json::JSONReport;
use flightanon_validator::utilities::partition::partition_by;
use flightanon_validator::Audit;
use tracing::{info, info_span};

use crate::components::Evaluable;
use crate::components::cast::Cast;
use crate::components::coarsen::Coarsen;
use crate::components::generalize::{Generalize, Range};
use crate::components::suppress::Suppress;
use crate::components::utility::round_utility;
use crate::config::AnonymizationConfig;


/// Outcome of a single (k, l) run.
#[derive(Clone, Debug, PartialEq)]
pub struct Release {
    /// the anonymized dataframe
    pub data: Dataframe,
    pub definition: PrivacyDefinition,
    /// audit of the coarsened data, before Level-2 generalization
    pub audit: Audit,
    pub num_partitions: usize,
    /// empty when the audit found no violation
    pub ranges: Vec<Range>,
    pub warnings: Vec<Warning>,
    /// heuristic utility given up by every stage
    pub utility_loss: f64,
}

impl Release {
    pub fn generalized(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Heuristic utility of the release, rounded to two decimals.
    pub fn heuristic_utility(&self) -> f64 {
        round_utility(1. - self.utility_loss)
    }

    pub fn report(&self, kl_divergence: Option<f64>) -> JSONReport {
        JSONReport {
            k: self.definition.k,
            l: self.definition.l,
            num_records: self.data.num_records(),
            k_violated: self.audit.k_violated(),
            l_violated: self.audit.l_violated(),
            generalized: self.generalized(),
            num_partitions: self.num_partitions,
            num_ranges: self.ranges.len(),
            num_merged_ranges: self.ranges.iter().filter(|range| !range.standalone).count(),
            num_tail_corrections: self.ranges.iter().filter(|range| range.tail_corrected).count(),
            heuristic_utility: self.heuristic_utility(),
            kl_divergence,
            warnings: self.warnings.clone(),
        }
    }
}

/// Anonymizes a dataframe to the given k and l.
///
/// The input is never modified. Stage errors are returned unchanged, so that their kind can be matched.
///
/// # Arguments
/// * `data` - Materialized dataframe of string columns.
/// * `config` - Column roles and policies.
/// * `k` - Minimum size of every released quasi-identifier group.
/// * `l` - Minimum occurrences of every sensitive category within a group.
///
/// # Return
/// The release, with any partitions that could not reach k and l reported as warnings.
/// With `deny_unsatisfiable` set, such a partition is an `UnsatisfiableGroup` error instead.
///
/// # Example
/// ```
/// use flightanon_runtime::anonymize;
/// use flightanon_runtime::components::materialize::read_csv;
/// use flightanon_runtime::config::AnonymizationConfig;
///
/// let text = "\
/// First Name,Gender,Age,Airport Continent,Departure Date,Flight Status
/// Edithe,Female,62,Europe,6/28/2022,On Time
/// Elwood,Female,62,Europe,6/12/2022,Delayed
/// Darby,Female,64,Europe,7/02/2022,On Time
/// ";
/// let data = read_csv(text.as_bytes()).unwrap();
/// let mut config = AnonymizationConfig::default();
/// config.sensitive_categories = vec!["On Time".to_string()];
///
/// let release = anonymize(&data, &config, 3, 1).unwrap();
/// assert!(!release.data.contains("First Name"));
/// assert_eq!(release.data.record(0), vec!["Female", "62--64", "Europe", "2022-06--2022-07", "On Time"]);
/// assert!(release.warnings.is_empty());
/// ```
pub fn anonymize(data: &Dataframe, config: &AnonymizationConfig, k: usize, l: usize) -> Result<Release> {
    let span = info_span!("anonymize", k, l);
    let _enter = span.enter();

    let identifiers = &config.identifiers;
    let definition = config.privacy_definition(k, l);

    let stages: Vec<Box<dyn Evaluable>> = vec![
        Box::new(Suppress { columns: config.suppressed.clone() }),
        Box::new(Cast { column: identifiers.numeric.clone() }),
        Box::new(Coarsen { column: identifiers.temporal.clone(), formats: config.date_formats.clone() }),
    ];
    let (data, utility_loss) = stages.iter()
        .try_fold((data.clone(), 0.), |(data, utility_loss), stage| {
            let node = stage.evaluate(data)?;
            info!(stage = ?stage, records = node.value.num_records(), "evaluated");
            Ok::<_, Error>((node.value, utility_loss + node.utility_loss))
        })?;

    let audit = audit(&data, identifiers, &definition)?;
    let num_partitions = partition_by(&data, &identifiers.partition)?.len();
    info!(groups = audit.num_groups, k_violated = audit.k_violated(), l_violated = audit.l_violated(), "audited");

    if !audit.requires_generalization() {
        return Ok(Release {
            data, definition, audit, num_partitions, utility_loss,
            ranges: Vec::new(),
            warnings: Vec::new(),
        });
    }

    let stage = Generalize { identifiers: identifiers.clone(), definition: definition.clone() };
    let node = stage.evaluate(data)?;
    info!(ranges = node.ranges.len(), warnings = node.warnings.len(), records = node.value.num_records(), "generalized");

    if config.deny_unsatisfiable {
        if let Some(warning) = node.warnings.first() {
            return Err(ErrorKind::UnsatisfiableGroup(warning.to_string()).into());
        }
    }

    Ok(Release {
        data: node.value,
        definition,
        audit,
        num_partitions,
        ranges: node.ranges,
        warnings: node.warnings,
        utility_loss: utility_loss + node.utility_loss,
    })
}


#[cfg(test)]
mod test_anonymize {
    use flightanon_validator::base::{Array, Dataframe, QuasiIdentifiers};
    use flightanon_validator::errors::ErrorKind;
    use flightanon_validator::utilities::partition::partition_by;
    use crate::anonymize;
    use crate::components::utility::kl_divergence;
    use crate::config::{AnonymizationConfig, DivergencePolicy};

    const STATUSES: [&str; 3] = ["Delayed", "On Time", "Cancelled"];

    fn text(n: usize, cell: impl Fn(usize) -> String) -> Array {
        Array::from((0..n).map(cell).collect::<Vec<String>>())
    }

    /// Raw flights with every column as text, as loaded from CSV.
    fn flights(n: usize) -> Dataframe {
        Dataframe::from_columns(vec![
            ("Passenger ID", text(n, |idx| format!("P{:05}", idx))),
            ("First Name", text(n, |idx| format!("Name{}", idx))),
            ("Last Name", text(n, |idx| format!("Surname{}", idx))),
            ("Gender", text(n, |idx| ["Female", "Male"][idx % 2].to_string())),
            ("Age", text(n, |idx| (18 + (idx * 13) % 60).to_string())),
            ("Nationality", text(n, |idx| ["Japan", "Brazil", "Canada"][idx % 3].to_string())),
            ("Airport Continent", text(n, |idx| ["Asia", "Europe"][(idx / 2) % 2].to_string())),
            ("Departure Date", text(n, |idx| format!("{}/{}/2022", 1 + (idx * 5) % 12, 1 + idx % 28))),
            ("Pilot Name", text(n, |idx| format!("Pilot{}", idx % 7))),
            ("Flight Status", text(n, |idx| STATUSES[idx % 3].to_string())),
        ]).unwrap()
    }

    #[test]
    fn release_groups_meet_k_and_l() {
        let data = flights(120);
        let config = AnonymizationConfig::default();
        let release = anonymize(&data, &config, 10, 2).unwrap();

        assert!(release.generalized());
        assert!(release.warnings.is_empty());
        assert_eq!(release.data.num_records(), 120);
        assert_eq!(release.data.column_names().collect::<Vec<_>>(),
                   vec!["Gender", "Age", "Airport Continent", "Departure Date", "Flight Status"]);

        let identifiers = QuasiIdentifiers::default();
        let status = release.data.column("Flight Status").unwrap();
        partition_by(&release.data, &identifiers.full()).unwrap().values().for_each(|rows| {
            assert!(rows.len() >= 10);
            STATUSES.iter().for_each(|category| assert!(
                rows.iter().filter(|&&row| status.display(row) == *category).count() >= 2));
        });

        // five suppressed columns and coarsening, plus a small loss per merged range
        assert_eq!(release.heuristic_utility(), 0.9);
        assert_eq!(data.num_columns(), 10);
    }

    #[test]
    fn anonymous_input_skips_generalization() {
        let mut data = flights(4);
        data.insert("Gender", Array::from(vec!["Female"; 4])).unwrap();
        data.insert("Airport Continent", Array::from(vec!["Asia"; 4])).unwrap();
        data.insert("Age", Array::from(vec!["40"; 4])).unwrap();
        data.insert("Departure Date", Array::from(vec!["2022-03-01", "3/9/2022", "2022-03", "2022/03/30"])).unwrap();

        let mut config = AnonymizationConfig::default();
        config.sensitive_categories = vec!["Delayed".to_string()];
        let release = anonymize(&data, &config, 4, 1).unwrap();

        assert!(!release.generalized());
        assert_eq!(release.data.record(0), vec!["Female", "40", "Asia", "2022-03", "Delayed"]);
        let report = release.report(Some(0.));
        assert!(!report.k_violated && !report.l_violated);
        assert_eq!(report.num_partitions, 1);
        assert_eq!(report.num_ranges, 0);
    }

    #[test]
    fn unsatisfiable_partition_is_a_warning_or_an_error() {
        let data = flights(6);
        let mut config = AnonymizationConfig::default();

        let release = anonymize(&data, &config, 5, 1).unwrap();
        assert_eq!(release.data.num_records(), 6);
        assert!(!release.warnings.is_empty());
        assert_eq!(release.report(None).warnings.len(), release.warnings.len());

        config.deny_unsatisfiable = true;
        let error = anonymize(&data, &config, 5, 1).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::UnsatisfiableGroup(_)));
    }

    #[test]
    fn malformed_inputs_are_fatal() {
        let mut data = flights(3);
        data.insert("Departure Date", Array::from(vec!["6/28/2022", "June 28", "6/29/2022"])).unwrap();
        let error = anonymize(&data, &AnonymizationConfig::default(), 2, 1).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::MalformedDate(value) if value == "June 28"));

        let mut data = flights(3);
        data.insert("Age", Array::from(vec!["40", "", "41"])).unwrap();
        let error = anonymize(&data, &AnonymizationConfig::default(), 2, 1).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::MalformedValue(_, 1, _)));
    }

    #[test]
    fn generalization_keeps_sensitive_distribution() {
        let data = flights(120);
        let release = anonymize(&data, &AnonymizationConfig::default(), 15, 3).unwrap();
        let divergence = kl_divergence(&data, &release.data, "Flight Status", DivergencePolicy::Error).unwrap();
        assert_eq!(divergence, 0.);

        let report = release.report(Some(divergence));
        assert_eq!(report.num_records, 120);
        assert_eq!((report.k, report.l), (15, 3));
        assert!(report.num_merged_ranges > 0);
    }
}
