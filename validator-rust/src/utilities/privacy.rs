use crate::errors::*;

use crate::base::{Dataframe, PrivacyDefinition, QuasiIdentifiers};
use crate::utilities::partition::{count_categories, partition_by};
use serde::Serialize;
use tracing::debug;


/// Outcome of checking every full quasi-identifier group against k and l.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Audit {
    pub num_groups: usize,
    /// groups with fewer than k records
    pub k_violations: usize,
    /// groups containing a sensitive value with fewer than l occurrences
    pub l_violations: usize,
}

impl Audit {
    pub fn k_violated(&self) -> bool {
        self.k_violations > 0
    }

    pub fn l_violated(&self) -> bool {
        self.l_violations > 0
    }

    /// Level-2 generalization must run if either threshold is violated.
    pub fn requires_generalization(&self) -> bool {
        self.k_violated() || self.l_violated()
    }
}

/// Groups records by the full quasi-identifier tuple and reports whether any group violates k or l.
///
/// Unlike generalization, only sensitive values present in a group are checked against l.
/// The auditor never repairs a violation.
///
/// # Arguments
/// * `data` - Suppressed and coarsened dataframe.
/// * `identifiers` - Column roles of the quasi-identifiers and sensitive attribute.
/// * `definition` - The k and l thresholds.
///
/// # Example
/// ```
/// use flightanon_validator::base::{Array, Dataframe, PrivacyDefinition, QuasiIdentifiers, YearMonth};
/// use flightanon_validator::audit;
///
/// let month: YearMonth = "2022-04".parse().unwrap();
/// let data = Dataframe::from_columns(vec![
///     ("Gender", Array::from(vec!["Male", "Male", "Male"])),
///     ("Airport Continent", Array::from(vec!["Asia", "Asia", "Asia"])),
///     ("Departure Date", Array::from(vec![month; 3])),
///     ("Age", Array::from(vec![30_i64, 30, 30])),
///     ("Flight Status", Array::from(vec!["Delayed", "Delayed", "On Time"])),
/// ]).unwrap();
///
/// let result = audit(&data, &QuasiIdentifiers::default(), &PrivacyDefinition::new(3, 2, vec![])).unwrap();
/// assert!(!result.k_violated());
/// assert!(result.l_violated());
/// ```
pub fn audit(
    data: &Dataframe, identifiers: &QuasiIdentifiers, definition: &PrivacyDefinition,
) -> Result<Audit> {
    let sensitive = data.column(&identifiers.sensitive)?;
    let groups = partition_by(data, &identifiers.full())?;

    let audit = groups.values()
        .fold(Audit { num_groups: groups.len(), ..Audit::default() }, |mut audit, rows| {
            if !definition.is_k_anonymous(rows.len()) {
                audit.k_violations += 1;
            }
            if count_categories(sensitive, rows).values().any(|&count| count < definition.l) {
                audit.l_violations += 1;
            }
            audit
        });

    debug!(groups = audit.num_groups, k_violations = audit.k_violations,
           l_violations = audit.l_violations, "audited quasi-identifier groups");
    Ok(audit)
}


#[cfg(test)]
mod test_privacy {
    use crate::base::{Array, Dataframe, PrivacyDefinition, QuasiIdentifiers, YearMonth};
    use crate::utilities::privacy::audit;

    fn data(ages: Vec<i64>, statuses: Vec<&str>) -> Dataframe {
        let month: YearMonth = "2022-06".parse().unwrap();
        let n = ages.len();
        Dataframe::from_columns(vec![
            ("Gender", Array::from(vec!["Female"; n])),
            ("Airport Continent", Array::from(vec!["Oceania"; n])),
            ("Departure Date", Array::from(vec![month; n])),
            ("Age", Array::from(ages)),
            ("Flight Status", Array::from(statuses)),
        ]).unwrap()
    }

    #[test]
    fn small_group_violates_k() {
        let data = data(vec![20, 20, 20, 31], vec!["Delayed", "Delayed", "Delayed", "Delayed"]);
        let result = audit(&data, &QuasiIdentifiers::default(), &PrivacyDefinition::new(3, 1, vec![])).unwrap();
        assert_eq!(result.num_groups, 2);
        assert_eq!(result.k_violations, 1);
        assert!(!result.l_violated());
        assert!(result.requires_generalization());
    }

    #[test]
    fn absent_categories_are_not_checked() {
        let data = data(vec![20, 20], vec!["Delayed", "Delayed"]);
        let definition = PrivacyDefinition::new(2, 2, vec!["Delayed".to_string(), "Cancelled".to_string()]);
        let result = audit(&data, &QuasiIdentifiers::default(), &definition).unwrap();
        assert!(!result.requires_generalization());
    }

    #[test]
    fn missing_column_is_an_error() {
        let mut data = data(vec![20], vec!["Delayed"]);
        data.remove("Age");
        assert!(audit(&data, &QuasiIdentifiers::default(), &PrivacyDefinition::new(1, 1, vec![])).is_err());
    }
}
