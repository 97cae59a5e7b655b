use flightanon_validator::errors::*;

use flightanon_validator::base::Dataframe;
use flightanon_validator::utilities::partition::count_categories;
use crate::config::DivergencePolicy;
use indexmap::IndexMap;

/// Share of each category of `column` in `data`, in order of first occurrence.
///
/// The shares of a non-empty column sum to 1. An empty dataframe has an empty distribution.
pub fn distribution(data: &Dataframe, column: &str) -> Result<IndexMap<String, f64>> {
    let rows = (0..data.num_records()).collect::<Vec<usize>>();
    let total = rows.len() as f64;
    Ok(count_categories(data.column(column)?, &rows).into_iter()
        .map(|(category, count)| (category, count as f64 / total))
        .collect())
}

/// Kullback-Leibler divergence of the anonymized distribution of `attribute` from the original.
///
/// Sums `p * ln(p / q)` over the categories of the original, where `p` and `q` are the shares of
/// a category before and after anonymization.
///
/// # Arguments
/// * `original` - Dataset before anonymization.
/// * `anonymized` - Dataset after anonymization. Both must contain `attribute`.
/// * `attribute` - Name of a categorical column.
/// * `policy` - Whether a category missing from the anonymized data is an error or an infinite divergence.
///
/// # Return
/// A non-negative divergence, zero when the two distributions agree.
///
/// # Example
/// ```
/// use flightanon_validator::base::{Array, Dataframe};
/// use flightanon_runtime::components::utility::kl_divergence;
/// use flightanon_runtime::config::DivergencePolicy;
///
/// let original = Dataframe::from_columns(vec![
///     ("Flight Status", Array::from(vec!["Delayed", "On Time", "On Time", "Cancelled"]))]).unwrap();
/// let shuffled = Dataframe::from_columns(vec![
///     ("Flight Status", Array::from(vec!["On Time", "Cancelled", "Delayed", "On Time"]))]).unwrap();
/// let skewed = Dataframe::from_columns(vec![
///     ("Flight Status", Array::from(vec!["On Time", "On Time", "On Time", "Cancelled"]))]).unwrap();
///
/// assert_eq!(kl_divergence(&original, &shuffled, "Flight Status", DivergencePolicy::Error).unwrap(), 0.);
/// assert!(kl_divergence(&original, &skewed, "Flight Status", DivergencePolicy::Error).is_err());
/// assert!(kl_divergence(&original, &skewed, "Flight Status", DivergencePolicy::Infinity).unwrap().is_infinite());
/// ```
pub fn kl_divergence(
    original: &Dataframe, anonymized: &Dataframe, attribute: &str, policy: DivergencePolicy,
) -> Result<f64> {
    let p = distribution(original, attribute)?;
    let q = distribution(anonymized, attribute)?;

    let divergence = p.iter()
        .filter(|(_, &p)| p > 0.)
        .map(|(category, &p)| match q.get(category).cloned().unwrap_or(0.) {
            q if q > 0. => Ok(p * (p / q).ln()),
            _ => match policy {
                DivergencePolicy::Error => Err(ErrorKind::DivergenceUndefined(category.clone()).into()),
                DivergencePolicy::Infinity => Ok(f64::INFINITY)
            }
        })
        .sum::<Result<f64>>()?;

    // rounding may leave identical distributions slightly below zero
    Ok(divergence.max(0.))
}

/// Rounds a heuristic utility score to two decimals.
pub fn round_utility(utility: f64) -> f64 {
    (utility * 100.).round() / 100.
}
