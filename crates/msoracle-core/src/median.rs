//! Sample computation over an ascending sequence of rates.
//!
//! ```text
//! n odd:  sample = v[(n - 1) / 2]
//! n even: sample = floor((v[n/2 - 1] + v[n/2]) / 2)
//! ```
//!
//! Only the multiset of rates matters; the order in which providers
//! submitted them has no effect.

use msoracle_types::{Rate, Sample};

use crate::{OracleError, Result};

/// Compute the sample from rates sorted in ascending order.
///
/// # Errors
///
/// - [`OracleError::NoData`] if the sequence is empty
///
/// # Examples
///
/// ```
/// use msoracle_core::median::compute_sample;
///
/// let sample = compute_sample([100_000u128, 200_000, 300_000, 400_000]).unwrap();
/// assert_eq!(sample.count, 4);
/// assert_eq!(sample.aggregate, 250_000);
/// ```
pub fn compute_sample<I>(ordered_values: I) -> Result<Sample>
where
    I: IntoIterator<Item = Rate>,
    I::IntoIter: ExactSizeIterator,
{
    let mut values = ordered_values.into_iter();
    let count = values.len();
    if count == 0 {
        return Err(OracleError::NoData);
    }

    let aggregate = if count % 2 == 1 {
        values.nth((count - 1) / 2).ok_or(OracleError::NoData)?
    } else {
        let low = values.nth(count / 2 - 1).ok_or(OracleError::NoData)?;
        let high = values.next().ok_or(OracleError::NoData)?;
        floor_average(low, high)
    };

    Ok(Sample { count, aggregate })
}

/// `floor((a + b) / 2)` without forming the sum.
fn floor_average(a: Rate, b: Rate) -> Rate {
    a / 2 + b / 2 + (a % 2 + b % 2) / 2
}
