use std::collections::BTreeMap;

use facade_api::{DeviceCategory, Sample};

/// Arithmetic mean of the numeric readings of a pool.
///
/// Booleans count as `1.0` / `0.0`. Null and other non-numeric readings are
/// dropped; an empty pool averages to `0.0`.
pub fn mean_of<'a, I>(samples: I) -> f64
where
    I: IntoIterator<Item = &'a Sample>,
{
    let (sum, count) = samples
        .into_iter()
        .filter_map(Sample::numeric)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Pools every series of a category and reduces it to one scalar.
///
/// Every category given gets an entry, even when none of its series
/// returned data.
pub fn average_by_category(
    series: &BTreeMap<DeviceCategory, Vec<Vec<Sample>>>,
) -> BTreeMap<DeviceCategory, f64> {
    series
        .iter()
        .map(|(category, topics)| (*category, mean_of(topics.iter().flatten())))
        .collect()
}
