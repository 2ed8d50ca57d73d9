use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// count/mean/std/quartiles, the way a dataframe `describe()` reports a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// Sample standard deviation (n - 1); 0.0 below two values.
    pub fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(values);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Linear-interpolated quantile of already sorted values.
    pub fn quantile(sorted: &[f64], q: f64) -> f64 {
        match sorted.len() {
            0 => 0.0,
            1 => sorted[0],
            n => {
                let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
                let lower = pos.floor() as usize;
                let upper = pos.ceil() as usize;
                sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
            }
        }
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    pub fn describe(values: &[f64]) -> Option<NumericSummary> {
        if values.is_empty() {
            return None;
        }
        let sorted = Self::sorted(values);
        Some(NumericSummary {
            count: sorted.len(),
            mean: Self::mean(&sorted),
            std: Self::std_dev(&sorted),
            min: sorted[0],
            q25: Self::quantile(&sorted, 0.25),
            median: Self::quantile(&sorted, 0.5),
            q75: Self::quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
        Self::describe(values).map(|d| BoxStats {
            count: d.count,
            min: d.min,
            q1: d.q25,
            median: d.median,
            q3: d.q75,
            max: d.max,
        })
    }

    /// Equal-width bins spanning min..=max; the max value lands in the last bin.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        if values.is_empty() || bins == 0 {
            return Vec::new();
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min == max {
            return vec![HistogramBin { lower: min, upper: max, count: values.len() }];
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + width * i as f64,
                upper: if i == bins - 1 { max } else { min + width * (i + 1) as f64 },
                count,
            })
            .collect()
    }

    /// Occurrences per key, most frequent first; ties ordered by key.
    pub fn count_by<K, I>(keys: I) -> Vec<(K, usize)>
    where
        K: Eq + Hash + Ord,
        I: IntoIterator<Item = K>,
    {
        let mut map: HashMap<K, usize> = HashMap::new();
        for key in keys {
            *map.entry(key).or_default() += 1;
        }
        let mut counts: Vec<(K, usize)> = map.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Values grouped by key, groups in key order.
    pub fn group_values<K, I>(pairs: I) -> Vec<(K, Vec<f64>)>
    where
        K: Eq + Hash + Ord,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut map: HashMap<K, Vec<f64>> = HashMap::new();
        for (key, value) in pairs {
            map.entry(key).or_default().push(value);
        }
        let mut groups: Vec<(K, Vec<f64>)> = map.into_iter().collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
    }

    /// Calculates the Pearson correlation coefficient between two slices.
    /// Returns None if slices have different lengths, are empty, or either has no variance.
    pub fn compute_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.is_empty() {
            return None;
        }
        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;
        let numerator: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| (xi - mean_x) * (yi - mean_y)).sum();
        let denominator_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
        let denominator_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
        let denominator = (denominator_x * denominator_y).sqrt();
        if denominator == 0.0 {
            None
        } else {
            Some(numerator / denominator)
        }
    }
}
