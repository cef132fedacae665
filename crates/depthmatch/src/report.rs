use crate::orchestrator::BatchResult;

/// Summary statistics of a set of angular errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorStatistics {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Median, the mean of the two middle samples for an even count.
    pub median: f64,
}

impl ErrorStatistics {
    /// Compute the statistics of `samples`, or `None` when there are no samples.
    ///
    /// Example:
    ///
    /// ```
    /// use depthmatch::report::ErrorStatistics;
    ///
    /// let stats = ErrorStatistics::from_samples(&[1.0, 3.0, 2.0, 4.0]).unwrap();
    /// assert_eq!(stats.mean, 2.5);
    /// assert_eq!(stats.median, 2.5);
    /// assert_eq!((stats.min, stats.max), (1.0, 4.0));
    /// ```
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            count: samples.len(),
            mean,
            std: var.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median,
        })
    }

    /// The same statistics with every value converted from radians to degrees.
    pub fn to_degrees(&self) -> Self {
        Self {
            count: self.count,
            mean: self.mean.to_degrees(),
            std: self.std.to_degrees(),
            min: self.min.to_degrees(),
            max: self.max.to_degrees(),
            median: self.median.to_degrees(),
        }
    }
}

/// Pearson correlation of two equally long sample sets.
///
/// `None` with fewer than two samples or when either set is constant.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a * var_b).sqrt())
}

impl BatchResult {
    /// Statistics of the rotation errors of all processed pairs, in radians.
    pub fn rotation_statistics(&self) -> Option<ErrorStatistics> {
        let samples: Vec<f64> = self
            .outcomes
            .iter()
            .map(|o| o.rotation_error)
            .collect();
        ErrorStatistics::from_samples(&samples)
    }

    /// Statistics of the translation errors of all processed pairs, in radians.
    pub fn translation_statistics(&self) -> Option<ErrorStatistics> {
        let samples: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| o.translation_error)
            .collect();
        ErrorStatistics::from_samples(&samples)
    }

    /// Statistics of the rotation errors against the reference poses, in radians.
    pub fn reference_rotation_statistics(&self) -> Option<ErrorStatistics> {
        let samples: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| o.reference.map(|r| r.rotation_error))
            .collect();
        ErrorStatistics::from_samples(&samples)
    }

    /// Statistics of the translation errors against the reference poses, in radians.
    pub fn reference_translation_statistics(&self) -> Option<ErrorStatistics> {
        let samples: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| o.reference.map(|r| r.translation_error))
            .collect();
        ErrorStatistics::from_samples(&samples)
    }

    /// Correlation between the predicted scales of both directions.
    pub fn scale_correlation(&self) -> Option<f64> {
        let (scale12, scale21): (Vec<f64>, Vec<f64>) = self
            .outcomes
            .iter()
            .map(|o| (o.scale12, o.scale21))
            .unzip();
        correlation(&scale12, &scale21)
    }
}
