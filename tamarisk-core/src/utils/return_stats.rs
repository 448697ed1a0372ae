use crate::error::StatsError;

/// Running sums over the returns of one evaluation batch.
#[derive(Debug, Default, Clone)]
pub struct ReturnStats {
    n: usize,
    sum: f64,
    sum_of_squares: f64,
    non_finite: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
    pub std: f64,
}

impl ReturnStats {
    pub fn push(&mut self, episode_return: f64) {
        if !episode_return.is_finite() && self.non_finite.is_none() {
            self.non_finite = Some(episode_return);
        }
        self.n += 1;
        self.sum += episode_return;
        self.sum_of_squares += episode_return * episode_return;
    }

    pub fn summary(&self) -> Result<Summary, StatsError> {
        if self.n < 2 {
            return Err(StatsError::TooFewSamples(self.n));
        }
        if let Some(episode_return) = self.non_finite {
            return Err(StatsError::NonFiniteReturn(episode_return));
        }
        let n = self.n as f64;
        let mean = self.sum / n;
        let variance = (self.sum_of_squares - n * mean * mean) / (n - 1.);
        // cancellation can leave a tiny negative number when all returns are equal
        let variance = if variance < 0. { 0. } else { variance };
        Ok(Summary {
            n: self.n,
            mean,
            variance,
            std: variance.sqrt(),
        })
    }
}

impl FromIterator<f64> for ReturnStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        for episode_return in iter {
            stats.push(episode_return);
        }
        stats
    }
}

#[cfg(test)]
mod test {
    use super::ReturnStats;
    use crate::error::StatsError;

    // two pass reference
    fn reference(returns: &[f64]) -> (f64, f64) {
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.);
        (mean, variance)
    }

    #[test]
    fn matches_two_pass_estimator() {
        let returns = [
            -1520.5, -1310.0, -1799.25, -1402.0, -1650.75, -1288.0, -1533.5, -1700.0, -1422.25,
            -1611.0,
        ];
        let summary = returns.iter().copied().collect::<ReturnStats>().summary().unwrap();
        let (mean, variance) = reference(&returns);
        assert_eq!(summary.n, 10);
        assert_eq!(summary.mean, returns.iter().sum::<f64>() / 10.);
        assert!((summary.mean - mean).abs() < 1e-9);
        assert!((summary.variance - variance).abs() < 1e-6 * variance);
        assert_eq!(summary.std, summary.variance.sqrt());
    }

    #[test]
    fn small_example() {
        let summary = [1., 2., 3., 4.]
            .into_iter()
            .collect::<ReturnStats>()
            .summary()
            .unwrap();
        assert_eq!(summary.mean, 2.5);
        assert!((summary.variance - 5. / 3.).abs() < 1e-12);
    }

    #[test]
    fn constant_returns_have_zero_spread() {
        let summary = std::iter::repeat_n(-1234.1, 10)
            .collect::<ReturnStats>()
            .summary()
            .unwrap();
        assert!(summary.variance >= 0.);
        assert!(summary.std < 1e-3);
    }

    #[test]
    fn single_return_is_rejected() {
        let stats: ReturnStats = [42.].into_iter().collect();
        assert_eq!(stats.summary(), Err(StatsError::TooFewSamples(1)));
        assert_eq!(
            ReturnStats::default().summary(),
            Err(StatsError::TooFewSamples(0))
        );
    }

    #[test]
    fn non_finite_returns_are_rejected() {
        let stats: ReturnStats = [1., f64::NAN, 3.].into_iter().collect();
        assert!(matches!(
            stats.summary(),
            Err(StatsError::NonFiniteReturn(r)) if r.is_nan()
        ));
        let stats: ReturnStats = [1., f64::INFINITY, f64::NEG_INFINITY].into_iter().collect();
        assert_eq!(
            stats.summary(),
            Err(StatsError::NonFiniteReturn(f64::INFINITY))
        );
    }

    #[test]
    fn overflowing_squares_are_not_clamped() {
        let summary = [1e200, -1e200]
            .into_iter()
            .collect::<ReturnStats>()
            .summary()
            .unwrap();
        assert_eq!(summary.mean, 0.);
        assert!(summary.variance.is_infinite());
        assert!(summary.std.is_infinite());
    }
}
