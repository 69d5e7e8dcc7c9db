use crate::api::instance_dto::DemandProfileDto;
use crate::error::{Error, Result};

/// Piecewise-constant demand curve.
///
/// Breakpoint `k` covers `[t[k], t[k + 1])` with constant demand `d[k]`. The curve has one more
/// timestamp than breakpoints; the last timestamp marks the end of the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandProfile {
    t: Vec<f64>,
    d: Vec<f64>,
}

impl DemandProfile {
    pub fn new(timestamps: Vec<f64>, demand: Vec<f64>) -> Result<Self> {
        if demand.is_empty() {
            return Err(Error::ModelConstructionError("A demand profile needs at least one breakpoint.".to_string()));
        }

        if timestamps.len() != demand.len() + 1 {
            return Err(Error::ModelConstructionError(format!(
                "A demand profile with {} breakpoints needs {} timestamps (including the horizon end), got {}.",
                demand.len(),
                demand.len() + 1,
                timestamps.len()
            )));
        }

        if timestamps.iter().any(|t| !t.is_finite()) {
            return Err(Error::ModelConstructionError("Demand profile timestamps must be finite.".to_string()));
        }

        if let Some(k) = timestamps.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(Error::ModelConstructionError(format!(
                "Demand profile timestamps must be strictly increasing, but t[{}] = {} and t[{}] = {}.",
                k,
                timestamps[k],
                k + 1,
                timestamps[k + 1]
            )));
        }

        if let Some(k) = demand.iter().position(|d| !d.is_finite() || *d < 0.0) {
            return Err(Error::ModelConstructionError(format!("Demand at breakpoint {} is invalid: {}", k, demand[k])));
        }

        Ok(DemandProfile { t: timestamps, d: demand })
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    pub fn breakpoints(&self) -> std::ops::Range<usize> {
        0..self.d.len()
    }

    /// Timestamp of breakpoint `k`. `k == len()` yields the horizon end.
    pub fn t(&self, k: usize) -> f64 {
        self.t[k]
    }

    pub fn demand(&self, k: usize) -> f64 {
        self.d[k]
    }

    pub fn duration(&self, k: usize) -> f64 {
        self.t[k + 1] - self.t[k]
    }

    /// Time elapsed from breakpoint `from` to breakpoint `to`.
    pub fn span(&self, from: usize, to: usize) -> f64 {
        self.t[to] - self.t[from]
    }

    pub fn horizon_end(&self) -> f64 {
        self.t[self.d.len()]
    }

    pub fn peak_demand(&self) -> f64 {
        self.d.iter().copied().fold(0.0, f64::max)
    }
}

impl TryFrom<DemandProfileDto> for DemandProfile {
    type Error = Error;

    fn try_from(dto: DemandProfileDto) -> Result<Self> {
        DemandProfile::new(dto.timestamps, dto.demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_and_spans() {
        let profile = DemandProfile::new(vec![0.0, 1.0, 5.0, 6.0], vec![1.0, 0.0, 2.0]).unwrap();

        assert_eq!(profile.len(), 3);
        assert_eq!(profile.duration(1), 4.0);
        assert_eq!(profile.span(0, 3), 6.0);
        assert_eq!(profile.horizon_end(), 6.0);
        assert_eq!(profile.peak_demand(), 2.0);
    }

    #[test]
    fn rejects_unordered_timestamps() {
        let result = DemandProfile::new(vec![0.0, 2.0, 2.0], vec![1.0, 1.0]);
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn rejects_missing_horizon_end() {
        let result = DemandProfile::new(vec![0.0, 1.0], vec![1.0, 1.0]);
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn rejects_negative_demand() {
        let result = DemandProfile::new(vec![0.0, 1.0], vec![-1.0]);
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }
}
