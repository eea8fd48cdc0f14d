//! Parameter metadata for pattern detectors
//!
//! This module provides metadata about detector parameters, enabling:
//! - Grid search over thresholds
//! - Parameter documentation
//! - Building detectors from loosely-typed configuration maps
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use ohlc_patterns::params::ParameterizedDetector;
//! use ohlc_patterns::prelude::*;
//!
//! for param in HammerDetector::param_meta() {
//!   println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let params = HashMap::from([("long_wick_factor", 3.0)]);
//! let hammer = HammerDetector::with_params(&params).unwrap();
//! assert_eq!(hammer.long_wick_factor, 3.0);
//! ```

use std::collections::HashMap;

use crate::{detectors::helpers::check_factor, PatternError, Ratio, Result, Tolerance};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Absolute price distance, finite and non-negative
    Tolerance,
    /// Fraction of a bar's range (0.0..=1.0)
    Ratio,
    /// Multiple of a bar measurement, finite and non-negative
    Factor,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "long_wick_factor")
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Range for grid search: (min, max, step)
    pub range: (f64, f64, f64),
    pub description: &'static str,
}

impl ParamMeta {
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Ratio, default, range, description }
    }

    pub const fn factor(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Factor, default, range, description }
    }

    pub const fn tolerance(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Tolerance, default, range, description }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        if step <= 0.0 {
            return vec![min];
        }
        let steps = ((max - min) / step + 1e-9).floor() as usize;
        (0..=steps).map(|i| min + step * i as f64).collect()
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if !(min..=max).contains(&value) {
            return Err(PatternError::OutOfRange { field: self.name, value, min, max });
        }
        match self.param_type {
            ParamType::Ratio => Ratio::new(value).map(|_| ()),
            ParamType::Tolerance => Tolerance::new(value).map(|_| ()),
            ParamType::Factor => check_factor(self.name, value),
        }
    }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Detectors that can be built from a name -> value map.
pub trait ParameterizedDetector: Sized {
    /// Returns metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Creates a detector with parameters from a HashMap
    ///
    /// Missing parameters use their default values.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    /// Returns the pattern ID string
    fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

pub fn get_tolerance(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Tolerance> {
    let value = params.get(key).copied().unwrap_or(default);
    Tolerance::new(value)
}

/// Factors have no upper bound but must be finite and non-negative.
pub fn get_factor(params: &HashMap<&str, f64>, key: &'static str, default: f64) -> Result<f64> {
    let value = params.get(key).copied().unwrap_or(default);
    check_factor(key, value)?;
    Ok(value)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{DojiDetector, HammerDetector, SpinningTopDetector};

    #[test]
    fn test_param_meta_ratio() {
        let meta = ParamMeta::ratio("test_ratio", 0.3, (0.1, 0.5, 0.1), "Test ratio parameter");

        assert_eq!(meta.name, "test_ratio");
        assert_eq!(meta.param_type, ParamType::Ratio);
        assert_eq!(meta.default, 0.3);
    }

    #[test]
    fn test_generate_grid() {
        let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.2), "Test");

        let grid = meta.generate_grid();
        assert_eq!(grid.len(), 3);
        assert!((grid[0] - 0.3).abs() < 1e-12);
        assert!((grid[1] - 0.5).abs() < 1e-12);
        assert!((grid[2] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_validate_by_type() {
        let ratio = ParamMeta::ratio("r", 0.5, (0.0, 2.0, 0.1), "");
        assert!(ratio.validate(0.5).is_ok());
        assert!(ratio.validate(1.5).is_err());

        let tol = ParamMeta::tolerance("t", 0.001, (0.0, 0.01, 0.001), "");
        assert!(tol.validate(0.005).is_ok());
        assert!(matches!(tol.validate(0.02), Err(PatternError::OutOfRange { field: "t", .. })));

        let factor = ParamMeta::factor("f", 2.0, (1.0, 3.0, 0.5), "");
        assert!(factor.validate(2.5).is_ok());
        assert!(factor.validate(0.5).is_err());
    }

    #[test]
    fn test_helpers_fall_back_to_defaults() {
        let params = HashMap::from([("tolerance", 0.01)]);

        assert_eq!(get_tolerance(&params, "tolerance", 0.001).unwrap().get(), 0.01);
        assert_eq!(get_ratio(&params, "missing", 0.3).unwrap().get(), 0.3);
        assert_eq!(get_factor(&params, "missing", 2.0).unwrap(), 2.0);
        assert!(get_tolerance(&HashMap::from([("tolerance", -1.0)]), "tolerance", 0.001).is_err());
    }

    #[test]
    fn test_detectors_from_params() {
        let doji = DojiDetector::with_params(&HashMap::from([("tolerance", 0.05)])).unwrap();
        assert_eq!(doji.tolerance.get(), 0.05);

        let top = SpinningTopDetector::with_params(&HashMap::new()).unwrap();
        assert_eq!(top.wick_factor, 2.0);

        assert!(HammerDetector::with_params(&HashMap::from([("max_body_ratio", 1.5)])).is_err());
        assert_eq!(HammerDetector::pattern_id_str(), "hammer");
    }

    #[test]
    fn test_every_default_sits_inside_its_grid() {
        for meta in SpinningTopDetector::param_meta()
            .iter()
            .chain(HammerDetector::param_meta())
            .chain(DojiDetector::param_meta())
        {
            assert!(meta.validate(meta.default).is_ok(), "{} default out of range", meta.name);
        }
    }
}
