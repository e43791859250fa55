use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::ClassifierError;

/// Online learning algorithm selected when a classifier is built.
///
/// Parsed from (and serialized as) the short identifiers used throughout the
/// library: `P`, `AP`, `PA`, `PA1`, `PA2`, `PAK`, `CW`, `AL`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Perceptron.
    #[serde(rename = "P")]
    Perceptron,
    /// Averaged Perceptron.
    #[serde(rename = "AP")]
    AveragedPerceptron,
    /// Passive-Aggressive.
    #[serde(rename = "PA")]
    PassiveAggressive,
    /// Passive-Aggressive I (step capped by `C`).
    #[serde(rename = "PA1")]
    PassiveAggressive1,
    /// Passive-Aggressive II (step softened by `1/2C`).
    #[serde(rename = "PA2")]
    PassiveAggressive2,
    /// Passive-Aggressive with a degree-2 polynomial kernel.
    #[serde(rename = "PAK")]
    KernelPassiveAggressive,
    /// Confidence-Weighted.
    #[serde(rename = "CW")]
    ConfidenceWeighted,
    /// ALMA (Approximate Large Margin Algorithm), p = 2.
    #[serde(rename = "AL")]
    Alma,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Perceptron,
        Method::AveragedPerceptron,
        Method::PassiveAggressive,
        Method::PassiveAggressive1,
        Method::PassiveAggressive2,
        Method::KernelPassiveAggressive,
        Method::ConfidenceWeighted,
        Method::Alma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Perceptron => "P",
            Method::AveragedPerceptron => "AP",
            Method::PassiveAggressive => "PA",
            Method::PassiveAggressive1 => "PA1",
            Method::PassiveAggressive2 => "PA2",
            Method::KernelPassiveAggressive => "PAK",
            Method::ConfidenceWeighted => "CW",
            Method::Alma => "AL",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ClassifierError::InvalidMethod(s.to_string()))
    }
}

/// ALMA parameters: `alpha` in (0, 1] sets the margin target `(1 - alpha)`
/// of the shrinking threshold `b / sqrt(k)`, `c` scales the learning rate
/// `c / sqrt(alpha * k)` and the weights are kept inside the ball of radius
/// `b / sqrt(alpha)`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlmaParams {
    pub alpha: f32,
    pub b: f32,
    pub c: f32,
}

impl Default for AlmaParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            b: 1.0,
            c: std::f32::consts::SQRT_2,
        }
    }
}

impl AlmaParams {
    /// Parameters from Gentile (2001): `b = 1 / alpha`, `c = sqrt(2)`.
    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            alpha,
            b: 1.0 / alpha,
            c: std::f32::consts::SQRT_2,
        }
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ClassifierError::InvalidHyperparameter {
                name: "alma.alpha",
                value: self.alpha as f64,
            });
        }
        if !(self.b.is_finite() && self.b > 0.0) {
            return Err(ClassifierError::InvalidHyperparameter {
                name: "alma.b",
                value: self.b as f64,
            });
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ClassifierError::InvalidHyperparameter {
                name: "alma.c",
                value: self.c as f64,
            });
        }
        Ok(())
    }
}

/// Central configuration for a classifier.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub method: Method,
    /// Aggressiveness for PA1/PA2/PAK, confidence parameter phi for CW.
    pub c: f32,
    /// Value of the implicit bias feature used when updating the bias weight.
    pub bias: f32,
    /// Whether the implicit bias feature takes part in updates and norms.
    pub use_bias: bool,
    pub alma: AlmaParams,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            method: Method::PassiveAggressive1,
            c: 1.0,
            bias: 0.0,
            use_bias: true,
            alma: AlmaParams::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_c(mut self, c: f32) -> Self {
        self.c = c;
        self
    }

    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_use_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    pub fn with_alma(mut self, alma: AlmaParams) -> Self {
        self.alma = alma;
        self
    }

    /// Set the CW confidence parameter from a target probability `eta` of
    /// classifying correctly: `phi = Φ⁻¹(eta)`. `eta` must lie in (0.5, 1).
    pub fn with_cw_confidence(mut self, eta: f64) -> Result<Self, ClassifierError> {
        if !(eta > 0.5 && eta < 1.0) {
            return Err(ClassifierError::InvalidHyperparameter {
                name: "eta",
                value: eta,
            });
        }
        let standard = Normal::new(0.0, 1.0).map_err(|_| ClassifierError::InvalidHyperparameter {
            name: "eta",
            value: eta,
        })?;
        self.c = standard.inverse_cdf(eta) as f32;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        validate_c(self.c)?;
        validate_bias(self.bias)?;
        self.alma.validate()
    }
}

pub(crate) fn validate_c(c: f32) -> Result<(), ClassifierError> {
    if c.is_finite() && c > 0.0 {
        Ok(())
    } else {
        Err(ClassifierError::InvalidHyperparameter {
            name: "C",
            value: c as f64,
        })
    }
}

pub(crate) fn validate_bias(bias: f32) -> Result<(), ClassifierError> {
    if bias.is_finite() {
        Ok(())
    } else {
        Err(ClassifierError::InvalidHyperparameter {
            name: "bias",
            value: bias as f64,
        })
    }
}

/// Read a JSON classifier configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<ClassifierConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ClassifierConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
        for bad in ["AWP", "PY", "pa1", "", "0"] {
            assert!(matches!(
                bad.parse::<Method>(),
                Err(ClassifierError::InvalidMethod(_))
            ));
        }
    }

    #[test]
    fn test_method_serde_uses_identifiers() {
        let json = serde_json::to_string(&Method::KernelPassiveAggressive).unwrap();
        assert_eq!(json, "\"PAK\"");
        let method: Method = serde_json::from_str("\"CW\"").unwrap();
        assert_eq!(method, Method::ConfidenceWeighted);
        assert!(serde_json::from_str::<Method>("0").is_err());
        assert!(serde_json::from_str::<Method>("\"AWP\"").is_err());
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: ClassifierConfig = serde_json::from_str(r#"{"method": "AL"}"#).unwrap();
        assert_eq!(config.method, Method::Alma);
        assert_eq!(config.c, 1.0);
        assert_eq!(config.bias, 0.0);
        assert!(config.use_bias);
        assert_eq!(config.alma, AlmaParams::default());
    }

    #[test]
    fn test_validate_rejects_bad_hyperparameters() {
        assert!(ClassifierConfig::default().validate().is_ok());
        assert!(ClassifierConfig::default().with_c(0.0).validate().is_err());
        assert!(ClassifierConfig::default().with_c(f32::NAN).validate().is_err());
        assert!(ClassifierConfig::default()
            .with_bias(f32::INFINITY)
            .validate()
            .is_err());
        assert!(ClassifierConfig::default()
            .with_alma(AlmaParams::with_alpha(1.5))
            .validate()
            .is_err());
    }

    #[test]
    fn test_cw_confidence_uses_normal_quantile() {
        let config = ClassifierConfig::new(Method::ConfidenceWeighted)
            .with_cw_confidence(0.9)
            .unwrap();
        assert!((config.c - 1.281_551_6).abs() < 1e-5);
        assert!(ClassifierConfig::default().with_cw_confidence(0.5).is_err());
        assert!(ClassifierConfig::default().with_cw_confidence(1.0).is_err());
    }
}
