use serde::{Deserialize, Serialize};

use super::error::GenerationError;

/// Tuning knobs shared by every room layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Fraction of spanning-tree edges added back as loops. `None` uses the layout's own ratio.
    pub additional_connection_ratio: Option<f64>,
    pub extra_connection_retries: u32,
    /// Upper bound of the random offset added to each room centroid before triangulation.
    pub site_jitter: f64,
    pub placement_retries: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            additional_connection_ratio: None,
            extra_connection_retries: 100,
            site_jitter: 0.1,
            placement_retries: 100,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if let Some(ratio) = self.additional_connection_ratio
            && !(0.0..=1.0).contains(&ratio)
        {
            return Err(GenerationError::InvalidConfig(format!(
                "additional_connection_ratio must be within [0, 1], got {ratio}"
            )));
        }
        if !(0.0..1.0).contains(&self.site_jitter) {
            return Err(GenerationError::InvalidConfig(format!(
                "site_jitter must be within [0, 1), got {}",
                self.site_jitter
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: GeneratorConfig = toml::from_str("site_jitter = 0.05").expect("parse config");
        assert_eq!(config.site_jitter, 0.05);
        assert_eq!(config.placement_retries, 100);
        assert_eq!(config.additional_connection_ratio, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config = GeneratorConfig { additional_connection_ratio: Some(1.5), ..Default::default() };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));

        let config = GeneratorConfig { site_jitter: f64::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));
    }
}
