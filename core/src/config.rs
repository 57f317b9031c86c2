use crate::{
    amounts::AmountPolicy,
    catalog::ProspectCatalog,
    error::{SurveyError, SurveyResult},
    prospect::Prospect,
};
use serde::{Deserialize, Serialize};

/// Tunables read from `survey/survey_config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurveySettingsFile {
    gain_problems: usize,
    loss_problems: usize,
    min_age: u32,
    #[serde(default)]
    amount_policy: AmountPolicy,
    #[serde(default)]
    neutral_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub catalog: ProspectCatalog,
    /// Gain prospects drawn per survey.
    pub gain_problems: usize,
    /// Loss prospects drawn per survey.
    pub loss_problems: usize,
    pub min_age: u32,
    pub amount_policy: AmountPolicy,
    /// Half-width of the risk-neutral band around EV. 0.0 = exact equality.
    pub neutral_tolerance: f64,
}

impl SurveyConfig {
    /// Load from the data/ directory.
    /// In tests, use SurveyConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let settings_path = format!("{data_dir}/survey/survey_config.json");
        let settings_content = std::fs::read_to_string(&settings_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {settings_path}: {e}"))?;
        let settings: SurveySettingsFile = serde_json::from_str(&settings_content)?;

        let catalog_path = format!("{data_dir}/prospects/catalog.json");
        let catalog_content = std::fs::read_to_string(&catalog_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {catalog_path}: {e}"))?;
        let catalog = ProspectCatalog::from_json(&catalog_content)
            .map_err(|e| anyhow::anyhow!("Invalid catalog {catalog_path}: {e}"))?;

        let config = Self {
            catalog,
            gain_problems: settings.gain_problems,
            loss_problems: settings.loss_problems,
            min_age: settings.min_age,
            amount_policy: settings.amount_policy,
            neutral_tolerance: settings.neutral_tolerance,
        };
        config.validate()?;
        log::info!(
            "Loaded survey config from {data_dir}: {} gains + {} losses from {} prospects",
            config.gain_problems,
            config.loss_problems,
            config.catalog.len()
        );
        Ok(config)
    }

    /// The compiled-in catalog with the standard 5 gain + 5 loss draw.
    pub fn builtin() -> SurveyResult<Self> {
        let config = Self {
            catalog: ProspectCatalog::builtin()?,
            gain_problems: 5,
            loss_problems: 5,
            min_age: 18,
            amount_policy: AmountPolicy::Concave,
            neutral_tolerance: 0.0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// Draws every prospect in a small catalog: 2 gains + 2 losses.
    pub fn default_test() -> Self {
        let p = |outcomes, probabilities| Prospect { outcomes, probabilities };
        Self {
            catalog: ProspectCatalog {
                gains: vec![
                    p([0.0, 100.0], [0.5, 0.5]),
                    p([50.0, 150.0], [0.9, 0.1]),
                ],
                losses: vec![
                    p([0.0, -100.0], [0.5, 0.5]),
                    p([-50.0, -150.0], [0.25, 0.75]),
                ],
            },
            gain_problems: 2,
            loss_problems: 2,
            min_age: 18,
            amount_policy: AmountPolicy::Concave,
            neutral_tolerance: 0.0,
        }
    }

    pub fn total_problems(&self) -> usize {
        self.gain_problems + self.loss_problems
    }

    pub fn validate(&self) -> SurveyResult<()> {
        self.catalog.validate()?;
        if self.total_problems() == 0 {
            return Err(SurveyError::InvalidConfig {
                reason: "a survey needs at least one problem".into(),
            });
        }
        if !self.neutral_tolerance.is_finite() || self.neutral_tolerance < 0.0 {
            return Err(SurveyError::InvalidConfig {
                reason: format!(
                    "neutral_tolerance must be a non-negative number, got {}",
                    self.neutral_tolerance
                ),
            });
        }
        for (domain, requested, available) in [
            ("gain", self.gain_problems, self.catalog.gains.len()),
            ("loss", self.loss_problems, self.catalog.losses.len()),
        ] {
            if requested > available {
                return Err(SurveyError::CatalogTooSmall {
                    domain: domain.into(),
                    requested,
                    available,
                });
            }
        }
        Ok(())
    }
}
