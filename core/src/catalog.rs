//! Static library of two-outcome gambles, split into gain and loss pools.
//!
//! A survey draws a fixed number from each pool without replacement
//! and then shuffles the combined list, so gains and losses interleave.

use crate::{
    error::{SurveyError, SurveyResult},
    prospect::{Domain, Prospect},
    rng::SurveyRng,
};
use serde::{Deserialize, Serialize};

/// The catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../../data/prospects/catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProspectCatalog {
    pub gains:  Vec<Prospect>,
    pub losses: Vec<Prospect>,
}

impl ProspectCatalog {
    pub fn new(gains: Vec<Prospect>, losses: Vec<Prospect>) -> SurveyResult<Self> {
        let catalog = Self { gains, losses };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> SurveyResult<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn builtin() -> SurveyResult<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Every entry must be well formed and sit in the pool matching its domain.
    pub fn validate(&self) -> SurveyResult<()> {
        for (pool, expected) in [(&self.gains, Domain::Gain), (&self.losses, Domain::Loss)] {
            for prospect in pool {
                prospect.validate()?;
                if prospect.domain() != expected {
                    return Err(SurveyError::InvalidProspect {
                        reason: format!(
                            "{:?} is a {} prospect listed in the {} pool",
                            prospect.outcomes,
                            prospect.domain(),
                            expected
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.gains.len() + self.losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw `n_gain` gains and `n_loss` losses without replacement,
    /// then shuffle the order of the combined sequence.
    pub fn sample(
        &self,
        n_gain: usize,
        n_loss: usize,
        rng: &mut SurveyRng,
    ) -> SurveyResult<Vec<Prospect>> {
        let mut drawn = Vec::with_capacity(n_gain + n_loss);
        for (pool, requested, domain) in [
            (&self.gains, n_gain, Domain::Gain),
            (&self.losses, n_loss, Domain::Loss),
        ] {
            if requested > pool.len() {
                return Err(SurveyError::CatalogTooSmall {
                    domain: domain.to_string().to_lowercase(),
                    requested,
                    available: pool.len(),
                });
            }
            drawn.extend(
                rng.sample_indices(pool.len(), requested)
                    .into_iter()
                    .map(|i| pool[i].clone()),
            );
        }
        rng.shuffle(&mut drawn);

        log::debug!(
            "catalog: drew {n_gain} gain + {n_loss} loss prospects from {} entries",
            self.len()
        );
        Ok(drawn)
    }
}
