//! Stage table: validated, ordered `(heater, ratio)` mappings.
//!
//! Built once from the two parallel configuration lists and immutable
//! afterwards. Entry order is dispatch order.

use core::ops::RangeInclusive;

use stagesync_traits::{DeviceRegistry, HeaterRef};

use crate::error::{ConfigError, HeaterRole, SyncError};

/// Accepted ratio range, bounds included.
pub const RATIO_RANGE: RangeInclusive<f64> = 0.0..=2.0;

pub struct StageMapping {
    heater: HeaterRef,
    ratio: f64,
}

impl core::fmt::Debug for StageMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StageMapping")
            .field("heater", &self.heater.name())
            .field("ratio", &self.ratio)
            .finish()
    }
}

impl StageMapping {
    pub fn heater(&self) -> &HeaterRef {
        &self.heater
    }

    pub fn name(&self) -> &str {
        self.heater.name()
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Target for this stage given the primary's target.
    #[inline]
    pub fn adjusted(&self, target: f64) -> f64 {
        target * self.ratio
    }
}

/// Non-empty, ratio-valid list of stages in configuration order.
#[derive(Debug)]
pub struct StageTable {
    stages: Vec<StageMapping>,
}

/// Parse one ratio literal and check it against [`RATIO_RANGE`].
pub fn parse_ratio(stage: &str, literal: &str) -> Result<f64, ConfigError> {
    let literal = literal.trim();
    let ratio: f64 = literal
        .parse()
        .map_err(|_| ConfigError::UnparsableRatio {
            stage: stage.to_string(),
            literal: literal.to_string(),
        })?;
    // NaN fails `contains`, infinities are outside the range.
    if !RATIO_RANGE.contains(&ratio) {
        return Err(ConfigError::RatioOutOfRange {
            stage: stage.to_string(),
            ratio,
        });
    }
    Ok(ratio)
}

impl StageTable {
    /// Validate `stages`/`temp_ratio` and resolve every stage heater.
    ///
    /// Entries are processed in order and the first failure is returned; no
    /// partial table ever escapes.
    pub fn build(
        stages: &str,
        temp_ratio: &str,
        registry: &dyn DeviceRegistry,
    ) -> Result<Self, SyncError> {
        if stages.trim().is_empty() {
            return Err(ConfigError::NoStages.into());
        }
        let names: Vec<&str> = stages.split(',').map(str::trim).collect();
        let ratios: Vec<&str> = temp_ratio.split(',').collect();
        if names.len() != ratios.len() {
            return Err(ConfigError::LengthMismatch {
                stages: names.len(),
                ratios: ratios.len(),
            }
            .into());
        }

        let mut table = Vec::with_capacity(names.len());
        for (index, (name, literal)) in names.into_iter().zip(ratios).enumerate() {
            if name.is_empty() {
                return Err(ConfigError::EmptyStageName { index }.into());
            }
            let ratio = parse_ratio(name, literal)?;
            let heater = registry
                .lookup_heater(name)
                .ok_or_else(|| SyncError::Lookup {
                    role: HeaterRole::Stage,
                    name: name.to_string(),
                })?;
            tracing::info!(stage = name, ratio, "stage mapped");
            table.push(StageMapping { heater, ratio });
        }

        Ok(StageTable { stages: table })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a built table; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageMapping> {
        self.stages.iter()
    }

    /// Stage names joined for messages, e.g. `left, right`.
    pub fn names(&self) -> String {
        self.stages
            .iter()
            .map(StageMapping::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ratio_accepts_inclusive_bounds() {
        assert_eq!(parse_ratio("a", "0"), Ok(0.0));
        assert_eq!(parse_ratio("a", " 2.0 "), Ok(2.0));
        assert_eq!(parse_ratio("a", "1.25"), Ok(1.25));
    }

    #[test]
    fn parse_ratio_rejects_non_finite_and_garbage() {
        for lit in ["nan", "inf", "-inf", "", "x1", "1,0"] {
            assert!(parse_ratio("a", lit).is_err(), "{lit} should be rejected");
        }
        assert!(matches!(
            parse_ratio("a", "-0.01"),
            Err(ConfigError::RatioOutOfRange { .. })
        ));
        assert!(matches!(
            parse_ratio("a", "abc"),
            Err(ConfigError::UnparsableRatio { .. })
        ));
    }
}
