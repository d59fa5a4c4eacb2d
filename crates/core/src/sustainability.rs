//! Deterministic sustainability metric computation.
//!
//! Conversion factors normally arrive from the knowledge collaborator; the
//! `Default` set is the degradation fallback used when that service is
//! unavailable.

use serde::{Deserialize, Serialize};

/// Per-garment conversion factors applied to a strategy's quantity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactors {
    /// Average garment weight in kilograms.
    pub garment_weight_kg: f64,
    /// Fraction of the quantity a reuse strategy actually diverts, in [0, 1].
    pub reuse_percentage: f64,
    /// Kilograms of CO2 avoided per kilogram of diverted textile.
    pub carbon_per_kg: f64,
    /// Liters of water saved per kilogram of diverted textile.
    pub water_per_kg: f64,
    /// Fraction of diverted weight that would otherwise reach landfill.
    pub landfill_percentage: f64,
}

impl Default for ConversionFactors {
    fn default() -> Self {
        Self {
            garment_weight_kg: 0.3,
            reuse_percentage: 0.5,
            carbon_per_kg: 2.1,
            water_per_kg: 10.85,
            landfill_percentage: 0.9,
        }
    }
}

impl ConversionFactors {
    /// A factor set from the wire is only usable when every field is
    /// non-negative; anything else falls back to defaults.
    pub fn is_usable(&self) -> bool {
        self.garment_weight_kg >= 0.0
            && self.reuse_percentage >= 0.0
            && self.carbon_per_kg >= 0.0
            && self.water_per_kg >= 0.0
            && self.landfill_percentage >= 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityMetrics {
    pub waste_reduction: f64,
    pub carbon_savings: f64,
    pub water_savings: f64,
    pub landfill_reduction: f64,
}

/// Metrics for one strategy consuming `quantity` garments.
///
/// Zero quantity yields all-zero metrics; there is no division anywhere.
pub fn compute(quantity: u32, factors: &ConversionFactors) -> SustainabilityMetrics {
    let waste_reduction = f64::from(quantity) * factors.garment_weight_kg * factors.reuse_percentage;

    SustainabilityMetrics {
        waste_reduction,
        carbon_savings: waste_reduction * factors.carbon_per_kg,
        water_savings: waste_reduction * factors.water_per_kg,
        landfill_reduction: waste_reduction * factors.landfill_percentage,
    }
}

impl SustainabilityMetrics {
    /// Field-wise sum across strategies; the item-level aggregate.
    pub fn aggregate<'a>(parts: impl IntoIterator<Item = &'a SustainabilityMetrics>) -> Self {
        parts.into_iter().fold(Self::default(), |acc, m| Self {
            waste_reduction: acc.waste_reduction + m.waste_reduction,
            carbon_savings: acc.carbon_savings + m.carbon_savings,
            water_savings: acc.water_savings + m.water_savings,
            landfill_reduction: acc.landfill_reduction + m.landfill_reduction,
        })
    }
}
