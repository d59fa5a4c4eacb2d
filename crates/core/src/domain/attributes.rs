use serde::{Deserialize, Serialize};

/// Output of the vision stage. Written once per pipeline run.
///
/// `confidence` is the score of the winning garment-type label, in [0, 100].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GarmentAttributes {
    pub garment_type: String,
    pub colors: Vec<String>,
    pub patterns: Vec<String>,
    pub detected_text: Vec<String>,
    pub confidence: f64,
}
