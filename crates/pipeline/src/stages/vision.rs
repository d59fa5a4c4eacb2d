//! Vision stage: label detection, taxonomy bucketing, and the confidence
//! gate.

use reloom_core::GarmentAttributes;

use crate::adapters::{VisionAdapter, VisionDetection};
use crate::retry::RetryExecutor;
use crate::stages::StageError;

const GARMENT_TYPES: &[&str] = &[
    "shirt", "t-shirt", "dress", "jeans", "trousers", "saree", "kurta", "jacket", "skirt",
    "sweater", "hoodie", "shorts",
];

const COLORS: &[&str] = &[
    "black", "white", "red", "blue", "green", "yellow", "orange", "purple", "pink", "brown",
    "grey", "beige", "indigo", "gold", "maroon", "navy",
];

const PATTERNS: &[&str] =
    &["striped", "checked", "floral", "printed", "solid", "embroidered", "paisley", "tie-dye"];

pub async fn extract_attributes(
    vision: &dyn VisionAdapter,
    retry: &RetryExecutor,
    image_ref: &str,
    confidence_threshold: f64,
) -> Result<GarmentAttributes, StageError> {
    let detection = retry.execute("vision.detect", || vision.detect(image_ref)).await?;
    map_detection(detection, confidence_threshold)
}

/// Buckets labels into the fixed taxonomy. The highest-confidence
/// garment-type label wins; a score below the threshold is a domain failure,
/// not a transient one.
pub(crate) fn map_detection(
    detection: VisionDetection,
    threshold: f64,
) -> Result<GarmentAttributes, StageError> {
    let mut best: Option<(String, f64)> = None;
    let mut colors = Vec::new();
    let mut patterns = Vec::new();

    for label in &detection.labels {
        let name = label.name.trim().to_ascii_lowercase();
        if GARMENT_TYPES.contains(&name.as_str()) {
            let better = best.as_ref().map(|(_, score)| label.confidence > *score).unwrap_or(true);
            if better {
                best = Some((name, label.confidence));
            }
        } else if COLORS.contains(&name.as_str()) {
            if !colors.contains(&name) {
                colors.push(name);
            }
        } else if PATTERNS.contains(&name.as_str()) && !patterns.contains(&name) {
            patterns.push(name);
        }
        // Unrecognized labels are ignored rather than guessed at.
    }

    let Some((garment_type, confidence)) = best else {
        return Err(StageError::MalformedResponse {
            service: "vision".to_string(),
            reason: "detection carries no garment-type label".to_string(),
        });
    };

    if confidence < threshold {
        return Err(StageError::LowConfidence { garment_type, confidence, threshold });
    }

    Ok(GarmentAttributes {
        garment_type,
        colors,
        patterns,
        detected_text: detection.text,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use crate::adapters::{LabelCandidate, VisionDetection};
    use crate::stages::StageError;

    use super::map_detection;

    fn label(name: &str, confidence: f64) -> LabelCandidate {
        LabelCandidate { name: name.to_string(), confidence }
    }

    #[test]
    fn buckets_labels_into_the_fixed_taxonomy() {
        let detection = VisionDetection {
            labels: vec![
                label("Shirt", 82.0),
                label("blue", 75.0),
                label("white", 64.0),
                label("striped", 58.0),
                label("mannequin", 90.0),
            ],
            text: vec!["SALE".to_string()],
        };

        let attributes = map_detection(detection, 70.0).expect("maps");

        assert_eq!(attributes.garment_type, "shirt");
        assert_eq!(attributes.colors, vec!["blue", "white"]);
        assert_eq!(attributes.patterns, vec!["striped"]);
        assert_eq!(attributes.detected_text, vec!["SALE"]);
        assert!((attributes.confidence - 82.0).abs() < f64::EPSILON);
    }

    #[test]
    fn highest_confidence_garment_label_wins() {
        let detection = VisionDetection {
            labels: vec![label("jacket", 71.0), label("shirt", 88.0), label("dress", 73.0)],
            text: vec![],
        };

        let attributes = map_detection(detection, 70.0).expect("maps");
        assert_eq!(attributes.garment_type, "shirt");
    }

    #[test]
    fn confidence_exactly_at_threshold_passes() {
        let detection = VisionDetection { labels: vec![label("shirt", 70.0)], text: vec![] };
        let attributes = map_detection(detection, 70.0).expect("boundary passes");
        assert!((attributes.confidence - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_just_under_threshold_fails() {
        let detection = VisionDetection { labels: vec![label("shirt", 69.9)], text: vec![] };
        let error = map_detection(detection, 70.0).expect_err("boundary fails");
        assert!(matches!(error, StageError::LowConfidence { .. }));
    }

    #[test]
    fn detection_without_garment_label_is_malformed() {
        let detection =
            VisionDetection { labels: vec![label("blue", 95.0), label("fabric", 88.0)], text: vec![] };
        let error = map_detection(detection, 70.0).expect_err("must be malformed");
        assert!(matches!(error, StageError::MalformedResponse { .. }));
    }
}
