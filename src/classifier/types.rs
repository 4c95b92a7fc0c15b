use super::ClassifierError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence above which a result is shown with high emphasis
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.80;
/// Confidence above which a result is shown with medium emphasis
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.60;
/// Below this the badge is rendered as an error colour
pub const WARNING_CONFIDENCE_THRESHOLD: f64 = 0.40;

const HEALTHY_ADVICE: &str =
    "Your potato plant appears healthy! Continue with regular care and monitoring.";
const EARLY_BLIGHT_ADVICE: &str = "Early Blight detected. Remove affected leaves, improve air \
     circulation, and consider applying appropriate fungicides.";
const LATE_BLIGHT_ADVICE: &str = "Late Blight detected. This is a serious condition that spreads \
     quickly. Remove affected plants, apply fungicide, and monitor neighboring plants closely.";
const UNKNOWN_ADVICE: &str = "The diagnosis could not be matched to a known condition. Consult \
     the diagnosis with a local agronomist before treating the plant.";

/// Outcome of one successful classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Label as returned by the inference service
    pub label: String,
    /// Score in [0, 1]
    pub confidence: f64,
}

impl ClassificationResult {
    /// Build a result, rejecting empty labels and confidences outside [0, 1]
    pub fn new(label: impl Into<String>, confidence: f64) -> Result<Self, ClassifierError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ClassifierError::MalformedResponse(
                "`class` is empty".to_string(),
            ));
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ClassifierError::MalformedResponse(format!(
                "`confidence` {} is outside [0, 1]",
                confidence
            )));
        }
        Ok(Self { label, confidence })
    }

    /// Parse the JSON body of a 2xx `/predict` response.
    ///
    /// Extra fields are ignored. `class` must be a string and `confidence`
    /// a number.
    pub fn from_response_body(body: &[u8]) -> Result<Self, ClassifierError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ClassifierError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        let object = value.as_object().ok_or_else(|| {
            ClassifierError::MalformedResponse("response is not a JSON object".to_string())
        })?;

        let label = object
            .get("class")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ClassifierError::MalformedResponse("missing string field `class`".to_string())
            })?;

        let confidence = object
            .get("confidence")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| {
                ClassifierError::MalformedResponse(
                    "missing numeric field `confidence`".to_string(),
                )
            })?;

        Self::new(label, confidence)
    }

    pub fn tier(&self) -> ConfidenceTier {
        compute_confidence_tier(self.confidence)
    }

    pub fn badge(&self) -> ConfidenceBadge {
        confidence_badge(self.confidence)
    }

    pub fn diagnosis(&self) -> Diagnosis {
        Diagnosis::from_label(&self.label)
    }

    pub fn recommendation(&self) -> &'static str {
        recommendation_for(&self.label)
    }

    /// Confidence as a percentage, e.g. 0.93 -> 93.0
    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

/// Coarse display emphasis derived from the confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "High"),
            ConfidenceTier::Medium => write!(f, "Medium"),
            ConfidenceTier::Low => write!(f, "Low"),
        }
    }
}

/// Colour of the confidence chip in the result card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBadge {
    Success,
    Primary,
    Warning,
    Error,
}

impl ConfidenceBadge {
    /// CSS class used by the page template
    pub fn css_class(&self) -> &'static str {
        match self {
            ConfidenceBadge::Success => "badge-success",
            ConfidenceBadge::Primary => "badge-primary",
            ConfidenceBadge::Warning => "badge-warning",
            ConfidenceBadge::Error => "badge-error",
        }
    }
}

/// Known conditions the inference service can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    Healthy,
    EarlyBlight,
    LateBlight,
    Unknown,
}

impl Diagnosis {
    /// Match a service label, tolerating case, `_`/`-` separators and
    /// prefixes such as `Potato___`.
    ///
    /// Matching is on whole words, and a condition preceded by a negation
    /// (`not healthy`, `no late blight`) is not matched.
    pub fn from_label(label: &str) -> Self {
        let normalized = normalize_label(label);
        let words: Vec<&str> = normalized.split(' ').collect();
        if has_condition(&words, &["early", "blight"]) {
            Diagnosis::EarlyBlight
        } else if has_condition(&words, &["late", "blight"]) {
            Diagnosis::LateBlight
        } else if has_condition(&words, &["healthy"]) {
            Diagnosis::Healthy
        } else {
            Diagnosis::Unknown
        }
    }
}

const NEGATIONS: [&str; 3] = ["not", "no", "non"];

fn has_condition(words: &[&str], condition: &[&str]) -> bool {
    words
        .windows(condition.len())
        .enumerate()
        .any(|(start, window)| {
            window == condition && (start == 0 || !NEGATIONS.contains(&words[start - 1]))
        })
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::Healthy => write!(f, "Healthy"),
            Diagnosis::EarlyBlight => write!(f, "Early Blight"),
            Diagnosis::LateBlight => write!(f, "Late Blight"),
            Diagnosis::Unknown => write!(f, "Unknown"),
        }
    }
}

fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bucket a confidence score. Thresholds are strict: 0.80 is medium.
pub fn compute_confidence_tier(confidence: f64) -> ConfidenceTier {
    if confidence > HIGH_CONFIDENCE_THRESHOLD {
        ConfidenceTier::High
    } else if confidence > MEDIUM_CONFIDENCE_THRESHOLD {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

pub fn confidence_badge(confidence: f64) -> ConfidenceBadge {
    if confidence > HIGH_CONFIDENCE_THRESHOLD {
        ConfidenceBadge::Success
    } else if confidence > MEDIUM_CONFIDENCE_THRESHOLD {
        ConfidenceBadge::Primary
    } else if confidence > WARNING_CONFIDENCE_THRESHOLD {
        ConfidenceBadge::Warning
    } else {
        ConfidenceBadge::Error
    }
}

/// Static advice for a label. Unknown labels get a generic message.
pub fn recommendation_for(label: &str) -> &'static str {
    match Diagnosis::from_label(label) {
        Diagnosis::Healthy => HEALTHY_ADVICE,
        Diagnosis::EarlyBlight => EARLY_BLIGHT_ADVICE,
        Diagnosis::LateBlight => LATE_BLIGHT_ADVICE,
        Diagnosis::Unknown => UNKNOWN_ADVICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_tier_thresholds() {
        assert_eq!(compute_confidence_tier(0.93), ConfidenceTier::High);
        assert_eq!(compute_confidence_tier(0.80), ConfidenceTier::Medium);
        assert_eq!(compute_confidence_tier(0.61), ConfidenceTier::Medium);
        assert_eq!(compute_confidence_tier(0.60), ConfidenceTier::Low);
        assert_eq!(compute_confidence_tier(0.45), ConfidenceTier::Low);
        assert_eq!(compute_confidence_tier(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn test_confidence_badge() {
        assert_eq!(confidence_badge(0.95), ConfidenceBadge::Success);
        assert_eq!(confidence_badge(0.70), ConfidenceBadge::Primary);
        assert_eq!(confidence_badge(0.45), ConfidenceBadge::Warning);
        assert_eq!(confidence_badge(0.40), ConfidenceBadge::Error);
    }

    #[test]
    fn test_recommendations() {
        assert!(recommendation_for("Healthy").contains("appears healthy"));
        assert!(recommendation_for("Early Blight").starts_with("Early Blight detected"));
        assert!(recommendation_for("Late Blight").starts_with("Late Blight detected"));
        assert_eq!(recommendation_for("Black Scurf"), UNKNOWN_ADVICE);
    }

    #[test]
    fn test_label_tolerance() {
        assert_eq!(Diagnosis::from_label("Potato___Early_blight"), Diagnosis::EarlyBlight);
        assert_eq!(Diagnosis::from_label("late-blight"), Diagnosis::LateBlight);
        assert_eq!(Diagnosis::from_label("  HEALTHY "), Diagnosis::Healthy);
        assert_eq!(Diagnosis::from_label("Potato___healthy"), Diagnosis::Healthy);
        assert_eq!(Diagnosis::from_label(""), Diagnosis::Unknown);
    }

    #[test]
    fn test_label_matching_uses_whole_words() {
        assert_eq!(Diagnosis::from_label("Unhealthy"), Diagnosis::Unknown);
        assert_eq!(Diagnosis::from_label("Not healthy"), Diagnosis::Unknown);
        assert_eq!(Diagnosis::from_label("Potato___Not_Healthy"), Diagnosis::Unknown);
        assert_eq!(Diagnosis::from_label("no late blight"), Diagnosis::Unknown);
        assert_eq!(Diagnosis::from_label("Earlyblight"), Diagnosis::Unknown);
        assert_eq!(Diagnosis::from_label("potato healthy"), Diagnosis::Healthy);
        assert_eq!(recommendation_for("Unhealthy"), UNKNOWN_ADVICE);
        assert_eq!(recommendation_for("Not healthy"), UNKNOWN_ADVICE);
    }

    #[test]
    fn test_parse_response_body() {
        let result =
            ClassificationResult::from_response_body(br#"{"class":"Healthy","confidence":0.93}"#)
                .unwrap();
        assert_eq!(result.label, "Healthy");
        assert_eq!(result.confidence, 0.93);
        assert_eq!(result.tier(), ConfidenceTier::High);
    }

    #[test]
    fn test_parse_missing_confidence() {
        let err = ClassificationResult::from_response_body(br#"{"class":"Healthy"}"#).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_rejects_out_of_range_and_wrong_types() {
        for body in [
            &br#"{"class":"Healthy","confidence":1.2}"#[..],
            br#"{"class":"Healthy","confidence":-0.1}"#,
            br#"{"class":"Healthy","confidence":"0.9"}"#,
            br#"{"class":42,"confidence":0.9}"#,
            br#"{"class":"","confidence":0.9}"#,
            br#"[1, 2]"#,
            b"not json",
        ] {
            let err = ClassificationResult::from_response_body(body).unwrap_err();
            assert!(
                matches!(err, ClassifierError::MalformedResponse(_)),
                "body {:?} should be malformed",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let result = ClassificationResult::from_response_body(
            br#"{"class":"Late Blight","confidence":0.45,"model":"v1"}"#,
        )
        .unwrap();
        assert_eq!(result.tier(), ConfidenceTier::Low);
        assert_eq!(result.diagnosis(), Diagnosis::LateBlight);
    }
}
