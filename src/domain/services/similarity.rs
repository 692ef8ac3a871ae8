use crate::helper::error_chain_fmt;

/// Distance function a collection was created with.
///
/// Variant names match the qdrant distance names used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
    Euclid,
    Dot,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "Cosine",
            DistanceMetric::Euclid => "Euclid",
            DistanceMetric::Dot => "Dot",
        }
    }

    /// Converts the score reported by the store into a distance
    /// (smaller means more similar), whatever the metric.
    ///
    /// Qdrant reports cosine and dot results as similarities (higher is
    /// better) and euclidean results as the distance itself.
    pub fn distance_from_score(&self, score: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - score,
            DistanceMetric::Euclid => score,
            DistanceMetric::Dot => -score,
        }
    }
}

impl TryFrom<&str> for DistanceMetric {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "Cosine" => Ok(Self::Cosine),
            "Euclid" => Ok(Self::Euclid),
            "Dot" => Ok(Self::Dot),
            other => Err(format!(
                "{} is not a supported distance. Use `Cosine`, `Euclid` or `Dot`.",
                other
            )),
        }
    }
}

/// Presentation score shown next to a match: `1 - distance`.
///
/// Only meaningful when the collection distance is cosine, where the
/// distance lives in [0, 2]. Fails for any other metric instead of
/// silently producing a meaningless score.
pub fn similarity_from_distance(
    metric: DistanceMetric,
    distance: f32,
) -> Result<f32, SimilarityError> {
    match metric {
        DistanceMetric::Cosine => Ok(1.0 - distance),
        other => Err(SimilarityError::UnsupportedMetric(other)),
    }
}

#[derive(thiserror::Error)]
pub enum SimilarityError {
    #[error("Similarity scores are only defined for the Cosine distance, collection uses {}", .0.as_str())]
    UnsupportedMetric(DistanceMetric),
}

impl std::fmt::Debug for SimilarityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
