use crate::models::{ScoreKind, ScoredResult};
use crate::traits::VectorMatch;

pub fn round_to_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Maps distances onto [0, 1] relative to the farthest match, rounded to
/// three decimals.
pub fn relevance_from_distances(distances: &[f64]) -> Vec<f64> {
    let max_distance = distances
        .iter()
        .copied()
        .filter(|distance| distance.is_finite())
        .fold(0.0, f64::max);
    let max_distance = if max_distance > 0.0 { max_distance } else { 1.0 };

    distances
        .iter()
        .map(|distance| {
            if !distance.is_finite() {
                return 0.0;
            }
            round_to_millis((1.0 - distance / max_distance).clamp(0.0, 1.0))
        })
        .collect()
}

/// Orders vector matches by relevance and keeps `limit` of them.
pub fn rank_vector_matches(matches: Vec<VectorMatch>, limit: usize) -> Vec<ScoredResult> {
    let distances: Vec<f64> = matches.iter().map(|found| found.distance).collect();
    let scores = relevance_from_distances(&distances);

    let mut results: Vec<ScoredResult> = matches
        .into_iter()
        .zip(scores)
        .map(|(found, score)| ScoredResult {
            document: found.document,
            score,
            kind: ScoreKind::Vector,
        })
        .collect();

    results.sort_by(|left, right| right.score.total_cmp(&left.score));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, DocumentChunk};

    fn found(id: &str, distance: f64) -> VectorMatch {
        VectorMatch {
            document: DocumentChunk::new(id, "text", ChunkMetadata::default()),
            distance,
        }
    }

    #[test]
    fn distances_become_relative_relevance() {
        assert_eq!(relevance_from_distances(&[0.2, 0.4, 0.8]), vec![0.75, 0.5, 0.0]);
    }

    #[test]
    fn zero_distances_do_not_divide_by_zero() {
        assert_eq!(relevance_from_distances(&[0.0, 0.0]), vec![1.0, 1.0]);
        assert!(relevance_from_distances(&[]).is_empty());
    }

    #[test]
    fn scores_are_rounded_and_bounded() {
        let scores = relevance_from_distances(&[0.1234, 0.3, 0.9, f64::NAN]);
        for score in scores {
            assert!((0.0..=1.0).contains(&score));
            assert_eq!(round_to_millis(score), score);
        }
        assert_eq!(relevance_from_distances(&[0.3, 0.9])[0], 0.667);
    }

    #[test]
    fn vector_results_are_sorted_and_truncated() {
        let results = rank_vector_matches(
            vec![found("far", 0.9), found("near", 0.1), found("mid", 0.5)],
            2,
        );
        let ids: Vec<_> = results.iter().map(|result| result.document.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(results.iter().all(|result| result.kind == ScoreKind::Vector));
    }
}
