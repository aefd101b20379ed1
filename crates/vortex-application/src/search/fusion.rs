//! Score fusion and chunk-to-document collapse.
//!
//! Two interchangeable strategies: min-max normalized weighted sum, and
//! reciprocal rank fusion. Both consume per-kind chunk hit lists and produce
//! a single fused chunk ranking; `collapse_documents` then groups chunks by
//! their parent document.

use std::collections::HashMap;

use vortex_domain::constants::search::SCORE_EPSILON;
use vortex_domain::value_objects::{FusionWeights, Payload, SearchHit};

/// A chunk hit after fusion across vector kinds.
#[derive(Debug, Clone)]
pub struct FusedChunk {
    /// Point ID
    pub id: String,
    /// Fused score
    pub score: f64,
    /// Payload from the first hit that carried one
    pub payload: Payload,
}

/// A document aggregate after chunk collapse.
#[derive(Debug, Clone)]
pub struct DocAggregate {
    /// Parent document ID
    pub db_id: String,
    /// Mean of contributing chunk scores
    pub avg_score: f64,
    /// Highest contributing chunk score (tie-break)
    pub max_score: f64,
    /// Representative payload
    pub payload: Payload,
}

/// Min-max normalize a score map into `[0, 1]`.
///
/// Degenerate spreads collapse to 0.5 so a single-hit kind neither dominates
/// nor vanishes.
#[must_use]
pub fn normalize_scores(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let min = scores.values().copied().fold(f64::INFINITY, f64::min);
    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min < SCORE_EPSILON {
        return scores.keys().map(|k| (k.clone(), 0.5)).collect();
    }
    scores
        .iter()
        .map(|(k, v)| (k.clone(), (v - min) / (max - min)))
        .collect()
}

fn score_map(hits: &[SearchHit]) -> HashMap<String, f64> {
    hits.iter().map(|h| (h.id.clone(), h.score)).collect()
}

fn collect_payloads<'a>(
    lists: impl Iterator<Item = &'a [SearchHit]>,
) -> HashMap<String, Payload> {
    let mut payloads = HashMap::new();
    for hits in lists {
        for hit in hits {
            payloads
                .entry(hit.id.clone())
                .or_insert_with(|| hit.payload.clone());
        }
    }
    payloads
}

/// Weighted fusion: per-kind min-max normalization, then
/// `w_d·d + w_s·s + w_p·p`.
#[must_use]
pub fn weighted_fuse(
    dense: &[SearchHit],
    sparse: &[SearchHit],
    splade: &[SearchHit],
    weights: FusionWeights,
) -> Vec<FusedChunk> {
    let dense_norm = normalize_scores(&score_map(dense));
    let sparse_norm = normalize_scores(&score_map(sparse));
    let splade_norm = normalize_scores(&score_map(splade));

    let mut payloads = collect_payloads([dense, sparse, splade].into_iter());

    let mut ids: Vec<String> = payloads.keys().cloned().collect();
    ids.sort();

    let mut fused: Vec<FusedChunk> = ids
        .into_iter()
        .map(|id| {
            let d = dense_norm.get(&id).copied().unwrap_or(0.0);
            let s = sparse_norm.get(&id).copied().unwrap_or(0.0);
            let p = splade_norm.get(&id).copied().unwrap_or(0.0);
            let score = weights.dense * d + weights.sparse * s + weights.splade * p;
            FusedChunk {
                payload: payloads.remove(&id).unwrap_or_default(),
                id,
                score,
            }
        })
        .collect();

    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}

/// Reciprocal rank fusion: each kind contributes `w / (k + rank + 1)` for
/// every candidate it ranked.
#[must_use]
pub fn rrf_fuse(
    dense: &[SearchHit],
    sparse: &[SearchHit],
    splade: &[SearchHit],
    k: f64,
    weights: FusionWeights,
) -> Vec<FusedChunk> {
    let mut scores: HashMap<String, f64> = HashMap::new();
    let mut payloads = collect_payloads([dense, sparse, splade].into_iter());

    for (hits, weight) in [
        (dense, weights.dense),
        (sparse, weights.sparse),
        (splade, weights.splade),
    ] {
        for (rank, hit) in hits.iter().enumerate() {
            *scores.entry(hit.id.clone()).or_insert(0.0) += weight / (k + rank as f64 + 1.0);
        }
    }

    let mut fused: Vec<FusedChunk> = scores
        .into_iter()
        .map(|(id, score)| FusedChunk {
            payload: payloads.remove(&id).unwrap_or_default(),
            id,
            score,
        })
        .collect();

    fused.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        std::cmp::Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
    fused
}

/// Collapse chunk hits into unique documents.
///
/// Grouping key: payload `db_id`, falling back to `parent_id`, then the
/// point ID. Document score is the mean of its chunk scores; ties break on
/// the higher max chunk score, then lexicographic `db_id`.
#[must_use]
pub fn collapse_documents(chunks: Vec<FusedChunk>, top_k: usize) -> Vec<DocAggregate> {
    let mut grouped: HashMap<String, (Vec<f64>, Payload)> = HashMap::new();

    for chunk in chunks {
        let db_id = chunk
            .payload
            .get("db_id")
            .or_else(|| chunk.payload.get("parent_id"))
            .and_then(|v| v.as_str())
            .map_or_else(|| chunk.id.clone(), str::to_owned);

        let entry = grouped
            .entry(db_id)
            .or_insert_with(|| (Vec::new(), chunk.payload));
        entry.0.push(chunk.score);
    }

    let mut docs: Vec<DocAggregate> = grouped
        .into_iter()
        .map(|(db_id, (scores, payload))| {
            let avg_score = scores.iter().sum::<f64>() / scores.len() as f64;
            let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            DocAggregate {
                db_id,
                avg_score,
                max_score,
                payload,
            }
        })
        .collect();

    docs.sort_by(|a, b| {
        b.avg_score
            .total_cmp(&a.avg_score)
            .then(b.max_score.total_cmp(&a.max_score))
            .then(a.db_id.cmp(&b.db_id))
    });
    docs.truncate(top_k);
    docs
}
