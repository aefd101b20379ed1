//! Hybrid search pipeline orchestration.
//!
//! State machine per request:
//! `received → (cache-hit → scrub → emit) | (cache-miss → fan-out → fuse →
//! dedup → (rerank?) → (boost?) → scrub → cache-write → emit)`.
//!
//! Per-collection failures degrade to an empty contribution; only a total
//! failure (every collection errored) surfaces to the caller.

use std::sync::Arc;

use serde_json::Value;

use vortex_domain::constants::search::{
    DATE_BOOST_DECAY_RATE, DATE_BOOST_WEIGHT, DEFAULT_RRF_K, MAX_TOP_K, SCAN_CAP_FACTOR,
    SEMANTIC_CACHE_COLLECTION, SEMANTIC_CACHE_THRESHOLD,
};
use vortex_domain::error::{Error, Result};
use vortex_domain::identity::cache_point_id;
use vortex_domain::identity::point_id;
use vortex_domain::ports::crypto::ContentCipher;
use vortex_domain::ports::encoders::{CrossEncoder, DenseEncoder, SparseEncoder, SpladeEncoder};
use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};
use vortex_domain::value_objects::{
    Filter, FusionStrategy, FusionWeights, NamedVectors, Payload, PointRecord, QueryVector,
    ScoredDocument, SearchHit, SearchTuning, UserContext, VectorKind,
};

use super::fusion::{collapse_documents, rrf_fuse, weighted_fuse};
use super::recency::apply_date_boost;
use super::scrub::{scrub_results, tenancy_filter};

/// Pipeline configuration with per-request override support.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Run the dense signal
    pub use_dense: bool,
    /// Run the BM25 signal
    pub use_sparse: bool,
    /// Run the SPLADE signal
    pub use_splade: bool,
    /// Fusion weights
    pub weights: FusionWeights,
    /// Fusion strategy
    pub strategy: FusionStrategy,
    /// RRF smoothing constant
    pub rrf_k: f64,
    /// Cross-encoder rerank stage
    pub use_reranker: bool,
    /// Recency boost stage
    pub date_boost: bool,
    /// Recency decay rate per day
    pub date_decay_rate: f64,
    /// Recency boost weight
    pub date_weight: f64,
    /// Semantic cache stage
    pub semantic_cache: bool,
    /// Similarity threshold for a cache hit
    pub cache_threshold: f32,
    /// Name of the cache collection
    pub cache_collection: String,
    /// Scan cap multiplier for unique-document collection
    pub scan_cap_factor: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_dense: true,
            use_sparse: true,
            use_splade: true,
            weights: FusionWeights::default(),
            strategy: FusionStrategy::Weighted,
            rrf_k: DEFAULT_RRF_K,
            use_reranker: true,
            date_boost: false,
            date_decay_rate: DATE_BOOST_DECAY_RATE,
            date_weight: DATE_BOOST_WEIGHT,
            semantic_cache: true,
            cache_threshold: SEMANTIC_CACHE_THRESHOLD,
            cache_collection: SEMANTIC_CACHE_COLLECTION.to_owned(),
            scan_cap_factor: SCAN_CAP_FACTOR,
        }
    }
}

impl PipelineConfig {
    fn with_tuning(&self, tuning: &SearchTuning) -> Self {
        let mut cfg = self.clone();
        if let Some(weights) = tuning.weights {
            cfg.weights = weights;
        }
        if let Some(alpha) = tuning.alpha {
            cfg.weights = FusionWeights::from_alpha(alpha);
        }
        if let Some(strategy) = tuning.strategy {
            cfg.strategy = strategy;
        }
        if let Some(rerank) = tuning.use_reranker {
            cfg.use_reranker = rerank;
        }
        if let Some(boost) = tuning.date_boost {
            cfg.date_boost = boost;
        }
        cfg
    }
}

/// One hybrid search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// User query text
    pub query_text: String,
    /// Result limit (0 returns an empty list)
    pub top_k: usize,
    /// Collections to fan out over
    pub collections: Vec<String>,
    /// Per-request tuning overrides
    pub tuning: SearchTuning,
}

/// The hybrid search pipeline.
pub struct HybridSearchPipeline {
    store: Arc<dyn VectorStoreProvider>,
    dense: Arc<dyn DenseEncoder>,
    sparse: Arc<dyn SparseEncoder>,
    splade: Arc<dyn SpladeEncoder>,
    cross: Option<Arc<dyn CrossEncoder>>,
    cipher: Arc<dyn ContentCipher>,
    config: PipelineConfig,
}

impl HybridSearchPipeline {
    /// Assemble the pipeline from its collaborators.
    pub fn new(
        store: Arc<dyn VectorStoreProvider>,
        dense: Arc<dyn DenseEncoder>,
        sparse: Arc<dyn SparseEncoder>,
        splade: Arc<dyn SpladeEncoder>,
        cross: Option<Arc<dyn CrossEncoder>>,
        cipher: Arc<dyn ContentCipher>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            dense,
            sparse,
            splade,
            cross,
            cipher,
            config,
        }
    }

    /// Run the full hybrid pipeline for a caller.
    ///
    /// # Errors
    /// Returns `INVALID_REQUEST` for an out-of-range `top_k` and
    /// `UPSTREAM_UNAVAILABLE` when every collection search failed.
    pub async fn query(
        &self,
        request: &SearchRequest,
        ctx: &UserContext,
    ) -> Result<Vec<ScoredDocument>> {
        let cfg = self.config.with_tuning(&request.tuning);
        self.execute(request, ctx, cfg).await
    }

    /// Keyword-only search: BM25 signal, no rerank, no cache.
    ///
    /// # Errors
    /// Same failure surface as [`HybridSearchPipeline::query`].
    pub async fn keyword(
        &self,
        query_text: &str,
        top_k: usize,
        collections: Vec<String>,
        ctx: &UserContext,
    ) -> Result<Vec<ScoredDocument>> {
        let mut cfg = self.config.clone();
        cfg.use_dense = false;
        cfg.use_splade = false;
        cfg.use_sparse = true;
        cfg.weights = FusionWeights {
            dense: 0.0,
            sparse: 1.0,
            splade: 0.0,
        };
        cfg.use_reranker = false;
        cfg.semantic_cache = false;

        let request = SearchRequest {
            query_text: query_text.to_owned(),
            top_k,
            collections,
            tuning: SearchTuning::default(),
        };
        self.execute(&request, ctx, cfg).await
    }

    async fn execute(
        &self,
        request: &SearchRequest,
        ctx: &UserContext,
        cfg: PipelineConfig,
    ) -> Result<Vec<ScoredDocument>> {
        if request.top_k == 0 {
            return Ok(Vec::new());
        }
        if request.top_k > MAX_TOP_K {
            return Err(Error::invalid_request(format!(
                "top_k must be between 1 and {MAX_TOP_K}"
            )));
        }
        if request.collections.is_empty() {
            return Ok(Vec::new());
        }

        let filter = tenancy_filter(ctx);

        let dense_query = if cfg.use_dense || cfg.semantic_cache {
            match self.dense.encode(&request.query_text).await {
                Ok(vector) => Some(vector),
                Err(e) => {
                    tracing::warn!(error = %e, "dense encoding failed; continuing without dense signal");
                    None
                }
            }
        } else {
            None
        };

        if cfg.semantic_cache
            && let Some(query_vector) = &dense_query
            && let Some(cached) = self.cache_get(query_vector, ctx, &cfg).await
        {
            tracing::debug!(query = %request.query_text, "semantic cache hit");
            return Ok(scrub_results(cached, ctx, &self.cipher));
        }

        let mut merged: Vec<ScoredDocument> = Vec::new();
        let mut failed_collections = 0usize;
        for collection in &request.collections {
            match self
                .search_collection(
                    collection,
                    &request.query_text,
                    dense_query.as_deref(),
                    request.top_k,
                    &cfg,
                    &filter,
                )
                .await
            {
                Ok(mut docs) => merged.append(&mut docs),
                Err(e) => {
                    tracing::warn!(collection, error = %e, "collection search failed");
                    failed_collections += 1;
                }
            }
        }

        if failed_collections == request.collections.len() {
            return Err(Error::upstream("all collection searches failed"));
        }

        merged.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
        merged.truncate(request.top_k);

        let mut results = if cfg.use_reranker {
            self.rerank(&request.query_text, merged, request.top_k, ctx)
                .await
        } else {
            merged
        };

        if cfg.date_boost {
            apply_date_boost(
                &mut results,
                cfg.date_decay_rate,
                cfg.date_weight,
                chrono::Utc::now(),
            );
        }

        // Cache before scrubbing: entries hold ciphertext, and every read
        // (cached or not) is scrubbed for the caller.
        if cfg.semantic_cache
            && !results.is_empty()
            && let Some(query_vector) = dense_query
        {
            self.cache_set(&request.query_text, query_vector, &results, ctx, &cfg)
                .await;
        }

        Ok(scrub_results(results, ctx, &self.cipher))
    }

    async fn search_collection(
        &self,
        collection: &str,
        query_text: &str,
        dense_query: Option<&[f32]>,
        top_k: usize,
        cfg: &PipelineConfig,
        filter: &Filter,
    ) -> Result<Vec<ScoredDocument>> {
        let mut dense_hits: Vec<SearchHit> = Vec::new();
        let mut sparse_hits: Vec<SearchHit> = Vec::new();
        let mut splade_hits: Vec<SearchHit> = Vec::new();

        if cfg.use_dense && let Some(vector) = dense_query {
            dense_hits = self
                .unique_doc_hits(
                    collection,
                    VectorKind::Dense,
                    QueryVector::Dense(vector.to_vec()),
                    top_k,
                    cfg,
                    filter,
                )
                .await?;
        }

        if cfg.use_sparse && self.sparse.is_ready() {
            let vector = self.sparse.encode(query_text);
            if !vector.is_empty() {
                sparse_hits = self
                    .unique_doc_hits(
                        collection,
                        VectorKind::Sparse,
                        QueryVector::Sparse(vector),
                        top_k,
                        cfg,
                        filter,
                    )
                    .await?;
            }
        }

        if cfg.use_splade && self.splade.enabled() {
            match self.splade.encode(query_text).await {
                Ok(vector) if !vector.is_empty() => {
                    splade_hits = self
                        .unique_doc_hits(
                            collection,
                            VectorKind::Splade,
                            QueryVector::Sparse(vector),
                            top_k,
                            cfg,
                            filter,
                        )
                        .await?;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "SPLADE query encoding failed; skipping signal");
                }
            }
        }

        let fused = match cfg.strategy {
            FusionStrategy::Weighted => {
                weighted_fuse(&dense_hits, &sparse_hits, &splade_hits, cfg.weights)
            }
            FusionStrategy::ReciprocalRank => rrf_fuse(
                &dense_hits,
                &sparse_hits,
                &splade_hits,
                cfg.rrf_k,
                cfg.weights,
            ),
        };

        let docs = collapse_documents(fused, top_k);
        Ok(docs
            .into_iter()
            .map(|doc| ScoredDocument {
                title: doc
                    .payload
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                db_id: doc.db_id,
                score: doc.avg_score,
                avg_score: doc.avg_score,
                collection: collection.to_owned(),
                payload: doc.payload,
            })
            .collect())
    }

    /// Collect chunk hits until `top_k` distinct parent documents are seen or
    /// the scan cap is reached, widening the search limit progressively.
    async fn unique_doc_hits(
        &self,
        collection: &str,
        kind: VectorKind,
        query: QueryVector,
        top_k: usize,
        cfg: &PipelineConfig,
        filter: &Filter,
    ) -> Result<Vec<SearchHit>> {
        let cap = top_k.saturating_mul(cfg.scan_cap_factor).max(top_k);
        let mut limit = top_k;

        loop {
            let hits = self
                .store
                .search(collection, kind, query.clone(), limit, Some(filter), None)
                .await?;

            let mut parents: Vec<&str> = hits
                .iter()
                .map(|h| {
                    h.payload
                        .get("parent_id")
                        .or_else(|| h.payload.get("db_id"))
                        .and_then(Value::as_str)
                        .unwrap_or(h.id.as_str())
                })
                .collect();
            parents.sort_unstable();
            parents.dedup();

            let exhausted = hits.len() < limit;
            if parents.len() >= top_k || exhausted || limit >= cap {
                return Ok(hits);
            }
            limit = limit.saturating_mul(4).min(cap);
        }
    }

    /// Fetch one representative chunk text for a document, decrypting for the
    /// owning tenant. Returns `None` when no text is reachable.
    async fn fetch_chunk_text(&self, doc: &ScoredDocument, ctx: &UserContext) -> Option<String> {
        let first_chunk = point_id(&doc.db_id, 0);
        let mut hits = self
            .store
            .retrieve(&doc.collection, &[first_chunk])
            .await
            .unwrap_or_default();

        if hits.is_empty() {
            let filter = Filter::new().must_match("db_id", doc.db_id.clone());
            hits = self
                .store
                .scroll(&doc.collection, Some(&filter), 1, None)
                .await
                .map(|(points, _)| points)
                .unwrap_or_default();
        }

        let payload = hits.first().map(|h| &h.payload)?;
        let text = payload
            .get("content")
            .or_else(|| payload.get("_text"))
            .and_then(Value::as_str)?
            .to_owned();

        let encrypted = payload
            .get("content_encrypted")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !encrypted {
            return Some(text);
        }

        let tenant_id = payload.get("tenant_id").and_then(Value::as_str)?;
        if ctx.user_id != tenant_id {
            return None;
        }
        match self.cipher.decrypt(tenant_id, &text) {
            Ok(plaintext) => Some(plaintext),
            Err(e) => {
                tracing::warn!(db_id = %doc.db_id, error = %e, "rerank text decryption failed");
                None
            }
        }
    }

    async fn rerank(
        &self,
        query_text: &str,
        merged: Vec<ScoredDocument>,
        top_k: usize,
        ctx: &UserContext,
    ) -> Vec<ScoredDocument> {
        let Some(cross) = &self.cross else {
            return merged;
        };
        if merged.is_empty() {
            return merged;
        }

        let mut candidates: Vec<ScoredDocument> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        for doc in &merged {
            match self.fetch_chunk_text(doc, ctx).await {
                Some(text) if !text.trim().is_empty() => {
                    candidates.push(doc.clone());
                    texts.push(text);
                }
                _ => {
                    tracing::warn!(db_id = %doc.db_id, collection = %doc.collection, "rerank text fetch failed; candidate dropped");
                }
            }
        }

        if candidates.is_empty() {
            tracing::warn!("no candidates for rerank; returning fused results");
            return merged;
        }

        match cross.score(query_text, &texts).await {
            Ok(scores) => {
                for (doc, score) in candidates.iter_mut().zip(scores) {
                    doc.score = f64::from(score);
                }
                candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
                candidates.truncate(top_k);
                candidates
            }
            Err(e) => {
                tracing::warn!(error = %e, "reranker failed; returning fused results");
                merged
            }
        }
    }

    async fn cache_get(
        &self,
        query_vector: &[f32],
        ctx: &UserContext,
        cfg: &PipelineConfig,
    ) -> Option<Vec<ScoredDocument>> {
        let filter = Filter::new().must_match("user_id", ctx.user_id.clone());
        let hits = self
            .store
            .search(
                &cfg.cache_collection,
                VectorKind::Dense,
                QueryVector::Dense(query_vector.to_vec()),
                1,
                Some(&filter),
                Some(cfg.cache_threshold),
            )
            .await
            .ok()?;

        let hit = hits.first()?;
        let results_json = hit.payload.get("results_json")?.as_str()?;
        serde_json::from_str(results_json).ok()
    }

    async fn cache_set(
        &self,
        query_text: &str,
        query_vector: Vec<f32>,
        results: &[ScoredDocument],
        ctx: &UserContext,
        cfg: &PipelineConfig,
    ) {
        let results_json = match serde_json::to_string(results) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "semantic cache serialization failed");
                return;
            }
        };

        let exists = self
            .store
            .collection_exists(&cfg.cache_collection)
            .await
            .unwrap_or(false);
        if !exists {
            let spec = CollectionSpec::dense_only(query_vector.len());
            if let Err(e) = self.store.create_collection(&cfg.cache_collection, &spec).await {
                tracing::warn!(error = %e, "semantic cache collection creation failed");
                return;
            }
        }

        let mut payload = Payload::new();
        payload.insert("query_text".to_owned(), Value::String(query_text.to_owned()));
        payload.insert("user_id".to_owned(), Value::String(ctx.user_id.clone()));
        payload.insert(
            "created_at".to_owned(),
            Value::from(chrono::Utc::now().timestamp()),
        );
        payload.insert("results_json".to_owned(), Value::String(results_json));

        let point = PointRecord {
            id: cache_point_id(query_text, &ctx.user_id),
            vectors: NamedVectors {
                dense: query_vector,
                ..NamedVectors::default()
            },
            payload,
        };

        if let Err(e) = self.store.upsert(&cfg.cache_collection, vec![point]).await {
            tracing::warn!(error = %e, "semantic cache write failed");
        }
    }
}
