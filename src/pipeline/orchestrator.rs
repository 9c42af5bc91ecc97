//! # Pipeline Orchestrator
//!
//! ## Purpose
//! Wires the acquisition strategies to the pure pipeline stages and collects
//! per-stage statistics. This is the entry point the HTTP layer calls.
//!
//! ## Failure Model
//! Strategies are tried in order; the first one that yields candidates wins.
//! When every strategy fails, the search still resolves: it returns an empty
//! record set with an error marker in the statistics, so callers can tell a
//! failed acquisition apart from a legitimately empty result.

use crate::acquisition::{
    DatajudSource, DepreSource, EsajEnricher, QuerySpec, SourceStrategy, SyntheticSource,
};
use crate::config::Config;
use crate::errors::Result;
use crate::pipeline::cache::QueryCache;
use crate::pipeline::classify::classify;
use crate::pipeline::filter::apply_filters;
use crate::pipeline::normalize::normalize;
use crate::pipeline::validate::is_valid_case_number;
use crate::utils::Timer;
use crate::{CaseRecord, SearchParams};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-stage counters for one search invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    /// Raw hits received from the source
    pub total: usize,
    /// Records whose case number passed validation
    pub valid: usize,
    /// Valid records dropped as duplicate case numbers
    pub duplicates: usize,
    /// Records surviving the filter stage
    pub filtered: usize,
    /// Records actually returned after truncation
    pub returned: usize,
    /// Tag of the strategy that produced the records
    pub source: String,
    /// Set when every acquisition strategy failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one search: records plus the statistics gathered on the way.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub records: Vec<CaseRecord>,
    pub stats: PipelineStats,
}

/// The search pipeline: ordered acquisition strategies, the pure stages, an
/// optional enrichment pass, and a TTL result cache.
pub struct SearchPipeline {
    strategies: Vec<Box<dyn SourceStrategy>>,
    enricher: Option<EsajEnricher>,
    cache: QueryCache,
}

impl SearchPipeline {
    /// Assemble the strategy chain from configuration: DataJud first, the
    /// DEPRE scraper second, the synthetic generator last when enabled.
    pub fn from_config(config: &Config) -> Result<Self> {
        let acq = &config.acquisition;

        let mut strategies: Vec<Box<dyn SourceStrategy>> = Vec::new();
        strategies.push(Box::new(DatajudSource::new(acq.datajud.clone())?));
        strategies.push(Box::new(DepreSource::new(acq.portal.clone())?));
        if acq.enable_synthetic_fallback {
            strategies.push(Box::new(SyntheticSource));
        }

        let enricher = if acq.enrichment.enabled {
            Some(EsajEnricher::new(acq.portal.clone(), acq.enrichment.clone())?)
        } else {
            None
        };

        Ok(Self {
            strategies,
            enricher,
            cache: QueryCache::new(acq.cache_ttl_seconds),
        })
    }

    /// Build a pipeline from explicit parts.
    pub fn new(
        strategies: Vec<Box<dyn SourceStrategy>>,
        enricher: Option<EsajEnricher>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            strategies,
            enricher,
            cache: QueryCache::new(cache_ttl_seconds),
        }
    }

    /// Run one search. Never fails: acquisition errors are folded into the
    /// statistics of an empty outcome.
    pub async fn search(&self, params: &SearchParams) -> SearchOutcome {
        let quantity = params.clamped_quantity();
        let cache_key = QueryCache::key(&params.court, quantity, &params.filter);

        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!("Serving search for {} from cache", params.court);
            return cached;
        }

        let timer = Timer::new("pipeline search");
        let query = QuerySpec::new(&params.court, quantity, params.filter.clone());

        let mut last_error: Option<String> = None;
        for strategy in &self.strategies {
            match strategy.fetch_candidates(&query).await {
                Ok(raws) if !raws.is_empty() => {
                    let outcome = self.process(raws, &query, strategy.source_tag()).await;
                    timer.finish();
                    self.cache.put(cache_key, outcome.clone());
                    return outcome;
                }
                Ok(_) => {
                    tracing::info!("{} returned no candidates, trying next", strategy.name());
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", strategy.name(), e);
                    last_error = Some(e.to_string());
                }
            }
        }

        timer.finish();
        SearchOutcome {
            records: Vec::new(),
            stats: PipelineStats {
                error: Some(
                    last_error.unwrap_or_else(|| "No acquisition source produced records".to_string()),
                ),
                ..Default::default()
            },
        }
    }

    async fn process(
        &self,
        raws: Vec<crate::acquisition::RawSourceRecord>,
        query: &QuerySpec,
        source_tag: &str,
    ) -> SearchOutcome {
        let total = raws.len();

        let normalized: Vec<CaseRecord> = raws
            .iter()
            .map(|raw| normalize(raw, &query.court, source_tag))
            .collect();

        let mut valid: Vec<CaseRecord> = normalized
            .into_iter()
            .filter(|r| is_valid_case_number(&r.case_number))
            .collect();
        let valid_count = valid.len();

        let mut seen = HashSet::new();
        valid.retain(|r| seen.insert(r.case_number.clone()));
        let duplicates = valid_count - valid.len();

        for record in &mut valid {
            record.nature = classify(&record.case_class, &[&record.subject]);
        }

        // enrichment precedes filtering; an enriched claim value must still
        // pass the range predicates
        if let Some(enricher) = &self.enricher {
            enricher.enrich(&mut valid).await;
        }

        let filtered = apply_filters(valid, &query.filter);
        let filtered_count = filtered.len();

        let records: Vec<CaseRecord> =
            filtered.into_iter().take(query.quantity).collect();

        let stats = PipelineStats {
            total,
            valid: valid_count,
            duplicates,
            filtered: filtered_count,
            returned: records.len(),
            source: source_tag.to_string(),
            error: None,
        };

        tracing::info!(
            "Search {} via {}: {} raw, {} valid, {} filtered, {} returned",
            query.court,
            source_tag,
            stats.total,
            stats.valid,
            stats.filtered,
            stats.returned
        );

        SearchOutcome { records, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::datajud::{DatajudProcess, NamedCode};
    use crate::acquisition::RawSourceRecord;
    use crate::errors::PrecatorioError;
    use crate::pipeline::FilterSpec;
    use crate::Nature;
    use async_trait::async_trait;

    struct StubSource {
        records: Vec<RawSourceRecord>,
        fail: bool,
    }

    impl StubSource {
        fn returning(records: Vec<RawSourceRecord>) -> Self {
            Self { records, fail: false }
        }

        fn failing() -> Self {
            Self { records: Vec::new(), fail: true }
        }
    }

    #[async_trait]
    impl SourceStrategy for StubSource {
        async fn fetch_candidates(
            &self,
            _query: &QuerySpec,
        ) -> crate::errors::Result<Vec<RawSourceRecord>> {
            if self.fail {
                return Err(PrecatorioError::AcquisitionTimeout {
                    source_name: "stub".to_string(),
                    timeout_ms: 30_000,
                });
            }
            Ok(self.records.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn source_tag(&self) -> &str {
            "stub"
        }
    }

    fn api_hit(case_number: &str, subject: &str) -> RawSourceRecord {
        let mut process = DatajudProcess::default();
        process.numero_processo = case_number.to_string();
        process.assuntos = vec![NamedCode {
            codigo: None,
            nome: subject.to_string(),
        }];
        RawSourceRecord::ApiHit(Box::new(process))
    }

    fn params(quantity: usize) -> SearchParams {
        SearchParams {
            court: "TJ-SP".to_string(),
            quantity,
            filter: FilterSpec::default(),
        }
    }

    #[tokio::test]
    async fn counts_every_stage_and_truncates() {
        let mut raws = Vec::new();
        for i in 0..8 {
            raws.push(api_hit(
                &format!("100000{}-23.2024.8.26.0100", i),
                "Execução",
            ));
        }
        raws.push(api_hit("", "Execução"));
        raws.push(api_hit("123", "Execução"));

        let pipeline = SearchPipeline::new(
            vec![Box::new(StubSource::returning(raws))],
            None,
            0,
        );
        let outcome = pipeline.search(&params(5)).await;

        assert_eq!(outcome.stats.total, 10);
        assert_eq!(outcome.stats.valid, 8);
        assert_eq!(outcome.stats.duplicates, 0);
        assert_eq!(outcome.stats.filtered, 8);
        assert_eq!(outcome.stats.returned, 5);
        assert_eq!(outcome.records.len(), 5);
        assert!(outcome.stats.error.is_none());
    }

    #[tokio::test]
    async fn duplicate_case_numbers_are_dropped() {
        let raws = vec![
            api_hit("1000001-23.2024.8.26.0100", "Execução"),
            api_hit("1000001-23.2024.8.26.0100", "Execução"),
            api_hit("1000002-23.2024.8.26.0100", "Execução"),
        ];

        let pipeline = SearchPipeline::new(
            vec![Box::new(StubSource::returning(raws))],
            None,
            0,
        );
        let outcome = pipeline.search(&params(10)).await;

        assert_eq!(outcome.stats.valid, 3);
        assert_eq!(outcome.stats.duplicates, 1);
        assert_eq!(outcome.records.len(), 2);
    }

    #[tokio::test]
    async fn records_are_classified_before_filtering() {
        let raws = vec![
            api_hit("1000001-23.2024.8.26.0100", "Pensão Alimentícia"),
            api_hit("1000002-23.2024.8.26.0100", "Execução Fiscal"),
        ];

        let pipeline = SearchPipeline::new(
            vec![Box::new(StubSource::returning(raws))],
            None,
            0,
        );
        let mut search = params(10);
        search.filter.nature = Some(Nature::Alimentar);
        let outcome = pipeline.search(&search).await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].nature, Nature::Alimentar);
    }

    #[tokio::test]
    async fn failing_source_falls_through_to_the_next() {
        let raws = vec![api_hit("1000001-23.2024.8.26.0100", "Execução")];
        let pipeline = SearchPipeline::new(
            vec![
                Box::new(StubSource::failing()),
                Box::new(StubSource::returning(raws)),
            ],
            None,
            0,
        );
        let outcome = pipeline.search(&params(10)).await;

        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.stats.error.is_none());
    }

    #[tokio::test]
    async fn exhausted_chain_yields_empty_outcome_with_error_marker() {
        let pipeline = SearchPipeline::new(
            vec![Box::new(StubSource::failing())],
            None,
            0,
        );
        let outcome = pipeline.search(&params(10)).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.total, 0);
        assert!(outcome.stats.error.is_some());
    }

    #[tokio::test]
    async fn enriched_value_is_still_subject_to_the_range_filter() {
        use crate::config::{EnrichmentConfig, PortalConfig};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cpopg/show.do"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div id="valorAcaoProcesso">R$ 300.000,00</div>"#,
            ))
            .mount(&server)
            .await;

        let mut portal = PortalConfig::default();
        portal.esaj_base_url = server.uri();
        let settings = EnrichmentConfig {
            enabled: true,
            max_records: 10,
            delay_ms: 0,
        };
        let enricher = crate::acquisition::EsajEnricher::new(portal, settings).unwrap();

        let mut process = DatajudProcess::default();
        process.numero_processo = "1000001-23.2024.8.26.0100".to_string();
        process.valor_causa = Some(50_000.0);
        let raws = vec![RawSourceRecord::ApiHit(Box::new(process))];

        let pipeline = SearchPipeline::new(
            vec![Box::new(StubSource::returning(raws))],
            Some(enricher),
            0,
        );
        let mut search = params(10);
        search.filter.max_value = Some(100_000.0);
        let outcome = pipeline.search(&search).await;

        // 50 000 fits the range, but the detail page raises it to 300 000
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.valid, 1);
        assert_eq!(outcome.stats.filtered, 0);
    }

    #[tokio::test]
    async fn repeated_searches_hit_the_cache() {
        let raws = vec![api_hit("1000001-23.2024.8.26.0100", "Execução")];
        let pipeline = SearchPipeline::new(
            vec![Box::new(StubSource::returning(raws))],
            None,
            60,
        );

        let first = pipeline.search(&params(10)).await;
        let second = pipeline.search(&params(10)).await;
        assert_eq!(first.records, second.records);
        assert_eq!(first.stats, second.stats);
    }
}
