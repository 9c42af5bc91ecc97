//! # CNJ DataJud Acquisition Strategy
//!
//! ## Purpose
//! Fetches precatório candidates from the official CNJ DataJud public API,
//! an Elasticsearch front-end exposing one index per tribunal.
//!
//! ## Input/Output Specification
//! - **Input**: `QuerySpec` (tribunal, quantity, filters)
//! - **Output**: raw `DatajudProcess` documents from the `_search` endpoint
//! - **Authentication**: `Authorization: APIKey <key>` header
//!
//! ## Query Translation
//! Filters are pushed down as an Elasticsearch `bool` query: value range on
//! `valorCausa`, nature keywords matched against `assuntos.nome`, the fiscal
//! year translated back to a filing-year range on `dataAjuizamento`, and
//! status keywords matched against `movimentos.nome`. Without filters the
//! query degenerates to `match_all`. Results are sorted by most recent
//! update first.

use super::{QuerySpec, RawSourceRecord, SourceStrategy};
use crate::config::DatajudConfig;
use crate::errors::{acquisition_error, PrecatorioError, Result};
use crate::pipeline::normalize::LOA_OFFSET_YEARS;
use crate::{CaseStatus, Nature};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const SOURCE_TAG: &str = "datajud-api";

/// One process document as returned by the DataJud index.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DatajudProcess {
    pub numero_processo: String,
    pub classe: Option<NamedCode>,
    pub assuntos: Vec<NamedCode>,
    pub orgao_julgador: Option<OrgaoJulgador>,
    pub valor_causa: Option<f64>,
    pub data_ajuizamento: Option<String>,
    pub movimentos: Vec<Movimento>,
    pub partes: Vec<Parte>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NamedCode {
    pub codigo: Option<i64>,
    pub nome: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OrgaoJulgador {
    pub nome: String,
    pub codigo_municipio_ibge: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Movimento {
    pub codigo: Option<i64>,
    pub nome: String,
    pub data_hora: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Parte {
    pub polo: Option<String>,
    pub nome: Option<String>,
    pub tipo_parte: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: DatajudProcess,
}

/// DataJud API acquisition strategy.
pub struct DatajudSource {
    config: DatajudConfig,
    client: reqwest::Client,
}

impl DatajudSource {
    pub fn new(config: DatajudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PrecatorioError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    fn endpoint_for(&self, court: &str) -> Result<String> {
        let path = self
            .config
            .endpoints
            .get(court)
            .ok_or_else(|| PrecatorioError::InvalidApiRequest {
                details: format!("Unknown tribunal: {}", court),
            })?;
        Ok(format!("{}{}", self.config.base_url, path))
    }

    /// Build the Elasticsearch request body for a query.
    fn build_query(&self, query: &QuerySpec) -> Value {
        let mut must: Vec<Value> = Vec::new();

        let filter = &query.filter;

        if filter.min_value.is_some() || filter.max_value.is_some() {
            let mut range = serde_json::Map::new();
            if let Some(min) = filter.min_value {
                range.insert("gte".to_string(), json!(min));
            }
            if let Some(max) = filter.max_value {
                range.insert("lte".to_string(), json!(max));
            }
            must.push(json!({ "range": { "valorCausa": Value::Object(range) } }));
        }

        if let Some(nature) = filter.nature {
            must.push(json!({
                "match": { "assuntos.nome": nature_keywords(nature) }
            }));
        }

        if let Some(year) = filter.budget_year {
            // The fiscal year is the filing year plus the statutory offset
            let filing_year = year - LOA_OFFSET_YEARS;
            must.push(json!({
                "range": {
                    "dataAjuizamento": {
                        "gte": format!("{}-01-01", filing_year),
                        "lte": format!("{}-12-31", filing_year)
                    }
                }
            }));
        }

        if let Some(status) = filter.status {
            must.push(json!({
                "nested": {
                    "path": "movimentos",
                    "query": {
                        "match": { "movimentos.nome": status_keywords(status) }
                    }
                }
            }));
        }

        let query_clause = if must.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({ "bool": { "must": must } })
        };

        json!({
            "size": query.fetch_size(),
            "query": query_clause,
            "sort": [{ "dataHoraUltimaAtualizacao": { "order": "desc" } }]
        })
    }
}

fn nature_keywords(nature: Nature) -> &'static str {
    match nature {
        Nature::Alimentar => "alimentos pensão salário",
        Nature::Tributaria => "tributário fiscal iptu",
        Nature::Previdenciaria => "previdenciário benefício",
        Nature::Comum => "precatório",
    }
}

fn status_keywords(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Aprovado => "aprovado deferido",
        CaseStatus::Pendente => "pendente aguardando",
        CaseStatus::Finalizado => "arquivado baixa",
        CaseStatus::Rejeitado => "rejeitado indeferido",
        CaseStatus::EmAnalise => "análise",
    }
}

#[async_trait]
impl SourceStrategy for DatajudSource {
    async fn fetch_candidates(&self, query: &QuerySpec) -> Result<Vec<RawSourceRecord>> {
        let url = self.endpoint_for(&query.court)?;
        let body = self.build_query(query);

        tracing::debug!("DataJud query for {}: {}", query.court, body);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("APIKey {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(PrecatorioError::AuthenticationFailed {
                source_name: self.name().to_string(),
                details: format!("DataJud rejected the API key (HTTP {})", status.as_u16()),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrecatorioError::AcquisitionStatus {
                source_name: self.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| PrecatorioError::DataParsing {
                    source_name: self.name().to_string(),
                    details: format!("Malformed search response: {}", e),
                })?;

        let hits = parsed.hits.hits;
        tracing::info!("DataJud returned {} hits for {}", hits.len(), query.court);

        Ok(hits
            .into_iter()
            .map(|h| RawSourceRecord::ApiHit(Box::new(h.source)))
            .collect())
    }

    fn name(&self) -> &str {
        "DataJud API"
    }

    fn source_tag(&self) -> &str {
        SOURCE_TAG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterSpec;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> DatajudConfig {
        let mut config = DatajudConfig::default();
        config.base_url = base_url.to_string();
        config.api_key = "test-key".to_string();
        config
    }

    fn sample_hit() -> serde_json::Value {
        json!({
            "numeroProcesso": "10000012320248260100",
            "classe": { "codigo": 1116, "nome": "Precatório" },
            "assuntos": [{ "codigo": 10433, "nome": "Pensão Alimentícia" }],
            "orgaoJulgador": { "nome": "1ª Vara da Fazenda Pública" },
            "valorCausa": 150000.0,
            "dataAjuizamento": "2024-03-15T00:00:00.000Z",
            "movimentos": [{ "codigo": 123, "nome": "Aguardando pagamento" }],
            "partes": [{ "polo": "ATIVO", "nome": "Maria da Silva" }]
        })
    }

    #[tokio::test]
    async fn fetches_and_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_publica_tjsp/_search"))
            .and(header("Authorization", "APIKey test-key"))
            .and(body_partial_json(json!({ "size": 10 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "hits": [{ "_source": sample_hit() }] }
            })))
            .mount(&server)
            .await;

        let source = DatajudSource::new(test_config(&server.uri())).unwrap();
        let query = QuerySpec::new("TJ-SP", 5, FilterSpec::default());
        let records = source.fetch_candidates(&query).await.unwrap();

        assert_eq!(records.len(), 1);
        match &records[0] {
            RawSourceRecord::ApiHit(process) => {
                assert_eq!(process.numero_processo, "10000012320248260100");
                assert_eq!(process.valor_causa, Some(150000.0));
                assert_eq!(process.partes[0].polo.as_deref(), Some("ATIVO"));
            }
            other => panic!("unexpected record variant: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejected_key_maps_to_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_publica_tjsp/_search"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let source = DatajudSource::new(test_config(&server.uri())).unwrap();
        let query = QuerySpec::new("TJ-SP", 5, FilterSpec::default());
        let err = source.fetch_candidates(&query).await.unwrap_err();

        assert!(matches!(err, PrecatorioError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn server_error_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_publica_tjsp/_search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let source = DatajudSource::new(test_config(&server.uri())).unwrap();
        let query = QuerySpec::new("TJ-SP", 5, FilterSpec::default());
        let err = source.fetch_candidates(&query).await.unwrap_err();

        match err {
            PrecatorioError::AcquisitionStatus { status, .. } => assert_eq!(status, 500),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_server_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_publica_tjsp/_search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_secs(5))
                    .set_body_json(json!({ "hits": { "hits": [] } })),
            )
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.timeout_ms = 100;
        let source = DatajudSource::new(config).unwrap();
        let query = QuerySpec::new("TJ-SP", 5, FilterSpec::default());
        let err = source.fetch_candidates(&query).await.unwrap_err();

        assert!(matches!(err, PrecatorioError::AcquisitionTimeout { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn unknown_tribunal_is_rejected() {
        let source = DatajudSource::new(test_config("http://localhost")).unwrap();
        assert!(source.endpoint_for("TJ-XX").is_err());
    }

    #[test]
    fn filterless_query_uses_match_all() {
        let source = DatajudSource::new(test_config("http://localhost")).unwrap();
        let query = QuerySpec::new("TJ-SP", 30, FilterSpec::default());
        let body = source.build_query(&query);

        assert_eq!(body["size"], 60);
        assert!(body["query"]["match_all"].is_object());
    }

    #[test]
    fn filters_translate_to_bool_query() {
        let source = DatajudSource::new(test_config("http://localhost")).unwrap();
        let filter = FilterSpec {
            min_value: Some(10_000.0),
            max_value: Some(500_000.0),
            nature: Some(Nature::Alimentar),
            budget_year: Some(2031),
            status: Some(CaseStatus::Pendente),
        };
        let query = QuerySpec::new("TJ-SP", 10, filter);
        let body = source.build_query(&query);

        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 4);
        assert_eq!(must[0]["range"]["valorCausa"]["gte"], 10_000.0);
        // fiscal year 2031 maps back to filing year 2024
        assert_eq!(must[2]["range"]["dataAjuizamento"]["gte"], "2024-01-01");
    }
}
