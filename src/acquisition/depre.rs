//! # DEPRE Portal Acquisition Strategy
//!
//! ## Purpose
//! Scrapes the São Paulo court's precatório consultation portal (DEPRE).
//! The portal is a classic WebForms application: the search form page embeds
//! hidden anti-forgery tokens that must be echoed back in a form-encoded
//! POST, and results come back as an HTML table.
//!
//! ## Resilience
//! - User-Agent strings rotate per request
//! - Cookies are kept across the GET/POST pair (session affinity)
//! - Malformed table rows are skipped, never fatal

use super::{QuerySpec, RawSourceRecord, SourceStrategy};
use crate::config::PortalConfig;
use crate::errors::{acquisition_error, PrecatorioError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const SOURCE_TAG: &str = "depre-scrape";

const SEARCH_PATH: &str = "/ConsultaPrecatorios";

/// One row scraped from the DEPRE results table.
#[derive(Debug, Clone, Default)]
pub struct PortalRow {
    pub case_number: String,
    pub creditor: String,
    pub raw_value: String,
    pub nature_text: String,
    pub status_text: String,
    pub district: String,
}

/// DEPRE portal scraping strategy.
#[derive(Debug)]
pub struct DepreSource {
    config: PortalConfig,
    client: reqwest::Client,
    ua_cursor: AtomicUsize,
    viewstate_re: Regex,
    eventvalidation_re: Regex,
    row_re: Regex,
    cell_re: Regex,
    tag_re: Regex,
}

impl DepreSource {
    pub fn new(config: PortalConfig) -> Result<Self> {
        if config.user_agents.is_empty() {
            return Err(PrecatorioError::ValidationFailed {
                field: "portal.user_agents".to_string(),
                reason: "At least one User-Agent string is required".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .build()
            .map_err(|e| PrecatorioError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            client,
            ua_cursor: AtomicUsize::new(0),
            viewstate_re: Regex::new(r#"id="__VIEWSTATE"\s+value="([^"]*)""#)
                .map_err(invalid_pattern)?,
            eventvalidation_re: Regex::new(r#"id="__EVENTVALIDATION"\s+value="([^"]*)""#)
                .map_err(invalid_pattern)?,
            row_re: Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").map_err(invalid_pattern)?,
            cell_re: Regex::new(r"(?s)<td[^>]*>(.*?)</td>").map_err(invalid_pattern)?,
            tag_re: Regex::new(r"<[^>]+>").map_err(invalid_pattern)?,
        })
    }

    fn next_user_agent(&self) -> &str {
        let i = self.ua_cursor.fetch_add(1, Ordering::Relaxed);
        &self.config.user_agents[i % self.config.user_agents.len()]
    }

    /// Extract the WebForms anti-forgery tokens from the search form page.
    fn extract_tokens(&self, html: &str) -> Result<(String, String)> {
        let viewstate = self
            .viewstate_re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| PrecatorioError::DataParsing {
                source_name: self.name().to_string(),
                details: "__VIEWSTATE token not found in form page".to_string(),
            })?;

        let eventvalidation = self
            .eventvalidation_re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| PrecatorioError::DataParsing {
                source_name: self.name().to_string(),
                details: "__EVENTVALIDATION token not found in form page".to_string(),
            })?;

        Ok((viewstate, eventvalidation))
    }

    fn strip_tags(&self, html: &str) -> String {
        self.tag_re.replace_all(html, "").trim().to_string()
    }

    /// Parse the results table. Rows with fewer cells than expected or a
    /// blank case number are skipped.
    fn parse_result_table(&self, html: &str, limit: usize) -> Vec<PortalRow> {
        let mut rows = Vec::new();

        for row_cap in self.row_re.captures_iter(html) {
            if rows.len() >= limit {
                break;
            }
            let row_html = &row_cap[1];
            let cells: Vec<String> = self
                .cell_re
                .captures_iter(row_html)
                .map(|c| self.strip_tags(&c[1]))
                .collect();

            // header rows use <th> and yield zero cells
            if cells.len() < 5 {
                continue;
            }

            let case_number = cells[0].clone();
            if case_number.is_empty() {
                tracing::debug!("Skipping DEPRE row with blank case number");
                continue;
            }

            rows.push(PortalRow {
                case_number,
                creditor: cells[1].clone(),
                raw_value: cells[2].clone(),
                nature_text: cells[3].clone(),
                status_text: cells[4].clone(),
                district: cells.get(5).cloned().unwrap_or_default(),
            });
        }

        rows
    }
}

fn invalid_pattern(e: regex::Error) -> PrecatorioError {
    PrecatorioError::Internal {
        message: format!("Invalid scraper pattern: {}", e),
    }
}

#[async_trait]
impl SourceStrategy for DepreSource {
    async fn fetch_candidates(&self, query: &QuerySpec) -> Result<Vec<RawSourceRecord>> {
        let url = format!("{}{}", self.config.depre_base_url, SEARCH_PATH);

        let form_page = self
            .client
            .get(&url)
            .header("User-Agent", self.next_user_agent())
            .send()
            .await
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?
            .error_for_status()
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?
            .text()
            .await
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?;

        let (viewstate, eventvalidation) = self.extract_tokens(&form_page)?;

        let mut form: Vec<(String, String)> = vec![
            ("__VIEWSTATE".to_string(), viewstate),
            ("__EVENTVALIDATION".to_string(), eventvalidation),
            ("tribunal".to_string(), query.court.clone()),
            ("quantidade".to_string(), query.fetch_size().to_string()),
        ];
        if let Some(nature) = query.filter.nature {
            form.push(("natureza".to_string(), nature.to_string()));
        }
        if let Some(year) = query.filter.budget_year {
            form.push(("anoOrcamento".to_string(), year.to_string()));
        }

        let results_page = self
            .client
            .post(&url)
            .header("User-Agent", self.next_user_agent())
            .form(&form)
            .send()
            .await
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?
            .error_for_status()
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?
            .text()
            .await
            .map_err(|e| acquisition_error(self.name(), self.config.timeout_ms, e))?;

        let rows = self.parse_result_table(&results_page, query.fetch_size());
        tracing::info!("DEPRE scrape yielded {} rows for {}", rows.len(), query.court);

        if rows.is_empty() {
            return Err(PrecatorioError::SourceUnavailable {
                source_name: self.name().to_string(),
                details: "Results page contained no parseable rows".to_string(),
            });
        }

        Ok(rows.into_iter().map(RawSourceRecord::ScrapedRow).collect())
    }

    fn name(&self) -> &str {
        "DEPRE portal"
    }

    fn source_tag(&self) -> &str {
        SOURCE_TAG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DepreSource {
        DepreSource::new(PortalConfig::default()).unwrap()
    }

    const FORM_PAGE: &str = r#"
        <form>
        <input type="hidden" id="__VIEWSTATE" value="vs-abc123" />
        <input type="hidden" id="__EVENTVALIDATION" value="ev-def456" />
        </form>
    "#;

    #[test]
    fn extracts_anti_forgery_tokens() {
        let (vs, ev) = source().extract_tokens(FORM_PAGE).unwrap();
        assert_eq!(vs, "vs-abc123");
        assert_eq!(ev, "ev-def456");
    }

    #[test]
    fn missing_token_is_a_parse_error() {
        let err = source().extract_tokens("<html></html>").unwrap_err();
        assert!(matches!(err, PrecatorioError::DataParsing { .. }));
    }

    #[test]
    fn parses_table_rows_and_skips_malformed() {
        let html = r##"
            <table>
            <tr><th>Processo</th><th>Credor</th><th>Valor</th><th>Natureza</th><th>Status</th></tr>
            <tr>
              <td><a href="#">0001234-56.2020.8.26.0500</a></td>
              <td>João Pereira</td>
              <td>R$ 250.000,00</td>
              <td>Alimentar</td>
              <td>Pendente</td>
              <td>São Paulo</td>
            </tr>
            <tr><td></td><td>Broken</td><td></td><td></td><td></td></tr>
            <tr><td>only-two</td><td>cells</td></tr>
            </table>
        "##;

        let rows = source().parse_result_table(html, 10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].case_number, "0001234-56.2020.8.26.0500");
        assert_eq!(rows[0].creditor, "João Pereira");
        assert_eq!(rows[0].raw_value, "R$ 250.000,00");
        assert_eq!(rows[0].district, "São Paulo");
    }

    #[test]
    fn respects_the_row_limit() {
        let row = "<tr><td>0001234-56.2020.8.26.0500</td><td>a</td><td>b</td><td>c</td><td>d</td></tr>";
        let html = format!("<table>{}</table>", row.repeat(8));
        let rows = source().parse_result_table(&html, 3);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn rotates_user_agents() {
        let s = source();
        let first = s.next_user_agent().to_string();
        let second = s.next_user_agent().to_string();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_user_agent_list_is_rejected_at_construction() {
        let mut config = PortalConfig::default();
        config.user_agents.clear();
        let err = DepreSource::new(config).unwrap_err();
        assert!(matches!(err, PrecatorioError::ValidationFailed { .. }));
    }
}
