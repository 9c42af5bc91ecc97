//! # ESAJ Detail Enrichment
//!
//! ## Purpose
//! Optional late-enrichment step: looks up individual cases on the ESAJ
//! public consultation pages and merges the richer detail fields back into
//! already-normalized records. Lookups are throttled and strictly
//! best-effort; a failed lookup leaves the record untouched.

use crate::config::{EnrichmentConfig, PortalConfig};
use crate::errors::{acquisition_error, PrecatorioError, Result};
use crate::utils::{parse_monetary_value, strip_non_digits};
use crate::CaseRecord;
use regex::Regex;
use std::time::Duration;

/// Detail fields extracted from an ESAJ case page.
#[derive(Debug, Clone, Default)]
pub struct EsajDetail {
    pub creditor: Option<String>,
    pub case_class: Option<String>,
    pub subject: Option<String>,
    pub claim_value: Option<f64>,
}

/// Per-case ESAJ lookup client.
pub struct EsajEnricher {
    portal: PortalConfig,
    settings: EnrichmentConfig,
    client: reqwest::Client,
    field_patterns: Vec<(Field, Regex)>,
    tag_re: Regex,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Creditor,
    Class,
    Subject,
    Value,
}

impl EsajEnricher {
    pub fn new(portal: PortalConfig, settings: EnrichmentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(portal.timeout_ms))
            .cookie_store(true)
            .build()
            .map_err(|e| PrecatorioError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let patterns = [
            (Field::Class, r#"(?s)id="classeProcesso"[^>]*>(.*?)</"#),
            (Field::Subject, r#"(?s)id="assuntoProcesso"[^>]*>(.*?)</"#),
            (Field::Value, r#"(?s)id="valorAcaoProcesso"[^>]*>(.*?)</"#),
            (
                Field::Creditor,
                r#"(?s)(?:Reqte|Requerente|Exeqte)[^<]*</span>\s*</td>\s*<td[^>]*>(.*?)</td>"#,
            ),
        ];
        let mut field_patterns = Vec::new();
        for (field, pattern) in patterns {
            let re = Regex::new(pattern).map_err(|e| PrecatorioError::Internal {
                message: format!("Invalid enrichment pattern: {}", e),
            })?;
            field_patterns.push((field, re));
        }

        Ok(Self {
            portal,
            settings,
            client,
            field_patterns,
            tag_re: Regex::new(r"<[^>]+>").map_err(|e| PrecatorioError::Internal {
                message: format!("Invalid enrichment pattern: {}", e),
            })?,
        })
    }

    pub fn enabled(&self) -> bool {
        self.settings.enabled
    }

    fn extract_detail(&self, html: &str) -> EsajDetail {
        let mut detail = EsajDetail::default();
        for (field, re) in &self.field_patterns {
            let Some(text) = re
                .captures(html)
                .and_then(|c| c.get(1))
                .map(|m| self.tag_re.replace_all(m.as_str(), "").trim().to_string())
                .filter(|t| !t.is_empty())
            else {
                continue;
            };

            match field {
                Field::Creditor => detail.creditor = Some(text),
                Field::Class => detail.case_class = Some(text),
                Field::Subject => detail.subject = Some(text),
                Field::Value => {
                    let value = parse_monetary_value(&text);
                    if value > 0.0 {
                        detail.claim_value = Some(value);
                    }
                }
            }
        }
        detail
    }

    async fn fetch_detail(&self, case_number: &str) -> Result<EsajDetail> {
        let digits = strip_non_digits(case_number);
        let url = format!(
            "{}/cpopg/show.do?processo.numero={}",
            self.portal.esaj_base_url, digits
        );

        let html = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| acquisition_error("ESAJ", self.portal.timeout_ms, e))?
            .error_for_status()
            .map_err(|e| acquisition_error("ESAJ", self.portal.timeout_ms, e))?
            .text()
            .await
            .map_err(|e| acquisition_error("ESAJ", self.portal.timeout_ms, e))?;

        Ok(self.extract_detail(&html))
    }

    /// Merge ESAJ detail into a record. Text fields are overwritten when the
    /// page has them; the claim value only when the page reports a larger
    /// amount (ESAJ shows the original claim, which may lag updates).
    fn apply_detail(record: &mut CaseRecord, detail: &EsajDetail) {
        if let Some(creditor) = &detail.creditor {
            record.creditor = creditor.clone();
        }
        if let Some(class) = &detail.case_class {
            record.case_class = class.clone();
        }
        if let Some(subject) = &detail.subject {
            record.subject = subject.clone();
        }
        if let Some(value) = detail.claim_value {
            if value > record.claim_value {
                record.claim_value = value;
            }
        }
    }

    /// Enrich up to `max_records` of the given records in place, with a
    /// throttling delay between lookups. Lookup failures are logged and
    /// skipped.
    pub async fn enrich(&self, records: &mut [CaseRecord]) {
        if !self.settings.enabled {
            return;
        }

        let limit = self.settings.max_records.min(records.len());
        for (i, record) in records.iter_mut().take(limit).enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.settings.delay_ms)).await;
            }

            match self.fetch_detail(&record.case_number).await {
                Ok(detail) => Self::apply_detail(record, &detail),
                Err(e) => {
                    tracing::warn!("ESAJ enrichment failed for {}: {}", record.case_number, e);
                }
            }
        }
    }
}
