//! # Record Normalizer
//!
//! ## Purpose
//! Converts raw source records from any acquisition strategy into the
//! canonical `CaseRecord` shape. Normalization is pure and total: every
//! field has a defined default and no input can make it fail.
//!
//! ## Budget Year
//! The CNJ case-number standard encodes the filing year at a fixed offset
//! within the digits-only form (digits 9..13). The fiscal (LOA) budget year
//! of a precatório is that filing year plus seven. When the year cannot be
//! parsed the current calendar year stands in for the filing year.

use crate::acquisition::{DatajudProcess, PortalRow, RawSourceRecord, SyntheticCase};
use crate::utils::{parse_monetary_value, strip_non_digits};
use crate::{CaseRecord, CaseStatus, Nature};
use chrono::{Datelike, NaiveDate, Utc};

/// Years between a precatório's filing year and its LOA budget year.
pub const LOA_OFFSET_YEARS: i32 = 7;

const DEFAULT_TEXT: &str = "Não informado";
const DEFAULT_DISTRICT: &str = "São Paulo";

/// Compute the budget (LOA) year from a case number in any format.
pub fn budget_year(case_number: &str) -> i32 {
    let digits = strip_non_digits(case_number);
    let filing_year = digits
        .get(9..13)
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|y| (1990..=2099).contains(y))
        .unwrap_or_else(|| Utc::now().year());
    filing_year + LOA_OFFSET_YEARS
}

/// Parse a source date: either an 8-digit `YYYYMMDD` string or an ISO-8601
/// timestamp. Anything else yields the current date.
pub fn normalize_date(raw: Option<&str>) -> NaiveDate {
    let today = Utc::now().date_naive();
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return today;
    };

    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(raw, "%Y%m%d").unwrap_or(today);
    }

    raw.get(..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(today)
}

/// Derive a processing status from movement or status text.
pub fn status_from_text(text: &str) -> Option<CaseStatus> {
    let lower = text.to_lowercase();
    if lower.contains("aprovad") || lower.contains("deferi") {
        Some(CaseStatus::Aprovado)
    } else if lower.contains("pendent") || lower.contains("aguard") {
        Some(CaseStatus::Pendente)
    } else if lower.contains("arquiv") || lower.contains("baixa") {
        Some(CaseStatus::Finalizado)
    } else if lower.contains("rejeit") || lower.contains("indefer") {
        Some(CaseStatus::Rejeitado)
    } else {
        None
    }
}

fn status_from_movements(names: &[String]) -> CaseStatus {
    if names.is_empty() {
        return CaseStatus::Pendente;
    }
    names
        .iter()
        .find_map(|n| status_from_text(n))
        .unwrap_or(CaseStatus::EmAnalise)
}

/// Normalize one raw record into the canonical shape.
pub fn normalize(raw: &RawSourceRecord, court: &str, source_tag: &str) -> CaseRecord {
    match raw {
        RawSourceRecord::ApiHit(process) => normalize_api_hit(process, court, source_tag),
        RawSourceRecord::ScrapedRow(row) => normalize_portal_row(row, court, source_tag),
        RawSourceRecord::Synthetic(case) => normalize_synthetic(case, court, source_tag),
    }
}

fn normalize_api_hit(process: &DatajudProcess, court: &str, source_tag: &str) -> CaseRecord {
    let creditor = process
        .partes
        .iter()
        .find(|p| {
            p.polo.as_deref().is_some_and(|polo| polo.eq_ignore_ascii_case("ATIVO"))
                || p.tipo_parte
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case("AUTOR"))
        })
        .and_then(|p| p.nome.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TEXT.to_string());

    let subject = if process.assuntos.is_empty() {
        DEFAULT_TEXT.to_string()
    } else {
        process
            .assuntos
            .iter()
            .map(|a| a.nome.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let movement_names: Vec<String> =
        process.movimentos.iter().map(|m| m.nome.clone()).collect();

    CaseRecord {
        case_number: process.numero_processo.clone(),
        court: court.to_string(),
        creditor,
        claim_value: process.valor_causa.unwrap_or(0.0).max(0.0),
        case_class: process
            .classe
            .as_ref()
            .map(|c| c.nome.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
        subject,
        filing_date: normalize_date(process.data_ajuizamento.as_deref()),
        district: DEFAULT_DISTRICT.to_string(),
        court_division: process
            .orgao_julgador
            .as_ref()
            .map(|o| o.nome.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
        nature: Nature::Comum,
        budget_year: budget_year(&process.numero_processo),
        status: status_from_movements(&movement_names),
        source_tag: source_tag.to_string(),
    }
}

fn normalize_portal_row(row: &PortalRow, court: &str, source_tag: &str) -> CaseRecord {
    let text_or_default = |s: &str| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            DEFAULT_TEXT.to_string()
        } else {
            trimmed.to_string()
        }
    };

    CaseRecord {
        case_number: row.case_number.trim().to_string(),
        court: court.to_string(),
        creditor: text_or_default(&row.creditor),
        claim_value: parse_monetary_value(&row.raw_value),
        case_class: "Precatório".to_string(),
        subject: text_or_default(&row.nature_text),
        filing_date: Utc::now().date_naive(),
        district: if row.district.trim().is_empty() {
            DEFAULT_DISTRICT.to_string()
        } else {
            row.district.trim().to_string()
        },
        court_division: DEFAULT_TEXT.to_string(),
        nature: Nature::Comum,
        budget_year: budget_year(&row.case_number),
        status: status_from_text(&row.status_text).unwrap_or(CaseStatus::Pendente),
        source_tag: source_tag.to_string(),
    }
}

fn normalize_synthetic(case: &SyntheticCase, court: &str, source_tag: &str) -> CaseRecord {
    CaseRecord {
        case_number: case.case_number.clone(),
        court: court.to_string(),
        creditor: case.creditor.clone(),
        claim_value: case.claim_value,
        case_class: "Precatório".to_string(),
        subject: case.subject.clone(),
        filing_date: case.filing_date,
        district: case.district.clone(),
        court_division: DEFAULT_TEXT.to_string(),
        nature: Nature::Comum,
        budget_year: budget_year(&case.case_number),
        status: status_from_text(&case.status_text).unwrap_or(CaseStatus::Pendente),
        source_tag: source_tag.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::datajud::{Movimento, NamedCode, Parte};

    #[test]
    fn budget_year_from_dotted_case_number() {
        assert_eq!(budget_year("1000001-23.2024.8.26.0100"), 2031);
    }

    #[test]
    fn budget_year_from_raw_digits() {
        assert_eq!(budget_year("10000012320248260100"), 2031);
    }

    #[test]
    fn budget_year_falls_back_to_current_year() {
        let expected = Utc::now().year() + LOA_OFFSET_YEARS;
        assert_eq!(budget_year("garbage"), expected);
        assert_eq!(budget_year(""), expected);
    }

    #[test]
    fn normalizes_compact_and_iso_dates() {
        assert_eq!(
            normalize_date(Some("20240315")),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(
            normalize_date(Some("2024-03-15T00:00:00.000Z")),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(normalize_date(None), Utc::now().date_naive());
        assert_eq!(normalize_date(Some("not a date")), Utc::now().date_naive());
    }

    #[test]
    fn creditor_comes_from_the_active_party() {
        let mut process = DatajudProcess::default();
        process.numero_processo = "1000001-23.2024.8.26.0100".to_string();
        process.partes = vec![
            Parte {
                polo: Some("PASSIVO".to_string()),
                nome: Some("Fazenda do Estado".to_string()),
                tipo_parte: None,
            },
            Parte {
                polo: Some("ATIVO".to_string()),
                nome: Some("Maria da Silva".to_string()),
                tipo_parte: None,
            },
        ];

        let record = normalize_api_hit(&process, "TJ-SP", "datajud-api");
        assert_eq!(record.creditor, "Maria da Silva");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut process = DatajudProcess::default();
        process.numero_processo = "1000001-23.2024.8.26.0100".to_string();

        let record = normalize_api_hit(&process, "TJ-SP", "datajud-api");
        assert_eq!(record.creditor, "Não informado");
        assert_eq!(record.subject, "Não informado");
        assert_eq!(record.case_class, "Não informado");
        assert_eq!(record.claim_value, 0.0);
        assert_eq!(record.status, CaseStatus::Pendente);
        assert_eq!(record.budget_year, 2031);
    }

    #[test]
    fn subjects_join_with_comma() {
        let mut process = DatajudProcess::default();
        process.numero_processo = "1000001-23.2024.8.26.0100".to_string();
        process.assuntos = vec![
            NamedCode {
                codigo: None,
                nome: "Pensão Alimentícia".to_string(),
            },
            NamedCode {
                codigo: None,
                nome: "Execução".to_string(),
            },
        ];

        let record = normalize_api_hit(&process, "TJ-SP", "datajud-api");
        assert_eq!(record.subject, "Pensão Alimentícia, Execução");
    }

    #[test]
    fn status_derives_from_movements() {
        let movement = |name: &str| Movimento {
            codigo: None,
            nome: name.to_string(),
            data_hora: None,
        };

        let mut process = DatajudProcess::default();
        process.numero_processo = "1000001-23.2024.8.26.0100".to_string();

        process.movimentos = vec![movement("Pagamento aprovado")];
        assert_eq!(
            normalize_api_hit(&process, "TJ-SP", "t").status,
            CaseStatus::Aprovado
        );

        process.movimentos = vec![movement("Arquivado definitivamente")];
        assert_eq!(
            normalize_api_hit(&process, "TJ-SP", "t").status,
            CaseStatus::Finalizado
        );

        process.movimentos = vec![movement("Juntada de petição")];
        assert_eq!(
            normalize_api_hit(&process, "TJ-SP", "t").status,
            CaseStatus::EmAnalise
        );

        process.movimentos.clear();
        assert_eq!(
            normalize_api_hit(&process, "TJ-SP", "t").status,
            CaseStatus::Pendente
        );
    }

    #[test]
    fn portal_rows_parse_brazilian_values() {
        let row = PortalRow {
            case_number: "0001234-56.2020.8.26.0500".to_string(),
            creditor: "João Pereira".to_string(),
            raw_value: "R$ 250.000,00".to_string(),
            nature_text: "Alimentar".to_string(),
            status_text: "Aguardando pagamento".to_string(),
            district: "Campinas".to_string(),
        };

        let record = normalize_portal_row(&row, "TJ-SP", "depre-scrape");
        assert_eq!(record.claim_value, 250_000.0);
        assert_eq!(record.status, CaseStatus::Pendente);
        assert_eq!(record.district, "Campinas");
        assert_eq!(record.budget_year, 2027);
    }
}
