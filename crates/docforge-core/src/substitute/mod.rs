//! The substitution engine.
//!
//! [`Engine::apply`] runs the passes of a [`VariantDescriptor`] strictly in
//! order, each one taking the full markup text produced by the previous pass.
//! A pass whose edit key is absent or blank is not run. A pass that fails with
//! a recoverable error (missing landmark, bad date, bad pattern) is logged and
//! skipped; the text it was given flows on unchanged.

pub mod dates;
pub mod drawing;
pub mod literal;
pub mod section;
pub mod table;

use std::fmt;

use crate::edits::EditRequest;
use crate::error::Result;
use crate::templates::renderer::TemplateRenderer;
use crate::variant::{PassSpec, Strategy, VariantDescriptor};

/// Text produced by one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// Number of replacements made (matches, rows or paragraphs).
    pub count: usize,
}

impl Applied {
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            count: 0,
        }
    }
}

/// What happened to one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassStatus {
    Applied(usize),
    NotRequested,
    Skipped(String),
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied(count) => write!(f, "applied ({count})"),
            Self::NotRequested => f.write_str("not requested"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub name: String,
    pub status: PassStatus,
}

/// Result of running a whole variant.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub reports: Vec<PassReport>,
}

impl Rendered {
    /// Names of the passes that were skipped after a recoverable failure.
    pub fn skipped(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| matches!(r.status, PassStatus::Skipped(_)))
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Interpreter for variant descriptors.
pub struct Engine {
    renderer: TemplateRenderer,
}

impl Engine {
    pub fn new() -> Result<Self> {
        Ok(Self {
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Apply every pass of `variant` to `text`.
    ///
    /// Only non-recoverable errors are returned; they cannot come from a
    /// pass's own logic, only from the engine's collaborators.
    pub fn apply(
        &self,
        variant: &VariantDescriptor,
        text: &str,
        edits: &EditRequest,
    ) -> Result<Rendered> {
        let mut current = text.to_string();
        let mut reports = Vec::with_capacity(variant.passes.len());

        for pass in &variant.passes {
            let status = match self.run_pass(pass, &current, edits) {
                Ok(None) => PassStatus::NotRequested,
                Ok(Some(applied)) => {
                    current = applied.text;
                    PassStatus::Applied(applied.count)
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(
                        variant = %variant.key,
                        pass = %pass.name,
                        error = %e,
                        "pass skipped"
                    );
                    PassStatus::Skipped(e.to_string())
                }
                Err(e) => return Err(e),
            };
            tracing::debug!(pass = %pass.name, %status, "pass finished");
            reports.push(PassReport {
                name: pass.name.clone(),
                status,
            });
        }

        Ok(Rendered {
            text: current,
            reports,
        })
    }

    /// Run one pass, or return `None` when its edit is not requested.
    fn run_pass(&self, pass: &PassSpec, text: &str, edits: &EditRequest) -> Result<Option<Applied>> {
        let applied = match &pass.strategy {
            Strategy::CasedWord {
                key,
                root,
                protected_suffix,
            } => {
                let Some(value) = edits.text(key) else {
                    return Ok(None);
                };
                literal::replace_root_word(text, root, protected_suffix.as_deref(), &value)?
            }
            Strategy::Phrase {
                key,
                pattern,
                case_insensitive,
                replacement,
            } => {
                let Some(value) = edits.text(key) else {
                    return Ok(None);
                };
                literal::replace_phrase(text, pattern, *case_insensitive, replacement, &value)?
            }
            Strategy::DateExpression { key, anchor } => {
                let Some(value) = edits.text(key) else {
                    return Ok(None);
                };
                dates::replace_date_expression(text, anchor, &value)?
            }
            Strategy::BillingCycle { start_key, end_key } => {
                let (Some(start), Some(end)) = (edits.text(start_key), edits.text(end_key)) else {
                    return Ok(None);
                };
                dates::replace_billing_cycle(text, &start, &end)?
            }
            Strategy::Section { key, start, end } => {
                let Some(value) = edits.text(key) else {
                    return Ok(None);
                };
                section::replace_section(text, start, end, &value, &self.renderer)?
            }
            Strategy::TableRows {
                key,
                selector,
                schema,
            } => {
                let records = edits.rows(key);
                if records.is_empty() {
                    return Ok(None);
                }
                let rows = schema.project(&records);
                log_dropped(&pass.name, records.len(), rows.len());
                table::replace_table_rows(text, selector, &rows, &self.renderer)?
            }
            Strategy::DrawingToTable {
                key,
                selector,
                schema,
                layout,
            } => {
                let records = edits.rows(key);
                if records.is_empty() {
                    return Ok(None);
                }
                let rows = schema.project(&records);
                log_dropped(&pass.name, records.len(), rows.len());
                drawing::drawing_to_table(text, selector, &rows, layout, &self.renderer)?
            }
        };
        Ok(Some(applied))
    }
}

fn log_dropped(pass: &str, submitted: usize, valid: usize) {
    if valid < submitted {
        tracing::debug!(pass, dropped = submitted - valid, "incomplete rows dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BODY: &str = concat!(
        "<w:body>",
        "<w:p><w:r><w:t>Fallyx Fall Detection for Responsive Health Management Inc.</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>Fees are in Canadian dollars.</w:t></w:r></w:p>",
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Beds</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Fee</w:t></w:r></w:p></w:tc></w:tr>",
        "<w:tr><w:tc><w:p><w:r><w:t>0-100</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>$1</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        "</w:body>"
    );

    fn edits(value: serde_json::Value) -> EditRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_request_is_identity() {
        let engine = Engine::new().unwrap();
        let out = engine
            .apply(&VariantDescriptor::v2_0_without_pilot(), BODY, &EditRequest::new())
            .unwrap();
        assert_eq!(out.text, BODY);
        assert!(out
            .reports
            .iter()
            .all(|r| r.status == PassStatus::NotRequested));
    }

    #[test]
    fn test_passes_chain_in_order() {
        let engine = Engine::new().unwrap();
        let out = engine
            .apply(
                &VariantDescriptor::v2_0_without_pilot(),
                BODY,
                &edits(json!({
                    "replaceFall": "behaviours",
                    "replaceFallyx": "Ascenix",
                    "homeLegalName": "Sunrise Care Ltd.",
                    "currencyCountry": "US dollars",
                    "pricingRows": [
                        { "description": "0-750", "fee": "$0.10" },
                        { "description": "", "fee": "$0.09" },
                        { "description": "751-1500", "fee": "$0.08" }
                    ]
                })),
            )
            .unwrap();

        assert!(out
            .text
            .contains("<w:t>Ascenix Behaviours Detection for Sunrise Care Ltd.</w:t>"));
        assert!(out.text.contains("<w:t>Fees are in US dollars.</w:t>"));
        assert!(out.text.contains("<w:t>751-1500</w:t>"));
        assert!(!out.text.contains("$0.09"));
        assert_eq!(out.text.matches("<w:tr>").count(), 3);

        let status = |name: &str| {
            out.reports
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.status.clone())
                .unwrap()
        };
        assert_eq!(status("pricing_table"), PassStatus::Applied(2));
        assert_eq!(status("billing_cycle"), PassStatus::NotRequested);
    }

    #[test]
    fn test_missing_landmarks_are_skipped() {
        let engine = Engine::new().unwrap();
        let out = engine
            .apply(
                &VariantDescriptor::v2_0_without_pilot(),
                BODY,
                &edits(json!({
                    "section33Text": "3.3. New terms",
                    "quarterlyStartDate": "2026-01-01",
                    "quarterlyEndDate": "2026-01-31",
                    "facilityRows": [{ "facilityName": "Maple" }],
                    "homeLocation": "1 Main St"
                })),
            )
            .unwrap();
        assert_eq!(out.text, BODY);
        assert_eq!(
            out.skipped(),
            vec!["section_3_3", "billing_cycle", "facility_table"]
        );
    }

    #[test]
    fn test_bad_dates_skip_only_their_pass() {
        let engine = Engine::new().unwrap();
        let out = engine
            .apply(
                &VariantDescriptor::v2_0_without_pilot(),
                BODY,
                &edits(json!({
                    "quarterlyStartDate": "2026-03-01",
                    "quarterlyEndDate": "2026-01-31",
                    "replaceFall": "Risk"
                })),
            )
            .unwrap();
        assert!(out.text.contains("Risk Detection"));
        assert_eq!(out.skipped(), vec!["billing_cycle"]);
    }

    #[test]
    fn test_all_rows_invalid_leaves_table() {
        let engine = Engine::new().unwrap();
        let out = engine
            .apply(
                &VariantDescriptor::v2_0_without_pilot(),
                BODY,
                &edits(json!({ "pricingRows": [{ "description": "0-750" }] })),
            )
            .unwrap();
        assert_eq!(out.text, BODY);
    }
}
