//! Property-based tests for the substitution engine.
//!
//! Generates random documents, values and row lists, then checks the
//! invariants every variant relies on.

use chrono::{Datelike, Duration, NaiveDate};
use docforge_core::edits::{EditRequest, RowRecord, RowSchema};
use docforge_core::markup::{RegionKind, RegionSelector, Structure};
use docforge_core::substitute::dates::BillingCycle;
use docforge_core::substitute::literal::replace_root_word;
use docforge_core::substitute::table::replace_table_rows;
use docforge_core::substitute::Engine;
use docforge_core::templates::renderer::TemplateRenderer;
use docforge_core::variant::VariantDescriptor;
use proptest::prelude::*;
use serde_json::json;

// ===========================================================================
// Generators
// ===========================================================================

/// Text built from the root word, the brand, and filler.
fn arb_brand_text() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec![
        "Fall", "fall", "Fallyx", "fallyx", " ", "  ", "Detection", "risk", ".", ",", "(",
        ")", "<w:t>", "</w:t>",
    ]);
    proptest::collection::vec(token, 0..40).prop_map(|tokens| tokens.concat())
}

/// A replacement word that cannot itself spell the root word or the brand.
fn arb_value() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,12}".prop_filter("must not contain the root word", |v| {
        let lower = v.to_lowercase();
        !lower.contains("fall") && !lower.contains("yx")
    })
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..36_500).prop_map(|days| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(days)
    })
}

fn arb_rows() -> impl Strategy<Value = Vec<RowRecord>> {
    let field = prop::sample::select(vec!["", "  ", "0-750", "751-1500", "$0.10", "A & B", "<1>"]);
    proptest::collection::vec((field.clone(), field), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(description, fee)| {
                RowRecord::from_pairs([("description", description), ("fee", fee)])
            })
            .collect()
    })
}

fn cell(text: &str) -> String {
    format!("<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>")
}

fn pricing_document() -> String {
    format!(
        "<w:body><w:p/><w:tbl><w:tblPr/><w:tr>{}{}</w:tr><w:tr>{}{}</w:tr></w:tbl><w:p/></w:body>",
        cell("Beds"),
        cell("Fee"),
        cell("0-100"),
        cell("$1.00")
    )
}

fn count_brand(text: &str) -> usize {
    text.matches("Fallyx").count() + text.matches("fallyx").count()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn brand_word_never_altered(text in arb_brand_text(), value in arb_value()) {
        let applied = replace_root_word(&text, "Fall", Some("yx"), &value).unwrap();
        prop_assert_eq!(count_brand(&applied.text), count_brand(&text));
    }

    #[test]
    fn billing_dates_are_quarterly(start in arb_date(), length in 0i64..400) {
        let end = start + Duration::days(length);
        let cycle = BillingCycle::compute(start, end).unwrap();

        prop_assert_eq!(cycle.first_billing.day(), 1);
        prop_assert!(cycle.first_billing > end);
        prop_assert_eq!(cycle.quarters[0], cycle.first_billing);
        for pair in cycle.quarters.windows(2) {
            let months = |d: NaiveDate| d.year() * 12 + d.month0() as i32;
            prop_assert_eq!(months(pair[1]) - months(pair[0]), 3);
            prop_assert_eq!(pair[1].day(), 1);
        }
    }

    #[test]
    fn row_count_matches_valid_rows(records in arb_rows()) {
        let schema = RowSchema::new(&[("description", true), ("fee", true)]);
        let valid = records.iter().filter(|r| schema.is_valid(r)).count();
        let rows = schema.project(&records);
        prop_assert_eq!(rows.len(), valid);

        let doc = pricing_document();
        let renderer = TemplateRenderer::new().unwrap();
        let out = replace_table_rows(&doc, &RegionSelector::First, &rows, &renderer).unwrap();

        let before = Structure::scan(&doc);
        let after = Structure::scan(&out.text);
        let table_before = before.tables()[0];
        let table_after = after.tables()[0];
        let rows_before = before.owned(table_before.index, RegionKind::Row, RegionKind::Table);
        let rows_after = after.owned(table_after.index, RegionKind::Row, RegionKind::Table);

        if valid == 0 {
            prop_assert_eq!(&out.text, &doc);
        } else {
            prop_assert_eq!(rows_after.len(), valid + 1);
        }
        prop_assert_eq!(
            &out.text[rows_after[0].span.clone()],
            &doc[rows_before[0].span.clone()]
        );
        prop_assert!(out.text.starts_with("<w:body><w:p/>"));
        prop_assert!(out.text.ends_with("</w:tbl><w:p/></w:body>"));
    }

    #[test]
    fn empty_request_is_identity(text in ".{0,200}") {
        let engine = Engine::new().unwrap();
        for variant in [VariantDescriptor::v2_0_without_pilot(), VariantDescriptor::with_pilot()] {
            let out = engine.apply(&variant, &text, &EditRequest::new()).unwrap();
            prop_assert_eq!(&out.text, &text);
        }
    }

    #[test]
    fn same_request_same_output(value in arb_value(), records in arb_rows()) {
        let engine = Engine::new().unwrap();
        let variant = VariantDescriptor::v2_0_without_pilot();
        let doc = format!("<w:body><w:p><w:r><w:t>Fall risk</w:t></w:r></w:p>{}</w:body>", pricing_document());
        let edits: EditRequest = serde_json::from_value(json!({
            "replaceFall": value,
            "pricingRows": records,
        }))
        .unwrap();

        let first = engine.apply(&variant, &doc, &edits).unwrap();
        let second = engine.apply(&variant, &doc, &edits).unwrap();
        prop_assert_eq!(first.text, second.text);
        prop_assert_eq!(first.reports, second.reports);
    }
}
