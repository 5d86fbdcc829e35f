//! Per-template variant descriptors.
//!
//! A variant is an ordered list of named passes, each pairing an edit-request
//! key with a locator and a replacement strategy. The [`crate::substitute::Engine`]
//! interprets descriptors; adding a template means adding a descriptor, either
//! here as a built-in or in the service configuration.

use serde::{Deserialize, Serialize};

use crate::edits::RowSchema;
use crate::error::{DocforgeError, Result};
use crate::markup::RegionSelector;
use crate::substitute::drawing::TableLayout;
use crate::substitute::literal::{compile, VALUE_PLACEHOLDER};

/// How one pass locates its target and what it writes there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// Root word in capitalized and lower-case form, optionally protecting a
    /// longer word that starts with it.
    CasedWord {
        key: String,
        root: String,
        #[serde(default)]
        protected_suffix: Option<String>,
    },
    /// Every match of a pattern becomes `replacement` with `{value}` filled in.
    Phrase {
        key: String,
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
        #[serde(default = "value_only")]
        replacement: String,
    },
    /// Long-form date directly after `anchor`.
    DateExpression { key: String, anchor: String },
    /// Initial-period and quarterly billing sentences.
    BillingCycle { start_key: String, end_key: String },
    /// Paragraphs from the one opening with `start` up to the one opening with `end`.
    Section {
        key: String,
        start: String,
        end: String,
    },
    /// Data rows of a selected table.
    TableRows {
        key: String,
        selector: RegionSelector,
        schema: RowSchema,
    },
    /// A selected drawing becomes a generated table.
    DrawingToTable {
        key: String,
        selector: RegionSelector,
        schema: RowSchema,
        layout: TableLayout,
    },
}

fn value_only() -> String {
    VALUE_PLACEHOLDER.to_string()
}

impl Strategy {
    /// Edit-request keys this strategy reads.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::CasedWord { key, .. }
            | Self::Phrase { key, .. }
            | Self::DateExpression { key, .. }
            | Self::Section { key, .. }
            | Self::TableRows { key, .. }
            | Self::DrawingToTable { key, .. } => vec![key.as_str()],
            Self::BillingCycle { start_key, end_key } => vec![start_key.as_str(), end_key.as_str()],
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Phrase { pattern, case_insensitive, .. } => {
                compile(pattern, *case_insensitive)?;
            }
            Self::CasedWord { root, .. } if root.trim().is_empty() => {
                return Err(DocforgeError::MalformedInput("empty root word".into()));
            }
            Self::Section { start, end, .. } if start.is_empty() || end.is_empty() => {
                return Err(DocforgeError::MalformedInput("empty section anchor".into()));
            }
            Self::TableRows { schema, .. } if schema.fields.is_empty() => {
                return Err(DocforgeError::MalformedInput("row schema has no fields".into()));
            }
            Self::DrawingToTable { schema, layout, .. } => {
                if schema.fields.is_empty() || schema.fields.len() != layout.columns.len() {
                    return Err(DocforgeError::MalformedInput(format!(
                        "{} schema field(s) for {} column(s)",
                        schema.fields.len(),
                        layout.columns.len()
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// One named pass of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSpec {
    pub name: String,
    #[serde(flatten)]
    pub strategy: Strategy,
}

impl PassSpec {
    pub fn new(name: &str, strategy: Strategy) -> Self {
        Self {
            name: name.to_string(),
            strategy,
        }
    }
}

/// Substitution descriptor for one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    /// Template key, also the stored template's file stem.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub passes: Vec<PassSpec>,
}

impl VariantDescriptor {
    /// Check every pass of the descriptor, naming the first offending pass.
    pub fn validate(&self) -> Result<()> {
        for pass in &self.passes {
            pass.strategy.validate().map_err(|e| {
                DocforgeError::Other(anyhow::anyhow!(
                    "variant '{}' pass '{}': {e}",
                    self.key,
                    pass.name
                ))
            })?;
        }
        Ok(())
    }

    /// Edit-request keys recognised by this variant, in pass order.
    pub fn keys(&self) -> Vec<&str> {
        self.passes.iter().flat_map(|p| p.strategy.keys()).collect()
    }

    /// "v2.0 Without Pilot": the user agreement template.
    pub fn v2_0_without_pilot() -> Self {
        Self {
            key: "v2_0_without_pilot".into(),
            name: "v2.0 Without Pilot".into(),
            description: "User Agreement Template".into(),
            passes: vec![
                PassSpec::new(
                    "section_3_3",
                    Strategy::Section {
                        key: "section33Text".into(),
                        start: "3.3.".into(),
                        end: "3.4.".into(),
                    },
                ),
                fall_root(),
                PassSpec::new(
                    "brand",
                    Strategy::CasedWord {
                        key: "replaceFallyx".into(),
                        root: "Fallyx".into(),
                        protected_suffix: None,
                    },
                ),
                phrase(
                    "currency",
                    "currencyCountry",
                    "Fees are in Canadian dollars",
                    "Fees are in {value}",
                ),
                phrase(
                    "legal_name",
                    "homeLegalName",
                    r"Responsive Health Management Inc\.?",
                    VALUE_PLACEHOLDER,
                ),
                phrase(
                    "home_location",
                    "homeLocation",
                    r"33 Christie Street, Toronto, ON M6G\s*3B1",
                    VALUE_PLACEHOLDER,
                ),
                PassSpec::new(
                    "billing_cycle",
                    Strategy::BillingCycle {
                        start_key: "quarterlyStartDate".into(),
                        end_key: "quarterlyEndDate".into(),
                    },
                ),
                PassSpec::new(
                    "pricing_table",
                    Strategy::TableRows {
                        key: "pricingRows".into(),
                        selector: RegionSelector::First,
                        schema: RowSchema::new(&[("description", true), ("fee", true)]),
                    },
                ),
                PassSpec::new(
                    "facility_table",
                    Strategy::DrawingToTable {
                        key: "facilityRows".into(),
                        selector: RegionSelector::Last,
                        schema: RowSchema::new(&[
                            ("facilityName", true),
                            ("group", false),
                            ("bedCount", false),
                        ]),
                        layout: TableLayout::new(&[
                            ("Facility Name", 4320),
                            ("Group", 2520),
                            ("Bed Count", 2520),
                        ]),
                    },
                ),
            ],
        }
    }

    /// "With Pilot Agreement": the pilot agreement template.
    pub fn with_pilot() -> Self {
        Self {
            key: "with_pilot".into(),
            name: "With Pilot Agreement".into(),
            description: "Pilot Agreement Template".into(),
            passes: vec![
                fall_root(),
                PassSpec::new(
                    "effective_date",
                    Strategy::DateExpression {
                        key: "effectiveDate".into(),
                        anchor: "effective as of ".into(),
                    },
                ),
                PassSpec::new(
                    "termination_date",
                    Strategy::DateExpression {
                        key: "terminationDate".into(),
                        anchor: "shall terminate on ".into(),
                    },
                ),
                phrase(
                    "client_name",
                    "clientName",
                    "Relavix Health Group LLC",
                    VALUE_PLACEHOLDER,
                ),
                phrase(
                    "client_address",
                    "clientAddress",
                    r"\[Insert Address Here\]",
                    VALUE_PLACEHOLDER,
                ),
                phrase(
                    "currency_country",
                    "currencyCountry",
                    r"\bCanadian dollars\b",
                    "{value} dollars",
                ),
                phrase("currency_code", "currencyCode", r"\bCAD\b", VALUE_PLACEHOLDER),
                PassSpec::new(
                    "fee_table",
                    Strategy::TableRows {
                        key: "feeRows".into(),
                        selector: RegionSelector::First,
                        schema: RowSchema::new(&[
                            ("bedCount", false),
                            ("location", true),
                            ("feePerBed", true),
                        ]),
                    },
                ),
                PassSpec::new(
                    "facility_table",
                    Strategy::TableRows {
                        key: "facilityRows".into(),
                        selector: RegionSelector::Last,
                        schema: RowSchema::new(&[("facilityName", true), ("bedCount", false)]),
                    },
                ),
            ],
        }
    }

    /// A built-in descriptor by template key.
    pub fn builtin(key: &str) -> Option<Self> {
        match key {
            "v2_0_without_pilot" => Some(Self::v2_0_without_pilot()),
            "with_pilot" => Some(Self::with_pilot()),
            _ => None,
        }
    }
}

fn fall_root() -> PassSpec {
    PassSpec::new(
        "fall_root_word",
        Strategy::CasedWord {
            key: "replaceFall".into(),
            root: "Fall".into(),
            protected_suffix: Some("yx".into()),
        },
    )
}

fn phrase(name: &str, key: &str, pattern: &str, replacement: &str) -> PassSpec {
    PassSpec::new(
        name,
        Strategy::Phrase {
            key: key.into(),
            pattern: pattern.into(),
            case_insensitive: false,
            replacement: replacement.into(),
        },
    )
}

/// Summary of a registered variant, as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Ordered set of variant descriptors, unique by key.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    variants: Vec<VariantDescriptor>,
}

impl VariantRegistry {
    /// Registry holding the built-in variants.
    pub fn builtin() -> Self {
        Self {
            variants: vec![
                VariantDescriptor::v2_0_without_pilot(),
                VariantDescriptor::with_pilot(),
            ],
        }
    }

    /// Add descriptors, replacing any registered under the same key.
    pub fn extend(&mut self, descriptors: impl IntoIterator<Item = VariantDescriptor>) {
        for descriptor in descriptors {
            match self.variants.iter_mut().find(|v| v.key == descriptor.key) {
                Some(existing) => {
                    tracing::debug!(key = %descriptor.key, "variant overridden");
                    *existing = descriptor;
                }
                None => self.variants.push(descriptor),
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.key == key)
    }

    pub fn list(&self) -> Vec<VariantSummary> {
        self.variants
            .iter()
            .map(|v| VariantSummary {
                id: v.key.clone(),
                name: v.name.clone(),
                description: v.description.clone(),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        self.variants.iter().try_for_each(VariantDescriptor::validate)
    }
}
