//! Estate domain types: assets, expenses and disputes.
//!
//! Line items of an asset or expense are stored in one table per parent with
//! a category column, and represented grouped by category:
//!
//! ```json
//! {"id": 1, "name": "House", "real_and_leasehold_properties": [{"id": 3, "description": "...", "value": "100.00"}], ...}
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use estate_desk_core::{
    ApplicationId, AssetCategory, AssetId, DisputeId, EstateId, ExpenseCategory, ExpenseId,
    FieldErrors, LineItemId, LineItemValue,
};

use super::fields::{REQUIRED, check_text, text_field};

/// A valued line item of an asset or expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub value: LineItemValue,
}

/// Line items keyed by category. Every category is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemGroups<C: Ord>(BTreeMap<C, Vec<LineItem>>);

impl<C: Ord + Copy> ItemGroups<C> {
    /// Empty groups for every category in `all`.
    #[must_use]
    pub fn new(all: &[C]) -> Self {
        Self(all.iter().map(|c| (*c, Vec::new())).collect())
    }

    /// Append an item to its category.
    pub fn push(&mut self, category: C, item: LineItem) {
        self.0.entry(category).or_default().push(item);
    }

    /// Items of one category.
    #[must_use]
    pub fn get(&self, category: C) -> &[LineItem] {
        self.0.get(&category).map_or(&[], Vec::as_slice)
    }
}

/// An asset of an estate with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub id: AssetId,
    #[serde(skip)]
    pub estate_id: EstateId,
    pub name: String,
    #[serde(flatten)]
    pub items: ItemGroups<AssetCategory>,
}

/// An expense of an estate with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    #[serde(skip)]
    pub estate_id: EstateId,
    pub name: String,
    #[serde(flatten)]
    pub items: ItemGroups<ExpenseCategory>,
}

/// A dispute raised against an estate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispute {
    pub id: DisputeId,
    #[serde(skip)]
    pub estate_id: EstateId,
    pub description: String,
}

/// An estate with its children nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Estate {
    pub id: EstateId,
    pub application: ApplicationId,
    pub assets: Vec<Asset>,
    pub expenses: Vec<Expense>,
    pub disputes: Vec<Dispute>,
}

// =============================================================================
// Payloads
// =============================================================================

/// A line item as received.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPayload {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
}

/// A validated line item ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub description: String,
    pub value: LineItemValue,
}

/// An asset or expense as received: a name plus category lists.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "C: Deserialize<'de> + Ord"))]
pub struct HoldingPayload<C: Ord> {
    /// Read-only; accepted so a representation can be sent back as-is.
    #[serde(default)]
    pub id: Option<IgnoredAny>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub items: BTreeMap<C, Vec<LineItemPayload>>,
}

/// A validated asset or expense write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingInput<C: Ord> {
    pub name: Option<String>,
    /// Categories present in the payload; each replaces the stored items.
    pub items: BTreeMap<C, Vec<NewLineItem>>,
}

fn validate_items<C>(
    errors: &mut FieldErrors,
    prefix: &str,
    items: BTreeMap<C, Vec<LineItemPayload>>,
) -> BTreeMap<C, Vec<NewLineItem>>
where
    C: Ord + Serialize,
{
    let mut valid = BTreeMap::new();
    for (category, list) in items {
        let key = serde_json::to_value(&category)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        let mut checked = Vec::with_capacity(list.len());
        for (index, item) in list.into_iter().enumerate() {
            let field = format!("{prefix}{key}.{index}");
            let description = item.description.unwrap_or_default();
            let value = match item.value {
                None => {
                    errors.add(format!("{field}.value"), REQUIRED);
                    None
                }
                Some(v) => errors.check(&format!("{field}.value"), LineItemValue::new(v)),
            };
            if let Some(value) = value {
                checked.push(NewLineItem { description, value });
            }
        }
        valid.insert(category, checked);
    }
    valid
}

impl<C: Ord + Serialize> HoldingPayload<C> {
    /// Validate the holding. The name is required unless `partial`.
    ///
    /// # Errors
    ///
    /// Returns the field errors found, keyed `category.index.value` for items.
    pub fn validate(self, partial: bool) -> Result<HoldingInput<C>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = text_field(&mut errors, "name", self.name, 255, partial);
        let items = validate_items(&mut errors, "", self.items);
        errors.into_result()?;
        Ok(HoldingInput { name, items })
    }

    /// Validate as part of an estate, where a missing name is stored empty.
    fn validate_nested(self, errors: &mut FieldErrors, prefix: &str) -> HoldingInput<C> {
        let name = check_text(errors, &format!("{prefix}name"), self.name, 255);
        let items = validate_items(errors, prefix, self.items);
        HoldingInput { name, items }
    }
}

/// A dispute as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisputePayload {
    #[serde(default)]
    pub description: Option<String>,
}

impl DisputePayload {
    /// Validate the dispute. The description is required unless `partial`.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(self, partial: bool) -> Result<Option<String>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let description =
            text_field(&mut errors, "description", self.description, usize::MAX, partial);
        errors.into_result()?;
        Ok(description)
    }
}

pub type AssetPayload = HoldingPayload<AssetCategory>;
pub type ExpensePayload = HoldingPayload<ExpenseCategory>;

/// Body of `POST /estates/`.
#[derive(Debug, Clone, Deserialize)]
pub struct EstatePayload {
    #[serde(default)]
    pub application: Option<i64>,
    #[serde(default)]
    pub assets: Vec<AssetPayload>,
    #[serde(default)]
    pub expenses: Vec<ExpensePayload>,
    #[serde(default)]
    pub disputes: Vec<DisputePayload>,
}

/// A validated estate write.
#[derive(Debug, Clone)]
pub struct EstateInput {
    pub application: ApplicationId,
    pub assets: Vec<HoldingInput<AssetCategory>>,
    pub expenses: Vec<HoldingInput<ExpenseCategory>>,
    pub disputes: Vec<String>,
}

impl EstatePayload {
    /// Validate the estate and every child.
    ///
    /// # Errors
    ///
    /// Returns the field errors found, keyed by path (`assets.0.name`).
    pub fn validate(self) -> Result<EstateInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let application = errors.require("application", self.application);

        let assets = self
            .assets
            .into_iter()
            .enumerate()
            .map(|(i, asset)| asset.validate_nested(&mut errors, &format!("assets.{i}.")))
            .collect();
        let expenses = self
            .expenses
            .into_iter()
            .enumerate()
            .map(|(i, expense)| expense.validate_nested(&mut errors, &format!("expenses.{i}.")))
            .collect();

        let mut disputes = Vec::new();
        for (i, dispute) in self.disputes.into_iter().enumerate() {
            match dispute.validate(false) {
                Ok(Some(description)) => disputes.push(description),
                Ok(None) => {}
                Err(nested) => errors.merge_nested(&format!("disputes.{i}"), nested),
            }
        }

        errors.into_result()?;
        Ok(EstateInput {
            application: ApplicationId::new(application.unwrap_or_default()),
            assets,
            expenses,
            disputes,
        })
    }
}
