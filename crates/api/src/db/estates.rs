//! Estate repository: estates, assets, expenses, disputes and line items.
//!
//! Estates are read back whole. Children are fetched with one query per
//! table and grouped in memory.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor};

use estate_desk_core::{
    ApplicationId, AssetCategory, AssetId, DisputeId, EstateId, ExpenseCategory, ExpenseId,
    LineItemId, LineItemValue,
};

use super::RepositoryError;
use crate::models::estate::{ItemGroups, LineItem, NewLineItem};
use crate::models::{Asset, Dispute, Estate, Expense};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct EstateRow {
    id: i64,
    application_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct HoldingRow {
    id: i64,
    estate_id: i64,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct AssetItemRow {
    id: i64,
    parent_id: i64,
    category: AssetCategory,
    description: String,
    value: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ExpenseItemRow {
    id: i64,
    parent_id: i64,
    category: ExpenseCategory,
    description: String,
    value: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct DisputeRow {
    id: i64,
    estate_id: i64,
    description: String,
}

impl From<DisputeRow> for Dispute {
    fn from(row: DisputeRow) -> Self {
        Self {
            id: DisputeId::new(row.id),
            estate_id: EstateId::new(row.estate_id),
            description: row.description,
        }
    }
}

fn line_item(id: i64, description: String, value: Decimal) -> Result<LineItem, RepositoryError> {
    let value = LineItemValue::new(value).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid line item value in database: {e}"))
    })?;
    Ok(LineItem {
        id: LineItemId::new(id),
        description,
        value,
    })
}

fn assemble_assets(
    rows: Vec<HoldingRow>,
    items: Vec<AssetItemRow>,
) -> Result<Vec<Asset>, RepositoryError> {
    let mut groups: HashMap<i64, ItemGroups<AssetCategory>> = HashMap::new();
    for item in items {
        let entry = groups
            .entry(item.parent_id)
            .or_insert_with(|| ItemGroups::new(&AssetCategory::ALL));
        entry.push(item.category, line_item(item.id, item.description, item.value)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| Asset {
            id: AssetId::new(row.id),
            estate_id: EstateId::new(row.estate_id),
            name: row.name,
            items: groups
                .remove(&row.id)
                .unwrap_or_else(|| ItemGroups::new(&AssetCategory::ALL)),
        })
        .collect())
}

fn assemble_expenses(
    rows: Vec<HoldingRow>,
    items: Vec<ExpenseItemRow>,
) -> Result<Vec<Expense>, RepositoryError> {
    let mut groups: HashMap<i64, ItemGroups<ExpenseCategory>> = HashMap::new();
    for item in items {
        let entry = groups
            .entry(item.parent_id)
            .or_insert_with(|| ItemGroups::new(&ExpenseCategory::ALL));
        entry.push(item.category, line_item(item.id, item.description, item.value)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| Expense {
            id: ExpenseId::new(row.id),
            estate_id: EstateId::new(row.estate_id),
            name: row.name,
            items: groups
                .remove(&row.id)
                .unwrap_or_else(|| ItemGroups::new(&ExpenseCategory::ALL)),
        })
        .collect())
}

// =============================================================================
// Estates
// =============================================================================

/// Create an empty estate for an application.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create_estate(
    executor: impl PgExecutor<'_>,
    application: ApplicationId,
) -> Result<EstateId, RepositoryError> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO loan.estate (application_id) VALUES ($1) RETURNING id")
            .bind(application)
            .fetch_one(executor)
            .await?;

    Ok(EstateId::new(id))
}

/// List every estate with its children, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn list_estates(conn: &mut PgConnection) -> Result<Vec<Estate>, RepositoryError> {
    let rows = sqlx::query_as::<_, EstateRow>(
        "SELECT id, application_id FROM loan.estate ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;

    load_estates(conn, rows).await
}

/// Get one estate with its children.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_estate(
    conn: &mut PgConnection,
    id: EstateId,
) -> Result<Option<Estate>, RepositoryError> {
    let rows = sqlx::query_as::<_, EstateRow>(
        "SELECT id, application_id FROM loan.estate WHERE id = $1",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(load_estates(conn, rows).await?.pop())
}

async fn load_estates(
    conn: &mut PgConnection,
    rows: Vec<EstateRow>,
) -> Result<Vec<Estate>, RepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let asset_rows = sqlx::query_as::<_, HoldingRow>(
        "SELECT id, estate_id, name FROM loan.asset WHERE estate_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let asset_ids: Vec<i64> = asset_rows.iter().map(|r| r.id).collect();
    let asset_items = asset_items(&mut *conn, &asset_ids).await?;

    let expense_rows = sqlx::query_as::<_, HoldingRow>(
        "SELECT id, estate_id, name FROM loan.expense WHERE estate_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let expense_ids: Vec<i64> = expense_rows.iter().map(|r| r.id).collect();
    let expense_items = expense_items(&mut *conn, &expense_ids).await?;

    let disputes = sqlx::query_as::<_, DisputeRow>(
        "SELECT id, estate_id, description FROM loan.dispute WHERE estate_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut estates: Vec<Estate> = rows
        .into_iter()
        .map(|row| Estate {
            id: EstateId::new(row.id),
            application: ApplicationId::new(row.application_id),
            assets: Vec::new(),
            expenses: Vec::new(),
            disputes: Vec::new(),
        })
        .collect();
    let index: HashMap<EstateId, usize> =
        estates.iter().enumerate().map(|(i, e)| (e.id, i)).collect();

    for asset in assemble_assets(asset_rows, asset_items)? {
        if let Some(estate) = index.get(&asset.estate_id).and_then(|&i| estates.get_mut(i)) {
            estate.assets.push(asset);
        }
    }
    for expense in assemble_expenses(expense_rows, expense_items)? {
        if let Some(estate) = index.get(&expense.estate_id).and_then(|&i| estates.get_mut(i)) {
            estate.expenses.push(expense);
        }
    }
    for dispute in disputes.into_iter().map(Dispute::from) {
        if let Some(estate) = index.get(&dispute.estate_id).and_then(|&i| estates.get_mut(i)) {
            estate.disputes.push(dispute);
        }
    }

    Ok(estates)
}

/// Delete an estate and everything it owns.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the estate does not exist.
pub async fn delete_estate(
    executor: impl PgExecutor<'_>,
    id: EstateId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.estate WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

// =============================================================================
// Assets
// =============================================================================

async fn asset_items(
    executor: impl PgExecutor<'_>,
    asset_ids: &[i64],
) -> Result<Vec<AssetItemRow>, RepositoryError> {
    if asset_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, AssetItemRow>(
        r"
        SELECT id, asset_id AS parent_id, category, description, value
        FROM loan.asset_item
        WHERE asset_id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(asset_ids)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Create an asset on an estate.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create_asset(
    executor: impl PgExecutor<'_>,
    estate: EstateId,
    name: &str,
) -> Result<AssetId, RepositoryError> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO loan.asset (estate_id, name) VALUES ($1, $2) RETURNING id")
            .bind(estate)
            .bind(name)
            .fetch_one(executor)
            .await?;

    Ok(AssetId::new(id))
}

/// Get an asset with its line items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_asset(
    conn: &mut PgConnection,
    id: AssetId,
) -> Result<Option<Asset>, RepositoryError> {
    let rows = sqlx::query_as::<_, HoldingRow>(
        "SELECT id, estate_id, name FROM loan.asset WHERE id = $1",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    if rows.is_empty() {
        return Ok(None);
    }
    let items = asset_items(&mut *conn, &[id.as_i64()]).await?;

    Ok(assemble_assets(rows, items)?.pop())
}

/// Rename an asset.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the asset does not exist.
pub async fn rename_asset(
    executor: impl PgExecutor<'_>,
    id: AssetId,
    name: &str,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE loan.asset SET name = $2 WHERE id = $1")
        .bind(id)
        .bind(name)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Replace the line items of one category of an asset.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn replace_asset_items(
    conn: &mut PgConnection,
    asset: AssetId,
    category: AssetCategory,
    items: &[NewLineItem],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM loan.asset_item WHERE asset_id = $1 AND category = $2")
        .bind(asset)
        .bind(category)
        .execute(&mut *conn)
        .await?;

    for item in items {
        sqlx::query(
            r"
            INSERT INTO loan.asset_item (asset_id, category, description, value)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(asset)
        .bind(category)
        .bind(&item.description)
        .bind(item.value)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Delete an asset and its line items.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the asset does not exist.
pub async fn delete_asset(
    executor: impl PgExecutor<'_>,
    id: AssetId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.asset WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

// =============================================================================
// Expenses
// =============================================================================

async fn expense_items(
    executor: impl PgExecutor<'_>,
    expense_ids: &[i64],
) -> Result<Vec<ExpenseItemRow>, RepositoryError> {
    if expense_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ExpenseItemRow>(
        r"
        SELECT id, expense_id AS parent_id, category, description, value
        FROM loan.expense_item
        WHERE expense_id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(expense_ids)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Create an expense on an estate.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create_expense(
    executor: impl PgExecutor<'_>,
    estate: EstateId,
    name: &str,
) -> Result<ExpenseId, RepositoryError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO loan.expense (estate_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(estate)
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(ExpenseId::new(id))
}

/// Get an expense with its line items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_expense(
    conn: &mut PgConnection,
    id: ExpenseId,
) -> Result<Option<Expense>, RepositoryError> {
    let rows = sqlx::query_as::<_, HoldingRow>(
        "SELECT id, estate_id, name FROM loan.expense WHERE id = $1",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    if rows.is_empty() {
        return Ok(None);
    }
    let items = expense_items(&mut *conn, &[id.as_i64()]).await?;

    Ok(assemble_expenses(rows, items)?.pop())
}

/// Rename an expense.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the expense does not exist.
pub async fn rename_expense(
    executor: impl PgExecutor<'_>,
    id: ExpenseId,
    name: &str,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE loan.expense SET name = $2 WHERE id = $1")
        .bind(id)
        .bind(name)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Replace the line items of one category of an expense.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn replace_expense_items(
    conn: &mut PgConnection,
    expense: ExpenseId,
    category: ExpenseCategory,
    items: &[NewLineItem],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM loan.expense_item WHERE expense_id = $1 AND category = $2")
        .bind(expense)
        .bind(category)
        .execute(&mut *conn)
        .await?;

    for item in items {
        sqlx::query(
            r"
            INSERT INTO loan.expense_item (expense_id, category, description, value)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(expense)
        .bind(category)
        .bind(&item.description)
        .bind(item.value)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Delete an expense and its line items.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the expense does not exist.
pub async fn delete_expense(
    executor: impl PgExecutor<'_>,
    id: ExpenseId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.expense WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

// =============================================================================
// Disputes
// =============================================================================

/// Create a dispute on an estate.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create_dispute(
    executor: impl PgExecutor<'_>,
    estate: EstateId,
    description: &str,
) -> Result<Dispute, RepositoryError> {
    let row = sqlx::query_as::<_, DisputeRow>(
        r"
        INSERT INTO loan.dispute (estate_id, description)
        VALUES ($1, $2)
        RETURNING id, estate_id, description
        ",
    )
    .bind(estate)
    .bind(description)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Get a dispute by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_dispute(
    executor: impl PgExecutor<'_>,
    id: DisputeId,
) -> Result<Option<Dispute>, RepositoryError> {
    let row = sqlx::query_as::<_, DisputeRow>(
        "SELECT id, estate_id, description FROM loan.dispute WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Update a dispute's description; `None` leaves it unchanged.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the dispute does not exist.
pub async fn update_dispute(
    executor: impl PgExecutor<'_>,
    id: DisputeId,
    description: Option<&str>,
) -> Result<Dispute, RepositoryError> {
    let row = sqlx::query_as::<_, DisputeRow>(
        r"
        UPDATE loan.dispute
        SET description = COALESCE($2, description)
        WHERE id = $1
        RETURNING id, estate_id, description
        ",
    )
    .bind(id)
    .bind(description)
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Delete a dispute.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the dispute does not exist.
pub async fn delete_dispute(
    executor: impl PgExecutor<'_>,
    id: DisputeId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM loan.dispute WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
