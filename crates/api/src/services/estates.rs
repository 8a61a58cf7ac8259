//! Estate composition and child management.

use sqlx::PgPool;

use estate_desk_core::{AssetId, DisputeId, EstateId, ExpenseId, FieldErrors};

use super::ServiceError;
use super::directory::missing_pk;
use crate::db::{self, RepositoryError};
use crate::models::estate::{AssetPayload, DisputePayload, EstatePayload, ExpensePayload};
use crate::models::{Asset, Dispute, Estate, Expense};

/// Estate service.
pub struct EstateService<'a> {
    pool: &'a PgPool,
}

impl<'a> EstateService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Estates
    // =========================================================================

    /// List every estate with its children nested.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn list(&self) -> Result<Vec<Estate>, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        Ok(db::estates::list_estates(&mut conn).await?)
    }

    /// Get one estate with its children nested.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the estate does not exist.
    pub async fn get(&self, id: EstateId) -> Result<Estate, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        db::estates::get_estate(&mut conn, id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Create an estate with all of its assets, expenses and disputes.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid children or an unknown
    /// application. Nothing is written in that case.
    pub async fn create(&self, payload: EstatePayload) -> Result<Estate, ServiceError> {
        let input = payload.validate()?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        if db::applications::get_by_id(&mut *tx, input.application).await?.is_none() {
            return Err(
                FieldErrors::single("application", missing_pk(input.application.as_i64())).into(),
            );
        }

        let estate_id = db::estates::create_estate(&mut *tx, input.application).await?;
        for asset in &input.assets {
            let name = asset.name.as_deref().unwrap_or_default();
            let asset_id = db::estates::create_asset(&mut *tx, estate_id, name).await?;
            for (category, items) in &asset.items {
                db::estates::replace_asset_items(&mut tx, asset_id, *category, items).await?;
            }
        }
        for expense in &input.expenses {
            let name = expense.name.as_deref().unwrap_or_default();
            let expense_id = db::estates::create_expense(&mut *tx, estate_id, name).await?;
            for (category, items) in &expense.items {
                db::estates::replace_expense_items(&mut tx, expense_id, *category, items).await?;
            }
        }
        for description in &input.disputes {
            db::estates::create_dispute(&mut *tx, estate_id, description).await?;
        }

        let estate = db::estates::get_estate(&mut tx, estate_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            estate_id = %estate.id,
            assets = estate.assets.len(),
            expenses = estate.expenses.len(),
            disputes = estate.disputes.len(),
            "estate created"
        );
        Ok(estate)
    }

    /// Delete an estate with everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `NotFound` if the estate does not exist.
    pub async fn delete(&self, id: EstateId) -> Result<(), ServiceError> {
        db::estates::delete_estate(self.pool, id).await?;
        tracing::info!(estate_id = %id, "estate deleted");
        Ok(())
    }

    // =========================================================================
    // Assets
    // =========================================================================

    /// Get an asset with its line items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the asset does not exist.
    pub async fn get_asset(&self, id: AssetId) -> Result<Asset, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        db::estates::get_asset(&mut conn, id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Rename an asset and replace the line items of every category supplied.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the asset does not exist.
    pub async fn update_asset(
        &self,
        id: AssetId,
        payload: AssetPayload,
        partial: bool,
    ) -> Result<Asset, ServiceError> {
        let input = payload.validate(partial)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        if db::estates::get_asset(&mut tx, id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        if let Some(name) = &input.name {
            db::estates::rename_asset(&mut *tx, id, name).await?;
        }
        for (category, items) in &input.items {
            db::estates::replace_asset_items(&mut tx, id, *category, items).await?;
        }
        let asset = db::estates::get_asset(&mut tx, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(asset)
    }

    /// Delete an asset and its line items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `NotFound` if the asset does not exist.
    pub async fn delete_asset(&self, id: AssetId) -> Result<(), ServiceError> {
        Ok(db::estates::delete_asset(self.pool, id).await?)
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Get an expense with its line items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the expense does not exist.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Expense, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        db::estates::get_expense(&mut conn, id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Rename an expense and replace the line items of every category supplied.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the expense does not exist.
    pub async fn update_expense(
        &self,
        id: ExpenseId,
        payload: ExpensePayload,
        partial: bool,
    ) -> Result<Expense, ServiceError> {
        let input = payload.validate(partial)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        if db::estates::get_expense(&mut tx, id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        if let Some(name) = &input.name {
            db::estates::rename_expense(&mut *tx, id, name).await?;
        }
        for (category, items) in &input.items {
            db::estates::replace_expense_items(&mut tx, id, *category, items).await?;
        }
        let expense = db::estates::get_expense(&mut tx, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(expense)
    }

    /// Delete an expense and its line items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `NotFound` if the expense does not exist.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<(), ServiceError> {
        Ok(db::estates::delete_expense(self.pool, id).await?)
    }

    // =========================================================================
    // Disputes
    // =========================================================================

    /// Get a dispute.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the dispute does not exist.
    pub async fn get_dispute(&self, id: DisputeId) -> Result<Dispute, ServiceError> {
        db::estates::get_dispute(self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Update a dispute's description.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` when a full update omits the description.
    pub async fn update_dispute(
        &self,
        id: DisputeId,
        payload: DisputePayload,
        partial: bool,
    ) -> Result<Dispute, ServiceError> {
        let description = payload.validate(partial)?;
        Ok(db::estates::update_dispute(self.pool, id, description.as_deref()).await?)
    }

    /// Delete a dispute.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `NotFound` if the dispute does not exist.
    pub async fn delete_dispute(&self, id: DisputeId) -> Result<(), ServiceError> {
        Ok(db::estates::delete_dispute(self.pool, id).await?)
    }
}
