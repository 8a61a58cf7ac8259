//! Agency and solicitor CRUD.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use estate_desk_core::{AgencyId, AuditAction, AuditEntity, FieldErrors, SolicitorId, UserId};

use super::ServiceError;
use crate::db::{self, RepositoryError};
use crate::models::agency::{AgencyPayload, SolicitorPayload};
use crate::models::{AgencyView, Solicitor, SolicitorView};

/// Message for a relation id that matches no row.
pub(crate) fn missing_pk(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// Agency and solicitor service.
pub struct DirectoryService<'a> {
    pool: &'a PgPool,
}

impl<'a> DirectoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Agencies
    // =========================================================================

    /// List agencies by name, each with its solicitors.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn list_agencies(&self) -> Result<Vec<AgencyView>, ServiceError> {
        let agencies = db::agencies::list_all(self.pool).await?;
        let ids: Vec<AgencyId> = agencies.iter().map(|a| a.id).collect();

        let mut by_agency: HashMap<AgencyId, Vec<Solicitor>> = HashMap::new();
        for solicitor in db::solicitors::list_for_agencies(self.pool, &ids).await? {
            if let Some(agency_id) = solicitor.agency_id {
                by_agency.entry(agency_id).or_default().push(solicitor);
            }
        }

        Ok(agencies
            .into_iter()
            .map(|agency| {
                let solicitors = by_agency.remove(&agency.id).unwrap_or_default();
                AgencyView::new(agency, solicitors)
            })
            .collect())
    }

    /// Get one agency with its solicitors.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the agency does not exist.
    pub async fn get_agency(&self, id: AgencyId) -> Result<AgencyView, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        agency_view(&mut conn, id).await
    }

    /// Create an agency. Every field is required.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if a field is missing or too long.
    pub async fn create_agency(
        &self,
        actor: UserId,
        payload: AgencyPayload,
    ) -> Result<AgencyView, ServiceError> {
        let fields = payload.validate(false)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let agency = db::agencies::create(&mut *tx, &fields).await?;
        record(
            &mut tx,
            AuditEntity::Agency,
            agency.id.as_i64(),
            AuditAction::Create,
            actor,
            &agency,
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(agency_id = %agency.id, "agency created");
        Ok(AgencyView::new(agency, Vec::new()))
    }

    /// Update an agency; with `partial` only the supplied fields are required.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the agency does not exist.
    pub async fn update_agency(
        &self,
        actor: UserId,
        id: AgencyId,
        payload: AgencyPayload,
        partial: bool,
    ) -> Result<AgencyView, ServiceError> {
        let fields = payload.validate(partial)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let agency = db::agencies::update(&mut *tx, id, &fields).await?;
        record(
            &mut tx,
            AuditEntity::Agency,
            id.as_i64(),
            AuditAction::Update,
            actor,
            &agency,
        )
        .await?;
        let view = agency_view(&mut tx, id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(view)
    }

    /// Delete an agency; its solicitors are kept without an agency.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `Protected` if an application
    /// references the agency.
    pub async fn delete_agency(&self, actor: UserId, id: AgencyId) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        db::agencies::delete(&mut *tx, id).await?;
        record(
            &mut tx,
            AuditEntity::Agency,
            id.as_i64(),
            AuditAction::Delete,
            actor,
            &serde_json::json!({}),
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(agency_id = %id, "agency deleted");
        Ok(())
    }

    // =========================================================================
    // Solicitors
    // =========================================================================

    /// List solicitors by last name with their agency name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_solicitors(&self) -> Result<Vec<SolicitorView>, ServiceError> {
        let rows = db::solicitors::list_with_agency(self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(solicitor, agency)| SolicitorView::new(solicitor, agency))
            .collect())
    }

    /// Get one solicitor.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the solicitor does not exist.
    pub async fn get_solicitor(&self, id: SolicitorId) -> Result<SolicitorView, ServiceError> {
        let (solicitor, agency) = db::solicitors::get_with_agency(self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok(SolicitorView::new(solicitor, agency))
    }

    /// Create a solicitor, optionally linked to an existing agency.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid fields or an unknown agency id.
    pub async fn create_solicitor(
        &self,
        actor: UserId,
        payload: SolicitorPayload,
    ) -> Result<SolicitorView, ServiceError> {
        let fields = payload.validate(false)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        if let Some(Some(agency_id)) = fields.agency {
            ensure_agency(&mut tx, agency_id).await?;
        }
        let solicitor = db::solicitors::create(&mut *tx, &fields).await?;
        record(
            &mut tx,
            AuditEntity::Solicitor,
            solicitor.id.as_i64(),
            AuditAction::Create,
            actor,
            &solicitor,
        )
        .await?;
        let view = solicitor_view(&mut tx, solicitor.id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(solicitor_id = %solicitor.id, "solicitor created");
        Ok(view)
    }

    /// Update a solicitor; `agency: null` unlinks it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the solicitor does not exist.
    pub async fn update_solicitor(
        &self,
        actor: UserId,
        id: SolicitorId,
        payload: SolicitorPayload,
        partial: bool,
    ) -> Result<SolicitorView, ServiceError> {
        let fields = payload.validate(partial)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        if let Some(Some(agency_id)) = fields.agency {
            ensure_agency(&mut tx, agency_id).await?;
        }
        let solicitor = db::solicitors::update(&mut *tx, id, &fields).await?;
        record(
            &mut tx,
            AuditEntity::Solicitor,
            id.as_i64(),
            AuditAction::Update,
            actor,
            &solicitor,
        )
        .await?;
        let view = solicitor_view(&mut tx, id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(view)
    }

    /// Delete a solicitor.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `Protected` if an application
    /// names the solicitor as lead.
    pub async fn delete_solicitor(
        &self,
        actor: UserId,
        id: SolicitorId,
    ) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        db::solicitors::delete(&mut *tx, id).await?;
        record(
            &mut tx,
            AuditEntity::Solicitor,
            id.as_i64(),
            AuditAction::Delete,
            actor,
            &serde_json::json!({}),
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(solicitor_id = %id, "solicitor deleted");
        Ok(())
    }
}

async fn record(
    conn: &mut PgConnection,
    entity: AuditEntity,
    entity_id: i64,
    action: AuditAction,
    actor: UserId,
    changes: &impl serde::Serialize,
) -> Result<(), RepositoryError> {
    db::audit::record(conn, entity, entity_id, action, Some(actor), changes).await
}

async fn ensure_agency(conn: &mut PgConnection, id: AgencyId) -> Result<(), ServiceError> {
    if db::agencies::get_by_id(conn, id).await?.is_none() {
        return Err(FieldErrors::single("agency", missing_pk(id.as_i64())).into());
    }
    Ok(())
}

async fn agency_view(conn: &mut PgConnection, id: AgencyId) -> Result<AgencyView, ServiceError> {
    let agency = db::agencies::get_by_id(&mut *conn, id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    let solicitors = db::solicitors::list_for_agencies(&mut *conn, &[id]).await?;
    Ok(AgencyView::new(agency, solicitors))
}

async fn solicitor_view(
    conn: &mut PgConnection,
    id: SolicitorId,
) -> Result<SolicitorView, ServiceError> {
    let (solicitor, agency) = db::solicitors::get_with_agency(conn, id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(SolicitorView::new(solicitor, agency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pk_message() {
        assert_eq!(missing_pk(42), "Invalid pk \"42\" - object does not exist.");
    }
}
