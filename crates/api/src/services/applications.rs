//! Loan application service.
//!
//! Relation fields arrive either as an id or as an inline object. Inside the
//! write transaction each one is resolved to a row id:
//!
//! - an id must name an existing row;
//! - an inline agency or solicitor edits the row already linked to the
//!   application, or, when nothing is linked yet, is matched by natural key
//!   (agency `name`, solicitor `first_name` + `last_name`) and created only
//!   when no row matches;
//! - an inline status is matched by `id`, then by `name`, and created when
//!   neither matches. Statuses are shared lookup rows and are never renamed.
//!
//! Natural-key lookups take a transaction-scoped advisory lock first, so two
//! concurrent writes naming the same new agency create it once.
//!
//! The lead solicitor is then linked to the agency if it has none.

use sqlx::{PgConnection, PgPool};

use estate_desk_core::{
    AgencyId, ApplicationId, ApplicationStatusId, AuditAction, AuditEntity, FieldErrors,
    SolicitorId, UserId,
};

use super::ServiceError;
use super::directory::missing_pk;
use crate::db::{self, RepositoryError};
use crate::models::agency::{AgencyFields, SolicitorFields};
use crate::models::application::{
    ApplicationFilter, ApplicationPayload, ApplicationRecord, RelationInput, StatusFields, UserRef,
};
use crate::models::fields::REQUIRED;
use crate::models::{Application, ApplicationDetail, ApplicationSummary, User};

/// Loan application service.
pub struct ApplicationService<'a> {
    pool: &'a PgPool,
}

impl<'a> ApplicationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List applications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<ApplicationSummary>, ServiceError> {
        let applications =
            db::applications::list(self.pool, filter.agency.map(AgencyId::new)).await?;
        Ok(applications.into_iter().map(Into::into).collect())
    }

    /// Get one application with its relations expanded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the application does not exist.
    pub async fn get(&self, id: ApplicationId) -> Result<ApplicationDetail, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        let application = db::applications::get_by_id(&mut *conn, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        detail(&mut conn, application).await
    }

    /// Create an application on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid fields or unresolvable
    /// relations. Nothing is written in that case.
    pub async fn create(
        &self,
        actor: &User,
        payload: ApplicationPayload,
    ) -> Result<ApplicationDetail, ServiceError> {
        let input = payload.validate(false)?;
        let (Some(amount), Some(term), Some(status), Some(agency), Some(solicitor)) = (
            input.amount,
            input.term,
            input.application_status,
            input.agency,
            input.lead_solicitor,
        ) else {
            return Err(FieldErrors::single(FieldErrors::NON_FIELD, REQUIRED).into());
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let application_status_id = resolve_status(&mut tx, status).await?;
        let agency_id = resolve_agency(&mut tx, actor.id, agency, None).await?;
        let lead_solicitor_id = resolve_solicitor(&mut tx, actor.id, solicitor, None).await?;
        link_solicitor(&mut tx, actor.id, lead_solicitor_id, agency_id).await?;
        let user_id = match input.user {
            Some(Some(user)) => Some(resolve_user(&mut tx, user).await?),
            _ => None,
        };

        let record = ApplicationRecord {
            amount,
            term,
            user_id,
            application_status_id: Some(application_status_id),
            agency_id: Some(agency_id),
            created_by_id: Some(actor.id),
            lead_solicitor_id: Some(lead_solicitor_id),
        };
        let application = db::applications::insert(&mut *tx, &record).await?;
        audit(&mut tx, actor.id, application.id, AuditAction::Create, &application).await?;
        let detail = detail(&mut tx, application).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(application_id = %detail.id, "application created");
        Ok(detail)
    }

    /// Update an application. With `partial`, fields not supplied keep their
    /// stored value; `created_by` and `date_submitted` are never written.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the application does not exist.
    /// Returns `ServiceError::Validation` for invalid fields or unresolvable
    /// relations.
    pub async fn update(
        &self,
        actor: &User,
        id: ApplicationId,
        payload: ApplicationPayload,
        partial: bool,
    ) -> Result<ApplicationDetail, ServiceError> {
        let input = payload.validate(partial)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let existing = db::applications::get_by_id(&mut *tx, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        let mut record = ApplicationRecord::from(&existing);

        if let Some(amount) = input.amount {
            record.amount = amount;
        }
        if let Some(term) = input.term {
            record.term = term;
        }
        match input.user {
            None => {}
            Some(None) => record.user_id = None,
            Some(Some(user)) => record.user_id = Some(resolve_user(&mut tx, user).await?),
        }
        if let Some(status) = input.application_status {
            record.application_status_id = Some(resolve_status(&mut tx, status).await?);
        }

        let relink = input.agency.is_some() || input.lead_solicitor.is_some();
        if let Some(agency) = input.agency {
            record.agency_id =
                Some(resolve_agency(&mut tx, actor.id, agency, existing.agency_id).await?);
        }
        if let Some(solicitor) = input.lead_solicitor {
            record.lead_solicitor_id = Some(
                resolve_solicitor(&mut tx, actor.id, solicitor, existing.lead_solicitor_id).await?,
            );
        }
        if relink
            && let (Some(solicitor), Some(agency)) = (record.lead_solicitor_id, record.agency_id)
        {
            link_solicitor(&mut tx, actor.id, solicitor, agency).await?;
        }

        let application = db::applications::update(&mut *tx, id, &record).await?;
        audit(&mut tx, actor.id, id, AuditAction::Update, &application).await?;
        let detail = detail(&mut tx, application).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(detail)
    }

    /// Delete an application and its estates.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` with `NotFound` if the application
    /// does not exist.
    pub async fn delete(&self, actor: &User, id: ApplicationId) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        db::applications::delete(&mut *tx, id).await?;
        audit(&mut tx, actor.id, id, AuditAction::Delete, &serde_json::json!({})).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(application_id = %id, "application deleted");
        Ok(())
    }
}

async fn audit(
    conn: &mut PgConnection,
    actor: UserId,
    id: ApplicationId,
    action: AuditAction,
    changes: &impl serde::Serialize,
) -> Result<(), RepositoryError> {
    db::audit::record(conn, AuditEntity::Application, id.as_i64(), action, Some(actor), changes)
        .await
}

/// Expand the relations of an application.
async fn detail(
    conn: &mut PgConnection,
    application: Application,
) -> Result<ApplicationDetail, ServiceError> {
    let application_status = match application.application_status_id {
        Some(id) => db::application_statuses::get_by_id(&mut *conn, id).await?,
        None => None,
    };
    let agency = match application.agency_id {
        Some(id) => db::agencies::get_by_id(&mut *conn, id).await?,
        None => None,
    };
    let lead_solicitor = match application.lead_solicitor_id {
        Some(id) => db::solicitors::get_by_id(&mut *conn, id).await?,
        None => None,
    };

    Ok(ApplicationDetail {
        id: application.id,
        amount: application.amount,
        term: application.term,
        user: application.user_id,
        application_status,
        created_by: application.created_by_id,
        agency,
        lead_solicitor,
        date_submitted: application.date_submitted,
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ServiceError {
    FieldErrors::single(field, message).into()
}

async fn resolve_user(conn: &mut PgConnection, user: UserRef) -> Result<UserId, ServiceError> {
    match user {
        UserRef::Id(id) => match db::users::get_by_id(conn, id).await? {
            Some(user) => Ok(user.id),
            None => Err(invalid("user", missing_pk(id.as_i64()))),
        },
        UserRef::Email(email) => match db::users::get_by_email(conn, &email).await? {
            Some(user) => Ok(user.id),
            None => Err(invalid(
                "user.email",
                format!("Object with email={email} does not exist."),
            )),
        },
    }
}

async fn resolve_status(
    conn: &mut PgConnection,
    status: RelationInput<StatusFields>,
) -> Result<ApplicationStatusId, ServiceError> {
    let fields = match status {
        RelationInput::Id(id) => {
            let id = ApplicationStatusId::new(id);
            return match db::application_statuses::get_by_id(conn, id).await? {
                Some(status) => Ok(status.id),
                None => Err(invalid("application_status", missing_pk(id.as_i64()))),
            };
        }
        RelationInput::Inline(fields) => fields,
    };

    match (fields.id, fields.name) {
        (Some(id), name) => {
            if let Some(status) = db::application_statuses::get_by_id(&mut *conn, id).await? {
                return Ok(status.id);
            }
            let Some(name) = name.filter(|n| !n.is_empty()) else {
                return Err(invalid("application_status.id", missing_pk(id.as_i64())));
            };
            let status = db::application_statuses::put_with_id(conn, id, &name, false).await?;
            tracing::info!(status_id = %status.id, "application status created");
            Ok(status.id)
        }
        (None, Some(name)) => {
            db::lock_natural_key(&mut *conn, "application_status", &name).await?;
            if let Some(status) = db::application_statuses::find_by_name(&mut *conn, &name).await? {
                return Ok(status.id);
            }
            let status = db::application_statuses::create(conn, &name).await?;
            tracing::info!(status_id = %status.id, "application status created");
            Ok(status.id)
        }
        (None, None) => Err(invalid("application_status", REQUIRED)),
    }
}

async fn resolve_agency(
    conn: &mut PgConnection,
    actor: UserId,
    agency: RelationInput<AgencyFields>,
    linked: Option<AgencyId>,
) -> Result<AgencyId, ServiceError> {
    let fields = match agency {
        RelationInput::Id(id) => {
            let id = AgencyId::new(id);
            return match db::agencies::get_by_id(conn, id).await? {
                Some(agency) => Ok(agency.id),
                None => Err(invalid("agency", missing_pk(id.as_i64()))),
            };
        }
        RelationInput::Inline(fields) => fields,
    };

    if let Some(id) = linked {
        let agency = db::agencies::update(&mut *conn, id, &fields).await?;
        db::audit::record(
            conn,
            AuditEntity::Agency,
            id.as_i64(),
            AuditAction::Update,
            Some(actor),
            &agency,
        )
        .await?;
        return Ok(id);
    }

    let Some(name) = fields.name.as_deref().filter(|n| !n.is_empty()) else {
        return Err(invalid("agency.name", REQUIRED));
    };
    db::lock_natural_key(&mut *conn, "agency", name).await?;
    if let Some(agency) = db::agencies::find_by_name(&mut *conn, name).await? {
        return Ok(agency.id);
    }
    let agency = db::agencies::create(&mut *conn, &fields).await?;
    db::audit::record(
        conn,
        AuditEntity::Agency,
        agency.id.as_i64(),
        AuditAction::Create,
        Some(actor),
        &agency,
    )
    .await?;
    tracing::info!(agency_id = %agency.id, "agency created inline");
    Ok(agency.id)
}

async fn resolve_solicitor(
    conn: &mut PgConnection,
    actor: UserId,
    solicitor: RelationInput<SolicitorFields>,
    linked: Option<SolicitorId>,
) -> Result<SolicitorId, ServiceError> {
    let fields = match solicitor {
        RelationInput::Id(id) => {
            let id = SolicitorId::new(id);
            return match db::solicitors::get_by_id(conn, id).await? {
                Some(solicitor) => Ok(solicitor.id),
                None => Err(invalid("lead_solicitor", missing_pk(id.as_i64()))),
            };
        }
        RelationInput::Inline(fields) => fields,
    };

    if let Some(id) = linked {
        let solicitor = db::solicitors::update(&mut *conn, id, &fields).await?;
        db::audit::record(
            conn,
            AuditEntity::Solicitor,
            id.as_i64(),
            AuditAction::Update,
            Some(actor),
            &solicitor,
        )
        .await?;
        return Ok(id);
    }

    let first_name = fields.first_name.as_deref().filter(|n| !n.is_empty());
    let last_name = fields.last_name.as_deref().filter(|n| !n.is_empty());
    let (Some(first_name), Some(last_name)) = (first_name, last_name) else {
        let mut errors = FieldErrors::new();
        if first_name.is_none() {
            errors.add("lead_solicitor.first_name", REQUIRED);
        }
        if last_name.is_none() {
            errors.add("lead_solicitor.last_name", REQUIRED);
        }
        return Err(errors.into());
    };
    db::lock_natural_key(&mut *conn, "solicitor", &format!("{first_name} {last_name}")).await?;
    if let Some(solicitor) =
        db::solicitors::find_by_name(&mut *conn, first_name, last_name).await?
    {
        return Ok(solicitor.id);
    }
    let solicitor = db::solicitors::create(&mut *conn, &fields).await?;
    db::audit::record(
        conn,
        AuditEntity::Solicitor,
        solicitor.id.as_i64(),
        AuditAction::Create,
        Some(actor),
        &solicitor,
    )
    .await?;
    tracing::info!(solicitor_id = %solicitor.id, "solicitor created inline");
    Ok(solicitor.id)
}

/// Attach the solicitor to the agency unless it already works for one.
async fn link_solicitor(
    conn: &mut PgConnection,
    actor: UserId,
    solicitor: SolicitorId,
    agency: AgencyId,
) -> Result<(), RepositoryError> {
    if db::solicitors::link_agency_if_unset(&mut *conn, solicitor, agency).await? {
        db::audit::record(
            conn,
            AuditEntity::Solicitor,
            solicitor.as_i64(),
            AuditAction::Update,
            Some(actor),
            &serde_json::json!({ "agency": agency }),
        )
        .await?;
    }
    Ok(())
}
