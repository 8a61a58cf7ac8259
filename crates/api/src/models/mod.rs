//! Domain models, JSON representations and request payloads.

pub mod agency;
pub mod application;
pub mod audit;
pub mod estate;
pub mod fields;
pub mod user;

pub use agency::{Agency, AgencyView, Solicitor, SolicitorView};
pub use application::{Application, ApplicationDetail, ApplicationStatus, ApplicationSummary};
pub use audit::AuditEntry;
pub use estate::{Asset, Dispute, Estate, Expense, LineItem};
pub use user::{Team, User, UserSummary};
