//! Enumerations for statuses, line-item categories and audit records.

use serde::{Deserialize, Serialize};

/// The seeded application statuses.
///
/// `loan.application_status` is a lookup table so new statuses can be added
/// without a release; these are the rows every installation starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownStatus {
    Unknown,
    Active,
    Cancelled,
    Declined,
    FraudRisk,
    Fraud,
    PaidOut,
    Settled,
}

impl KnownStatus {
    /// Every seeded status, in id order.
    pub const ALL: [Self; 8] = [
        Self::Unknown,
        Self::Active,
        Self::Cancelled,
        Self::Declined,
        Self::FraudRisk,
        Self::Fraud,
        Self::PaidOut,
        Self::Settled,
    ];

    /// Row id of the status in `loan.application_status`.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Active => 1,
            Self::Cancelled => 2,
            Self::Declined => 3,
            Self::FraudRisk => 4,
            Self::Fraud => 5,
            Self::PaidOut => 6,
            Self::Settled => 7,
        }
    }

    /// Human-readable label stored in the `name` column.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Active => "Active Application",
            Self::Cancelled => "Application Cancelled",
            Self::Declined => "Borrower Declined",
            Self::FraudRisk => "Fraud Risk",
            Self::Fraud => "Fraud",
            Self::PaidOut => "Loan Paid Out",
            Self::Settled => "Settled",
        }
    }

    /// Look up a seeded status by row id.
    #[must_use]
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.id() == id)
    }
}

/// Category of an asset line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "loan.asset_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    RealAndLeaseholdProperties,
    HouseholdContents,
    CarsAndBoats,
    BusinessAssetsNotIncludedElsewhere,
    AssetsWithFinancialInstitutions,
    FundsFromLifeInsurances,
    DebtsOwingToTheDeceased,
    StocksSharesSecurities,
    UnpaidPurchaseMoney,
    OtherPropertyNotIncluded,
    DebtsAndFuneralExpensesPayableInTheState,
}

impl AssetCategory {
    /// Every asset category, in display order.
    pub const ALL: [Self; 11] = [
        Self::RealAndLeaseholdProperties,
        Self::HouseholdContents,
        Self::CarsAndBoats,
        Self::BusinessAssetsNotIncludedElsewhere,
        Self::AssetsWithFinancialInstitutions,
        Self::FundsFromLifeInsurances,
        Self::DebtsOwingToTheDeceased,
        Self::StocksSharesSecurities,
        Self::UnpaidPurchaseMoney,
        Self::OtherPropertyNotIncluded,
        Self::DebtsAndFuneralExpensesPayableInTheState,
    ];
}

/// Category of an expense line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "loan.expense_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    TaxLiabilities,
    SecuredMortgages,
    OtherExpenses,
}

impl ExpenseCategory {
    /// Every expense category, in display order.
    pub const ALL: [Self; 3] = [
        Self::TaxLiabilities,
        Self::SecuredMortgages,
        Self::OtherExpenses,
    ];
}

/// Kind of change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "loan.audit_action", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Entity types whose changes are audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "loan.audit_entity", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    User,
    Team,
    Agency,
    Solicitor,
    Application,
}

impl std::fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Team => write!(f, "team"),
            Self::Agency => write!(f, "agency"),
            Self::Solicitor => write!(f, "solicitor"),
            Self::Application => write!(f, "application"),
        }
    }
}

impl std::str::FromStr for AuditEntity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "team" => Ok(Self::Team),
            "agency" => Ok(Self::Agency),
            "solicitor" => Ok(Self::Solicitor),
            "application" => Ok(Self::Application),
            _ => Err(format!("invalid audit entity: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_status_ids_are_sequential() {
        for (index, status) in KnownStatus::ALL.iter().enumerate() {
            assert_eq!(status.id(), i64::try_from(index).unwrap_or(-1));
            assert_eq!(KnownStatus::from_id(status.id()), Some(*status));
        }
        assert_eq!(KnownStatus::from_id(8), None);
    }

    #[test]
    fn test_known_status_labels() {
        assert_eq!(KnownStatus::Active.label(), "Active Application");
        assert_eq!(KnownStatus::PaidOut.label(), "Loan Paid Out");
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&AssetCategory::RealAndLeaseholdProperties)
            .unwrap_or_default();
        assert_eq!(json, "\"real_and_leasehold_properties\"");

        let parsed: Result<ExpenseCategory, _> = serde_json::from_str("\"tax_liabilities\"");
        assert_eq!(parsed.ok(), Some(ExpenseCategory::TaxLiabilities));
    }

    #[test]
    fn test_audit_entity_parse() {
        assert_eq!("agency".parse::<AuditEntity>(), Ok(AuditEntity::Agency));
        assert!("estate".parse::<AuditEntity>().is_err());
        assert_eq!(AuditEntity::Solicitor.to_string(), "solicitor");
    }
}
