use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RenewalError;
use crate::period::AcademicPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScholarStatus {
    Active,
    Suspended,
    Completed,
    Cancelled,
}

impl FromStr for ScholarStatus {
    type Err = RenewalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Active" => Ok(ScholarStatus::Active),
            "Suspended" => Ok(ScholarStatus::Suspended),
            "Completed" => Ok(ScholarStatus::Completed),
            "Cancelled" => Ok(ScholarStatus::Cancelled),
            other => Err(RenewalError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ScholarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScholarStatus::Active => "Active",
            ScholarStatus::Suspended => "Suspended",
            ScholarStatus::Completed => "Completed",
            ScholarStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// Renewal pipeline state. One-way: once a record leaves NotApplicable it
/// never returns, and Approved/Denied are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenewalStatus {
    NotApplicable,
    Pending,
    Approved,
    Denied,
}

impl RenewalStatus {
    pub fn transition(self, to: RenewalStatus) -> Result<RenewalStatus, RenewalError> {
        let allowed = matches!(
            (self, to),
            (RenewalStatus::NotApplicable, RenewalStatus::Pending)
                | (RenewalStatus::Pending, RenewalStatus::Approved)
                | (RenewalStatus::Pending, RenewalStatus::Denied)
        );
        if allowed {
            Ok(to)
        } else {
            Err(RenewalError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl FromStr for RenewalStatus {
    type Err = RenewalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Not Applicable" => Ok(RenewalStatus::NotApplicable),
            "Pending" => Ok(RenewalStatus::Pending),
            "Approved" => Ok(RenewalStatus::Approved),
            "Denied" => Ok(RenewalStatus::Denied),
            other => Err(RenewalError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for RenewalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RenewalStatus::NotApplicable => "Not Applicable",
            RenewalStatus::Pending => "Pending",
            RenewalStatus::Approved => "Approved",
            RenewalStatus::Denied => "Denied",
        };
        f.write_str(label)
    }
}

/// One award of one scholarship to one student for one academic period,
/// joined with student and scholarship names for display.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub scholarship_id: Uuid,
    pub scholarship_name: String,
    pub period: AcademicPeriod,
    pub amount: f64,
    pub status: ScholarStatus,
    pub date_awarded: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub renewal_status: RenewalStatus,
    pub requirements_complete: bool,
}

/// Fields needed to insert a recipient row. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewRecipient {
    pub student_id: Uuid,
    pub scholarship_id: Uuid,
    pub period: AcademicPeriod,
    pub amount: f64,
    pub status: ScholarStatus,
    pub date_awarded: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub renewal_status: RenewalStatus,
}

/// A submission obligation tied to one recipient record.
#[derive(Debug, Clone, Serialize)]
pub struct Requirement {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub name: String,
    pub deadline: NaiveDate,
    pub submitted: bool,
}

/// An unsubmitted requirement joined with the award it belongs to, for
/// report and reminder listings.
#[derive(Debug, Clone, Serialize)]
pub struct OpenRequirement {
    pub student_name: String,
    pub student_email: String,
    pub scholarship_name: String,
    pub requirement: Requirement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renewal_status_follows_the_pipeline() {
        assert_eq!(
            RenewalStatus::NotApplicable
                .transition(RenewalStatus::Pending)
                .unwrap(),
            RenewalStatus::Pending
        );
        assert_eq!(
            RenewalStatus::Pending
                .transition(RenewalStatus::Approved)
                .unwrap(),
            RenewalStatus::Approved
        );
        assert_eq!(
            RenewalStatus::Pending
                .transition(RenewalStatus::Denied)
                .unwrap(),
            RenewalStatus::Denied
        );
    }

    #[test]
    fn renewal_status_never_reenters_not_applicable() {
        for from in [
            RenewalStatus::Pending,
            RenewalStatus::Approved,
            RenewalStatus::Denied,
        ] {
            assert!(from.transition(RenewalStatus::NotApplicable).is_err());
        }
        assert!(RenewalStatus::Approved
            .transition(RenewalStatus::Pending)
            .is_err());
        assert!(RenewalStatus::Denied
            .transition(RenewalStatus::Approved)
            .is_err());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in ["Active", "Suspended", "Completed", "Cancelled"] {
            let parsed: ScholarStatus = status.parse().unwrap();
            assert_eq!(parsed.to_string(), status);
        }
        let parsed: RenewalStatus = "Not Applicable".parse().unwrap();
        assert_eq!(parsed, RenewalStatus::NotApplicable);
    }
}
