use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::RenewalError;
use crate::models::{NewRecipient, RecipientRecord, RenewalStatus};
use crate::period::AcademicPeriod;

/// Persistence seam for recipient records. The Postgres implementation lives
/// in `db`; tests run against `mem::MemoryStore`.
#[async_trait]
pub trait RecipientStore {
    /// Look up the recipient row for one (student, scholarship, period) tuple.
    async fn find_for_period(
        &self,
        student_id: Uuid,
        scholarship_id: Uuid,
        period: &AcademicPeriod,
    ) -> Result<Option<RecipientRecord>, RenewalError>;

    /// Insert a recipient row. The (student, scholarship, academic_year,
    /// semester) uniqueness constraint is authoritative; a violation surfaces
    /// as `DuplicateRenewal`.
    async fn insert_recipient(&self, new: NewRecipient)
        -> Result<RecipientRecord, RenewalError>;

    /// Active recipients whose awards expire within `threshold_days` of the
    /// reference date, boundary inclusive.
    async fn list_expiring(
        &self,
        reference: NaiveDate,
        threshold_days: i64,
    ) -> Result<Vec<RecipientRecord>, RenewalError>;

    /// All recipient rows for one academic period.
    async fn list_for_period(
        &self,
        period: &AcademicPeriod,
    ) -> Result<Vec<RecipientRecord>, RenewalError>;

    /// Look up one award by student email and scholarship name.
    async fn find_award(
        &self,
        student_email: &str,
        scholarship_name: &str,
        period: &AcademicPeriod,
    ) -> Result<Option<RecipientRecord>, RenewalError>;

    async fn set_renewal_status(
        &self,
        recipient_id: Uuid,
        status: RenewalStatus,
    ) -> Result<(), RenewalError>;
}
