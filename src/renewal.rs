use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::RenewalError;
use crate::models::{NewRecipient, RecipientRecord, RenewalStatus, ScholarStatus};
use crate::period::AcademicPeriod;
use crate::store::RecipientStore;

/// Carry one award forward into the target period. The duplicate check runs
/// first so the common case fails without a write; the store's uniqueness
/// constraint remains the authority under concurrent callers.
pub async fn apply_renewal<S: RecipientStore + ?Sized>(
    store: &S,
    source: &RecipientRecord,
    target: &AcademicPeriod,
    reference: NaiveDate,
) -> Result<RecipientRecord, RenewalError> {
    let existing = store
        .find_for_period(source.student_id, source.scholarship_id, target)
        .await?;
    if existing.is_some() {
        return Err(RenewalError::DuplicateRenewal {
            student: source.student_email.clone(),
            scholarship: source.scholarship_name.clone(),
            period: target.to_string(),
        });
    }

    store
        .insert_recipient(NewRecipient {
            student_id: source.student_id,
            scholarship_id: source.scholarship_id,
            period: target.clone(),
            amount: source.amount,
            status: ScholarStatus::Active,
            date_awarded: Some(reference),
            expiration_date: None,
            renewal_status: RenewalStatus::Approved,
        })
        .await
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeKind {
    Created { recipient_id: Uuid },
    Duplicate { detail: String },
    Failed { detail: String },
}

#[derive(Debug, Serialize)]
pub struct RenewalOutcome {
    pub source_id: Uuid,
    pub student_email: String,
    pub scholarship_name: String,
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl RenewalOutcome {
    pub fn created(&self) -> bool {
        matches!(self.kind, OutcomeKind::Created { .. })
    }
}

/// Renew a batch into the target period. Each recipient is checked and
/// inserted independently; duplicates and storage failures are recorded in
/// the outcome list and never stop the rest of the batch.
pub async fn bulk_apply<S: RecipientStore + ?Sized>(
    store: &S,
    sources: &[RecipientRecord],
    target: &AcademicPeriod,
    reference: NaiveDate,
) -> Vec<RenewalOutcome> {
    let mut outcomes = Vec::with_capacity(sources.len());
    for source in sources {
        let kind = match apply_renewal(store, source, target, reference).await {
            Ok(record) => OutcomeKind::Created {
                recipient_id: record.id,
            },
            Err(err) if err.is_duplicate() => OutcomeKind::Duplicate {
                detail: err.to_string(),
            },
            Err(err) => OutcomeKind::Failed {
                detail: err.to_string(),
            },
        };
        outcomes.push(RenewalOutcome {
            source_id: source.id,
            student_email: source.student_email.clone(),
            scholarship_name: source.scholarship_name.clone(),
            kind,
        });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::{recipient, MemoryStore};
    use chrono::NaiveDate;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn renewal_copies_linkage_into_the_target_period() {
        let store = MemoryStore::default();
        let source = recipient("2024-2025", "2nd");
        store.seed_record(source.clone()).await;

        let target = AcademicPeriod::parse("2025-2026", "1st").unwrap();
        let renewed = apply_renewal(&store, &source, &target, reference())
            .await
            .unwrap();

        assert_eq!(renewed.student_id, source.student_id);
        assert_eq!(renewed.scholarship_id, source.scholarship_id);
        assert_eq!(renewed.period, target);
        assert_eq!(renewed.amount, source.amount);
        assert_eq!(renewed.status, ScholarStatus::Active);
        assert_eq!(renewed.renewal_status, RenewalStatus::Approved);
    }

    #[tokio::test]
    async fn second_renewal_of_the_same_tuple_is_a_duplicate() {
        let store = MemoryStore::default();
        let source = recipient("2024-2025", "2nd");
        store.seed_record(source.clone()).await;

        let target = AcademicPeriod::parse("2025-2026", "1st").unwrap();
        apply_renewal(&store, &source, &target, reference())
            .await
            .unwrap();
        let err = apply_renewal(&store, &source, &target, reference())
            .await
            .unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(
            store
                .rows_matching(source.student_id, source.scholarship_id, &target)
                .await,
            1
        );
    }

    #[tokio::test]
    async fn bulk_duplicates_do_not_block_the_rest() {
        let store = MemoryStore::default();
        let a = recipient("2024-2025", "2nd");
        let b = recipient("2024-2025", "2nd");
        let c = recipient("2024-2025", "2nd");
        for rec in [&a, &b, &c] {
            store.seed_record((*rec).clone()).await;
        }

        let target = AcademicPeriod::parse("2025-2026", "1st").unwrap();
        // b is already renewed into the target period.
        apply_renewal(&store, &b, &target, reference())
            .await
            .unwrap();
        let rows_before = store.row_count().await;

        let outcomes = bulk_apply(
            &store,
            &[a.clone(), b.clone(), c.clone()],
            &target,
            reference(),
        )
        .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.created()).count(), 2);
        assert!(outcomes
            .iter()
            .any(|o| o.source_id == b.id && matches!(o.kind, OutcomeKind::Duplicate { .. })));
        assert_eq!(store.row_count().await, rows_before + 2);
    }
}
