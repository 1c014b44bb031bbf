use std::fmt;

use chrono::{Duration, NaiveDate};

use crate::error::RenewalError;
use crate::models::{RecipientRecord, ScholarStatus};
use crate::period::AcademicPeriod;
use crate::store::RecipientStore;

pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityReason {
    Eligible,
    NotActive(ScholarStatus),
    Expired,
    AlreadyRenewed,
}

impl fmt::Display for EligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EligibilityReason::Eligible => f.write_str("eligible for renewal"),
            EligibilityReason::NotActive(status) => {
                write!(f, "award is {status}, only Active awards renew")
            }
            EligibilityReason::Expired => f.write_str("award has already expired"),
            EligibilityReason::AlreadyRenewed => {
                f.write_str("a record already exists for the target period")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reason: EligibilityReason,
}

impl EligibilityDecision {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reason: EligibilityReason::Eligible,
        }
    }

    fn ineligible(reason: EligibilityReason) -> Self {
        Self {
            eligible: false,
            reason,
        }
    }
}

/// Renewal eligibility from the record alone: the award must be Active and
/// not yet expired as of the reference date. An absent expiration date never
/// expires.
pub fn evaluate(recipient: &RecipientRecord, reference: NaiveDate) -> EligibilityDecision {
    if recipient.status != ScholarStatus::Active {
        return EligibilityDecision::ineligible(EligibilityReason::NotActive(recipient.status));
    }
    if let Some(expiration) = recipient.expiration_date {
        if expiration < reference {
            return EligibilityDecision::ineligible(EligibilityReason::Expired);
        }
    }
    EligibilityDecision::eligible()
}

/// Full eligibility for a concrete target period: the record rules plus the
/// duplicate check against the store.
pub async fn evaluate_for_period<S: RecipientStore + ?Sized>(
    store: &S,
    recipient: &RecipientRecord,
    target: &AcademicPeriod,
    reference: NaiveDate,
) -> Result<EligibilityDecision, RenewalError> {
    let decision = evaluate(recipient, reference);
    if !decision.eligible {
        return Ok(decision);
    }
    let existing = store
        .find_for_period(recipient.student_id, recipient.scholarship_id, target)
        .await?;
    if existing.is_some() {
        return Ok(EligibilityDecision::ineligible(
            EligibilityReason::AlreadyRenewed,
        ));
    }
    Ok(decision)
}

/// "Expiring soon": the award has an expiration date within `days` of the
/// reference date. Both ends inclusive; dates are start-of-day, so an award
/// expiring exactly `days` out counts.
pub fn expiring_within(recipient: &RecipientRecord, reference: NaiveDate, days: i64) -> bool {
    match recipient.expiration_date {
        Some(expiration) => {
            expiration >= reference && expiration <= reference + Duration::days(days)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenewalStatus;
    use crate::store::mem::recipient;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn non_active_awards_are_ineligible() {
        for status in [
            ScholarStatus::Suspended,
            ScholarStatus::Completed,
            ScholarStatus::Cancelled,
        ] {
            let mut rec = recipient("2024-2025", "1st");
            rec.status = status;
            let decision = evaluate(&rec, day(2025, 1, 15));
            assert!(!decision.eligible);
            assert_eq!(decision.reason, EligibilityReason::NotActive(status));
        }
    }

    #[test]
    fn expired_awards_are_ineligible() {
        let mut rec = recipient("2024-2025", "1st");
        rec.expiration_date = Some(day(2025, 1, 14));
        let decision = evaluate(&rec, day(2025, 1, 15));
        assert!(!decision.eligible);
        assert_eq!(decision.reason, EligibilityReason::Expired);
    }

    #[test]
    fn expiring_on_the_reference_day_is_still_eligible() {
        let mut rec = recipient("2024-2025", "1st");
        rec.expiration_date = Some(day(2025, 1, 15));
        assert!(evaluate(&rec, day(2025, 1, 15)).eligible);
    }

    #[test]
    fn missing_expiration_date_never_expires() {
        let mut rec = recipient("2024-2025", "1st");
        rec.expiration_date = None;
        assert!(evaluate(&rec, day(2099, 1, 1)).eligible);
    }

    #[test]
    fn expiring_soon_boundary_is_inclusive() {
        let reference = day(2025, 3, 1);
        let mut rec = recipient("2024-2025", "2nd");

        rec.expiration_date = Some(day(2025, 3, 31));
        assert!(expiring_within(&rec, reference, 30));

        rec.expiration_date = Some(day(2025, 4, 1));
        assert!(!expiring_within(&rec, reference, 30));

        rec.expiration_date = Some(reference);
        assert!(expiring_within(&rec, reference, 30));

        rec.expiration_date = Some(day(2025, 2, 28));
        assert!(!expiring_within(&rec, reference, 30));

        rec.expiration_date = None;
        assert!(!expiring_within(&rec, reference, 30));
    }

    #[tokio::test]
    async fn target_period_duplicate_blocks_eligibility() {
        let store = crate::store::mem::MemoryStore::default();
        let rec = recipient("2024-2025", "2nd");
        let target = AcademicPeriod::parse("2025-2026", "1st").unwrap();

        let decision = evaluate_for_period(&store, &rec, &target, day(2025, 5, 1))
            .await
            .unwrap();
        assert!(decision.eligible);

        store
            .seed_record({
                let mut renewed = rec.clone();
                renewed.id = uuid::Uuid::new_v4();
                renewed.period = target.clone();
                renewed.renewal_status = RenewalStatus::Approved;
                renewed
            })
            .await;

        let decision = evaluate_for_period(&store, &rec, &target, day(2025, 5, 1))
            .await
            .unwrap();
        assert!(!decision.eligible);
        assert_eq!(decision.reason, EligibilityReason::AlreadyRenewed);
    }
}
