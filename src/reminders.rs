use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::RenewalError;
use crate::models::RecipientRecord;
use crate::store::RecipientStore;

/// Delivery seam for renewal reminders. Transport (email/SMS/in-app) lives
/// behind this trait.
#[async_trait]
pub trait ReminderNotifier {
    async fn notify(&self, recipient: &RecipientRecord, days_left: i64) -> anyhow::Result<()>;
}

/// Writes reminders to stdout. Stands in for the campus notification
/// gateway when running from the CLI.
pub struct ConsoleNotifier;

#[async_trait]
impl ReminderNotifier for ConsoleNotifier {
    async fn notify(&self, recipient: &RecipientRecord, days_left: i64) -> anyhow::Result<()> {
        println!(
            "reminder: {} <{}> - {} expires in {} day(s), renewal not yet filed",
            recipient.student_name, recipient.student_email, recipient.scholarship_name, days_left
        );
        Ok(())
    }
}

/// Send one renewal reminder to each active recipient whose award expires
/// within `threshold_days` and who has no record for the following period.
/// Best-effort fan-out: a delivery failure is reported and the batch moves
/// on. Returns the number of reminders actually dispatched.
pub async fn dispatch_reminders<S, N>(
    store: &S,
    notifier: &N,
    threshold_days: i64,
    reference: NaiveDate,
) -> Result<usize, RenewalError>
where
    S: RecipientStore + ?Sized,
    N: ReminderNotifier + ?Sized,
{
    let expiring = store.list_expiring(reference, threshold_days).await?;
    let mut seen: HashSet<uuid::Uuid> = HashSet::new();
    let mut dispatched = 0usize;

    for recipient in &expiring {
        if !seen.insert(recipient.id) {
            continue;
        }
        let next_period = recipient.period.next();
        let already_renewed = store
            .find_for_period(recipient.student_id, recipient.scholarship_id, &next_period)
            .await?
            .is_some();
        if already_renewed {
            continue;
        }
        let days_left = recipient
            .expiration_date
            .map(|exp| (exp - reference).num_days())
            .unwrap_or(0);
        match notifier.notify(recipient, days_left).await {
            Ok(()) => dispatched += 1,
            Err(err) => {
                eprintln!(
                    "reminder delivery failed for {} ({}): {err:#}",
                    recipient.student_email, recipient.scholarship_name
                );
            }
        }
    }

    Ok(dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RenewalStatus, ScholarStatus};
    use crate::store::mem::{recipient, MemoryStore};
    use anyhow::anyhow;
    use chrono::{Duration, NaiveDate};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<uuid::Uuid>>,
        fail_for: Option<uuid::Uuid>,
    }

    #[async_trait]
    impl ReminderNotifier for RecordingNotifier {
        async fn notify(
            &self,
            recipient: &RecipientRecord,
            _days_left: i64,
        ) -> anyhow::Result<()> {
            if self.fail_for == Some(recipient.id) {
                return Err(anyhow!("gateway rejected message"));
            }
            self.sent.lock().unwrap().push(recipient.id);
            Ok(())
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn expiring_recipient(days_out: i64) -> RecipientRecord {
        let mut rec = recipient("2024-2025", "2nd");
        rec.expiration_date = Some(reference() + Duration::days(days_out));
        rec
    }

    #[tokio::test]
    async fn sends_exactly_one_reminder_per_matching_recipient() {
        let store = MemoryStore::default();
        let rec = expiring_recipient(7);
        store.seed_record(rec.clone()).await;

        let notifier = RecordingNotifier::default();
        let count = dispatch_reminders(&store, &notifier, 7, reference())
            .await
            .unwrap();

        assert_eq!(count, 1);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[rec.id]);
    }

    #[tokio::test]
    async fn skips_recipients_outside_the_threshold() {
        let store = MemoryStore::default();
        store.seed_record(expiring_recipient(8)).await;

        let notifier = RecordingNotifier::default();
        let count = dispatch_reminders(&store, &notifier, 7, reference())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn skips_recipients_already_renewed_for_the_next_period() {
        let store = MemoryStore::default();
        let rec = expiring_recipient(10);
        store.seed_record(rec.clone()).await;

        let mut renewed = rec.clone();
        renewed.id = uuid::Uuid::new_v4();
        renewed.period = rec.period.next();
        renewed.renewal_status = RenewalStatus::Approved;
        renewed.expiration_date = None;
        store.seed_record(renewed).await;

        let notifier = RecordingNotifier::default();
        let count = dispatch_reminders(&store, &notifier, 30, reference())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_halt_the_batch() {
        let store = MemoryStore::default();
        let failing = expiring_recipient(5);
        let healthy = expiring_recipient(12);
        store.seed_record(failing.clone()).await;
        store.seed_record(healthy.clone()).await;

        let notifier = RecordingNotifier {
            fail_for: Some(failing.id),
            ..Default::default()
        };
        let count = dispatch_reminders(&store, &notifier, 30, reference())
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(notifier.sent.lock().unwrap().as_slice(), &[healthy.id]);
    }

    #[tokio::test]
    async fn ignores_inactive_recipients() {
        let store = MemoryStore::default();
        let mut rec = expiring_recipient(3);
        rec.status = ScholarStatus::Suspended;
        store.seed_record(rec).await;

        let notifier = RecordingNotifier::default();
        let count = dispatch_reminders(&store, &notifier, 30, reference())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
