use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{OpenRequirement, RecipientRecord, RenewalStatus};

#[derive(Debug, Clone)]
pub struct StatusSummary {
    pub renewal_status: RenewalStatus,
    pub count: usize,
    pub total_amount: f64,
}

pub fn summarize_renewal_pipeline(recipients: &[RecipientRecord]) -> Vec<StatusSummary> {
    let mut map: std::collections::HashMap<String, (RenewalStatus, usize, f64)> =
        std::collections::HashMap::new();

    for recipient in recipients {
        let entry = map
            .entry(recipient.renewal_status.to_string())
            .or_insert((recipient.renewal_status, 0, 0.0));
        entry.1 += 1;
        entry.2 += recipient.amount;
    }

    let mut summaries: Vec<StatusSummary> = map
        .into_values()
        .map(|(renewal_status, count, total_amount)| StatusSummary {
            renewal_status,
            count,
            total_amount,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(
    period_label: &str,
    threshold_days: i64,
    reference: NaiveDate,
    expiring: &[RecipientRecord],
    roster: &[RecipientRecord],
    open_requirements: &[OpenRequirement],
) -> String {
    let summaries = summarize_renewal_pipeline(roster);

    let mut output = String::new();
    let _ = writeln!(output, "# Scholarship Renewal Report");
    let _ = writeln!(
        output,
        "Generated for {} (as of {}, {}-day expiry window)",
        period_label, reference, threshold_days
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Renewal Pipeline");

    if summaries.is_empty() {
        let _ = writeln!(output, "No recipients on record for this period.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} award(s) totalling {:.2}",
                summary.renewal_status, summary.count, summary.total_amount
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Expiring Within {threshold_days} Days");

    if expiring.is_empty() {
        let _ = writeln!(output, "No awards expire in this window.");
    } else {
        let mut soonest = expiring.to_vec();
        soonest.sort_by(|a, b| a.expiration_date.cmp(&b.expiration_date));
        for recipient in soonest.iter() {
            let expiry = recipient
                .expiration_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                output,
                "- {} ({}) — {} expires {} [renewal: {}]",
                recipient.student_name,
                recipient.student_email,
                recipient.scholarship_name,
                expiry,
                recipient.renewal_status
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Outstanding Requirements");

    if open_requirements.is_empty() {
        let _ = writeln!(output, "All requirements have been submitted.");
    } else {
        for item in open_requirements.iter().take(20) {
            let _ = writeln!(
                output,
                "- {} ({}) owes {} for {} (due {})",
                item.student_name,
                item.student_email,
                item.requirement.name,
                item.scholarship_name,
                item.requirement.deadline
            );
        }
    }

    output
}
