use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::RenewalError;
use crate::models::{
    NewRecipient, OpenRequirement, RecipientRecord, RenewalStatus, Requirement, ScholarStatus,
};
use crate::period::AcademicPeriod;
use crate::store::RecipientStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Maria Santos",
            "maria.santos@univ.edu",
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jose Ramirez",
            "jose.ramirez@univ.edu",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Aisha Dela Cruz",
            "aisha.delacruz@univ.edu",
        ),
    ];

    for (id, name, email) in students {
        sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.students (id, full_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;
    }

    let scholarships = vec![
        (
            Uuid::parse_str("7a1c3b58-6f02-4d2a-9a77-1be13a62b0aa")?,
            "Academic Excellence Grant",
            "Office of Student Affairs",
        ),
        (
            Uuid::parse_str("b2f4d9e1-8c35-4f60-bb0d-2c9e51a7340f")?,
            "Athletics Scholarship",
            "Sports Development Office",
        ),
    ];

    for (id, name, sponsor) in scholarships {
        sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.scholarships (id, name, sponsor)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET sponsor = EXCLUDED.sponsor
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(sponsor)
        .execute(pool)
        .await?;
    }

    let awards = vec![
        (
            "maria.santos@univ.edu",
            "Academic Excellence Grant",
            "2025-2026",
            "1st",
            15000.0_f64,
            Some(NaiveDate::from_ymd_opt(2025, 8, 15).context("invalid date")?),
            Some(NaiveDate::from_ymd_opt(2026, 1, 31).context("invalid date")?),
        ),
        (
            "jose.ramirez@univ.edu",
            "Athletics Scholarship",
            "2025-2026",
            "1st",
            12000.0_f64,
            Some(NaiveDate::from_ymd_opt(2025, 8, 20).context("invalid date")?),
            Some(NaiveDate::from_ymd_opt(2026, 2, 15).context("invalid date")?),
        ),
        (
            "aisha.delacruz@univ.edu",
            "Academic Excellence Grant",
            "2025-2026",
            "1st",
            15000.0_f64,
            Some(NaiveDate::from_ymd_opt(2025, 8, 15).context("invalid date")?),
            None,
        ),
    ];

    for (email, scholarship, year, semester, amount, awarded, expires) in awards {
        let student_id: Uuid =
            sqlx::query("SELECT id FROM scholarship_renewal.students WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");
        let scholarship_id: Uuid =
            sqlx::query("SELECT id FROM scholarship_renewal.scholarships WHERE name = $1")
                .bind(scholarship)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.recipients
            (id, student_id, scholarship_id, academic_year, semester, amount,
             status, date_awarded, expiration_date, renewal_status, requirements_complete)
            VALUES ($1, $2, $3, $4, $5, $6, 'Active', $7, $8, 'Not Applicable', TRUE)
            ON CONFLICT ON CONSTRAINT recipients_award_period_key DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(scholarship_id)
        .bind(year)
        .bind(semester)
        .bind(amount)
        .bind(awarded)
        .bind(expires)
        .execute(pool)
        .await?;
    }

    let requirements = vec![
        (
            Uuid::parse_str("1f0a6a77-5a40-4a7e-92d1-6f3c0b8a9e01")?,
            "maria.santos@univ.edu",
            "Academic Excellence Grant",
            "Certified grade report",
            NaiveDate::from_ymd_opt(2026, 1, 15).context("invalid date")?,
        ),
        (
            Uuid::parse_str("2b1c7d88-6e51-4b8f-a3e2-7a4d1c9b0f12")?,
            "jose.ramirez@univ.edu",
            "Athletics Scholarship",
            "Coach endorsement letter",
            NaiveDate::from_ymd_opt(2026, 2, 1).context("invalid date")?,
        ),
    ];

    for (id, email, scholarship, name, deadline) in requirements {
        sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.requirements (id, recipient_id, name, deadline, submitted)
            SELECT $1, r.id, $4, $5, FALSE
            FROM scholarship_renewal.recipients r
            JOIN scholarship_renewal.students st ON st.id = r.student_id
            JOIN scholarship_renewal.scholarships sch ON sch.id = r.scholarship_id
            WHERE st.email = $2 AND sch.name = $3
            LIMIT 1
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(scholarship)
        .bind(name)
        .bind(deadline)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Bulk-load award records exported from the registrar. Students and
/// scholarships are upserted by natural key; award rows that collide on the
/// period tuple are skipped. Returns the number of awards inserted.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        scholarship: String,
        academic_year: String,
        semester: String,
        amount: f64,
        date_awarded: Option<NaiveDate>,
        expiration_date: Option<NaiveDate>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        // Malformed periods abort the import before any further writes.
        let period = AcademicPeriod::parse(&row.academic_year, &row.semester)?;

        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.students (id, full_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .fetch_one(pool)
        .await?
        .get("id");

        let scholarship_id: Uuid = sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.scholarships (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.scholarship)
        .fetch_one(pool)
        .await?
        .get("id");

        let result = sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.recipients
            (id, student_id, scholarship_id, academic_year, semester, amount,
             status, date_awarded, expiration_date, renewal_status, requirements_complete)
            VALUES ($1, $2, $3, $4, $5, $6, 'Active', $7, $8, 'Not Applicable', FALSE)
            ON CONFLICT ON CONSTRAINT recipients_award_period_key DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(scholarship_id)
        .bind(period.year.to_string())
        .bind(period.semester.to_string())
        .bind(row.amount)
        .bind(row.date_awarded)
        .bind(row.expiration_date)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

const RECIPIENT_COLUMNS: &str = "SELECT r.id, r.student_id, st.full_name, st.email, \
     r.scholarship_id, sch.name AS scholarship_name, \
     r.academic_year, r.semester, r.amount, r.status, \
     r.date_awarded, r.expiration_date, r.renewal_status, r.requirements_complete \
     FROM scholarship_renewal.recipients r \
     JOIN scholarship_renewal.students st ON st.id = r.student_id \
     JOIN scholarship_renewal.scholarships sch ON sch.id = r.scholarship_id";

fn record_from_row(row: &PgRow) -> Result<RecipientRecord, RenewalError> {
    let year: String = row.get("academic_year");
    let semester: String = row.get("semester");
    let status: String = row.get("status");
    let renewal_status: String = row.get("renewal_status");
    Ok(RecipientRecord {
        id: row.get("id"),
        student_id: row.get("student_id"),
        student_name: row.get("full_name"),
        student_email: row.get("email"),
        scholarship_id: row.get("scholarship_id"),
        scholarship_name: row.get("scholarship_name"),
        period: AcademicPeriod::parse(&year, &semester)?,
        amount: row.get("amount"),
        status: status.parse::<ScholarStatus>()?,
        date_awarded: row.get("date_awarded"),
        expiration_date: row.get("expiration_date"),
        renewal_status: renewal_status.parse::<RenewalStatus>()?,
        requirements_complete: row.get("requirements_complete"),
    })
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Unsubmitted requirements for one period's recipients, soonest
    /// deadline first.
    pub async fn list_open_requirements(
        &self,
        period: &AcademicPeriod,
    ) -> Result<Vec<OpenRequirement>, RenewalError> {
        let rows = sqlx::query(
            r#"
            SELECT st.full_name, st.email, sch.name AS scholarship_name,
                   q.id, q.recipient_id, q.name, q.deadline, q.submitted
            FROM scholarship_renewal.requirements q
            JOIN scholarship_renewal.recipients r ON r.id = q.recipient_id
            JOIN scholarship_renewal.students st ON st.id = r.student_id
            JOIN scholarship_renewal.scholarships sch ON sch.id = r.scholarship_id
            WHERE q.submitted = FALSE AND r.academic_year = $1 AND r.semester = $2
            ORDER BY q.deadline
            "#,
        )
        .bind(period.year.to_string())
        .bind(period.semester.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| OpenRequirement {
                student_name: row.get("full_name"),
                student_email: row.get("email"),
                scholarship_name: row.get("scholarship_name"),
                requirement: Requirement {
                    id: row.get("id"),
                    recipient_id: row.get("recipient_id"),
                    name: row.get("name"),
                    deadline: row.get("deadline"),
                    submitted: row.get("submitted"),
                },
            })
            .collect())
    }
}

#[async_trait]
impl RecipientStore for PgStore {
    async fn find_for_period(
        &self,
        student_id: Uuid,
        scholarship_id: Uuid,
        period: &AcademicPeriod,
    ) -> Result<Option<RecipientRecord>, RenewalError> {
        let query = format!(
            "{RECIPIENT_COLUMNS} WHERE r.student_id = $1 AND r.scholarship_id = $2 \
             AND r.academic_year = $3 AND r.semester = $4"
        );
        let row = sqlx::query(&query)
            .bind(student_id)
            .bind(scholarship_id)
            .bind(period.year.to_string())
            .bind(period.semester.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert_recipient(
        &self,
        new: NewRecipient,
    ) -> Result<RecipientRecord, RenewalError> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO scholarship_renewal.recipients
            (id, student_id, scholarship_id, academic_year, semester, amount,
             status, date_awarded, expiration_date, renewal_status, requirements_complete)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            "#,
        )
        .bind(id)
        .bind(new.student_id)
        .bind(new.scholarship_id)
        .bind(new.period.year.to_string())
        .bind(new.period.semester.to_string())
        .bind(new.amount)
        .bind(new.status.to_string())
        .bind(new.date_awarded)
        .bind(new.expiration_date)
        .bind(new.renewal_status.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            // The unique constraint is the authority on the period tuple;
            // a violation is the duplicate-renewal failure, not a crash.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(RenewalError::DuplicateRenewal {
                    student: new.student_id.to_string(),
                    scholarship: new.scholarship_id.to_string(),
                    period: new.period.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        let query = format!("{RECIPIENT_COLUMNS} WHERE r.id = $1");
        let row = sqlx::query(&query).bind(id).fetch_one(&self.pool).await?;
        record_from_row(&row)
    }

    async fn list_expiring(
        &self,
        reference: NaiveDate,
        threshold_days: i64,
    ) -> Result<Vec<RecipientRecord>, RenewalError> {
        let limit = reference + Duration::days(threshold_days);
        let query = format!(
            "{RECIPIENT_COLUMNS} WHERE r.status = 'Active' \
             AND r.expiration_date IS NOT NULL \
             AND r.expiration_date BETWEEN $1 AND $2 \
             ORDER BY r.expiration_date"
        );
        let rows = sqlx::query(&query)
            .bind(reference)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn list_for_period(
        &self,
        period: &AcademicPeriod,
    ) -> Result<Vec<RecipientRecord>, RenewalError> {
        let query = format!(
            "{RECIPIENT_COLUMNS} WHERE r.academic_year = $1 AND r.semester = $2 \
             ORDER BY st.full_name"
        );
        let rows = sqlx::query(&query)
            .bind(period.year.to_string())
            .bind(period.semester.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn find_award(
        &self,
        student_email: &str,
        scholarship_name: &str,
        period: &AcademicPeriod,
    ) -> Result<Option<RecipientRecord>, RenewalError> {
        let query = format!(
            "{RECIPIENT_COLUMNS} WHERE st.email = $1 AND sch.name = $2 \
             AND r.academic_year = $3 AND r.semester = $4"
        );
        let row = sqlx::query(&query)
            .bind(student_email)
            .bind(scholarship_name)
            .bind(period.year.to_string())
            .bind(period.semester.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn set_renewal_status(
        &self,
        recipient_id: Uuid,
        status: RenewalStatus,
    ) -> Result<(), RenewalError> {
        sqlx::query("UPDATE scholarship_renewal.recipients SET renewal_status = $2 WHERE id = $1")
            .bind(recipient_id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
