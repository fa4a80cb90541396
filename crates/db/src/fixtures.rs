//! Sample data for demos and integration tests.
//!
//! Inserts use `INSERT OR IGNORE` so seeding an already-seeded database is a
//! no-op rather than an error.

use chrono::{Duration, Utc};
use sqlx::Error as SqlxError;

use teller_core::session::credential_digest;

use crate::DbPool;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: u64,
    pub remittances: u64,
}

struct CustomerFixture {
    customer_id: &'static str,
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    tier: &'static str,
    credential: &'static str,
}

const CUSTOMERS: &[CustomerFixture] = &[
    CustomerFixture {
        customer_id: "CUST001",
        name: "Rajesh Sharma",
        email: "rajesh.sharma@example.com",
        phone: "+91-98100-11001",
        tier: "hni",
        credential: "sunrise-001",
    },
    CustomerFixture {
        customer_id: "CUST002",
        name: "Priya Nair",
        email: "priya.nair@example.com",
        phone: "+91-98100-11002",
        tier: "premium",
        credential: "harbor-002",
    },
    CustomerFixture {
        customer_id: "CUST003",
        name: "Arjun Mehta",
        email: "arjun.mehta@example.com",
        phone: "+91-98100-11003",
        tier: "vip",
        credential: "meridian-003",
    },
    CustomerFixture {
        customer_id: "CUST004",
        name: "Sara Iyer",
        email: "sara.iyer@example.com",
        phone: "+91-98100-11004",
        tier: "regular",
        credential: "lantern-004",
    },
];

pub async fn seed_sample_data(pool: &DbPool) -> Result<SeedSummary, SqlxError> {
    let mut summary = SeedSummary::default();
    let now = Utc::now();
    let now_raw = now.to_rfc3339();

    for fixture in CUSTOMERS {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO customers
                 (customer_id, name, email, phone, tier, account_status, credential_digest,
                  failed_attempts, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 'active', ?, 0, ?, ?)",
        )
        .bind(fixture.customer_id)
        .bind(fixture.name)
        .bind(fixture.email)
        .bind(fixture.phone)
        .bind(fixture.tier)
        .bind(credential_digest(fixture.credential))
        .bind(&now_raw)
        .bind(&now_raw)
        .execute(pool)
        .await?;
        summary.customers += result.rows_affected();
    }

    let completed = sqlx::query(
        "INSERT OR IGNORE INTO remittances
             (id, customer_id, reference_id, amount, currency,
              sender_name, sender_account, recipient_name, recipient_account,
              recipient_bank, recipient_country, status, transaction_type, purpose,
              exchange_rate, fees, net_amount, initiated_date, processed_date, completed_date)
         VALUES ('rem-0001', 'CUST001', 'RF001A', '5000.00', 'USD',
                 'Rajesh Sharma', 'ACC-4410-0001', 'Anita Sharma', 'ACC-8810-2210',
                 'First National Bank', 'United States', 'completed', 'international',
                 'Family support', '83.12', '25.00', '4975.00', ?, ?, ?)",
    )
    .bind((now - Duration::days(3)).to_rfc3339())
    .bind((now - Duration::days(2)).to_rfc3339())
    .bind((now - Duration::days(1)).to_rfc3339())
    .execute(pool)
    .await?;
    summary.remittances += completed.rows_affected();

    let processing = sqlx::query(
        "INSERT OR IGNORE INTO remittances
             (id, customer_id, reference_id, amount, currency,
              sender_name, sender_account, recipient_name, recipient_account,
              recipient_bank, recipient_country, status, transaction_type, purpose,
              fees, initiated_date, processed_date)
         VALUES ('rem-0002', 'CUST001', 'RF002B', '12500.00', 'EUR',
                 'Rajesh Sharma', 'ACC-4410-0001', 'Klaus Weber', 'DE44-5001-0517',
                 'Commerzbank', 'Germany', 'processing', 'wire_transfer',
                 'Property payment', '45.00', ?, ?)",
    )
    .bind((now - Duration::hours(6)).to_rfc3339())
    .bind((now - Duration::hours(2)).to_rfc3339())
    .execute(pool)
    .await?;
    summary.remittances += processing.rows_affected();

    let failed = sqlx::query(
        "INSERT OR IGNORE INTO remittances
             (id, customer_id, reference_id, amount, currency,
              sender_name, sender_account, recipient_name, recipient_account,
              recipient_bank, recipient_country, status, transaction_type, purpose,
              fees, initiated_date, failure_reason)
         VALUES ('rem-0003', 'CUST003', 'RF003C', '800.00', 'GBP',
                 'Arjun Mehta', 'ACC-4410-0003', 'Tom Ellis', 'GB29-NWBK-6016',
                 'NatWest', 'United Kingdom', 'failed', 'international',
                 'Tuition fees', '15.00', ?, 'Recipient account details could not be verified')",
    )
    .bind((now - Duration::days(5)).to_rfc3339())
    .execute(pool)
    .await?;
    summary.remittances += failed.rows_affected();

    Ok(summary)
}
