use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use teller_core::domain::customer::{AccountStatus, Customer, CustomerId, CustomerTier};

use super::{parse_opt_datetime, CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT customer_id, name, email, phone, tier, account_status,
                    last_login, failed_attempts, locked_until
             FROM customers
             WHERE customer_id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(customer_from_row).transpose()
    }

    async fn credential_digest(
        &self,
        id: &CustomerId,
    ) -> Result<Option<String>, RepositoryError> {
        let digest: Option<String> =
            sqlx::query_scalar("SELECT credential_digest FROM customers WHERE customer_id = ?")
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(digest)
    }

    async fn record_login_success(
        &self,
        id: &CustomerId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE customers
             SET failed_attempts = 0, locked_until = NULL, last_login = ?, updated_at = ?
             WHERE customer_id = ?",
        )
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .bind(&id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_login_failure(
        &self,
        id: &CustomerId,
        failed_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE customers
             SET failed_attempts = ?, locked_until = ?, updated_at = ?
             WHERE customer_id = ?",
        )
        .bind(i64::from(failed_attempts))
        .bind(locked_until.map(|until| until.to_rfc3339()))
        .bind(Utc::now().to_rfc3339())
        .bind(&id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn customer_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let tier_raw: String = row.try_get("tier").map_err(RepositoryError::Database)?;
    let tier = CustomerTier::parse(&tier_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown tier `{tier_raw}`")))?;

    let status_raw: String = row.try_get("account_status").map_err(RepositoryError::Database)?;
    let account_status = AccountStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown account status `{status_raw}`")))?;

    let failed_attempts: i64 =
        row.try_get("failed_attempts").map_err(RepositoryError::Database)?;

    Ok(Customer {
        id: CustomerId(row.try_get("customer_id").map_err(RepositoryError::Database)?),
        name: row.try_get("name").map_err(RepositoryError::Database)?,
        email: row.try_get("email").map_err(RepositoryError::Database)?,
        phone: row.try_get("phone").map_err(RepositoryError::Database)?,
        tier,
        account_status,
        last_login: parse_opt_datetime(
            row.try_get("last_login").map_err(RepositoryError::Database)?,
            "last_login",
        )?,
        failed_attempts: failed_attempts.max(0) as u32,
        locked_until: parse_opt_datetime(
            row.try_get("locked_until").map_err(RepositoryError::Database)?,
            "locked_until",
        )?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use teller_core::domain::customer::{AccountStatus, CustomerId, CustomerTier};
    use teller_core::session::credential_digest;

    use teller_core::config::DatabaseConfig;

    use crate::repositories::{CustomerRepository, SqlCustomerRepository};
    use crate::{connect, migrations};

    async fn pool_with_customer() -> crate::DbPool {
        let pool = connect(&DatabaseConfig::for_url("sqlite::memory:")).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO customers
                 (customer_id, name, email, tier, account_status, credential_digest,
                  failed_attempts, created_at, updated_at)
             VALUES ('CUST001', 'Rajesh Sharma', 'rajesh@example.com', 'hni', 'active', ?, 0, ?, ?)",
        )
        .bind(credential_digest("sunrise-001"))
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .expect("seed customer");

        pool
    }

    #[tokio::test]
    async fn find_by_id_maps_tier_and_status() {
        let pool = pool_with_customer().await;
        let repo = SqlCustomerRepository::new(pool);

        let customer = repo
            .find_by_id(&CustomerId("CUST001".to_string()))
            .await
            .expect("query")
            .expect("customer exists");

        assert_eq!(customer.tier, CustomerTier::Hni);
        assert_eq!(customer.account_status, AccountStatus::Active);
        assert_eq!(customer.failed_attempts, 0);
        assert!(customer.locked_until.is_none());
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_customer() {
        let pool = pool_with_customer().await;
        let repo = SqlCustomerRepository::new(pool);

        let found =
            repo.find_by_id(&CustomerId("CUST999".to_string())).await.expect("query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn login_failure_and_success_round_trip_lock_state() {
        let pool = pool_with_customer().await;
        let repo = SqlCustomerRepository::new(pool);
        let id = CustomerId("CUST001".to_string());
        let locked_until = Utc::now() + Duration::minutes(15);

        repo.record_login_failure(&id, 3, Some(locked_until)).await.expect("record failure");
        let locked = repo.find_by_id(&id).await.expect("query").expect("exists");
        assert_eq!(locked.failed_attempts, 3);
        assert!(locked.is_locked(Utc::now()));

        repo.record_login_success(&id, Utc::now()).await.expect("record success");
        let cleared = repo.find_by_id(&id).await.expect("query").expect("exists");
        assert_eq!(cleared.failed_attempts, 0);
        assert!(cleared.locked_until.is_none());
        assert!(cleared.last_login.is_some());
    }

    #[tokio::test]
    async fn credential_digest_is_exposed_separately() {
        let pool = pool_with_customer().await;
        let repo = SqlCustomerRepository::new(pool);

        let digest = repo
            .credential_digest(&CustomerId("CUST001".to_string()))
            .await
            .expect("query")
            .expect("digest exists");
        assert_eq!(digest, credential_digest("sunrise-001"));
    }
}
