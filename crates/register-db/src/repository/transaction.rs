//! # Transaction Repository
//!
//! Database operations for the append-only transaction ledger.
//!
//! ## Read Path
//! ```text
//! SQLite row
//!      │  (raw columns, any schema generation)
//!      ▼
//! TransactionRow (FromRow)
//!      │  From<TransactionRow>
//!      ▼
//! RawTransactionRecord
//!      │  normalize_transaction()
//!      ▼
//! Transaction (canonical)
//! ```
//! Every read funnels through the normalizer, so callers never see a
//! schema-generation difference.
//!
//! ## Write Path
//! Writes flatten the canonical [`Transaction`] back to columns via
//! `to_raw()`. Credit rows additionally store a `customer_key` — the
//! normalized (name, phone) settlement key — so settling a customer's
//! whole balance is a single conditional UPDATE.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use register_core::{
    normalize_transaction, validation::customer_key, RawTransactionRecord, Transaction,
    TransactionStatus,
};

const TX_COLUMNS: &str = "id, shift_id, kind, amount, payment_method, status, description, \
     insurer_id, card_id, coverage_percent, covered_amount, \
     customer_name, customer_phone, payment_status, paid_by, paid_at, \
     original_id, created_by, created_at, approved_by, approved_at";

// =============================================================================
// Row Type
// =============================================================================

/// A transaction row exactly as SQLite returns it.
///
/// Kept loose (everything optional, plain strings) so rows written by any
/// schema generation decode; canonicalization happens in the normalizer.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    shift_id: String,
    kind: Option<String>,
    amount: i64,
    payment_method: Option<String>,
    status: Option<String>,
    description: Option<String>,

    insurer_id: Option<String>,
    card_id: Option<String>,
    coverage_percent: Option<f64>,
    covered_amount: Option<i64>,

    customer_name: Option<String>,
    customer_phone: Option<String>,
    payment_status: Option<String>,
    paid_by: Option<String>,
    paid_at: Option<chrono::DateTime<chrono::Utc>>,

    original_id: Option<String>,
    created_by: Option<String>,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    approved_by: Option<String>,
    approved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<TransactionRow> for RawTransactionRecord {
    fn from(row: TransactionRow) -> Self {
        RawTransactionRecord {
            id: row.id,
            shift_id: row.shift_id,
            amount: row.amount,
            kind: row.kind,
            payment_method: row.payment_method,
            status: row.status,
            approved: None,
            description: row.description,
            insurer_id: row.insurer_id,
            card_id: row.card_id,
            coverage_percent: row.coverage_percent,
            covered_amount: row.covered_amount,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            payment_status: row.payment_status,
            paid_by: row.paid_by,
            paid_at: row.paid_at,
            original_id: row.original_id,
            created_by: row.created_by,
            created_at: row.created_at,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
        }
    }
}

fn to_canonical(row: TransactionRow) -> Transaction {
    normalize_transaction(row.into())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a canonical transaction.
    ///
    /// Credit rows get their `customer_key` computed here, at write time,
    /// so settlement never has to re-derive it per row.
    pub async fn insert(&self, tx: &Transaction) -> DbResult<()> {
        debug!(id = %tx.id, kind = tx.kind.as_str(), "Inserting transaction");

        let raw = tx.to_raw();
        let key = raw
            .customer_name
            .as_deref()
            .map(|name| customer_key(name, raw.customer_phone.as_deref()));

        sqlx::query(
            "INSERT INTO transactions (id, shift_id, kind, amount, payment_method, status, \
             description, insurer_id, card_id, coverage_percent, covered_amount, \
             customer_name, customer_phone, customer_key, payment_status, paid_by, paid_at, \
             original_id, created_by, created_at, approved_by, approved_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
             ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        )
        .bind(&raw.id)
        .bind(&raw.shift_id)
        .bind(&raw.kind)
        .bind(raw.amount)
        .bind(&raw.payment_method)
        .bind(&raw.status)
        .bind(&raw.description)
        .bind(&raw.insurer_id)
        .bind(&raw.card_id)
        .bind(raw.coverage_percent)
        .bind(raw.covered_amount)
        .bind(&raw.customer_name)
        .bind(&raw.customer_phone)
        .bind(&key)
        .bind(&raw.payment_status)
        .bind(&raw.paid_by)
        .bind(raw.paid_at)
        .bind(&raw.original_id)
        .bind(&raw.created_by)
        .bind(raw.created_at)
        .bind(&raw.approved_by)
        .bind(raw.approved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a transaction by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(to_canonical))
    }

    /// Lists all transactions for a shift in chronological order.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE shift_id = ?1 ORDER BY created_at, id"
        ))
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_canonical).collect())
    }

    /// Lists expenses still awaiting sign-off for a shift.
    pub async fn list_pending_expenses(&self, shift_id: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions \
             WHERE shift_id = ?1 AND kind = 'expense' AND status = 'pending' \
             ORDER BY created_at, id"
        ))
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_canonical).collect())
    }

    /// Lists unpaid credit sales across all shifts (the debts screen).
    pub async fn list_unpaid_credit(&self) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions \
             WHERE kind = 'credit_sale' AND payment_status = 'unpaid' \
             AND status = 'approved' \
             ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_canonical).collect())
    }

    /// Flips a pending expense to approved or rejected.
    ///
    /// ## Conditional Write
    /// The `kind = 'expense' AND status = 'pending'` guard makes the
    /// transition race-safe: an expense that was already decided (or is not
    /// an expense at all) affects zero rows and errors.
    pub async fn set_expense_status(
        &self,
        id: &str,
        status: TransactionStatus,
        decided_by: &str,
        decided_at: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, status = status.as_str(), "Deciding expense");

        let result = sqlx::query(
            "UPDATE transactions SET status = ?2, approved_by = ?3, approved_at = ?4 \
             WHERE id = ?1 AND kind = 'expense' AND status = 'pending'",
        )
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(decided_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending expense", id));
        }

        Ok(())
    }

    /// Atomically marks the original returned and inserts the reversal.
    ///
    /// Both writes share one database transaction: either the original is
    /// flagged AND the negative-amount reversal exists, or neither does.
    /// The original must still be in `approved` status; anything else
    /// (already returned, rejected, pending) rolls back with NotFound.
    pub async fn mark_returned_and_insert(
        &self,
        original_id: &str,
        reversal: &Transaction,
    ) -> DbResult<()> {
        debug!(original = %original_id, reversal = %reversal.id, "Recording return");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE transactions SET status = 'returned' \
             WHERE id = ?1 AND status = 'approved'",
        )
        .bind(original_id)
        .execute(&mut *db_tx)
        .await?;

        if result.rows_affected() == 0 {
            // Rolls back on drop
            return Err(DbError::not_found("Returnable transaction", original_id));
        }

        let raw = reversal.to_raw();
        sqlx::query(
            "INSERT INTO transactions (id, shift_id, kind, amount, payment_method, status, \
             description, original_id, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&raw.id)
        .bind(&raw.shift_id)
        .bind(&raw.kind)
        .bind(raw.amount)
        .bind(&raw.payment_method)
        .bind(&raw.status)
        .bind(&raw.description)
        .bind(&raw.original_id)
        .bind(&raw.created_by)
        .bind(raw.created_at)
        .execute(&mut *db_tx)
        .await?;

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Settles every unpaid, still-approved credit row for one customer in
    /// a single UPDATE.
    ///
    /// Grouping happens on the stored `customer_key` column, so the whole
    /// settlement is one statement and therefore atomic: no partially-paid
    /// customer is observable. Returned (refunded) rows are not debt and
    /// are never touched. Returns the number of rows settled.
    pub async fn settle_credit(
        &self,
        key: &str,
        settled_by: &str,
        settled_at: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<u64> {
        debug!(customer_key = %key, settled_by = %settled_by, "Settling credit");

        let result = sqlx::query(
            "UPDATE transactions SET payment_status = 'paid', paid_by = ?2, paid_at = ?3 \
             WHERE kind = 'credit_sale' AND customer_key = ?1 AND payment_status = 'unpaid' \
             AND status = 'approved'",
        )
        .bind(key)
        .bind(settled_by)
        .bind(settled_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts all transactions for a shift.
    pub async fn count_for_shift(&self, shift_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE shift_id = ?1")
                .bind(shift_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use register_core::{
        CreditStatus, Money, PaymentMethod, SaleSplit, Shift, TransactionKind,
    };
    use uuid::Uuid;

    async fn db_with_shift() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            cashier_id: "cashier-a".to_string(),
            started_at: Utc::now(),
            ended_at: None,
            expected_cash: Money::zero(),
            actual_cash: None,
            cash_difference: None,
            closed_by: None,
            close_reason: None,
        };
        db.shifts().insert(&shift).await.unwrap();
        (db, shift.id)
    }

    fn tx(shift_id: &str, kind: TransactionKind, amount: i64, split: SaleSplit) -> Transaction {
        Transaction {
            id: Uuid::new_v4().to_string(),
            shift_id: shift_id.to_string(),
            kind,
            amount: Money::from_amount(amount),
            method: if split.is_credit() {
                PaymentMethod::CreditDebt
            } else {
                PaymentMethod::Cash
            },
            status: if kind == TransactionKind::Expense {
                TransactionStatus::Pending
            } else {
                TransactionStatus::Approved
            },
            description: None,
            split,
            original_id: None,
            created_by: "cashier-a".to_string(),
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        }
    }

    fn credit_split(name: &str, phone: Option<&str>) -> SaleSplit {
        SaleSplit::Credit {
            customer_name: name.to_string(),
            customer_phone: phone.map(String::from),
            status: CreditStatus::Unpaid,
            paid_by: None,
            paid_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_insurance_sale() {
        let (db, shift_id) = db_with_shift().await;
        let sale = tx(
            &shift_id,
            TransactionKind::Sale,
            100_000,
            SaleSplit::Insurance {
                insurer_id: "rssb".to_string(),
                card_id: "card-1".to_string(),
                coverage_percent: 80,
                covered_amount: Money::from_amount(80_000),
            },
        );
        db.transactions().insert(&sale).await.unwrap();

        let back = db
            .transactions()
            .get_by_id(&sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(back.split, sale.split);
        assert_eq!(back.patient_part().amount(), 20_000);
    }

    #[tokio::test]
    async fn test_list_for_shift_is_chronological() {
        let (db, shift_id) = db_with_shift().await;
        for amount in [1_000, 2_000, 3_000] {
            db.transactions()
                .insert(&tx(&shift_id, TransactionKind::Sale, amount, SaleSplit::None))
                .await
                .unwrap();
        }

        let list = db.transactions().list_for_shift(&shift_id).await.unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_expense_decision_is_single_shot() {
        let (db, shift_id) = db_with_shift().await;
        let expense = tx(&shift_id, TransactionKind::Expense, 5_000, SaleSplit::None);
        db.transactions().insert(&expense).await.unwrap();

        db.transactions()
            .set_expense_status(&expense.id, TransactionStatus::Approved, "admin-1", Utc::now())
            .await
            .unwrap();

        let back = db
            .transactions()
            .get_by_id(&expense.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(back.status, TransactionStatus::Approved);
        assert_eq!(back.approved_by.as_deref(), Some("admin-1"));

        // A second decision finds no pending row
        let err = db
            .transactions()
            .set_expense_status(&expense.id, TransactionStatus::Rejected, "admin-2", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_return_marks_original_and_inserts_reversal() {
        let (db, shift_id) = db_with_shift().await;
        let sale = tx(&shift_id, TransactionKind::Sale, 30_000, SaleSplit::None);
        db.transactions().insert(&sale).await.unwrap();

        let mut reversal = tx(&shift_id, TransactionKind::Return, -30_000, SaleSplit::None);
        reversal.original_id = Some(sale.id.clone());
        db.transactions()
            .mark_returned_and_insert(&sale.id, &reversal)
            .await
            .unwrap();

        let original = db.transactions().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(original.status, TransactionStatus::Returned);

        let back = db
            .transactions()
            .get_by_id(&reversal.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(back.amount.amount(), -30_000);
        assert_eq!(back.original_id.as_deref(), Some(sale.id.as_str()));

        // Returning again: the original is no longer approved, nothing inserted
        let reversal2 = tx(&shift_id, TransactionKind::Return, -30_000, SaleSplit::None);
        let err = db
            .transactions()
            .mark_returned_and_insert(&sale.id, &reversal2)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.transactions().count_for_shift(&shift_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_settle_credit_flips_all_rows_for_one_key() {
        let (db, shift_id) = db_with_shift().await;
        // Same customer, spelled differently; same key
        db.transactions()
            .insert(&tx(
                &shift_id,
                TransactionKind::CreditSale,
                10_000,
                credit_split("Uwase Claudine", Some("0788 123 456")),
            ))
            .await
            .unwrap();
        db.transactions()
            .insert(&tx(
                &shift_id,
                TransactionKind::CreditSale,
                15_000,
                credit_split("  UWASE   claudine ", Some("0788123456")),
            ))
            .await
            .unwrap();
        // Different customer, untouched
        db.transactions()
            .insert(&tx(
                &shift_id,
                TransactionKind::CreditSale,
                7_000,
                credit_split("Jean Bosco", None),
            ))
            .await
            .unwrap();

        let key = customer_key("Uwase Claudine", Some("0788 123 456"));
        let settled = db
            .transactions()
            .settle_credit(&key, "admin-1", Utc::now())
            .await
            .unwrap();
        assert_eq!(settled, 2);

        let unpaid = db.transactions().list_unpaid_credit().await.unwrap();
        assert_eq!(unpaid.len(), 1);
        match &unpaid[0].split {
            SaleSplit::Credit { customer_name, .. } => assert_eq!(customer_name, "Jean Bosco"),
            other => panic!("expected credit split, got {other:?}"),
        }

        // Settling again is a no-op
        let again = db
            .transactions()
            .settle_credit(&key, "admin-1", Utc::now())
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_settle_credit_skips_returned_rows() {
        let (db, shift_id) = db_with_shift().await;
        let sale = tx(
            &shift_id,
            TransactionKind::CreditSale,
            20_000,
            credit_split("Jean Bosco", None),
        );
        db.transactions().insert(&sale).await.unwrap();

        let mut reversal = tx(&shift_id, TransactionKind::Return, -20_000, SaleSplit::None);
        reversal.original_id = Some(sale.id.clone());
        db.transactions()
            .mark_returned_and_insert(&sale.id, &reversal)
            .await
            .unwrap();

        // The refunded debt cannot be marked paid
        let key = customer_key("Jean Bosco", None);
        let settled = db
            .transactions()
            .settle_credit(&key, "admin-1", Utc::now())
            .await
            .unwrap();
        assert_eq!(settled, 0);

        let back = db.transactions().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(back.status, TransactionStatus::Returned);
        match &back.split {
            SaleSplit::Credit { status, paid_by, .. } => {
                assert_eq!(*status, CreditStatus::Unpaid);
                assert_eq!(*paid_by, None);
            }
            other => panic!("expected credit split, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pending_expense_listing() {
        let (db, shift_id) = db_with_shift().await;
        db.transactions()
            .insert(&tx(&shift_id, TransactionKind::Expense, 4_000, SaleSplit::None))
            .await
            .unwrap();
        db.transactions()
            .insert(&tx(&shift_id, TransactionKind::Sale, 9_000, SaleSplit::None))
            .await
            .unwrap();

        let pending = db.transactions().list_pending_expenses(&shift_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, TransactionKind::Expense);
    }
}
