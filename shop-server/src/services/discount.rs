//! Discount Evaluator
//!
//! Checks a code against its activity flag, validity window, usage cap and
//! minimum purchase, in that order, and computes the discount amount.
//! Validation never consumes a use; [`DiscountService::apply_in`] does, as
//! part of the checkout transaction.

use super::money::{to_decimal, to_f64};
use crate::db::DbService;
use crate::db::repository::discount::{consume_in, find_by_id_in, save_in, touch_in};
use crate::db::repository::{DiscountRepository, RepoError, commit};
use rust_decimal::Decimal;
use shared::models::{
    DiscountCode, DiscountCodeCreate, DiscountCodeListResponse, DiscountCodeUpdate, DiscountType,
    DiscountValidation, Pagination,
};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqliteConnection;

pub const MSG_NOT_FOUND: &str = "Discount code not found";
pub const MSG_INACTIVE: &str = "Discount code is inactive";
pub const MSG_NOT_YET_VALID: &str = "Discount code not yet valid";
pub const MSG_EXPIRED: &str = "Discount code expired";
pub const MSG_LIMIT_REACHED: &str = "Discount code usage limit reached";
pub const MSG_BELOW_MINIMUM: &str = "Purchase amount does not meet minimum requirement";
pub const MSG_VALID: &str = "Discount code is valid";

/// Codes are compared upper-case
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Evaluate `discount` for `purchase_total` at `now` (Unix millis)
///
/// Returns the discount amount, never more than the purchase total, or
/// the message of the first failed check.
pub fn evaluate(
    discount: &DiscountCode,
    purchase_total: Decimal,
    now: i64,
) -> Result<Decimal, &'static str> {
    if !discount.is_active {
        return Err(MSG_INACTIVE);
    }
    if now < discount.start_date {
        return Err(MSG_NOT_YET_VALID);
    }
    if now > discount.end_date {
        return Err(MSG_EXPIRED);
    }
    if let Some(max) = discount.max_uses
        && discount.used_count >= max
    {
        return Err(MSG_LIMIT_REACHED);
    }
    if let Some(min) = discount.min_purchase
        && purchase_total < to_decimal(min)
    {
        return Err(MSG_BELOW_MINIMUM);
    }

    let amount = match discount.discount_type {
        DiscountType::Percentage => purchase_total * to_decimal(discount.value) / Decimal::ONE_HUNDRED,
        DiscountType::FixedAmount => to_decimal(discount.value),
    };
    Ok(amount.min(purchase_total))
}

fn check_value(discount_type: DiscountType, value: f64) -> AppResult<()> {
    if discount_type == DiscountType::Percentage && value > 100.0 {
        return Err(AppError::with_message(
            ErrorCode::DiscountValueOutOfRange,
            "Percentage discount cannot be greater than 100%",
        )
        .with_detail("value", value));
    }
    Ok(())
}

fn check_window(start_date: i64, end_date: i64) -> AppResult<()> {
    if end_date < start_date {
        return Err(AppError::with_message(
            ErrorCode::DiscountInvalidWindow,
            "End date must be after start date",
        )
        .with_detail("start_date", start_date)
        .with_detail("end_date", end_date));
    }
    Ok(())
}

fn code_exists(code: &str) -> AppError {
    AppError::with_message(
        ErrorCode::DiscountCodeExists,
        format!("Discount code {code} already exists"),
    )
    .with_detail("code", code)
}

fn discount_not_found(id: &str) -> AppError {
    AppError::with_message(
        ErrorCode::DiscountNotFound,
        format!("Discount code {id} not found"),
    )
    .with_detail("id", id)
}

#[derive(Clone)]
pub struct DiscountService {
    db: DbService,
    repo: DiscountRepository,
}

impl DiscountService {
    pub fn new(db: DbService) -> Self {
        Self {
            repo: DiscountRepository::new(&db),
            db,
        }
    }

    /// Validate `code` against `purchase_total` right now
    pub async fn validate(&self, code: &str, purchase_total: f64) -> AppResult<DiscountValidation> {
        self.validate_at(code, purchase_total, now_millis()).await
    }

    pub async fn validate_at(
        &self,
        code: &str,
        purchase_total: f64,
        now: i64,
    ) -> AppResult<DiscountValidation> {
        let Some(discount) = self.repo.find_by_code(&normalize_code(code)).await? else {
            return Ok(DiscountValidation {
                valid: false,
                discount_code: None,
                discount_amount: 0.0,
                message: MSG_NOT_FOUND.to_string(),
            });
        };

        let validation = match evaluate(&discount, to_decimal(purchase_total), now) {
            Ok(amount) => DiscountValidation {
                valid: true,
                discount_code: Some(discount),
                discount_amount: to_f64(amount),
                message: MSG_VALID.to_string(),
            },
            Err(message) => DiscountValidation {
                valid: false,
                discount_code: Some(discount),
                discount_amount: 0.0,
                message: message.to_string(),
            },
        };
        Ok(validation)
    }

    /// Count one use of the code inside the checkout transaction
    ///
    /// The cap is re-checked in the same statement, so concurrent checkouts
    /// cannot push `used_count` past `max_uses`. `false` means the code ran
    /// out (or vanished) after validation and nothing was counted.
    pub async fn apply_in(conn: &mut SqliteConnection, id: &str) -> AppResult<bool> {
        let applied = consume_in(conn, id).await?;
        if applied {
            tracing::info!(discount_id = %id, "Discount code applied");
        }
        Ok(applied)
    }

    // ==================== Administration ====================

    pub async fn create(&self, data: DiscountCodeCreate) -> AppResult<DiscountCode> {
        check_window(data.start_date, data.end_date)?;
        check_value(data.discount_type, data.value)?;

        let now = now_millis();
        let discount = DiscountCode {
            id: new_id(),
            code: normalize_code(&data.code),
            description: data.description,
            discount_type: data.discount_type,
            value: data.value,
            min_purchase: data.min_purchase,
            max_uses: data.max_uses,
            used_count: 0,
            start_date: data.start_date,
            end_date: data.end_date,
            is_active: data.is_active,
            created_at: now,
            updated_at: now,
        };
        match self.repo.insert(&discount).await {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => return Err(code_exists(&discount.code)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(discount_id = %discount.id, code = %discount.code, "Discount code created");
        Ok(discount)
    }

    pub async fn get(&self, id: &str) -> AppResult<DiscountCode> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| discount_not_found(id))
    }

    pub async fn list(&self, page: Pagination) -> AppResult<DiscountCodeListResponse> {
        let (discount_codes, total) = self.repo.find_all(page).await?;
        Ok(DiscountCodeListResponse {
            discount_codes,
            total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages(total),
        })
    }

    /// Partial update, re-checking the window, value range and code uniqueness
    pub async fn update(&self, id: &str, data: DiscountCodeUpdate) -> AppResult<DiscountCode> {
        let mut tx = self.db.begin().await?;
        if !touch_in(&mut tx, id).await? {
            return Err(discount_not_found(id));
        }
        let mut d = find_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| discount_not_found(id))?;

        if let Some(code) = data.code.as_deref() {
            d.code = normalize_code(code);
        }
        if let Some(description) = data.description {
            d.description = description;
        }
        if let Some(discount_type) = data.discount_type {
            d.discount_type = discount_type;
        }
        if let Some(value) = data.value {
            d.value = value;
        }
        if data.min_purchase.is_some() {
            d.min_purchase = data.min_purchase;
        }
        if data.max_uses.is_some() {
            d.max_uses = data.max_uses;
        }
        if let Some(start_date) = data.start_date {
            d.start_date = start_date;
        }
        if let Some(end_date) = data.end_date {
            d.end_date = end_date;
        }
        if let Some(is_active) = data.is_active {
            d.is_active = is_active;
        }
        check_window(d.start_date, d.end_date)?;
        check_value(d.discount_type, d.value)?;
        d.updated_at = now_millis();

        match save_in(&mut tx, &d).await {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => return Err(code_exists(&d.code)),
            Err(e) => return Err(e.into()),
        }
        commit(tx).await?;

        tracing::info!(discount_id = %d.id, code = %d.code, "Discount code updated");
        Ok(d)
    }

    /// Remove the code; orders keep their `discount_code_id` reference
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.repo.delete(id).await? {
            return Err(discount_not_found(id));
        }
        tracing::info!(discount_id = %id, "Discount code deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const DAY: i64 = 86_400_000;

    async fn service() -> DiscountService {
        DiscountService::new(DbService::in_memory().await.unwrap())
    }

    fn create(code: &str, discount_type: DiscountType, value: f64) -> DiscountCodeCreate {
        let now = now_millis();
        DiscountCodeCreate {
            code: code.into(),
            description: "test".into(),
            discount_type,
            value,
            min_purchase: None,
            max_uses: None,
            start_date: now - DAY,
            end_date: now + DAY,
            is_active: true,
        }
    }

    fn code(discount_type: DiscountType, value: f64) -> DiscountCode {
        DiscountCode {
            id: "d1".into(),
            code: "TEST".into(),
            description: String::new(),
            discount_type,
            value,
            min_purchase: None,
            max_uses: None,
            used_count: 0,
            start_date: 1_000,
            end_date: 2_000,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_percentage_amount() {
        let d = code(DiscountType::Percentage, 10.0);
        let amount = evaluate(&d, to_decimal(60000.0), 1_500).unwrap();
        assert_eq!(to_f64(amount), 6000.0);
    }

    #[test]
    fn test_fixed_amount_clamped_to_total() {
        let d = code(DiscountType::FixedAmount, 99999.0);
        let amount = evaluate(&d, to_decimal(50000.0), 1_500).unwrap();
        assert_eq!(to_f64(amount), 50000.0);
    }

    #[test]
    fn test_check_order_short_circuits() {
        // Inactive and expired and capped: the inactive message wins
        let mut d = code(DiscountType::FixedAmount, 10.0);
        d.is_active = false;
        d.max_uses = Some(1);
        d.used_count = 1;
        assert_eq!(evaluate(&d, Decimal::ONE, 5_000), Err(MSG_INACTIVE));

        d.is_active = true;
        assert_eq!(evaluate(&d, Decimal::ONE, 500), Err(MSG_NOT_YET_VALID));
        assert_eq!(evaluate(&d, Decimal::ONE, 5_000), Err(MSG_EXPIRED));
        assert_eq!(evaluate(&d, Decimal::ONE, 1_500), Err(MSG_LIMIT_REACHED));

        d.max_uses = None;
        d.min_purchase = Some(50000.0);
        assert_eq!(
            evaluate(&d, to_decimal(40000.0), 1_500),
            Err(MSG_BELOW_MINIMUM)
        );
        assert!(evaluate(&d, to_decimal(50000.0), 1_500).is_ok());
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let d = code(DiscountType::FixedAmount, 1.0);
        assert!(evaluate(&d, Decimal::TEN, 1_000).is_ok());
        assert!(evaluate(&d, Decimal::TEN, 2_000).is_ok());
    }

    #[tokio::test]
    async fn test_validate_case_insensitive_and_not_consuming() {
        let svc = service().await;
        let created = svc
            .create(create("welcome10", DiscountType::FixedAmount, 10000.0))
            .await
            .unwrap();
        assert_eq!(created.code, "WELCOME10");

        let v = svc.validate("Welcome10", 60000.0).await.unwrap();
        assert!(v.valid);
        assert_eq!(v.message, MSG_VALID);
        assert_eq!(v.discount_amount, 10000.0);

        assert_eq!(svc.get(&created.id).await.unwrap().used_count, 0);
    }

    #[tokio::test]
    async fn test_validate_unknown_code() {
        let v = service().await.validate("NOPE", 100.0).await.unwrap();
        assert!(!v.valid);
        assert!(v.discount_code.is_none());
        assert_eq!(v.message, MSG_NOT_FOUND);
        assert_eq!(v.discount_amount, 0.0);
    }

    #[tokio::test]
    async fn test_min_purchase_rejected() {
        let svc = service().await;
        let mut payload = create("MIN50", DiscountType::Percentage, 10.0);
        payload.min_purchase = Some(50000.0);
        svc.create(payload).await.unwrap();

        let v = svc.validate("MIN50", 40000.0).await.unwrap();
        assert!(!v.valid);
        assert_eq!(v.message, MSG_BELOW_MINIMUM);
        assert!(v.discount_code.is_some());
    }

    #[tokio::test]
    async fn test_apply_respects_cap() {
        let svc = service().await;
        let mut payload = create("ONCE", DiscountType::FixedAmount, 5.0);
        payload.max_uses = Some(1);
        let d = svc.create(payload).await.unwrap();

        let mut conn = svc.db.acquire().await.unwrap();
        assert!(DiscountService::apply_in(&mut conn, &d.id).await.unwrap());
        assert!(!DiscountService::apply_in(&mut conn, &d.id).await.unwrap());
        assert!(!DiscountService::apply_in(&mut conn, "missing").await.unwrap());
        drop(conn);
        assert_eq!(svc.get(&d.id).await.unwrap().used_count, 1);

        let v = svc.validate("ONCE", 100.0).await.unwrap();
        assert_eq!(v.message, MSG_LIMIT_REACHED);
    }

    #[tokio::test]
    async fn test_apply_rolls_back_with_transaction() {
        let svc = service().await;
        let d = svc
            .create(create("ROLLBACK", DiscountType::FixedAmount, 5.0))
            .await
            .unwrap();

        let mut tx = svc.db.begin().await.unwrap();
        assert!(DiscountService::apply_in(&mut tx, &d.id).await.unwrap());
        drop(tx);
        assert_eq!(svc.get(&d.id).await.unwrap().used_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_creates_of_one_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        let db = DbService::new(path.to_str().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        let svc = DiscountService::new(db);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let svc = svc.clone();
                let code = if i % 2 == 0 { "SUMMER" } else { "summer" };
                tokio::spawn(async move {
                    svc.create(create(code, DiscountType::Percentage, 15.0)).await
                })
            })
            .collect();

        let mut created = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e.code, ErrorCode::DiscountCodeExists),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(svc.list(Pagination::new(1, 10)).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let svc = service().await;
        svc.create(create("DUP", DiscountType::FixedAmount, 1.0))
            .await
            .unwrap();

        let err = svc
            .create(create("dup", DiscountType::FixedAmount, 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountCodeExists);

        let err = svc
            .create(create("BIG", DiscountType::Percentage, 150.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountValueOutOfRange);

        let mut payload = create("BACKWARDS", DiscountType::FixedAmount, 1.0);
        std::mem::swap(&mut payload.start_date, &mut payload.end_date);
        let err = svc.create(payload).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountInvalidWindow);
    }

    #[tokio::test]
    async fn test_update_rechecks_resulting_state() {
        let svc = service().await;
        let a = svc
            .create(create("AAA", DiscountType::FixedAmount, 150.0))
            .await
            .unwrap();
        svc.create(create("BBB", DiscountType::FixedAmount, 1.0))
            .await
            .unwrap();

        // Switching to percentage with the old value of 150 is out of range
        let err = svc
            .update(
                &a.id,
                DiscountCodeUpdate {
                    discount_type: Some(DiscountType::Percentage),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountValueOutOfRange);

        let err = svc
            .update(
                &a.id,
                DiscountCodeUpdate {
                    code: Some("bbb".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountCodeExists);

        let updated = svc
            .update(
                &a.id,
                DiscountCodeUpdate {
                    code: Some("aaa".into()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.code, "AAA");
        assert!(!updated.is_active);

        let err = svc
            .update("missing", DiscountCodeUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountNotFound);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_delete() {
        let svc = service().await;
        let first = svc
            .create(create("FIRST", DiscountType::FixedAmount, 1.0))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = svc
            .create(create("SECOND", DiscountType::FixedAmount, 1.0))
            .await
            .unwrap();

        let page = svc.list(Pagination::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.discount_codes[0].id, second.id);

        svc.delete(&first.id).await.unwrap();
        let err = svc.delete(&first.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountNotFound);
        assert_eq!(svc.list(Pagination::new(1, 10)).await.unwrap().total, 1);
    }
}
