//! Order Orchestrator
//!
//! Checkout: price every line from the catalog and evaluate the discount
//! code, then in one transaction reserve stock, count the discount use and
//! write the header with its items. Any failure rolls the whole checkout
//! back, so stock, discount usage and orders stay as they were.

use super::discount::{DiscountService, normalize_code};
use super::inventory::{InventoryLedger, product_not_found};
use super::money::{line_subtotal, to_decimal, to_f64};
use super::order_number;
use super::state_machine::order_not_found;
use crate::db::DbService;
use crate::db::repository::order::{insert_in, insert_items_in};
use crate::db::repository::{OrderRepository, ProductRepository, commit};
use rust_decimal::Decimal;
use shared::models::{
    Order, OrderCreate, OrderItem, OrderListResponse, OrderStatus, OrderWithItems, Pagination,
    PaymentStatus,
};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

/// A discount that passed validation at checkout
struct AcceptedDiscount {
    id: String,
    amount: Decimal,
}

#[derive(Clone)]
pub struct OrderService {
    db: DbService,
    orders: OrderRepository,
    products: ProductRepository,
    discounts: DiscountService,
}

impl OrderService {
    pub fn new(db: DbService, discounts: DiscountService) -> Self {
        Self {
            orders: OrderRepository::new(&db),
            products: ProductRepository::new(&db),
            db,
            discounts,
        }
    }

    pub async fn create_order(
        &self,
        req: OrderCreate,
        user_id: Option<String>,
    ) -> AppResult<OrderWithItems> {
        if req.items.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::OrderEmpty,
                "Order must contain at least one product",
            ));
        }

        let order_id = new_id();
        let mut items = Vec::with_capacity(req.items.len());
        let mut subtotal = Decimal::ZERO;

        for line in &req.items {
            let product = self
                .products
                .find_by_id(&line.product_id)
                .await?
                .ok_or_else(|| product_not_found(&line.product_id))?;

            if !product.is_active {
                return Err(AppError::with_message(
                    ErrorCode::ProductInactive,
                    format!("Product {} is not available", product.name),
                )
                .with_detail("product_id", product.id.as_str()));
            }
            if product.stock < line.quantity {
                return Err(AppError::insufficient_stock(
                    &product.id,
                    &product.name,
                    line.quantity,
                    product.stock,
                ));
            }

            let line_total = line_subtotal(product.price, line.quantity);
            subtotal = subtotal.saturating_add(line_total);
            items.push(OrderItem {
                id: new_id(),
                order_id: order_id.clone(),
                product_id: product.id,
                product_name: product.name,
                quantity: line.quantity,
                price: product.price,
                subtotal: to_f64(line_total),
            });
        }

        let discount = match req.discount_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => self.accept_discount(code, subtotal).await?,
            _ => None,
        };

        let now = now_millis();
        let draft = Order {
            id: order_id,
            order_number: order_number::generate(),
            user_id,
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            subtotal: to_f64(subtotal),
            discount: 0.0,
            total: to_f64(subtotal),
            payment_method: req.payment_method,
            payment_status: PaymentStatus::Pending,
            mp_payment_id: None,
            status: OrderStatus::Pending,
            shipping_address: req.shipping_address,
            discount_code_id: None,
            utm_source: req.utm_source,
            utm_medium: req.utm_medium,
            utm_campaign: req.utm_campaign,
            created_at: now,
            updated_at: now,
        };

        let order = match self.place(draft, subtotal, &items, discount).await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(error = %e, "Checkout rolled back");
                return Err(e);
            }
        };

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = items.len(),
            subtotal = order.subtotal,
            discount = order.discount,
            total = order.total,
            "Order created"
        );

        Ok(OrderWithItems { order, items })
    }

    /// Invalid codes do not block checkout; they just yield no discount
    async fn accept_discount(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> AppResult<Option<AcceptedDiscount>> {
        let validation = self.discounts.validate(code, to_f64(subtotal)).await?;
        match validation.discount_code {
            Some(d) if validation.valid => Ok(Some(AcceptedDiscount {
                id: d.id,
                amount: to_decimal(validation.discount_amount),
            })),
            _ => {
                tracing::warn!(
                    code = %normalize_code(code),
                    reason = %validation.message,
                    "Ignoring discount code at checkout"
                );
                Ok(None)
            }
        }
    }

    /// Reserve, count the discount and write the order as one unit
    ///
    /// Reservations go first so the transaction holds the write lock before
    /// it reads anything.
    async fn place(
        &self,
        mut order: Order,
        subtotal: Decimal,
        items: &[OrderItem],
        discount: Option<AcceptedDiscount>,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        for item in items {
            InventoryLedger::adjust_in(&mut tx, &item.product_id, -item.quantity).await?;
        }

        if let Some(d) = discount {
            if DiscountService::apply_in(&mut tx, &d.id).await? {
                order.discount = to_f64(d.amount);
                order.total = to_f64((subtotal - d.amount).max(Decimal::ZERO));
                order.discount_code_id = Some(d.id);
            } else {
                tracing::warn!(
                    order_id = %order.id,
                    discount_id = %d.id,
                    "Discount code used up during checkout, order placed without it"
                );
            }
        }

        insert_in(&mut tx, &order).await?;
        insert_items_in(&mut tx, items).await?;
        commit(tx).await?;
        Ok(order)
    }

    // ==================== Lookups ====================

    pub async fn get_by_id(&self, id: &str) -> AppResult<OrderWithItems> {
        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        let items = self.orders.find_items(&order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn get_by_number(&self, order_number: &str) -> AppResult<OrderWithItems> {
        let order = self
            .orders
            .find_by_number(order_number)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("Order {order_number} not found"),
                )
                .with_detail("order_number", order_number)
            })?;
        let items = self.orders.find_items(&order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn user_orders(&self, user_id: &str, page: Pagination) -> AppResult<OrderListResponse> {
        let (orders, total) = self.orders.find_by_user(user_id, page).await?;
        Ok(list_response(orders, total, page))
    }

    pub async fn all_orders(&self, page: Pagination) -> AppResult<OrderListResponse> {
        let (orders, total) = self.orders.find_all(page).await?;
        Ok(list_response(orders, total, page))
    }
}

fn list_response(orders: Vec<Order>, total: u64, page: Pagination) -> OrderListResponse {
    OrderListResponse {
        orders,
        total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages(total),
    }
}
