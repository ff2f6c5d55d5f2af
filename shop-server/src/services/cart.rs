//! Shopping carts
//!
//! A cart holds product snapshots, not reservations; stock is only taken
//! at checkout.

use crate::db::DbService;
use crate::db::repository::cart::{Snapshot, add_in};
use crate::db::repository::{CartRepository, ProductRepository, commit};
use shared::models::{Cart, CartItemAdd, CartItemUpdate, CartSync, Product};
use shared::{AppError, AppResult, ErrorCode};

use super::inventory::product_not_found;

fn not_in_cart(product_id: &str) -> AppError {
    AppError::new(ErrorCode::CartItemNotFound).with_detail("product_id", product_id)
}

#[derive(Clone)]
pub struct CartService {
    db: DbService,
    carts: CartRepository,
    products: ProductRepository,
}

impl CartService {
    pub fn new(db: DbService) -> Self {
        Self {
            carts: CartRepository::new(&db),
            products: ProductRepository::new(&db),
            db,
        }
    }

    pub async fn get(&self, user_id: &str) -> AppResult<Cart> {
        let (items, updated_at) = self.carts.find(user_id).await?;
        Ok(Cart {
            user_id: user_id.to_string(),
            items,
            updated_at,
        })
    }

    /// Add units of an active product, merging with an existing line
    pub async fn add_item(&self, user_id: &str, req: CartItemAdd) -> AppResult<Cart> {
        let product = self.sellable(&req.product_id).await?;
        self.carts.add(user_id, &product, req.quantity).await?;
        tracing::debug!(user_id, product_id = %product.id, quantity = req.quantity, "Cart item added");
        self.get(user_id).await
    }

    pub async fn update_item(
        &self,
        user_id: &str,
        product_id: &str,
        req: CartItemUpdate,
    ) -> AppResult<Cart> {
        if !self
            .carts
            .set_quantity(user_id, product_id, req.quantity)
            .await?
        {
            return Err(not_in_cart(product_id));
        }
        self.get(user_id).await
    }

    /// Removing a product that is not in the cart is a no-op
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> AppResult<Cart> {
        self.carts.remove(user_id, product_id).await?;
        self.get(user_id).await
    }

    pub async fn clear(&self, user_id: &str) -> AppResult<()> {
        let removed = self.carts.clear(user_id).await?;
        tracing::debug!(user_id, removed, "Cart cleared");
        Ok(())
    }

    /// Merge a guest cart into the user's cart
    ///
    /// Missing and inactive products are skipped. Lines already present get
    /// their quantity added and their snapshot refreshed; all lines land in
    /// one transaction.
    pub async fn sync(&self, user_id: &str, req: CartSync) -> AppResult<Cart> {
        let mut lines = Vec::with_capacity(req.items.len());
        for item in req.items {
            match self.products.find_by_id(&item.product_id).await? {
                Some(product) if product.is_active => lines.push((product, item.quantity)),
                _ => tracing::debug!(
                    user_id,
                    product_id = %item.product_id,
                    "Skipping unavailable product in cart sync"
                ),
            }
        }

        if !lines.is_empty() {
            let mut tx = self.db.begin().await?;
            for (product, quantity) in &lines {
                add_in(&mut tx, user_id, product, *quantity, Snapshot::Refresh).await?;
            }
            commit(tx).await?;
        }
        tracing::info!(user_id, merged = lines.len(), "Cart synced");
        self.get(user_id).await
    }

    async fn sellable(&self, product_id: &str) -> AppResult<Product> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| product_not_found(product_id))?;
        if !product.is_active {
            return Err(AppError::with_message(
                ErrorCode::ProductInactive,
                format!("Product {} is not available", product.name),
            )
            .with_detail("product_id", product_id));
        }
        Ok(product)
    }
}
