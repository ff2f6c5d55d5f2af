//! Product catalog
//!
//! Listing, search and admin maintenance of products. Stock only moves
//! through the [`InventoryLedger`].

use super::inventory::{InventoryLedger, product_not_found};
use crate::db::DbService;
use crate::db::repository::{ProductRepository, RepoError};
use shared::models::{Pagination, Product, ProductCreate, ProductListResponse, ProductUpdate};
use shared::{AppError, AppResult, ErrorCode};

/// Size of the storefront's featured strip
pub const FEATURED_LIMIT: u32 = 8;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct CatalogService {
    products: ProductRepository,
    ledger: InventoryLedger,
}

impl CatalogService {
    pub fn new(db: DbService) -> Self {
        Self {
            products: ProductRepository::new(&db),
            ledger: InventoryLedger::new(db),
        }
    }

    /// Active products, newest first
    pub async fn list(&self, page: Pagination) -> AppResult<ProductListResponse> {
        let (products, total) = self.products.find_active(page).await?;
        Ok(ProductListResponse {
            products,
            total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages(total),
        })
    }

    pub async fn featured(&self) -> AppResult<Vec<Product>> {
        Ok(self.products.find_featured(FEATURED_LIMIT).await?)
    }

    /// Substring match over active products; a limit outside
    /// `1..=MAX_SEARCH_LIMIT` falls back to the default
    pub async fn search(&self, query: &str, limit: Option<i64>) -> AppResult<Vec<Product>> {
        let term = query.trim();
        if term.is_empty() {
            return Err(AppError::new(ErrorCode::SearchTermRequired));
        }
        let limit = limit
            .and_then(|l| u32::try_from(l).ok())
            .filter(|l| (1..=MAX_SEARCH_LIMIT).contains(l))
            .unwrap_or(DEFAULT_SEARCH_LIMIT);
        let products = self.products.search(term, limit).await?;
        tracing::debug!(term, limit, found = products.len(), "Product search");
        Ok(products)
    }

    pub async fn get(&self, id: &str) -> AppResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    pub async fn create(&self, data: ProductCreate) -> AppResult<Product> {
        let product = self.products.create(data).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Partial update; `is_active = false` retires the product
    pub async fn update(&self, id: &str, data: ProductUpdate) -> AppResult<Product> {
        match self.products.update(id, data).await {
            Ok(product) => Ok(product),
            Err(RepoError::NotFound(_)) => Err(product_not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Signed stock adjustment through the ledger
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> AppResult<Product> {
        let product = self.ledger.adjust_stock(id, delta).await?;
        tracing::info!(product_id = %id, delta, stock = product.stock, "Stock adjusted by admin");
        Ok(product)
    }
}
