//! Session-scoped product repository.
//!
//! Holds the product list for a single session in memory. Nothing is
//! persisted: the list is created empty, grows through manual entry and
//! imports, and is dropped with the session. The engine never sees this
//! type, only the snapshots it hands out.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Product, ProductError};

pub struct ProductRepository {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    products: Vec<Product>,
}

impl Default for ProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductRepository {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            products: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Add one manually entered product after validating it.
    pub fn add(&mut self, product: Product) -> Result<(), ProductError> {
        product.validate()?;
        debug!(session = %self.session_id, product = %product, "Product added");
        self.products.push(product);
        Ok(())
    }

    /// Append a batch of imported products. Additive, never replaces.
    /// Returns how many rows were appended.
    pub fn append(&mut self, products: Vec<Product>) -> usize {
        let count = products.len();
        self.products.extend(products.iter().map(Product::normalized));
        info!(
            session = %self.session_id,
            appended = count,
            total = self.products.len(),
            "Products imported"
        );
        count
    }

    /// Drop every product. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.products.len();
        self.products.clear();
        info!(session = %self.session_id, removed, "All products cleared");
        removed
    }

    /// Owned copy of the current rows, in insertion order.
    pub fn snapshot(&self) -> Vec<Product> {
        self.products.clone()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
