//! In-memory product store.
//!
//! One ordered list of [`Product`]s for the process lifetime. Nothing is
//! persisted. Ids come from a counter that only moves forward, so an id is
//! never handed out twice, even after deletions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Number;
use tokio::sync::Mutex;

/// The store as shared between request handlers.
///
/// Handlers hold the lock across a whole read-modify-write, so at most one
/// mutation is in progress at a time.
pub type SharedStore = Arc<Mutex<Store>>;

/// A product id. Always a string on the wire and in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ProductId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Number,
    pub category: String,
    pub in_stock: bool,
}

/// The fields of a product to be created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Number,
    pub category: String,
    pub in_stock: bool,
}

/// A partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Number>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

#[derive(Debug, Default)]
pub struct Store {
    products: Vec<Product>,
    last_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the three catalogue records every process starts with.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        for (name, description, price, category, in_stock) in [
            ("Laptop", "High-performance laptop with 16GB RAM", 1200, "electronics", true),
            ("Smartphone", "Latest model with 128GB storage", 800, "electronics", true),
            ("Coffee Maker", "Programmable coffee maker with timer", 50, "kitchen", false),
        ] {
            store.create(NewProduct {
                name: name.to_owned(),
                description: description.to_owned(),
                price: Number::from(price),
                category: category.to_owned(),
                in_stock,
            });
        }
        store
    }

    pub fn list(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Appends a product under a fresh id and returns it.
    pub fn create(&mut self, fields: NewProduct) -> Product {
        self.last_id += 1;
        let product = Product {
            id: ProductId::from(self.last_id),
            name: fields.name,
            description: fields.description,
            price: fields.price,
            category: fields.category,
            in_stock: fields.in_stock,
        };
        self.products.push(product.clone());
        product
    }

    /// Overwrites the fields present in `patch`. `None` if `id` is unknown.
    pub fn update(&mut self, id: &ProductId, patch: ProductPatch) -> Option<Product> {
        let product = self.products.iter_mut().find(|p| &p.id == id)?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(in_stock) = patch.in_stock {
            product.in_stock = in_stock;
        }
        Some(product.clone())
    }

    /// Removes the product with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &ProductId) -> bool {
        let before = self.products.len();
        self.products.retain(|p| &p.id != id);
        self.products.len() != before
    }
}
