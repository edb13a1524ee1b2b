//! The import-product job: loads a CSV of products into the product store.

use crate::execution::StepSummary;
use crate::job::Job;
use crate::parameters::JobParameters;
use async_trait::async_trait;
use batchgate_core::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub const IMPORT_PRODUCT_JOB: &str = "importProductJob";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
}

/// Imported products keyed by SKU.
#[derive(Default)]
pub struct ProductStore {
    products: RwLock<BTreeMap<String, Product>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, product: Product) {
        let mut products = self
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        products.insert(product.sku.clone(), product);
    }

    pub fn get(&self, sku: &str) -> Option<Product> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sku)
            .cloned()
    }

    /// All products ordered by SKU.
    pub fn list(&self) -> Vec<Product> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ImportProductJob {
    input: PathBuf,
    skip_limit: usize,
    store: Arc<ProductStore>,
}

impl ImportProductJob {
    pub fn new(input: impl Into<PathBuf>, skip_limit: usize, store: Arc<ProductStore>) -> Self {
        Self {
            input: input.into(),
            skip_limit,
            store,
        }
    }
}

#[async_trait]
impl Job for ImportProductJob {
    fn name(&self) -> &str {
        IMPORT_PRODUCT_JOB
    }

    async fn execute(&self, _parameters: &JobParameters) -> Result<StepSummary, BatchError> {
        let contents = tokio::fs::read(&self.input).await.map_err(|e| {
            BatchError::Input(format!("cannot read {}: {e}", self.input.display()))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_slice());

        let mut summary = StepSummary::default();
        for (index, result) in reader.deserialize::<ProductRecord>().enumerate() {
            summary.read_count += 1;

            match result
                .map_err(|e| e.to_string())
                .and_then(Product::try_from)
            {
                Ok(product) => {
                    self.store.upsert(product);
                    summary.write_count += 1;
                }
                Err(reason) => {
                    summary.skip_count += 1;
                    tracing::warn!(record = index + 1, "Skipping product record: {reason}");
                    if summary.skip_count > self.skip_limit {
                        return Err(BatchError::SkipLimitExceeded {
                            limit: self.skip_limit,
                        });
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// One data row of the input file, matched to the `sku,name,price` header.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    sku: String,
    name: String,
    price: String,
}

impl TryFrom<ProductRecord> for Product {
    type Error = String;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        if record.sku.is_empty() {
            return Err("empty sku".to_string());
        }
        if record.name.is_empty() {
            return Err("empty name".to_string());
        }
        Ok(Product {
            sku: record.sku.to_uppercase(),
            price_cents: parse_price_cents(&record.price)?,
            name: record.name,
        })
    }
}

/// Parses a non-negative decimal price with at most two fraction digits.
fn parse_price_cents(raw: &str) -> Result<i64, String> {
    let invalid = || format!("invalid price '{raw}'");
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || fraction.len() > 2 {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse::<i64>().map_err(|_| invalid())?,
    };
    whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(invalid)
}
