//! # Product Service
//!
//! Field-level CRUD for catalog products. Validation runs before any store
//! call; the only computed fields are the write timestamps. A product may
//! reference a category at either level of the hierarchy.

use std::collections::HashMap;

use chrono::Utc;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::error;

use crate::error::AppError;
use crate::fallback::{self, Sourced};
use crate::models::{
    none_if_empty, Brand, CategoryRef, Product, ProductForm, ProductWithCategory,
};
use crate::store::{decode, decode_all, Filter, Order, Store, StoreError, CATEGORIES, PRODUCTS};
use crate::views::View;

/// Views stale after any product mutation.
pub const PRODUCT_VIEWS: &[View] = &[View::Storefront, View::AdminProducts];

fn validated_fields(form: &ProductForm) -> Result<Value, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let price: f64 = form
        .price
        .as_deref()
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("price must be a number".into()))?;
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation("price must be non-negative".into()));
    }

    let affiliate_link = none_if_empty(form.affiliate_link.as_deref())
        .ok_or_else(|| AppError::Validation("affiliate link is required".into()))?;
    Url::parse(affiliate_link)
        .map_err(|_| AppError::Validation("affiliate link must be an absolute URL".into()))?;

    let brand: Brand = form
        .brand
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::Validation("unknown brand".into()))?;

    Ok(json!({
        "name": name,
        "description": none_if_empty(form.description.as_deref()),
        "price": price,
        "image_url": none_if_empty(form.image_url.as_deref()),
        "affiliate_link": affiliate_link,
        "brand": brand,
        "category_id": none_if_empty(form.category_id.as_deref()),
        "is_active": form.is_active.as_deref() == Some("true"),
    }))
}

pub async fn create(store: &dyn Store, form: &ProductForm) -> Result<&'static [View], AppError> {
    let mut record = validated_fields(form)?;
    let now = Utc::now();
    record["created_at"] = json!(now);
    record["updated_at"] = json!(now);

    if let Err(e) = store.insert(PRODUCTS, record).await {
        error!("Error creating product: {e}");
        return Err(e.into());
    }

    Ok(PRODUCT_VIEWS)
}

pub async fn update(
    store: &dyn Store,
    id: &str,
    form: &ProductForm,
) -> Result<&'static [View], AppError> {
    let mut patch = validated_fields(form)?;
    patch["updated_at"] = json!(Utc::now());

    store.update(PRODUCTS, id, patch).await.map_err(|e| {
        if matches!(e, StoreError::RowNotFound) {
            AppError::NotFound("product")
        } else {
            error!("Error updating product: {e}");
            e.into()
        }
    })?;

    Ok(PRODUCT_VIEWS)
}

pub async fn delete(store: &dyn Store, id: &str) -> Result<&'static [View], AppError> {
    store.delete(PRODUCTS, id).await.map_err(|e| {
        error!("Error deleting product {id}: {e}");
        AppError::from(e)
    })?;

    Ok(PRODUCT_VIEWS)
}

pub async fn set_active(
    store: &dyn Store,
    id: &str,
    is_active: bool,
) -> Result<&'static [View], AppError> {
    let patch = json!({ "is_active": is_active, "updated_at": Utc::now() });

    store.update(PRODUCTS, id, patch).await.map_err(|e| {
        if matches!(e, StoreError::RowNotFound) {
            AppError::NotFound("product")
        } else {
            error!("Error toggling product {id}: {e}");
            e.into()
        }
    })?;

    Ok(PRODUCT_VIEWS)
}

fn join(products: Vec<Product>, categories: &[Value]) -> Vec<ProductWithCategory> {
    let refs: HashMap<String, CategoryRef> = categories
        .iter()
        .filter_map(|row| decode::<CategoryRef>(row.clone()).ok())
        .map(|category| (category.id.clone(), category))
        .collect();

    products
        .into_iter()
        .map(|product| ProductWithCategory {
            category: product
                .category_id
                .as_deref()
                .and_then(|id| refs.get(id).cloned()),
            product,
        })
        .collect()
}

/// Active products for the storefront, newest first, joined with their
/// category. Both reads are issued concurrently; the built-in samples take
/// over when the store is unreachable or has no active products.
pub async fn storefront(store: &dyn Store, affiliate_id: &str) -> Sourced<Vec<ProductWithCategory>> {
    let (products_result, categories_result) = tokio::join!(
        store.select(
            PRODUCTS,
            Some(Filter::eq("is_active", "true")),
            Some(Order::descending("created_at")),
        ),
        store.select(CATEGORIES, None, Some(Order::ascending("order_index"))),
    );

    let products = match products_result.and_then(decode_all::<Product>) {
        Ok(products) if !products.is_empty() => products,
        Ok(_) => return Sourced::Fallback(fallback::sample_products(affiliate_id)),
        Err(e) => {
            error!("Error fetching products: {e}");
            return Sourced::Fallback(fallback::sample_products(affiliate_id));
        }
    };

    let categories = categories_result.unwrap_or_else(|e| {
        error!("Error fetching categories for join: {e}");
        Vec::new()
    });

    Sourced::Live(join(products, &categories))
}

/// Admin listing of every product, newest first. Empty on store failure.
pub async fn list(store: &dyn Store) -> Vec<ProductWithCategory> {
    let (products_result, categories_result) = tokio::join!(
        store.select(PRODUCTS, None, Some(Order::descending("created_at"))),
        store.select(CATEGORIES, None, Some(Order::ascending("order_index"))),
    );

    let products = match products_result.and_then(decode_all::<Product>) {
        Ok(products) => products,
        Err(e) => {
            error!("Error fetching products: {e}");
            return Vec::new();
        }
    };

    let categories = categories_result.unwrap_or_else(|e| {
        error!("Error fetching categories for join: {e}");
        Vec::new()
    });

    join(products, &categories)
}

pub async fn get(store: &dyn Store, id: &str) -> Result<ProductWithCategory, AppError> {
    let rows = store
        .select(PRODUCTS, Some(Filter::eq("id", id)), None)
        .await?;
    let row = rows.into_iter().next().ok_or(AppError::NotFound("product"))?;
    let product: Product = decode(row)?;

    let category = match &product.category_id {
        Some(category_id) => store
            .select(CATEGORIES, Some(Filter::eq("id", category_id.clone())), None)
            .await?
            .into_iter()
            .next()
            .and_then(|row| decode::<CategoryRef>(row).ok()),
        None => None,
    };

    Ok(ProductWithCategory { product, category })
}
