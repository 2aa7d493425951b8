use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row shape of the `categories` table.
///
/// `parent_id` of `None` marks a top-level category; anything else is a
/// subcategory. Depth beyond two levels is a data integrity violation the
/// tree builder tolerates by omission rather than rejecting here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// The two brands the catalog carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brand {
    Natura,
    NovaVenta,
}

impl FromStr for Brand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Natura" => Ok(Brand::Natura),
            "NovaVenta" => Ok(Brand::NovaVenta),
            _ => Err(()),
        }
    }
}

/// Row shape of the `products` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub affiliate_link: String,
    pub brand: Brand,
    pub category_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Slim category reference embedded into joined payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategoryRef {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

/// Product joined with its category, if it has one.
#[derive(Clone, Debug, Serialize)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<CategoryRef>,
}

/// Category joined with its parent, for the admin listing.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryWithParent {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<CategoryRef>,
}

/// Form-encoded payload of the admin category form.
///
/// Optional fields arrive as empty strings when left blank; `order_index`
/// arrives as free text and falls back to 0 when missing or unparsable.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order_index: Option<String>,
}

impl CategoryForm {
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn order(&self) -> i32 {
        self.order_index
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Form-encoded payload of the admin product form.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub affiliate_link: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    #[serde(default)]
    pub is_active: Option<String>,
}

pub fn none_if_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
