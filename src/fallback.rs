//! Built-in sample catalog served while the hosted store is unreachable or
//! still empty, so the storefront never renders blank.

use chrono::Utc;

use crate::models::{Brand, Category, Product, ProductWithCategory};

/// Read payload tagged with where it came from. Fallback content is good
/// enough to render but must not be cached, or a recovered store would keep
/// serving samples until the next mutation.
#[derive(Debug)]
pub enum Sourced<T> {
    Live(T),
    Fallback(T),
}

impl<T> Sourced<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Live(value) | Sourced::Fallback(value) => value,
        }
    }
}

/// Appends the affiliate ref tag to a product link.
pub fn affiliate_link(base_url: &str, affiliate_id: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}ref={affiliate_id}")
}

pub fn sample_products(affiliate_id: &str) -> Vec<ProductWithCategory> {
    let samples: [(&str, f64, &str, Brand); 6] = [
        (
            "Chronos Desodorante Colonia",
            89.90,
            "https://natura.com.br/produto/chronos",
            Brand::Natura,
        ),
        (
            "Ekos Castanha Hidratante Corporal",
            45.90,
            "https://natura.com.br/produto/ekos-castanha",
            Brand::Natura,
        ),
        (
            "Luna Perfume Feminino",
            129.90,
            "https://natura.com.br/produto/luna",
            Brand::Natura,
        ),
        (
            "Kit Cuidado Facial Tododia",
            99.90,
            "https://natura.com.br/produto/tododia",
            Brand::Natura,
        ),
        (
            "Perfume Masculino Essencial",
            79.90,
            "https://novaventa.com/producto/perfume-essencial",
            Brand::NovaVenta,
        ),
        (
            "Crema Hidratante Natural",
            55.90,
            "https://novaventa.com/producto/crema-hidratante",
            Brand::NovaVenta,
        ),
    ];

    let now = Utc::now();
    samples
        .iter()
        .enumerate()
        .map(|(index, (name, price, link, brand))| ProductWithCategory {
            product: Product {
                id: (index + 1).to_string(),
                name: (*name).into(),
                description: None,
                price: *price,
                image_url: Some(format!("https://picsum.photos/400/400?random={}", index + 1)),
                affiliate_link: affiliate_link(link, affiliate_id),
                brand: *brand,
                category_id: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            category: None,
        })
        .collect()
}

pub fn sample_categories() -> Vec<Category> {
    let names = [
        "Perfumes",
        "Cuidados diarios",
        "Cabello",
        "Rostro",
        "Maquillaje",
        "Hogar",
        "Cocina",
    ];

    let now = Utc::now();
    names
        .iter()
        .enumerate()
        .map(|(index, name)| Category {
            id: (index + 1).to_string(),
            name: (*name).into(),
            slug: crate::slug::slugify(name),
            parent_id: None,
            order_index: (index + 1) as i32,
            created_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affiliate_link_separator() {
        assert_eq!(
            affiliate_link("https://natura.com.br/produto/luna", "AFILIADO123"),
            "https://natura.com.br/produto/luna?ref=AFILIADO123"
        );
        assert_eq!(
            affiliate_link("https://novaventa.com/p?x=1", "AFILIADO123"),
            "https://novaventa.com/p?x=1&ref=AFILIADO123"
        );
    }

    #[test]
    fn test_samples_are_storefront_ready() {
        let products = sample_products("AFILIADO123");
        assert_eq!(products.len(), 6);
        assert!(products.iter().all(|p| p.product.is_active));

        let categories = sample_categories();
        assert_eq!(categories.len(), 7);
        assert!(categories.iter().all(|c| c.parent_id.is_none()));
    }
}
