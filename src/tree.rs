//! # Category Tree
//!
//! Organizes the flat `categories` table into the two-level hierarchy the
//! navigation renders: top-level categories in `order_index` order, each
//! carrying its subcategories.
//!
//! The builder is a total function over any row list. Rows whose
//! `parent_id` points at a missing category, or at a category that is
//! itself a subcategory, are dropped silently instead of failing the
//! render.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Category;

/// A top-level category with its direct subcategories attached.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Builds the display hierarchy from unordered category rows.
///
/// Top-level rows are sorted ascending by `order_index` with insertion
/// order breaking ties; subcategories are grouped under their parent and
/// sorted the same way.
pub fn organize(categories: &[Category]) -> Vec<CategoryNode> {
    let mut top_level: Vec<&Category> = categories
        .iter()
        .filter(|category| category.parent_id.is_none())
        .collect();
    // sort_by_key is stable, preserving insertion order between ties
    top_level.sort_by_key(|category| category.order_index);

    let mut by_parent: HashMap<&str, Vec<&Category>> = HashMap::new();
    for category in categories {
        if let Some(parent_id) = &category.parent_id {
            by_parent.entry(parent_id.as_str()).or_default().push(category);
        }
    }

    let mut nodes = Vec::with_capacity(top_level.len());
    for parent in top_level {
        let mut children = by_parent.remove(parent.id.as_str()).unwrap_or_default();
        children.sort_by_key(|child| child.order_index);

        nodes.push(CategoryNode {
            id: parent.id.clone(),
            name: parent.name.clone(),
            slug: parent.slug.clone(),
            subcategories: children
                .into_iter()
                .map(|child| Subcategory {
                    id: child.id.clone(),
                    name: child.name.clone(),
                    slug: child.slug.clone(),
                })
                .collect(),
        });
    }

    nodes
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::organize;
    use crate::models::Category;
    use crate::slug::slugify;

    fn category(id: &str, name: &str, parent_id: Option<&str>, order_index: i32) -> Category {
        Category {
            id: id.into(),
            name: name.into(),
            slug: slugify(name),
            parent_id: parent_id.map(Into::into),
            order_index,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(organize(&[]), vec![]);
    }

    #[test]
    fn test_scenario() {
        let rows = vec![
            category("1", "Perfumes", None, 1),
            category("2", "Body", None, 2),
            category("3", "Spray", Some("1"), 1),
        ];

        let tree = organize(&rows);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Perfumes");
        assert_eq!(tree[0].subcategories.len(), 1);
        assert_eq!(tree[0].subcategories[0].name, "Spray");
        assert_eq!(tree[1].name, "Body");
        assert!(tree[1].subcategories.is_empty());
    }

    #[test]
    fn test_top_level_ordering() {
        let rows = vec![
            category("1", "C", None, 3),
            category("2", "A", None, 1),
            category("3", "B", None, 2),
        ];

        let tree = organize(&rows);
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ordering_ties_are_stable() {
        let rows = vec![
            category("1", "First", None, 1),
            category("2", "Second", None, 1),
        ];

        let tree = organize(&rows);
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_subcategories_sorted_by_order() {
        let rows = vec![
            category("1", "Perfumes", None, 1),
            category("2", "Roll-on", Some("1"), 2),
            category("3", "Spray", Some("1"), 1),
        ];

        let tree = organize(&rows);
        let names: Vec<&str> = tree[0].subcategories.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Spray", "Roll-on"]);
    }

    #[test]
    fn test_orphan_is_excluded() {
        let rows = vec![
            category("1", "Perfumes", None, 1),
            category("2", "Lost", Some("missing"), 1),
        ];

        let tree = organize(&rows);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].subcategories.is_empty());
    }

    #[test]
    fn test_grandchild_is_excluded() {
        let rows = vec![
            category("1", "Perfumes", None, 1),
            category("2", "Spray", Some("1"), 1),
            category("3", "Mini spray", Some("2"), 1),
        ];

        let tree = organize(&rows);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].subcategories.len(), 1);
        assert_eq!(tree[0].subcategories[0].name, "Spray");
    }

    #[test]
    fn test_every_valid_row_appears_once() {
        let rows = vec![
            category("1", "Perfumes", None, 2),
            category("2", "Hogar", None, 1),
            category("3", "Spray", Some("1"), 1),
            category("4", "Velas", Some("2"), 1),
        ];

        let tree = organize(&rows);
        let total: usize = tree.iter().map(|n| 1 + n.subcategories.len()).sum();
        assert_eq!(total, rows.len());
    }
}
