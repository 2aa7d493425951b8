//! # Category Service
//!
//! Admin writes and public reads for the two-level category hierarchy.
//!
//! Writes always recompute the slug from the submitted name and replace all
//! four mutable fields; deleting a parent cascades over its direct children
//! as an explicit two-step sequence (children first, so a failure on the
//! second leg cannot leave dangling `parent_id` references).

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::error::AppError;
use crate::fallback::{self, Sourced};
use crate::models::{Category, CategoryForm, CategoryRef, CategoryWithParent};
use crate::slug::slugify;
use crate::store::{decode_all, Filter, Order, Store, StoreError, CATEGORIES};
use crate::tree::{organize, CategoryNode};
use crate::views::View;

/// Views stale after any category mutation.
pub const CATEGORY_VIEWS: &[View] = &[View::Storefront, View::AdminCategories];

pub async fn list(store: &dyn Store) -> Result<Vec<Category>, AppError> {
    let rows = store
        .select(CATEGORIES, None, Some(Order::ascending("order_index")))
        .await?;

    Ok(decode_all(rows)?)
}

/// Public navigation tree. Serves the built-in sample categories when the
/// store is unreachable or has no rows yet.
pub async fn tree(store: &dyn Store) -> Sourced<Vec<CategoryNode>> {
    match list(store).await {
        Ok(categories) if !categories.is_empty() => Sourced::Live(organize(&categories)),
        Ok(_) => Sourced::Fallback(organize(&fallback::sample_categories())),
        Err(e) => {
            error!("Error fetching categories: {e}");
            Sourced::Fallback(organize(&fallback::sample_categories()))
        }
    }
}

/// Admin listing: every category with its parent attached. Degrades to an
/// empty list on store failure; the form surface reports errors, the list
/// surface does not.
pub async fn list_with_parent(store: &dyn Store) -> Vec<CategoryWithParent> {
    let categories = match list(store).await {
        Ok(categories) => categories,
        Err(e) => {
            error!("Error fetching categories: {e}");
            return Vec::new();
        }
    };

    let refs: HashMap<&str, CategoryRef> = categories
        .iter()
        .map(|category| (category.id.as_str(), CategoryRef::from(category)))
        .collect();

    categories
        .iter()
        .map(|category| CategoryWithParent {
            parent: category
                .parent_id
                .as_deref()
                .and_then(|parent_id| refs.get(parent_id).cloned()),
            category: category.clone(),
        })
        .collect()
}

fn validated_name(form: &CategoryForm) -> Result<&str, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    Ok(name)
}

pub async fn create(store: &dyn Store, form: &CategoryForm) -> Result<&'static [View], AppError> {
    let name = validated_name(form)?;

    let record = json!({
        "name": name,
        "slug": slugify(name),
        "parent_id": form.parent(),
        "order_index": form.order(),
        "created_at": Utc::now(),
    });

    if let Err(e) = store.insert(CATEGORIES, record).await {
        error!("Error creating category: {e}");
        return Err(e.into());
    }

    Ok(CATEGORY_VIEWS)
}

/// Full replacement of the mutable fields; the slug is re-derived from the
/// new name. Updating a missing id is an error, not a silent no-op.
pub async fn update(
    store: &dyn Store,
    id: &str,
    form: &CategoryForm,
) -> Result<&'static [View], AppError> {
    let name = validated_name(form)?;

    let patch = json!({
        "name": name,
        "slug": slugify(name),
        "parent_id": form.parent(),
        "order_index": form.order(),
    });

    store.update(CATEGORIES, id, patch).await.map_err(|e| {
        if matches!(e, StoreError::RowNotFound) {
            AppError::NotFound("category")
        } else {
            error!("Error updating category: {e}");
            e.into()
        }
    })?;

    Ok(CATEGORY_VIEWS)
}

/// Deletes a category and cascades over its direct children.
pub async fn delete(store: &dyn Store, id: &str) -> Result<&'static [View], AppError> {
    // Children go first: if the parent delete then fails, no row is left
    // pointing at a missing parent.
    store
        .delete_where(CATEGORIES, Filter::eq("parent_id", id))
        .await
        .map_err(|e| {
            error!("Error deleting subcategories of {id}: {e}");
            AppError::from(e)
        })?;

    store.delete(CATEGORIES, id).await.map_err(|e| {
        error!("Error deleting category {id}: {e}");
        AppError::from(e)
    })?;

    Ok(CATEGORY_VIEWS)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::{AuthUser, Session};

    fn form(name: &str, parent_id: Option<&str>, order_index: Option<&str>) -> CategoryForm {
        CategoryForm {
            name: name.into(),
            parent_id: parent_id.map(Into::into),
            order_index: order_index.map(Into::into),
        }
    }

    async fn seed(store: &MemoryStore, id: &str, name: &str, parent_id: Option<&str>) {
        store
            .insert(
                CATEGORIES,
                json!({
                    "id": id,
                    "name": name,
                    "slug": slugify(name),
                    "parent_id": parent_id,
                    "order_index": 0,
                    "created_at": Utc::now(),
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_defaults() {
        let store = MemoryStore::new();
        let views = create(&store, &form("Café & Té", Some(""), None)).await.unwrap();
        assert_eq!(views, CATEGORY_VIEWS);

        let categories = list(&store).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug, "cafe-te");
        assert_eq!(categories[0].parent_id, None);
        assert_eq!(categories[0].order_index, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let store = MemoryStore::new();
        let result = create(&store, &form("   ", None, None)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_every_field() {
        let store = MemoryStore::new();
        seed(&store, "p1", "Perfumes", None).await;
        seed(&store, "c1", "Spray", Some("p1")).await;

        update(&store, "c1", &form("Colonias", None, Some("7")))
            .await
            .unwrap();

        let updated = list(&store)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.id == "c1")
            .unwrap();
        assert_eq!(updated.name, "Colonias");
        assert_eq!(updated.slug, "colonias");
        assert_eq!(updated.parent_id, None);
        assert_eq!(updated.order_index, 7);
    }

    #[tokio::test]
    async fn test_update_missing_id() {
        let store = MemoryStore::new();
        let result = update(&store, "ghost", &form("Rostro", None, None)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children() {
        let store = MemoryStore::new();
        seed(&store, "p1", "Perfumes", None).await;
        seed(&store, "c1", "Spray", Some("p1")).await;
        seed(&store, "c2", "Roll-on", Some("p1")).await;
        seed(&store, "p2", "Hogar", None).await;

        delete(&store, "p1").await.unwrap();

        let remaining = list(&store).await.unwrap();
        let ids: Vec<&str> = remaining.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p2"]);
    }

    /// Store whose row deletes fail after the filtered (cascade) delete has
    /// already gone through, to exercise a partial cascade.
    struct ParentDeleteFails(MemoryStore);

    #[async_trait]
    impl Store for ParentDeleteFails {
        async fn select(
            &self,
            table: &str,
            filter: Option<Filter>,
            order: Option<Order>,
        ) -> Result<Vec<Value>, StoreError> {
            self.0.select(table, filter, order).await
        }

        async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
            self.0.insert(table, record).await
        }

        async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
            self.0.update(table, id, patch).await
        }

        async fn delete(&self, _table: &str, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Unreachable("connection reset".into()))
        }

        async fn delete_where(&self, table: &str, filter: Filter) -> Result<u64, StoreError> {
            self.0.delete_where(table, filter).await
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
            self.0.sign_in(email, password).await
        }

        async fn sign_out(&self, token: &str) -> Result<(), StoreError> {
            self.0.sign_out(token).await
        }

        async fn current_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError> {
            self.0.current_user(token).await
        }
    }

    #[tokio::test]
    async fn test_partial_cascade_surfaces_error() {
        let store = ParentDeleteFails(MemoryStore::new());
        seed(&store.0, "p1", "Perfumes", None).await;
        seed(&store.0, "c1", "Spray", Some("p1")).await;
        seed(&store.0, "c2", "Roll-on", Some("p1")).await;

        let result = delete(&store, "p1").await;
        assert!(matches!(result, Err(AppError::Store(_))));

        // children went first, so the parent is all that can be left behind
        let remaining = list(&store).await.unwrap();
        let ids: Vec<&str> = remaining.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p1"]);
        assert!(remaining.iter().all(|c| c.parent_id.is_none()));
    }

    #[tokio::test]
    async fn test_admin_listing_attaches_parent() {
        let store = MemoryStore::new();
        seed(&store, "p1", "Perfumes", None).await;
        seed(&store, "c1", "Spray", Some("p1")).await;

        let listing = list_with_parent(&store).await;
        let child = listing.iter().find(|c| c.category.id == "c1").unwrap();
        assert_eq!(child.parent.as_ref().map(|p| p.name.as_str()), Some("Perfumes"));
    }

    #[tokio::test]
    async fn test_tree_falls_back_when_empty() {
        let store = MemoryStore::new();
        let tree = tree(&store).await;
        assert!(tree.is_fallback());

        let nodes = tree.into_inner();
        assert_eq!(nodes.len(), 7);
        assert_eq!(nodes[0].name, "Perfumes");
    }
}
