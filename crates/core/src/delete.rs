//! Guards for destructive admin actions.
//!
//! Deletion rules are evaluated before the confirmation dialog ever opens:
//! a blocked action shows its reason instead of the dialog, so the server
//! conflict response is the backstop rather than the first line of defense.

/// Why a delete action is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBlock {
    /// The category still has subcategories. Checked first.
    HasSubcategories(u32),
    /// The category still has products.
    HasProducts(u32),
}

impl DeleteBlock {
    /// Message for the blocked-delete notice.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::HasSubcategories(1) => {
                "No se puede eliminar: la categoría tiene 1 subcategoría.".to_string()
            }
            Self::HasSubcategories(n) => {
                format!("No se puede eliminar: la categoría tiene {n} subcategorías.")
            }
            Self::HasProducts(1) => {
                "No se puede eliminar: la categoría tiene 1 producto.".to_string()
            }
            Self::HasProducts(n) => {
                format!("No se puede eliminar: la categoría tiene {n} productos.")
            }
        }
    }
}

/// Outcome of a delete pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteGuard {
    /// Whether the delete action may proceed to confirmation.
    pub can_delete: bool,
    /// First failing rule, in check order, when blocked.
    pub blocking_reason: Option<DeleteBlock>,
}

impl DeleteGuard {
    const fn allowed() -> Self {
        Self {
            can_delete: true,
            blocking_reason: None,
        }
    }

    const fn blocked(reason: DeleteBlock) -> Self {
        Self {
            can_delete: false,
            blocking_reason: Some(reason),
        }
    }

    /// Guard for deleting a category.
    ///
    /// Subcategories are checked before products: when both remain, the
    /// subcategories reason is the one reported.
    #[must_use]
    pub const fn for_category(children_count: u32, products_count: u32) -> Self {
        if children_count > 0 {
            return Self::blocked(DeleteBlock::HasSubcategories(children_count));
        }
        if products_count > 0 {
            return Self::blocked(DeleteBlock::HasProducts(products_count));
        }
        Self::allowed()
    }

    /// Guard for deleting a product. Always deletable; the Data API
    /// cascades the product's media and current offer.
    #[must_use]
    pub const fn for_product() -> Self {
        Self::allowed()
    }

    /// Guard for deleting an offer. Always deletable; the owning product
    /// simply reverts to its list price.
    #[must_use]
    pub const fn for_offer() -> Self {
        Self::allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_with_children_and_products_reports_children_first() {
        let guard = DeleteGuard::for_category(2, 5);
        assert!(!guard.can_delete);
        assert_eq!(guard.blocking_reason, Some(DeleteBlock::HasSubcategories(2)));
    }

    #[test]
    fn test_category_with_only_products_reports_products() {
        let guard = DeleteGuard::for_category(0, 5);
        assert!(!guard.can_delete);
        assert_eq!(guard.blocking_reason, Some(DeleteBlock::HasProducts(5)));
    }

    #[test]
    fn test_empty_category_is_deletable() {
        let guard = DeleteGuard::for_category(0, 0);
        assert!(guard.can_delete);
        assert_eq!(guard.blocking_reason, None);
    }

    #[test]
    fn test_products_and_offers_are_always_deletable() {
        assert!(DeleteGuard::for_product().can_delete);
        assert!(DeleteGuard::for_offer().can_delete);
    }

    #[test]
    fn test_block_messages_pluralize() {
        assert_eq!(
            DeleteBlock::HasSubcategories(1).message(),
            "No se puede eliminar: la categoría tiene 1 subcategoría."
        );
        assert!(DeleteBlock::HasProducts(5).message().contains("5 productos"));
    }
}
