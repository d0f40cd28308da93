//! Category hierarchy views: breadcrumbs, ordering and display counts.

use crate::catalog::CategoryNode;
use crate::types::CategoryId;

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub slug: String,
}

/// Display view over one category node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    /// Breadcrumb sequence: `[parent, self]` for a subcategory, `[self]`
    /// for a main category.
    pub breadcrumbs: Vec<Crumb>,
    /// True for top-level categories.
    pub is_main: bool,
    /// Direct subcategory count.
    pub children_count: u32,
    /// Product count shown next to the name. Aggregated server-side for
    /// main categories and displayed verbatim.
    pub product_count: u32,
}

impl From<&CategoryNode> for CategoryView {
    fn from(node: &CategoryNode) -> Self {
        let mut breadcrumbs = Vec::with_capacity(2);
        if let Some(parent) = &node.parent {
            breadcrumbs.push(Crumb {
                name: parent.name.clone(),
                slug: parent.slug.clone(),
            });
        }
        breadcrumbs.push(Crumb {
            name: node.name.clone(),
            slug: node.slug.clone(),
        });
        Self {
            breadcrumbs,
            is_main: node.parent.is_none(),
            children_count: node.children_count,
            product_count: node.products_count,
        }
    }
}

/// Main categories in display order (`sort_order`, then name).
#[must_use]
pub fn main_categories(all: &[CategoryNode]) -> Vec<&CategoryNode> {
    let mut mains: Vec<&CategoryNode> = all.iter().filter(|node| node.is_main()).collect();
    mains.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
    mains
}

/// Direct subcategories of `parent_id` in display order.
///
/// Prefers children embedded on the parent node; falls back to scanning the
/// flat list when the parent is absent or came without embeds.
#[must_use]
pub fn subcategories_of(all: &[CategoryNode], parent_id: CategoryId) -> Vec<&CategoryNode> {
    let mut children: Vec<&CategoryNode> = match all
        .iter()
        .find(|node| node.id == parent_id && !node.children.is_empty())
    {
        Some(parent) => parent.children.iter().collect(),
        None => all
            .iter()
            .filter(|node| {
                node.parent
                    .as_ref()
                    .is_some_and(|parent| parent.id == parent_id)
            })
            .collect(),
    };
    children.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
    children
}
