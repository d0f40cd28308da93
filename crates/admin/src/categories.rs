//! Categories table and create/edit form for the back office.
//!
//! Deletes run through a client-side guard before the confirmation dialog
//! ever opens: a category with subcategories or products shows the reason
//! instead of the dialog, and the server conflict response stays the
//! backstop for races.

use std::collections::HashMap;

use chispa_client::api::{AdminApi, CatalogApi, CategoryFilters, CategoryInput};
use chispa_client::error::{ApiError, Notice, NoticeKind};
use chispa_core::action::ActionState;
use chispa_core::catalog::{CategoryNode, Page};
use chispa_core::confirm::ConfirmDialog;
use chispa_core::delete::DeleteGuard;
use chispa_core::types::CategoryId;

use crate::form::FieldIssue;

/// One row of the categories table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    /// Parent name for subcategory rows, `None` for mains.
    pub parent_name: Option<String>,
    pub is_active: bool,
    pub children_count: u32,
    pub products_count: u32,
    /// False renders the delete control disabled with the reason nearby.
    pub can_delete: bool,
    /// False while a row action or the delete dialog is in flight.
    pub controls_enabled: bool,
}

impl CategoryRow {
    fn from_node(node: &CategoryNode, controls_enabled: bool) -> Self {
        let guard = DeleteGuard::for_category(node.children_count, node.products_count);
        Self {
            id: node.id,
            name: node.name.clone(),
            slug: node.slug.clone(),
            parent_name: node.parent.as_ref().map(|parent| parent.name.clone()),
            is_active: node.is_active,
            children_count: node.children_count,
            products_count: node.products_count,
            can_delete: guard.can_delete,
            controls_enabled,
        }
    }
}

/// State of the categories table.
pub struct CategoriesPage<'a> {
    api: &'a dyn AdminApi,
    catalog: &'a dyn CatalogApi,
    page: Page<CategoryNode>,
    filters: CategoryFilters,
    row_actions: HashMap<CategoryId, ActionState>,
    delete_dialog: ConfirmDialog<CategoryId>,
    loading: ActionState,
    notice: Option<Notice>,
}

impl<'a> CategoriesPage<'a> {
    #[must_use]
    pub fn new(api: &'a dyn AdminApi, catalog: &'a dyn CatalogApi, page_size: u32) -> Self {
        Self {
            api,
            catalog,
            page: Page::empty(),
            filters: CategoryFilters {
                per_page: Some(page_size),
                ..CategoryFilters::default()
            },
            row_actions: HashMap::new(),
            delete_dialog: ConfirmDialog::new(),
            loading: ActionState::default(),
            notice: None,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load one page of the table under the current filters.
    pub async fn load(&mut self, page_number: u32) {
        if self.loading.begin().is_err() {
            return;
        }
        self.notice = None;
        match self.catalog.list_categories(&self.filters, page_number).await {
            Ok(page) => {
                self.page = page;
                self.row_actions
                    .retain(|id, _| self.page.data.iter().any(|node| node.id == *id));
                self.loading.succeed();
            }
            Err(e) => {
                tracing::error!(error = %e, page_number, "categories load failed");
                self.notice = Some(Notice::from(&e));
                self.loading.fail(e.to_string());
            }
        }
    }

    async fn reload(&mut self) {
        let current = self.page.current_page.max(1);
        self.load(current).await;
    }

    /// Step to the next page, when one exists.
    pub async fn next_page(&mut self) {
        if self.page.has_next_page() {
            let next = self.page.current_page + 1;
            self.load(next).await;
        }
    }

    /// Step to the previous page, when one exists.
    pub async fn previous_page(&mut self) {
        if self.page.has_previous_page() {
            let previous = self.page.current_page - 1;
            self.load(previous).await;
        }
    }

    /// Apply a search term and reload from the first page.
    pub async fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        let trimmed = term.trim();
        self.filters.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.load(1).await;
    }

    /// Narrow to the children of one main category, `None` for all.
    pub async fn set_parent(&mut self, parent: Option<CategoryId>) {
        self.filters.parent = parent;
        self.load(1).await;
    }

    // =========================================================================
    // Row actions
    // =========================================================================

    /// Flip the visibility of one category.
    pub async fn toggle_active(&mut self, id: CategoryId) {
        if self.delete_dialog.is_pending() || self.row_state(id).begin().is_err() {
            return;
        }
        match self.api.toggle_category_active(id).await {
            Ok(()) => {
                tracing::info!(category_id = %id, "Category toggled");
                self.row_state(id).succeed();
                self.reload().await;
            }
            Err(e @ ApiError::NotFound(_)) => {
                self.notice = Some(Notice::from(&e));
                self.row_state(id).succeed();
                self.reload().await;
            }
            Err(e) => {
                tracing::error!(category_id = %id, error = %e, "Failed to toggle category");
                self.notice = Some(Notice::from(&e));
                self.row_state(id).fail(e.to_string());
            }
        }
    }

    fn row_state(&mut self, id: CategoryId) -> &mut ActionState {
        self.row_actions.entry(id).or_default()
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Run the delete guard for one category and open the confirmation
    /// when it passes. A blocked delete surfaces the reason instead and
    /// never opens the dialog.
    pub fn request_delete(&mut self, id: CategoryId) {
        let Some(node) = self.page.data.iter().find(|node| node.id == id) else {
            return;
        };
        let guard = DeleteGuard::for_category(node.children_count, node.products_count);
        match guard.blocking_reason {
            None => self.delete_dialog.open(id),
            Some(reason) => {
                self.notice = Some(Notice {
                    kind: NoticeKind::Blocking,
                    message: reason.message(),
                });
            }
        }
    }

    /// Close the delete confirmation without acting.
    pub fn cancel_delete(&mut self) {
        self.delete_dialog.dismiss();
    }

    /// Run the confirmed delete, then reload the listing.
    pub async fn confirm_delete(&mut self) {
        let Some(id) = self.delete_dialog.begin() else {
            return;
        };
        match self.api.delete_category(id).await {
            Ok(()) => {
                tracing::info!(category_id = %id, "Category deleted");
                self.delete_dialog.complete();
                self.row_actions.remove(&id);
                let target = self.page_after_removal();
                self.load(target).await;
            }
            Err(ApiError::Conflict(message)) => {
                // the guard passed on stale counts; refresh them
                tracing::warn!(category_id = %id, %message, "Category delete conflicted");
                self.notice = Some(Notice {
                    kind: NoticeKind::Blocking,
                    message: message.clone(),
                });
                self.delete_dialog.fail(message);
                self.reload().await;
            }
            Err(e @ ApiError::NotFound(_)) => {
                self.notice = Some(Notice::from(&e));
                self.delete_dialog.complete();
                self.reload().await;
            }
            Err(e) => {
                tracing::error!(category_id = %id, error = %e, "Failed to delete category");
                self.notice = Some(Notice::from(&e));
                self.delete_dialog.fail(e.to_string());
            }
        }
    }

    fn page_after_removal(&self) -> u32 {
        if self.page.data.len() == 1 && self.page.has_previous_page() {
            self.page.current_page - 1
        } else {
            self.page.current_page.max(1)
        }
    }

    // =========================================================================
    // Views & accessors
    // =========================================================================

    /// Rows for the table, mains and subcategories flattened together.
    #[must_use]
    pub fn rows(&self) -> Vec<CategoryRow> {
        self.page
            .data
            .iter()
            .map(|node| {
                let enabled = !self.delete_dialog.is_pending()
                    && self
                        .row_actions
                        .get(&node.id)
                        .is_none_or(ActionState::is_enabled);
                CategoryRow::from_node(node, enabled)
            })
            .collect()
    }

    #[must_use]
    pub const fn page(&self) -> &Page<CategoryNode> {
        &self.page
    }

    #[must_use]
    pub const fn is_delete_dialog_open(&self) -> bool {
        self.delete_dialog.is_open()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading.is_pending()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}

// =============================================================================
// Form
// =============================================================================

/// Create/edit form for a category.
///
/// The slug tracks the name (`Chispas Frías` becomes `chispas-frias`)
/// until the operator edits it by hand; editing an existing category
/// never rewrites its slug behind the operator's back.
pub struct CategoryForm<'a> {
    api: &'a dyn AdminApi,
    category_id: Option<CategoryId>,
    name: String,
    slug: String,
    slug_edited: bool,
    parent_id: Option<CategoryId>,
    is_active: bool,
    sort_order: String,
    issues: Vec<FieldIssue>,
    saving: ActionState,
    saved: Option<CategoryNode>,
    notice: Option<Notice>,
}

impl<'a> CategoryForm<'a> {
    /// Blank form for creating a category. New categories start visible.
    #[must_use]
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self {
            api,
            category_id: None,
            name: String::new(),
            slug: String::new(),
            slug_edited: false,
            parent_id: None,
            is_active: true,
            sort_order: "0".to_string(),
            issues: Vec::new(),
            saving: ActionState::default(),
            saved: None,
            notice: None,
        }
    }

    /// Form prefilled from an existing category. The slug counts as
    /// hand-edited so renaming does not move the category's URL.
    #[must_use]
    pub fn edit(api: &'a dyn AdminApi, node: &CategoryNode) -> Self {
        Self {
            category_id: Some(node.id),
            name: node.name.clone(),
            slug: node.slug.clone(),
            slug_edited: true,
            parent_id: node.parent.as_ref().map(|parent| parent.id),
            is_active: node.is_active,
            sort_order: node.sort_order.to_string(),
            ..Self::new(api)
        }
    }

    // =========================================================================
    // Field setters
    // =========================================================================

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
        if !self.slug_edited {
            self.slug = slug::slugify(&self.name);
        }
        self.clear_issue("name");
    }

    pub fn set_slug(&mut self, value: impl Into<String>) {
        self.slug = value.into();
        self.slug_edited = true;
        self.clear_issue("slug");
    }

    pub fn set_parent(&mut self, parent: Option<CategoryId>) {
        self.parent_id = parent;
        self.clear_issue("parent_id");
    }

    pub fn set_active(&mut self, value: bool) {
        self.is_active = value;
    }

    pub fn set_sort_order(&mut self, value: impl Into<String>) {
        self.sort_order = value.into();
        self.clear_issue("sort_order");
    }

    fn clear_issue(&mut self, field: &str) {
        self.issues.retain(|issue| issue.field != field);
    }

    // =========================================================================
    // Save
    // =========================================================================

    fn validate(&mut self) -> Option<CategoryInput> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(FieldIssue::new("name", "El nombre es obligatorio"));
        }
        let slug = self.slug.trim();
        if slug.is_empty() {
            issues.push(FieldIssue::new("slug", "El slug es obligatorio"));
        } else if slug != slug::slugify(slug) {
            issues.push(FieldIssue::new(
                "slug",
                "El slug solo puede tener letras, números y guiones",
            ));
        }
        let sort_order = match self.sort_order.trim().parse::<i32>() {
            Ok(sort_order) => Some(sort_order),
            Err(_) => {
                issues.push(FieldIssue::new("sort_order", "El orden debe ser un número"));
                None
            }
        };

        self.issues = issues;
        if !self.issues.is_empty() {
            return None;
        }
        Some(CategoryInput {
            name: self.name.trim().to_string(),
            slug: slug.to_string(),
            parent_id: self.parent_id,
            is_active: self.is_active,
            sort_order: sort_order?,
        })
    }

    /// Validate and save. Nothing is sent while validation fails.
    pub async fn save(&mut self) {
        let Some(input) = self.validate() else {
            return;
        };
        if self.saving.begin().is_err() {
            return;
        }
        self.notice = None;
        let result = match self.category_id {
            None => self.api.create_category(&input).await,
            Some(id) => self.api.update_category(id, &input).await,
        };
        match result {
            Ok(node) => {
                if self.category_id.is_none() {
                    tracing::info!(category_id = %node.id, name = %node.name, "Category created");
                } else {
                    tracing::info!(category_id = %node.id, "Category updated");
                }
                self.category_id = Some(node.id);
                self.saved = Some(node);
                self.saving.succeed();
            }
            Err(ApiError::Validation { field, message }) => {
                self.apply_server_issue(field, message.clone());
                self.saving.fail(message);
            }
            Err(e @ ApiError::Conflict(_)) => {
                self.notice = Some(Notice::from(&e));
                self.saving.fail(e.to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save category");
                self.notice = Some(Notice::from(&e));
                self.saving.fail(e.to_string());
            }
        }
    }

    fn apply_server_issue(&mut self, field: Option<String>, message: String) {
        const FIELDS: [&str; 4] = ["name", "slug", "parent_id", "sort_order"];
        let known = field
            .as_deref()
            .and_then(|name| FIELDS.iter().find(|candidate| **candidate == name).copied());
        match known {
            Some(field) => self.issues.push(FieldIssue::new(field, message)),
            None => {
                self.notice = Some(Notice {
                    kind: NoticeKind::Field,
                    message,
                });
            }
        }
    }

    /// The saved category, handed over once.
    pub fn take_saved(&mut self) -> Option<CategoryNode> {
        self.saved.take()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub const fn parent_id(&self) -> Option<CategoryId> {
        self.parent_id
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn sort_order(&self) -> &str {
        &self.sort_order
    }

    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// The message for one field, when validation flagged it.
    #[must_use]
    pub fn issue_for(&self, field: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message.as_str())
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.category_id.is_some()
    }

    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.saving.is_pending()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chispa_client::api::{
        ApiResult, MediaInput, OfferInput, ProductFilters, ProductInput,
    };
    use chispa_core::catalog::{CategoryRef, Offer, Product};
    use chispa_core::types::{MediaId, OfferId, ProductId};

    use super::*;

    struct FakeBackoffice {
        categories: Mutex<Vec<CategoryNode>>,
        per_page: u32,
        list_calls: Mutex<Vec<(CategoryFilters, u32)>>,
        mutations: Mutex<Vec<String>>,
        conflict_on_delete: bool,
        conflict_on_save: bool,
    }

    impl FakeBackoffice {
        fn new(categories: Vec<CategoryNode>) -> Self {
            Self {
                categories: Mutex::new(categories),
                per_page: 15,
                list_calls: Mutex::new(Vec::new()),
                mutations: Mutex::new(Vec::new()),
                conflict_on_delete: false,
                conflict_on_save: false,
            }
        }

        fn last_list_call(&self) -> (CategoryFilters, u32) {
            self.list_calls.lock().unwrap().last().cloned().unwrap()
        }

        fn list_call_count(&self) -> usize {
            self.list_calls.lock().unwrap().len()
        }
    }

    fn page_of<T: Clone>(items: &[T], page: u32, per_page: u32) -> Page<T> {
        let start = ((page.max(1) - 1) * per_page) as usize;
        let data: Vec<T> = items
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        Page {
            data,
            current_page: page.max(1),
            last_page: u32::try_from(items.len()).unwrap().div_ceil(per_page).max(1),
            per_page,
            total: items.len() as u64,
        }
    }

    #[async_trait]
    impl CatalogApi for FakeBackoffice {
        async fn list_products(
            &self,
            _filters: &ProductFilters,
            _page: u32,
        ) -> ApiResult<Page<Product>> {
            Ok(Page::empty())
        }

        async fn get_product(&self, _id: ProductId) -> ApiResult<Product> {
            Err(ApiError::NotFound("No encontrado".to_string()))
        }

        async fn list_categories(
            &self,
            filters: &CategoryFilters,
            page: u32,
        ) -> ApiResult<Page<CategoryNode>> {
            self.list_calls.lock().unwrap().push((filters.clone(), page));
            let categories = self.categories.lock().unwrap().clone();
            Ok(page_of(&categories, page, self.per_page))
        }

        async fn get_category(&self, id: CategoryId) -> ApiResult<CategoryNode> {
            self.categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("No encontrado".to_string()))
        }
    }

    #[async_trait]
    impl AdminApi for FakeBackoffice {
        async fn create_product(
            &self,
            _input: &ProductInput,
            _media: &[MediaInput],
        ) -> ApiResult<Product> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn update_product(
            &self,
            _id: ProductId,
            _input: &ProductInput,
            _media_add: &[MediaInput],
            _media_remove: &[MediaId],
        ) -> ApiResult<Product> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn delete_product(&self, _id: ProductId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn set_primary_image(
            &self,
            _product_id: ProductId,
            _media_id: MediaId,
        ) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn toggle_product_active(&self, _id: ProductId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn toggle_product_featured(&self, _id: ProductId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn create_category(&self, input: &CategoryInput) -> ApiResult<CategoryNode> {
            if self.conflict_on_save {
                return Err(ApiError::Conflict("El slug ya está en uso".to_string()));
            }
            let mut categories = self.categories.lock().unwrap();
            let id = CategoryId::new(categories.len() as i64 + 100);
            let node = node_from_input(id, input);
            categories.push(node.clone());
            self.mutations
                .lock()
                .unwrap()
                .push(format!("create_category {}", input.slug));
            Ok(node)
        }

        async fn update_category(
            &self,
            id: CategoryId,
            input: &CategoryInput,
        ) -> ApiResult<CategoryNode> {
            let mut categories = self.categories.lock().unwrap();
            let slot = categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| ApiError::NotFound("No encontrado".to_string()))?;
            *slot = node_from_input(id, input);
            self.mutations
                .lock()
                .unwrap()
                .push(format!("update_category {id}"));
            Ok(slot.clone())
        }

        async fn delete_category(&self, id: CategoryId) -> ApiResult<()> {
            if self.conflict_on_delete {
                return Err(ApiError::Conflict(
                    "La categoría tiene productos asociados".to_string(),
                ));
            }
            self.mutations
                .lock()
                .unwrap()
                .push(format!("delete_category {id}"));
            self.categories.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }

        async fn toggle_category_active(&self, id: CategoryId) -> ApiResult<()> {
            let mut categories = self.categories.lock().unwrap();
            let Some(node) = categories.iter_mut().find(|c| c.id == id) else {
                return Err(ApiError::NotFound("No encontrado".to_string()));
            };
            node.is_active = !node.is_active;
            self.mutations
                .lock()
                .unwrap()
                .push(format!("toggle_category_active {id}"));
            Ok(())
        }

        async fn list_offers(&self, _page: u32) -> ApiResult<Page<Offer>> {
            Ok(Page::empty())
        }

        async fn create_offer(
            &self,
            _product_id: ProductId,
            _input: &OfferInput,
        ) -> ApiResult<Offer> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn update_offer(&self, _id: OfferId, _input: &OfferInput) -> ApiResult<Offer> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn delete_offer(&self, _id: OfferId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn toggle_offer_active(&self, _id: OfferId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }
    }

    fn node(id: i64, name: &str, parent: Option<(i64, &str)>) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            name: name.to_string(),
            slug: slug::slugify(name),
            parent: parent.map(|(parent_id, parent_name)| CategoryRef {
                id: CategoryId::new(parent_id),
                name: parent_name.to_string(),
                slug: slug::slugify(parent_name),
            }),
            is_active: true,
            sort_order: 0,
            children_count: 0,
            products_count: 0,
            children: Vec::new(),
        }
    }

    fn node_from_input(id: CategoryId, input: &CategoryInput) -> CategoryNode {
        CategoryNode {
            id,
            name: input.name.clone(),
            slug: input.slug.clone(),
            parent: input.parent_id.map(|parent_id| CategoryRef {
                id: parent_id,
                name: "Padre".to_string(),
                slug: "padre".to_string(),
            }),
            is_active: input.is_active,
            sort_order: input.sort_order,
            children_count: 0,
            products_count: 0,
            children: Vec::new(),
        }
    }

    fn fixture() -> FakeBackoffice {
        let mut chispas = node(1, "Chispas Frías", None);
        chispas.children_count = 2;
        chispas.products_count = 12;
        let mut interiores = node(2, "Interiores", Some((1, "Chispas Frías")));
        interiores.products_count = 3;
        let mut vacia = node(3, "Descontinuados", None);
        vacia.is_active = false;

        FakeBackoffice::new(vec![chispas, interiores, vacia])
    }

    #[tokio::test]
    async fn test_load_lists_every_category_with_the_page_size() {
        let api = fixture();
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        let (filters, page_number) = api.last_list_call();
        assert_eq!(page_number, 1);
        assert_eq!(filters.per_page, Some(15));

        // hidden categories stay listed for the admin
        let rows = page.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().any(|row| !row.is_active));
    }

    #[tokio::test]
    async fn test_rows_carry_parent_names_and_delete_guards() {
        let api = fixture();
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        let rows = page.rows();
        assert_eq!(rows[0].parent_name, None);
        assert!(!rows[0].can_delete);
        assert_eq!(rows[1].parent_name.as_deref(), Some("Chispas Frías"));
        assert!(!rows[1].can_delete);
        assert!(rows[2].can_delete);
    }

    #[tokio::test]
    async fn test_blocked_delete_reports_subcategories_and_skips_the_dialog() {
        let api = fixture();
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        page.request_delete(CategoryId::new(1));

        assert!(!page.is_delete_dialog_open());
        let notice = page.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Blocking);
        assert_eq!(
            notice.message,
            "No se puede eliminar: la categoría tiene 2 subcategorías."
        );
        assert!(api.mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_delete_reports_products_when_no_children_remain() {
        let api = fixture();
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        page.request_delete(CategoryId::new(2));

        assert!(!page.is_delete_dialog_open());
        assert_eq!(
            page.notice().unwrap().message,
            "No se puede eliminar: la categoría tiene 3 productos."
        );
    }

    #[tokio::test]
    async fn test_empty_category_deletes_after_confirmation() {
        let api = fixture();
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        page.request_delete(CategoryId::new(3));
        assert!(page.is_delete_dialog_open());
        assert!(api.mutations.lock().unwrap().is_empty());

        page.confirm_delete().await;

        assert!(!page.is_delete_dialog_open());
        assert_eq!(page.rows().len(), 2);
        assert_eq!(
            api.mutations.lock().unwrap().as_slice(),
            ["delete_category 3"]
        );
    }

    #[tokio::test]
    async fn test_conflicting_delete_surfaces_the_server_reason_and_reloads() {
        let mut api = fixture();
        api.conflict_on_delete = true;
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        page.request_delete(CategoryId::new(3));
        page.confirm_delete().await;

        let notice = page.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Blocking);
        assert_eq!(notice.message, "La categoría tiene productos asociados");
        // counts were stale; the listing refreshed to show the real ones
        assert_eq!(api.list_call_count(), 2);
        assert_eq!(page.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_active_reloads_the_listing() {
        let api = fixture();
        let mut page = CategoriesPage::new(&api, &api, 15);
        page.load(1).await;

        page.toggle_active(CategoryId::new(3)).await;

        assert_eq!(api.list_call_count(), 2);
        assert!(page.rows()[2].is_active);
    }

    #[tokio::test]
    async fn test_form_derives_the_slug_until_edited_by_hand() {
        let api = fixture();
        let mut form = CategoryForm::new(&api);

        form.set_name("Chispas Frías");
        assert_eq!(form.slug(), "chispas-frias");

        form.set_slug("patio");
        form.set_name("Otra cosa");
        assert_eq!(form.slug(), "patio");
    }

    #[tokio::test]
    async fn test_form_rejects_bad_input_all_at_once() {
        let api = fixture();
        let mut form = CategoryForm::new(&api);
        form.set_slug("No Es Un Slug");
        form.set_sort_order("abc");

        form.save().await;

        assert_eq!(form.issue_for("name"), Some("El nombre es obligatorio"));
        assert_eq!(
            form.issue_for("slug"),
            Some("El slug solo puede tener letras, números y guiones")
        );
        assert_eq!(
            form.issue_for("sort_order"),
            Some("El orden debe ser un número")
        );
        assert!(api.mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_form_creates_a_subcategory() {
        let api = fixture();
        let mut form = CategoryForm::new(&api);
        form.set_name("Exteriores");
        form.set_parent(Some(CategoryId::new(1)));
        form.set_sort_order("2");

        form.save().await;

        let saved = form.take_saved().unwrap();
        assert_eq!(saved.slug, "exteriores");
        assert_eq!(saved.parent.map(|p| p.id), Some(CategoryId::new(1)));
        assert_eq!(saved.sort_order, 2);
        assert_eq!(
            api.mutations.lock().unwrap().as_slice(),
            ["create_category exteriores"]
        );
    }

    #[tokio::test]
    async fn test_editing_keeps_the_slug_when_renaming() {
        let api = fixture();
        let original = api.categories.lock().unwrap()[0].clone();
        let mut form = CategoryForm::edit(&api, &original);

        form.set_name("Chispas de Interior");
        assert_eq!(form.slug(), "chispas-frias");

        form.save().await;
        let saved = form.take_saved().unwrap();
        assert_eq!(saved.name, "Chispas de Interior");
        assert_eq!(saved.slug, "chispas-frias");
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflict_leaves_the_form_open() {
        let mut api = fixture();
        api.conflict_on_save = true;
        let mut form = CategoryForm::new(&api);
        form.set_name("Chispas Frías");

        form.save().await;

        let notice = form.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Blocking);
        assert_eq!(notice.message, "El slug ya está en uso");
        assert!(form.take_saved().is_none());
        assert!(!form.is_saving());
    }
}
