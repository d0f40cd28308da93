//! Products table and create/edit form for the back office.
//!
//! Every mutation reloads the listing from the Data API afterwards, so
//! the table always shows what the server accepted rather than an
//! optimistic local patch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use chispa_client::api::{
    AdminApi, CatalogApi, CategoryFilters, MediaInput, ProductFilters, ProductInput, StatusFilter,
    StockFilter,
};
use chispa_client::error::{ApiError, Notice, NoticeKind};
use chispa_core::action::ActionState;
use chispa_core::catalog::{CategoryNode, MediaItem, Page, Product};
use chispa_core::confirm::ConfirmDialog;
use chispa_core::delete::DeleteGuard;
use chispa_core::pricing::resolve_price;
use chispa_core::stock;
use chispa_core::types::{CategoryId, MediaId, ProductId};

use crate::form::{self, FieldIssue};

/// One row of the products table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: ProductId,
    pub title: String,
    /// Effective price as of render time (`$12.000`).
    pub price: String,
    /// Crossed-out list price while an offer applies.
    pub list_price: Option<String>,
    /// Availability line (`5 unidades`, `Sin stock`).
    pub stock_label: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub category_name: String,
    /// Thumbnail, when the gallery has one.
    pub image_url: Option<String>,
    /// False while a row action or the delete dialog is in flight.
    pub controls_enabled: bool,
}

impl ProductRow {
    fn from_product(product: &Product, now: DateTime<Utc>, controls_enabled: bool) -> Self {
        let quote = resolve_price(product.price, product.current_offer.as_ref(), now);
        Self {
            id: product.id,
            title: product.title.clone(),
            price: quote.effective_price.to_string(),
            list_price: quote.has_offer.then(|| product.price.to_string()),
            stock_label: stock::availability_label(product.stock),
            is_active: product.is_active,
            is_featured: product.is_featured,
            category_name: product.category.name.clone(),
            image_url: product.primary_media().map(|media| media.url.clone()),
            controls_enabled,
        }
    }
}

enum RowToggle {
    Active,
    Featured,
}

/// State of the products table.
pub struct ProductsPage<'a> {
    api: &'a dyn AdminApi,
    catalog: &'a dyn CatalogApi,
    page: Page<Product>,
    /// Category tree for the filter dropdown.
    categories: Vec<CategoryNode>,
    filters: ProductFilters,
    row_actions: HashMap<ProductId, ActionState>,
    delete_dialog: ConfirmDialog<ProductId>,
    loading: ActionState,
    notice: Option<Notice>,
}

impl<'a> ProductsPage<'a> {
    #[must_use]
    pub fn new(api: &'a dyn AdminApi, catalog: &'a dyn CatalogApi, page_size: u32) -> Self {
        Self {
            api,
            catalog,
            page: Page::empty(),
            categories: Vec::new(),
            filters: ProductFilters {
                per_page: Some(page_size),
                ..ProductFilters::default()
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
        match self.fetch(page_number).await {
            Ok(()) => self.loading.succeed(),
            Err(e) => {
                tracing::error!(error = %e, page_number, "products load failed");
                self.notice = Some(Notice::from(&e));
                self.loading.fail(e.to_string());
            }
        }
    }

    async fn fetch(&mut self, page_number: u32) -> Result<(), ApiError> {
        if self.categories.is_empty() {
            let categories = self
                .catalog
                .list_categories(&CategoryFilters::default(), 1)
                .await?;
            self.categories = categories.data;
        }
        self.page = self.catalog.list_products(&self.filters, page_number).await?;
        self.row_actions
            .retain(|id, _| self.page.data.iter().any(|product| product.id == *id));
        Ok(())
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

    // =========================================================================
    // Filters
    // =========================================================================

    /// Apply a search term and reload from the first page.
    pub async fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        let trimmed = term.trim();
        self.filters.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.load(1).await;
    }

    /// Narrow to one category, `None` for all.
    pub async fn set_category(&mut self, category: Option<CategoryId>) {
        self.filters.category = category;
        self.load(1).await;
    }

    /// Narrow by visibility, `None` for all.
    pub async fn set_status(&mut self, status: Option<StatusFilter>) {
        self.filters.status = status;
        self.load(1).await;
    }

    /// Narrow by stock slice, `None` for all.
    pub async fn set_stock(&mut self, stock: Option<StockFilter>) {
        self.filters.stock = stock;
        self.load(1).await;
    }

    // =========================================================================
    // Row actions
    // =========================================================================

    /// Flip the storefront visibility of one product.
    pub async fn toggle_active(&mut self, id: ProductId) {
        self.run_toggle(id, RowToggle::Active).await;
    }

    /// Flip the featured flag of one product.
    pub async fn toggle_featured(&mut self, id: ProductId) {
        self.run_toggle(id, RowToggle::Featured).await;
    }

    async fn run_toggle(&mut self, id: ProductId, toggle: RowToggle) {
        if self.delete_dialog.is_pending() || self.row_state(id).begin().is_err() {
            return;
        }
        let api = self.api;
        let result = match toggle {
            RowToggle::Active => api.toggle_product_active(id).await,
            RowToggle::Featured => api.toggle_product_featured(id).await,
        };
        match result {
            Ok(()) => {
                tracing::info!(product_id = %id, "Product toggled");
                self.row_state(id).succeed();
                self.reload().await;
            }
            Err(e @ ApiError::NotFound(_)) => {
                // deleted elsewhere; the reload drops the row
                self.notice = Some(Notice::from(&e));
                self.row_state(id).succeed();
                self.reload().await;
            }
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Failed to toggle product");
                self.notice = Some(Notice::from(&e));
                self.row_state(id).fail(e.to_string());
            }
        }
    }

    fn row_state(&mut self, id: ProductId) -> &mut ActionState {
        self.row_actions.entry(id).or_default()
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Open the delete confirmation for one product.
    pub fn request_delete(&mut self, id: ProductId) {
        if DeleteGuard::for_product().can_delete {
            self.delete_dialog.open(id);
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
        match self.api.delete_product(id).await {
            Ok(()) => {
                tracing::info!(product_id = %id, "Product deleted");
                self.delete_dialog.complete();
                self.row_actions.remove(&id);
                let target = self.page_after_removal();
                self.load(target).await;
            }
            Err(e @ ApiError::NotFound(_)) => {
                self.notice = Some(Notice::from(&e));
                self.delete_dialog.complete();
                self.reload().await;
            }
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Failed to delete product");
                self.notice = Some(Notice::from(&e));
                self.delete_dialog.fail(e.to_string());
            }
        }
    }

    /// Page to show after a row left the table. Deleting the last row of
    /// the last page steps back one instead of landing on an empty page.
    fn page_after_removal(&self) -> u32 {
        if self.page.data.len() == 1 && self.page.has_previous_page() {
            self.page.current_page - 1
        } else {
            self.page.current_page.max(1)
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Rows for the table as of `now`.
    #[must_use]
    pub fn rows(&self, now: DateTime<Utc>) -> Vec<ProductRow> {
        self.page
            .data
            .iter()
            .map(|product| {
                let enabled = !self.delete_dialog.is_pending()
                    && self
                        .row_actions
                        .get(&product.id)
                        .is_none_or(ActionState::is_enabled);
                ProductRow::from_product(product, now, enabled)
            })
            .collect()
    }

    /// Categories for the filter dropdown. The admin sees hidden ones too.
    #[must_use]
    pub fn categories(&self) -> &[CategoryNode] {
        &self.categories
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn page(&self) -> &Page<Product> {
        &self.page
    }

    #[must_use]
    pub const fn filters(&self) -> &ProductFilters {
        &self.filters
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

/// Create/edit form for a product, including its media gallery.
///
/// Text inputs stay raw strings until [`save`](Self::save) validates them
/// all at once; the operator sees every problem in a single pass.
pub struct ProductForm<'a> {
    api: &'a dyn AdminApi,
    product_id: Option<ProductId>,
    title: String,
    description: String,
    price: String,
    stock: String,
    category_id: Option<CategoryId>,
    is_active: bool,
    is_featured: bool,
    /// Media already on the server (edit mode).
    existing_media: Vec<MediaItem>,
    /// Media staged to upload with the next save.
    staged_media: Vec<MediaInput>,
    /// Server media marked for removal on the next save.
    removed_media: Vec<MediaId>,
    issues: Vec<FieldIssue>,
    saving: ActionState,
    primary_action: ActionState,
    saved: Option<Product>,
    notice: Option<Notice>,
}

impl<'a> ProductForm<'a> {
    /// Blank form for creating a product. New products start visible.
    #[must_use]
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self {
            api,
            product_id: None,
            title: String::new(),
            description: String::new(),
            price: String::new(),
            stock: String::new(),
            category_id: None,
            is_active: true,
            is_featured: false,
            existing_media: Vec::new(),
            staged_media: Vec::new(),
            removed_media: Vec::new(),
            issues: Vec::new(),
            saving: ActionState::default(),
            primary_action: ActionState::default(),
            saved: None,
            notice: None,
        }
    }

    /// Form prefilled from an existing product.
    #[must_use]
    pub fn edit(api: &'a dyn AdminApi, product: &Product) -> Self {
        Self {
            product_id: Some(product.id),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            stock: product.stock.to_string(),
            category_id: Some(product.category.id),
            is_active: product.is_active,
            is_featured: product.is_featured,
            existing_media: product.media.clone(),
            ..Self::new(api)
        }
    }

    // =========================================================================
    // Field setters
    // =========================================================================

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
        self.clear_issue("title");
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
        self.clear_issue("description");
    }

    pub fn set_price(&mut self, value: impl Into<String>) {
        self.price = value.into();
        self.clear_issue("price");
    }

    pub fn set_stock(&mut self, value: impl Into<String>) {
        self.stock = value.into();
        self.clear_issue("stock");
    }

    pub fn set_category(&mut self, category: Option<CategoryId>) {
        self.category_id = category;
        self.clear_issue("category_id");
    }

    pub fn set_active(&mut self, value: bool) {
        self.is_active = value;
    }

    pub fn set_featured(&mut self, value: bool) {
        self.is_featured = value;
    }

    fn clear_issue(&mut self, field: &str) {
        self.issues.retain(|issue| issue.field != field);
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// Stage a new media item for the next save.
    pub fn stage_media(&mut self, media: MediaInput) {
        self.staged_media.push(media);
    }

    /// Drop a staged media item before it was ever saved.
    pub fn unstage_media(&mut self, index: usize) {
        if index < self.staged_media.len() {
            self.staged_media.remove(index);
        }
    }

    /// Mark an existing media item for removal on the next save.
    pub fn remove_existing(&mut self, media_id: MediaId) {
        if self.existing_media.iter().any(|item| item.id == media_id) {
            self.existing_media.retain(|item| item.id != media_id);
            self.removed_media.push(media_id);
        }
    }

    /// Make an existing media item the product's thumbnail. Applied against
    /// the server immediately, not deferred to the next save.
    pub async fn set_primary_existing(&mut self, media_id: MediaId) {
        let Some(product_id) = self.product_id else {
            return;
        };
        if self.primary_action.begin().is_err() {
            return;
        }
        match self.api.set_primary_image(product_id, media_id).await {
            Ok(()) => {
                tracing::info!(product_id = %product_id, media_id = %media_id, "Primary image set");
                for item in &mut self.existing_media {
                    item.is_primary = item.id == media_id;
                }
                self.primary_action.succeed();
            }
            Err(e) => {
                tracing::error!(product_id = %product_id, error = %e, "Failed to set primary image");
                self.notice = Some(Notice::from(&e));
                self.primary_action.fail(e.to_string());
            }
        }
    }

    // =========================================================================
    // Save
    // =========================================================================

    fn validate(&mut self) -> Option<ProductInput> {
        let mut issues = Vec::new();

        if self.title.trim().is_empty() {
            issues.push(FieldIssue::new("title", "El título es obligatorio"));
        }
        let price = match form::parse_money("price", &self.price) {
            Ok(price) => Some(price),
            Err(issue) => {
                issues.push(issue);
                None
            }
        };
        let stock = match form::parse_quantity("stock", &self.stock) {
            Ok(stock) => Some(stock),
            Err(issue) => {
                issues.push(issue);
                None
            }
        };
        if self.category_id.is_none() {
            issues.push(FieldIssue::new("category_id", "La categoría es obligatoria"));
        }

        self.issues = issues;
        if !self.issues.is_empty() {
            return None;
        }
        Some(ProductInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price: price?,
            stock: stock?,
            category_id: self.category_id?,
            is_active: self.is_active,
            is_featured: self.is_featured,
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
        let result = match self.product_id {
            None => self.api.create_product(&input, &self.staged_media).await,
            Some(id) => {
                self.api
                    .update_product(id, &input, &self.staged_media, &self.removed_media)
                    .await
            }
        };
        match result {
            Ok(product) => {
                if self.product_id.is_none() {
                    tracing::info!(product_id = %product.id, title = %product.title, "Product created");
                } else {
                    tracing::info!(product_id = %product.id, "Product updated");
                }
                self.product_id = Some(product.id);
                self.existing_media = product.media.clone();
                self.staged_media.clear();
                self.removed_media.clear();
                self.saved = Some(product);
                self.saving.succeed();
            }
            Err(ApiError::Validation { field, message }) => {
                self.apply_server_issue(field, message.clone());
                self.saving.fail(message);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save product");
                self.notice = Some(Notice::from(&e));
                self.saving.fail(e.to_string());
            }
        }
    }

    /// Pin a server-side rejection onto the field it names when it is one
    /// of ours, a page-level notice otherwise.
    fn apply_server_issue(&mut self, field: Option<String>, message: String) {
        const FIELDS: [&str; 5] = ["title", "description", "price", "stock", "category_id"];
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

    /// The saved product, handed over once. The host navigates back to
    /// the listing when this yields one.
    pub fn take_saved(&mut self) -> Option<Product> {
        self.saved.take()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn price(&self) -> &str {
        &self.price
    }

    #[must_use]
    pub fn stock(&self) -> &str {
        &self.stock
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub const fn is_featured(&self) -> bool {
        self.is_featured
    }

    #[must_use]
    pub fn gallery(&self) -> &[MediaItem] {
        &self.existing_media
    }

    #[must_use]
    pub fn staged(&self) -> &[MediaInput] {
        &self.staged_media
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
        self.product_id.is_some()
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
    use chispa_client::api::{ApiResult, CategoryInput, OfferInput};
    use chispa_core::catalog::{CategoryRef, MediaKind, Offer};
    use chispa_core::types::{Money, OfferId};

    use super::*;

    struct FakeBackoffice {
        products: Mutex<Vec<Product>>,
        categories: Vec<CategoryNode>,
        per_page: u32,
        list_calls: Mutex<Vec<(ProductFilters, u32)>>,
        mutations: Mutex<Vec<String>>,
        fail_mutations: bool,
        vanished: bool,
        reject_price: bool,
    }

    impl FakeBackoffice {
        fn new(products: Vec<Product>, categories: Vec<CategoryNode>) -> Self {
            Self {
                products: Mutex::new(products),
                categories,
                per_page: 15,
                list_calls: Mutex::new(Vec::new()),
                mutations: Mutex::new(Vec::new()),
                fail_mutations: false,
                vanished: false,
                reject_price: false,
            }
        }

        fn last_list_call(&self) -> (ProductFilters, u32) {
            self.list_calls.lock().unwrap().last().cloned().unwrap()
        }

        fn list_call_count(&self) -> usize {
            self.list_calls.lock().unwrap().len()
        }

        fn mutation_gate(&self, op: &str, id: ProductId) -> ApiResult<()> {
            if self.vanished {
                return Err(ApiError::NotFound("No encontrado".to_string()));
            }
            if self.fail_mutations {
                return Err(ApiError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.mutations.lock().unwrap().push(format!("{op} {id}"));
            Ok(())
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
            filters: &ProductFilters,
            page: u32,
        ) -> ApiResult<Page<Product>> {
            self.list_calls.lock().unwrap().push((filters.clone(), page));
            let products = self.products.lock().unwrap().clone();
            Ok(page_of(&products, page, self.per_page))
        }

        async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
            self.products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("No encontrado".to_string()))
        }

        async fn list_categories(
            &self,
            _filters: &CategoryFilters,
            page: u32,
        ) -> ApiResult<Page<CategoryNode>> {
            Ok(page_of(&self.categories, page, 50))
        }

        async fn get_category(&self, id: CategoryId) -> ApiResult<CategoryNode> {
            self.categories
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
            input: &ProductInput,
            media: &[MediaInput],
        ) -> ApiResult<Product> {
            if self.reject_price {
                return Err(ApiError::Validation {
                    field: Some("price".to_string()),
                    message: "El precio supera el máximo permitido".to_string(),
                });
            }
            let mut products = self.products.lock().unwrap();
            let id = ProductId::new(products.len() as i64 + 100);
            let product = product_from_input(id, input, media);
            products.push(product.clone());
            self.mutations
                .lock()
                .unwrap()
                .push(format!("create_product {}", input.title));
            Ok(product)
        }

        async fn update_product(
            &self,
            id: ProductId,
            input: &ProductInput,
            media_add: &[MediaInput],
            _media_remove: &[MediaId],
        ) -> ApiResult<Product> {
            let mut products = self.products.lock().unwrap();
            let slot = products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| ApiError::NotFound("No encontrado".to_string()))?;
            *slot = product_from_input(id, input, media_add);
            self.mutations
                .lock()
                .unwrap()
                .push(format!("update_product {id}"));
            Ok(slot.clone())
        }

        async fn delete_product(&self, id: ProductId) -> ApiResult<()> {
            self.mutation_gate("delete_product", id)?;
            self.products.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn set_primary_image(
            &self,
            product_id: ProductId,
            media_id: MediaId,
        ) -> ApiResult<()> {
            self.mutations
                .lock()
                .unwrap()
                .push(format!("set_primary_image {product_id} {media_id}"));
            Ok(())
        }

        async fn toggle_product_active(&self, id: ProductId) -> ApiResult<()> {
            self.mutation_gate("toggle_product_active", id)?;
            let mut products = self.products.lock().unwrap();
            if let Some(product) = products.iter_mut().find(|p| p.id == id) {
                product.is_active = !product.is_active;
            }
            Ok(())
        }

        async fn toggle_product_featured(&self, id: ProductId) -> ApiResult<()> {
            self.mutation_gate("toggle_product_featured", id)?;
            let mut products = self.products.lock().unwrap();
            if let Some(product) = products.iter_mut().find(|p| p.id == id) {
                product.is_featured = !product.is_featured;
            }
            Ok(())
        }

        async fn create_category(&self, _input: &CategoryInput) -> ApiResult<CategoryNode> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn update_category(
            &self,
            _id: CategoryId,
            _input: &CategoryInput,
        ) -> ApiResult<CategoryNode> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn delete_category(&self, _id: CategoryId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
        }

        async fn toggle_category_active(&self, _id: CategoryId) -> ApiResult<()> {
            Err(ApiError::Api {
                status: 501,
                message: "not wired in this fake".to_string(),
            })
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

    fn category_node(id: i64, name: &str) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            parent: None,
            is_active: true,
            sort_order: 0,
            children_count: 0,
            products_count: 0,
            children: Vec::new(),
        }
    }

    fn product(id: i64, title: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: String::new(),
            price: Money::from(price),
            stock,
            is_active: true,
            is_featured: false,
            category: CategoryRef {
                id: CategoryId::new(1),
                name: "Chispas Frías".to_string(),
                slug: "chispas-frias".to_string(),
            },
            media: vec![MediaItem {
                id: MediaId::new(id * 10),
                product_id: ProductId::new(id),
                kind: MediaKind::Image,
                url: format!("https://cdn.chispafria.cl/{id}.webp"),
                alt_text: None,
                is_primary: true,
            }],
            current_offer: None,
        }
    }

    fn product_from_input(id: ProductId, input: &ProductInput, media: &[MediaInput]) -> Product {
        Product {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price,
            stock: input.stock,
            is_active: input.is_active,
            is_featured: input.is_featured,
            category: CategoryRef {
                id: input.category_id,
                name: "Chispas Frías".to_string(),
                slug: "chispas-frias".to_string(),
            },
            media: media
                .iter()
                .enumerate()
                .map(|(index, item)| MediaItem {
                    id: MediaId::new(index as i64 + 500),
                    product_id: id,
                    kind: item.kind,
                    url: item.url.clone(),
                    alt_text: item.alt_text.clone(),
                    is_primary: item.is_primary,
                })
                .collect(),
            current_offer: None,
        }
    }

    fn fixture() -> FakeBackoffice {
        FakeBackoffice::new(
            vec![
                product(1, "Chispero frío 60 cm", 15_000, 5),
                product(2, "Chispero frío 90 cm", 22_000, 3),
                product(3, "Base giratoria", 9_000, 0),
            ],
            vec![category_node(1, "Chispas Frías"), category_node(4, "Humo")],
        )
    }

    #[tokio::test]
    async fn test_load_requests_the_configured_page_size() {
        let api = fixture();
        let mut page = ProductsPage::new(&api, &api, 15);
        page.load(1).await;

        let (filters, page_number) = api.last_list_call();
        assert_eq!(page_number, 1);
        assert_eq!(filters.per_page, Some(15));
        assert_eq!(filters.status, None);
        assert_eq!(page.rows(Utc::now()).len(), 3);
        assert_eq!(page.categories().len(), 2);
    }

    #[tokio::test]
    async fn test_changing_a_filter_restarts_from_the_first_page() {
        let mut api = fixture();
        api.per_page = 2;
        let mut page = ProductsPage::new(&api, &api, 2);

        page.load(1).await;
        page.next_page().await;
        assert_eq!(page.page().current_page, 2);

        page.set_status(Some(StatusFilter::Inactive)).await;
        let (filters, page_number) = api.last_list_call();
        assert_eq!(page_number, 1);
        assert_eq!(filters.status, Some(StatusFilter::Inactive));

        page.set_stock(Some(StockFilter::OutOfStock)).await;
        let (filters, page_number) = api.last_list_call();
        assert_eq!(page_number, 1);
        assert_eq!(filters.stock, Some(StockFilter::OutOfStock));
    }

    #[tokio::test]
    async fn test_toggle_active_reloads_the_listing() {
        let api = fixture();
        let mut page = ProductsPage::new(&api, &api, 15);
        page.load(1).await;

        page.toggle_active(ProductId::new(1)).await;

        assert_eq!(api.list_call_count(), 2);
        let rows = page.rows(Utc::now());
        assert!(!rows[0].is_active);
        assert!(rows[0].controls_enabled);
        assert_eq!(
            api.mutations.lock().unwrap().as_slice(),
            ["toggle_product_active 1"]
        );
    }

    #[tokio::test]
    async fn test_toggle_on_a_vanished_product_refreshes_with_a_stale_notice() {
        let mut api = fixture();
        api.vanished = true;
        let mut page = ProductsPage::new(&api, &api, 15);
        page.load(1).await;

        page.toggle_featured(ProductId::new(2)).await;

        assert_eq!(page.notice().map(|n| n.kind), Some(NoticeKind::Stale));
        assert_eq!(api.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_the_row_enabled_for_retry() {
        let mut api = fixture();
        api.fail_mutations = true;
        let mut page = ProductsPage::new(&api, &api, 15);
        page.load(1).await;

        page.toggle_active(ProductId::new(1)).await;

        assert_eq!(page.notice().map(|n| n.kind), Some(NoticeKind::Retry));
        // no reload on failure, and the row accepts another try
        assert_eq!(api.list_call_count(), 1);
        assert!(page.rows(Utc::now())[0].controls_enabled);
    }

    #[tokio::test]
    async fn test_delete_waits_for_confirmation() {
        let api = fixture();
        let mut page = ProductsPage::new(&api, &api, 15);
        page.load(1).await;

        page.request_delete(ProductId::new(3));
        assert!(page.is_delete_dialog_open());
        assert!(api.mutations.lock().unwrap().is_empty());

        page.cancel_delete();
        assert!(!page.is_delete_dialog_open());
        page.confirm_delete().await;
        assert!(api.mutations.lock().unwrap().is_empty());

        page.request_delete(ProductId::new(3));
        page.confirm_delete().await;
        assert_eq!(page.rows(Utc::now()).len(), 2);
        assert_eq!(
            api.mutations.lock().unwrap().as_slice(),
            ["delete_product 3"]
        );
    }

    #[tokio::test]
    async fn test_deleting_the_last_row_of_a_page_steps_back() {
        let mut api = fixture();
        api.per_page = 2;
        let mut page = ProductsPage::new(&api, &api, 2);

        page.load(2).await;
        assert_eq!(page.rows(Utc::now()).len(), 1);

        page.request_delete(ProductId::new(3));
        page.confirm_delete().await;

        assert_eq!(page.page().current_page, 1);
        assert_eq!(page.rows(Utc::now()).len(), 2);
    }

    #[tokio::test]
    async fn test_rows_present_offer_pricing_and_stock() {
        let api = fixture();
        api.products.lock().unwrap()[0].current_offer = Some(Offer {
            id: OfferId::new(900),
            product_id: ProductId::new(1),
            product: None,
            offer_price: Money::from(12_000),
            percentage_discount: None,
            starts_at: None,
            ends_at: None,
            is_active: true,
        });
        let mut page = ProductsPage::new(&api, &api, 15);
        page.load(1).await;

        let rows = page.rows(Utc::now());
        assert_eq!(rows[0].price, "$12.000");
        assert_eq!(rows[0].list_price.as_deref(), Some("$15.000"));
        assert_eq!(rows[0].stock_label, "5 unidades");
        assert_eq!(rows[2].stock_label, "Sin stock");
        assert_eq!(rows[2].list_price, None);
    }

    #[tokio::test]
    async fn test_form_rejects_all_invalid_fields_at_once() {
        let api = fixture();
        let mut form = ProductForm::new(&api);
        form.set_price("abc");
        form.save().await;

        assert_eq!(form.issues().len(), 4);
        assert_eq!(form.issue_for("title"), Some("El título es obligatorio"));
        assert_eq!(
            form.issue_for("price"),
            Some("El precio debe ser un número válido")
        );
        assert_eq!(
            form.issue_for("stock"),
            Some("El stock debe ser un número entero")
        );
        assert_eq!(
            form.issue_for("category_id"),
            Some("La categoría es obligatoria")
        );
        assert!(api.mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_form_creates_a_product_from_valid_input() {
        let api = fixture();
        let mut form = ProductForm::new(&api);
        form.set_title("  Volcán plateado  ");
        form.set_description("Chispa fría de 3 minutos");
        form.set_price("18500");
        form.set_stock("12");
        form.set_category(Some(CategoryId::new(1)));
        form.stage_media(MediaInput {
            kind: MediaKind::Image,
            url: "https://cdn.chispafria.cl/volcan.webp".to_string(),
            alt_text: None,
            is_primary: true,
        });

        form.save().await;

        let saved = form.take_saved().unwrap();
        assert_eq!(saved.title, "Volcán plateado");
        assert_eq!(saved.price, Money::from(18_500));
        assert_eq!(saved.media.len(), 1);
        assert!(form.is_editing());
        assert!(form.staged().is_empty());
        assert!(form.issues().is_empty());
    }

    #[tokio::test]
    async fn test_form_maps_server_rejections_onto_fields() {
        let mut api = fixture();
        api.reject_price = true;
        let mut form = ProductForm::new(&api);
        form.set_title("Volcán plateado");
        form.set_price("999999999");
        form.set_stock("1");
        form.set_category(Some(CategoryId::new(1)));

        form.save().await;

        assert_eq!(
            form.issue_for("price"),
            Some("El precio supera el máximo permitido")
        );
        assert!(form.take_saved().is_none());
        assert!(!form.is_saving());
    }

    #[tokio::test]
    async fn test_edit_form_prefills_and_updates() {
        let api = fixture();
        let original = api.products.lock().unwrap()[0].clone();
        let mut form = ProductForm::edit(&api, &original);

        assert_eq!(form.title(), "Chispero frío 60 cm");
        assert_eq!(form.price(), "15000");
        assert_eq!(form.stock(), "5");
        assert!(form.is_editing());

        form.set_stock("9");
        form.save().await;

        let saved = form.take_saved().unwrap();
        assert_eq!(saved.stock, 9);
        assert_eq!(
            api.mutations.lock().unwrap().as_slice(),
            ["update_product 1"]
        );
    }

    #[tokio::test]
    async fn test_set_primary_existing_updates_the_gallery() {
        let api = fixture();
        let mut original = api.products.lock().unwrap()[0].clone();
        original.media.push(MediaItem {
            id: MediaId::new(11),
            product_id: original.id,
            kind: MediaKind::Image,
            url: "https://cdn.chispafria.cl/1b.webp".to_string(),
            alt_text: None,
            is_primary: false,
        });
        let mut form = ProductForm::edit(&api, &original);

        form.set_primary_existing(MediaId::new(11)).await;

        let flags: Vec<bool> = form.gallery().iter().map(|m| m.is_primary).collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(
            api.mutations.lock().unwrap().as_slice(),
            ["set_primary_image 1 11"]
        );
    }
}
