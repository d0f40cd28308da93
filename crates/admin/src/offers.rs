//! Offers table and create/edit form for the back office.
//!
//! The table badges every offer with its lifecycle as of render time, so
//! an offer whose window just closed reads "Vencida" without a refetch.
//! The form refuses to even pick a product that already carries an offer;
//! the Data API conflict response covers the race where another operator
//! attached one in between.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use chispa_client::api::{AdminApi, OfferInput};
use chispa_client::error::{ApiError, Notice, NoticeKind};
use chispa_core::action::ActionState;
use chispa_core::catalog::{Offer, Page, Product};
use chispa_core::confirm::ConfirmDialog;
use chispa_core::delete::DeleteGuard;
use chispa_core::pricing;
use chispa_core::types::{Money, OfferId, OfferStatus, ProductId};

use crate::form::{self, FieldIssue};

const DATE_DISPLAY: &str = "%d-%m-%Y %H:%M";

/// One row of the offers table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRow {
    pub id: OfferId,
    pub product_title: String,
    /// Promotional price, formatted (`$12.000`).
    pub offer_price: String,
    /// Crossed-out list price, when the listing embedded the product.
    pub list_price: Option<String>,
    /// Advertised discount (`-20%`).
    pub discount: Option<String>,
    /// Window open, formatted for display; `None` reads "Sin límite".
    pub starts_at: Option<String>,
    /// Window close, formatted for display.
    pub ends_at: Option<String>,
    /// Lifecycle label (`Vigente`, `Programada`, `Vencida`, `Inactiva`).
    pub status: String,
    /// Badge CSS classes matching the label.
    pub status_class: String,
    pub controls_enabled: bool,
}

impl OfferRow {
    fn from_offer(offer: &Offer, now: DateTime<Utc>, controls_enabled: bool) -> Self {
        let (status, status_class) = match offer.status_at(now) {
            OfferStatus::Active => (
                "Vigente",
                "bg-green-100 text-green-700 dark:bg-green-900/30 dark:text-green-400",
            ),
            OfferStatus::Scheduled => (
                "Programada",
                "bg-blue-100 text-blue-700 dark:bg-blue-900/30 dark:text-blue-400",
            ),
            OfferStatus::Expired => (
                "Vencida",
                "bg-gray-100 text-gray-700 dark:bg-gray-800 dark:text-gray-400",
            ),
            OfferStatus::Inactive => (
                "Inactiva",
                "bg-amber-100 text-amber-700 dark:bg-amber-900/30 dark:text-amber-400",
            ),
        };

        let discount = offer.percentage_discount.or_else(|| {
            offer
                .product
                .as_ref()
                .and_then(|product| pricing::discount_percent(product.price, offer.offer_price))
        });

        Self {
            id: offer.id,
            product_title: offer.product.as_ref().map_or_else(
                || format!("Producto {}", offer.product_id),
                |product| product.title.clone(),
            ),
            offer_price: offer.offer_price.to_string(),
            list_price: offer.product.as_ref().map(|p| p.price.to_string()),
            discount: discount.map(|pct| format!("-{pct}%")),
            starts_at: offer.starts_at.map(|ts| ts.format(DATE_DISPLAY).to_string()),
            ends_at: offer.ends_at.map(|ts| ts.format(DATE_DISPLAY).to_string()),
            status: status.to_string(),
            status_class: status_class.to_string(),
            controls_enabled,
        }
    }
}

/// State of the offers table.
pub struct OffersPage<'a> {
    api: &'a dyn AdminApi,
    page: Page<Offer>,
    row_actions: HashMap<OfferId, ActionState>,
    delete_dialog: ConfirmDialog<OfferId>,
    loading: ActionState,
    notice: Option<Notice>,
}

impl<'a> OffersPage<'a> {
    #[must_use]
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self {
            api,
            page: Page::empty(),
            row_actions: HashMap::new(),
            delete_dialog: ConfirmDialog::new(),
            loading: ActionState::default(),
            notice: None,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load one page of the table.
    pub async fn load(&mut self, page_number: u32) {
        if self.loading.begin().is_err() {
            return;
        }
        self.notice = None;
        match self.api.list_offers(page_number).await {
            Ok(page) => {
                self.page = page;
                self.row_actions
                    .retain(|id, _| self.page.data.iter().any(|offer| offer.id == *id));
                self.loading.succeed();
            }
            Err(e) => {
                tracing::error!(error = %e, page_number, "offers load failed");
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

    // =========================================================================
    // Row actions
    // =========================================================================

    /// Flip the kill-switch of one offer.
    pub async fn toggle_active(&mut self, id: OfferId) {
        if self.delete_dialog.is_pending() || self.row_state(id).begin().is_err() {
            return;
        }
        match self.api.toggle_offer_active(id).await {
            Ok(()) => {
                tracing::info!(offer_id = %id, "Offer toggled");
                self.row_state(id).succeed();
                self.reload().await;
            }
            Err(e @ ApiError::NotFound(_)) => {
                self.notice = Some(Notice::from(&e));
                self.row_state(id).succeed();
                self.reload().await;
            }
            Err(e) => {
                tracing::error!(offer_id = %id, error = %e, "Failed to toggle offer");
                self.notice = Some(Notice::from(&e));
                self.row_state(id).fail(e.to_string());
            }
        }
    }

    fn row_state(&mut self, id: OfferId) -> &mut ActionState {
        self.row_actions.entry(id).or_default()
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Open the delete confirmation for one offer. Offers are always
    /// deletable; the product just reverts to its list price.
    pub fn request_delete(&mut self, id: OfferId) {
        if DeleteGuard::for_offer().can_delete {
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
        match self.api.delete_offer(id).await {
            Ok(()) => {
                tracing::info!(offer_id = %id, "Offer deleted");
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
                tracing::error!(offer_id = %id, error = %e, "Failed to delete offer");
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

    /// Rows for the table as of `now`.
    #[must_use]
    pub fn rows(&self, now: DateTime<Utc>) -> Vec<OfferRow> {
        self.page
            .data
            .iter()
            .map(|offer| {
                let enabled = !self.delete_dialog.is_pending()
                    && self
                        .row_actions
                        .get(&offer.id)
                        .is_none_or(ActionState::is_enabled);
                OfferRow::from_offer(offer, now, enabled)
            })
            .collect()
    }

    #[must_use]
    pub const fn page(&self) -> &Page<Offer> {
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

/// Product an offer hangs off, as the form needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferProduct {
    pub id: ProductId,
    pub title: String,
    /// List price the offer must undercut.
    pub price: Money,
}

/// Create/edit form for an offer.
///
/// Creation starts from picking a product; a product that already carries
/// an offer is rejected right there, before any field is filled in. On
/// edit the product is locked.
pub struct OfferForm<'a> {
    api: &'a dyn AdminApi,
    offer_id: Option<OfferId>,
    product: Option<OfferProduct>,
    offer_price: String,
    percentage_discount: String,
    starts_at: String,
    ends_at: String,
    is_active: bool,
    issues: Vec<FieldIssue>,
    saving: ActionState,
    saved: Option<Offer>,
    notice: Option<Notice>,
}

impl<'a> OfferForm<'a> {
    /// Blank form for creating an offer. New offers start active.
    #[must_use]
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self {
            api,
            offer_id: None,
            product: None,
            offer_price: String::new(),
            percentage_discount: String::new(),
            starts_at: String::new(),
            ends_at: String::new(),
            is_active: true,
            issues: Vec::new(),
            saving: ActionState::default(),
            saved: None,
            notice: None,
        }
    }

    /// Form prefilled from an existing offer. The product cannot change;
    /// delete and recreate to move an offer.
    #[must_use]
    pub fn edit(api: &'a dyn AdminApi, offer: &Offer) -> Self {
        Self {
            offer_id: Some(offer.id),
            product: offer.product.as_ref().map(|product| OfferProduct {
                id: product.id,
                title: product.title.clone(),
                price: product.price,
            }),
            offer_price: offer.offer_price.amount().to_string(),
            percentage_discount: offer
                .percentage_discount
                .map(|pct| pct.to_string())
                .unwrap_or_default(),
            starts_at: offer.starts_at.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
            ends_at: offer.ends_at.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
            is_active: offer.is_active,
            ..Self::new(api)
        }
    }

    // =========================================================================
    // Product picker
    // =========================================================================

    /// Attach the offer-to-be to a product. Refused with a blocking notice
    /// when the product already carries an offer, whatever its lifecycle;
    /// one offer per product at a time.
    pub fn pick_product(&mut self, product: &Product) {
        if self.offer_id.is_some() {
            return;
        }
        if product.current_offer.is_some() {
            self.notice = Some(Notice {
                kind: NoticeKind::Blocking,
                message: "El producto ya tiene una oferta vigente.".to_string(),
            });
            return;
        }
        self.product = Some(OfferProduct {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
        });
        self.notice = None;
        self.clear_issue("product");
    }

    /// Detach the picked product (create mode only).
    pub fn clear_product(&mut self) {
        if self.offer_id.is_none() {
            self.product = None;
        }
    }

    // =========================================================================
    // Field setters
    // =========================================================================

    pub fn set_offer_price(&mut self, value: impl Into<String>) {
        self.offer_price = value.into();
        self.clear_issue("offer_price");
    }

    pub fn set_percentage_discount(&mut self, value: impl Into<String>) {
        self.percentage_discount = value.into();
        self.clear_issue("percentage_discount");
    }

    pub fn set_starts_at(&mut self, value: impl Into<String>) {
        self.starts_at = value.into();
        self.clear_issue("starts_at");
    }

    pub fn set_ends_at(&mut self, value: impl Into<String>) {
        self.ends_at = value.into();
        self.clear_issue("ends_at");
    }

    pub fn set_active(&mut self, value: bool) {
        self.is_active = value;
    }

    fn clear_issue(&mut self, field: &str) {
        self.issues.retain(|issue| issue.field != field);
    }

    // =========================================================================
    // Save
    // =========================================================================

    fn validate(&mut self) -> Option<OfferInput> {
        let mut issues = Vec::new();

        if self.product.is_none() {
            issues.push(FieldIssue::new("product", "Selecciona un producto"));
        }
        let offer_price = match form::parse_money("offer_price", &self.offer_price) {
            Ok(price) => {
                if let Some(product) = &self.product
                    && price >= product.price
                {
                    issues.push(FieldIssue::new(
                        "offer_price",
                        "La oferta debe ser menor al precio del producto",
                    ));
                }
                Some(price)
            }
            Err(issue) => {
                issues.push(issue);
                None
            }
        };
        let percentage_discount =
            match form::parse_optional_percent("percentage_discount", &self.percentage_discount) {
                Ok(percent) => percent,
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            };
        let starts_at = match form::parse_optional_date("starts_at", &self.starts_at) {
            Ok(starts_at) => starts_at,
            Err(issue) => {
                issues.push(issue);
                None
            }
        };
        let ends_at = match form::parse_optional_date("ends_at", &self.ends_at) {
            Ok(ends_at) => ends_at,
            Err(issue) => {
                issues.push(issue);
                None
            }
        };
        if let (Some(starts), Some(ends)) = (starts_at, ends_at)
            && ends <= starts
        {
            issues.push(FieldIssue::new(
                "ends_at",
                "La fecha de término debe ser posterior al inicio",
            ));
        }

        self.issues = issues;
        if !self.issues.is_empty() {
            return None;
        }
        Some(OfferInput {
            offer_price: offer_price?,
            percentage_discount,
            starts_at,
            ends_at,
            is_active: self.is_active,
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
        let result = match (self.offer_id, &self.product) {
            (Some(id), _) => self.api.update_offer(id, &input).await,
            (None, Some(product)) => self.api.create_offer(product.id, &input).await,
            (None, None) => {
                // validate() already flagged the missing product
                self.saving.reset();
                return;
            }
        };
        match result {
            Ok(offer) => {
                if self.offer_id.is_none() {
                    tracing::info!(offer_id = %offer.id, product_id = %offer.product_id, "Offer created");
                } else {
                    tracing::info!(offer_id = %offer.id, "Offer updated");
                }
                self.offer_id = Some(offer.id);
                self.saved = Some(offer);
                self.saving.succeed();
            }
            Err(ApiError::Validation { field, message }) => {
                self.apply_server_issue(field, message.clone());
                self.saving.fail(message);
            }
            Err(e @ ApiError::Conflict(_)) => {
                // another operator attached an offer since the pre-check
                self.notice = Some(Notice::from(&e));
                self.saving.fail(e.to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save offer");
                self.notice = Some(Notice::from(&e));
                self.saving.fail(e.to_string());
            }
        }
    }

    fn apply_server_issue(&mut self, field: Option<String>, message: String) {
        const FIELDS: [&str; 4] = [
            "offer_price",
            "percentage_discount",
            "starts_at",
            "ends_at",
        ];
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

    /// The saved offer, handed over once.
    pub fn take_saved(&mut self) -> Option<Offer> {
        self.saved.take()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn product(&self) -> Option<&OfferProduct> {
        self.product.as_ref()
    }

    #[must_use]
    pub fn offer_price(&self) -> &str {
        &self.offer_price
    }

    #[must_use]
    pub fn percentage_discount(&self) -> &str {
        &self.percentage_discount
    }

    #[must_use]
    pub fn starts_at(&self) -> &str {
        &self.starts_at
    }

    #[must_use]
    pub fn ends_at(&self) -> &str {
        &self.ends_at
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
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
        self.offer_id.is_some()
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
