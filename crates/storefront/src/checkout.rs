//! Checkout page: shipping form and WhatsApp hand-off.
//!
//! There is no payment step. A valid submit asks the server to compose
//! the order message, and the page turns it into a `wa.me` deep link
//! the host opens in a new tab; the conversation continues on WhatsApp.

use chrono::{DateTime, Utc};

use chispa_client::api::CartApi;
use chispa_client::error::{Notice, NoticeKind};
use chispa_core::action::ActionState;
use chispa_core::cart::Cart;
use chispa_core::checkout::{FieldError, OrderLine, ShippingField, ShippingInfo};

/// The hand-off produced by a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppHandoff {
    /// Composed order message, exactly as it will arrive.
    pub message: String,
    /// `wa.me` deep link carrying the message.
    pub url: String,
}

/// State of the checkout page.
pub struct CheckoutPage<'a> {
    api: &'a dyn CartApi,
    /// Destination phone, digits only.
    phone: String,
    info: ShippingInfo,
    errors: Vec<FieldError>,
    submitting: ActionState,
    handoff: Option<WhatsAppHandoff>,
    notice: Option<Notice>,
}

impl<'a> CheckoutPage<'a> {
    /// `whatsapp_digits` is the shop's number as produced by
    /// [`crate::StorefrontConfig::whatsapp_digits`].
    #[must_use]
    pub fn new(api: &'a dyn CartApi, whatsapp_digits: impl Into<String>) -> Self {
        Self {
            api,
            phone: whatsapp_digits.into(),
            info: ShippingInfo::default(),
            errors: Vec::new(),
            submitting: ActionState::default(),
            handoff: None,
            notice: None,
        }
    }

    // =========================================================================
    // Form
    // =========================================================================

    /// Record a field edit. Only that field's error is cleared; the
    /// rest stay up until the next submit.
    pub fn set_field(&mut self, field: ShippingField, value: impl Into<String>) {
        self.info.set(field, value);
        self.errors.retain(|error| error.field != field);
    }

    #[must_use]
    pub fn field_value(&self, field: ShippingField) -> &str {
        self.info.get(field)
    }

    #[must_use]
    pub fn field_error(&self, field: ShippingField) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    // =========================================================================
    // Submit
    // =========================================================================

    /// Validate the form and compose the order.
    ///
    /// With any invalid field nothing is sent; the errors land inline
    /// all at once. Otherwise the server composes the message from the
    /// cart as it stands at `now` and the page holds the finished
    /// hand-off.
    pub async fn submit(&mut self, cart: &Cart, now: DateTime<Utc>) {
        if cart.is_empty() || self.submitting.is_pending() {
            return;
        }
        if let Err(errors) = self.info.validate() {
            self.errors = errors;
            return;
        }
        if self.submitting.begin().is_err() {
            return;
        }
        self.errors.clear();
        self.notice = None;

        let lines: Vec<OrderLine> = cart
            .lines()
            .iter()
            .map(|line| OrderLine::from_cart_line(line, now))
            .collect();
        match self.api.compose_whatsapp_message(&lines, &self.info).await {
            Ok(composed) if composed.success => {
                self.submitting.succeed();
                let url = format!(
                    "https://wa.me/{}?text={}",
                    self.phone,
                    urlencoding::encode(&composed.message)
                );
                self.handoff = Some(WhatsAppHandoff {
                    message: composed.message,
                    url,
                });
            }
            Ok(_) => {
                self.notice = Some(Notice {
                    kind: NoticeKind::Retry,
                    message: "No pudimos preparar el pedido. Vuelve a intentarlo.".to_string(),
                });
                self.submitting.fail("composition rejected");
            }
            Err(e) => {
                tracing::error!(error = %e, "order composition failed");
                self.notice = Some(Notice::from(&e));
                self.submitting.fail(e.to_string());
            }
        }
    }

    /// Forget the hand-off and start a fresh form, once the host has
    /// opened the link. Clearing the cart itself is the cart page's
    /// job.
    pub fn complete_handoff(&mut self) {
        if self.handoff.take().is_some() {
            self.info = ShippingInfo::default();
            self.errors.clear();
            self.submitting.reset();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn handoff(&self) -> Option<&WhatsAppHandoff> {
        self.handoff.as_ref()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting.is_pending()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}
