//! Checkout shipping data and order-message composition.
//!
//! The shipping record is transient input: it flows into the composed
//! order message and is never persisted by this layer. Composition itself
//! is pure string building; opening the WhatsApp channel and clearing the
//! cart afterwards belong to the calling page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::Money;

/// A checkout form field, used to attach validation errors inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingField {
    Name,
    Lastname,
    Dni,
    Province,
    City,
    Address,
    Number,
    BetweenStreets,
    PostalCode,
    Phone,
    Email,
    Observations,
}

impl ShippingField {
    /// Every field in form order.
    pub const ALL: [Self; 12] = [
        Self::Name,
        Self::Lastname,
        Self::Dni,
        Self::Province,
        Self::City,
        Self::Address,
        Self::Number,
        Self::BetweenStreets,
        Self::PostalCode,
        Self::Phone,
        Self::Email,
        Self::Observations,
    ];

    /// Label shown next to the input and inside the composed message.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Name => "Nombre",
            Self::Lastname => "Apellido",
            Self::Dni => "DNI",
            Self::Province => "Provincia",
            Self::City => "Ciudad",
            Self::Address => "Dirección",
            Self::Number => "Número",
            Self::BetweenStreets => "Entre calles",
            Self::PostalCode => "Código postal",
            Self::Phone => "Teléfono",
            Self::Email => "Email",
            Self::Observations => "Observaciones",
        }
    }

    /// Whether the field must be filled before composing the message.
    /// Only the "entre calles" reference and the free-form notes are
    /// optional.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        !matches!(self, Self::BetweenStreets | Self::Observations)
    }
}

/// One inline validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ShippingField,
    pub message: String,
}

/// Shipping and contact data collected at checkout.
///
/// Optional fields hold the empty string when unfilled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub name: String,
    pub lastname: String,
    pub dni: String,
    pub province: String,
    pub city: String,
    pub address: String,
    pub number: String,
    #[serde(default)]
    pub between_streets: String,
    pub postal_code: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub observations: String,
}

impl ShippingInfo {
    /// The raw value of `field`.
    #[must_use]
    pub fn get(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::Name => &self.name,
            ShippingField::Lastname => &self.lastname,
            ShippingField::Dni => &self.dni,
            ShippingField::Province => &self.province,
            ShippingField::City => &self.city,
            ShippingField::Address => &self.address,
            ShippingField::Number => &self.number,
            ShippingField::BetweenStreets => &self.between_streets,
            ShippingField::PostalCode => &self.postal_code,
            ShippingField::Phone => &self.phone,
            ShippingField::Email => &self.email,
            ShippingField::Observations => &self.observations,
        }
    }

    /// Overwrite the value of `field`.
    pub fn set(&mut self, field: ShippingField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ShippingField::Name => self.name = value,
            ShippingField::Lastname => self.lastname = value,
            ShippingField::Dni => self.dni = value,
            ShippingField::Province => self.province = value,
            ShippingField::City => self.city = value,
            ShippingField::Address => self.address = value,
            ShippingField::Number => self.number = value,
            ShippingField::BetweenStreets => self.between_streets = value,
            ShippingField::PostalCode => self.postal_code = value,
            ShippingField::Phone => self.phone = value,
            ShippingField::Email => self.email = value,
            ShippingField::Observations => self.observations = value,
        }
    }

    /// Validate the whole record, returning every failure at once so the
    /// form can mark each offending input without clearing any of them.
    ///
    /// # Errors
    ///
    /// One [`FieldError`] per failing field, in form order.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for field in ShippingField::ALL {
            if field.is_required() && self.get(field).trim().is_empty() {
                errors.push(FieldError {
                    field,
                    message: format!("{} es obligatorio", field.label()),
                });
            }
        }
        if !self.email.trim().is_empty() && !is_plausible_email(&self.email) {
            errors.push(FieldError {
                field: ShippingField::Email,
                message: "Email inválido".to_string(),
            });
        }
        if !self.phone.trim().is_empty() && !is_plausible_phone(&self.phone) {
            errors.push(FieldError {
                field: ShippingField::Phone,
                message: "Teléfono inválido".to_string(),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn is_plausible_email(value: &str) -> bool {
    value.trim().split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    })
}

fn is_plausible_phone(value: &str) -> bool {
    value.chars().filter(char::is_ascii_digit).count() >= 6
}

/// One itemized line of the order summary, snapshotted at composition time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub title: String,
    pub quantity: u32,
    /// Effective per-unit price at composition time.
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderLine {
    /// Snapshot a cart line at `now`.
    #[must_use]
    pub fn from_cart_line(line: &CartLine, now: DateTime<Utc>) -> Self {
        Self {
            title: line.product.title.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price(now),
            subtotal: line.subtotal(now),
        }
    }
}

/// Compose the human-readable WhatsApp order summary.
///
/// Itemized product lines, then the total, then the shipping fields with
/// the empty optional ones omitted. The item lines keep a fixed
/// `title xN | unit | subtotal` shape so the receiving side can re-check
/// an order against them.
#[must_use]
pub fn compose_order_message(lines: &[OrderLine], total: Money, info: &ShippingInfo) -> String {
    let mut message = String::from("*Nuevo pedido*\n\n*Productos:*\n");
    for line in lines {
        message.push_str(&format!(
            "- {} x{} | Precio unitario: {} | Subtotal: {}\n",
            line.title, line.quantity, line.unit_price, line.subtotal
        ));
    }
    message.push_str(&format!("\n*Total: {total}*\n\n*Datos de envío:*\n"));

    for field in ShippingField::ALL {
        let value = info.get(field).trim();
        if !field.is_required() && value.is_empty() {
            continue;
        }
        message.push_str(&format!("{}: {value}\n", field.label()));
    }
    message
}
