//! Stock availability gates.
//!
//! Availability derives from the stock count alone. Whether a product is
//! listed at all is the admin-controlled `is_active` flag, an independent
//! axis that must never be folded into these checks: an active product with
//! zero stock still renders, marked out of stock.

/// True when at least one unit can be added to a cart.
#[must_use]
pub const fn can_add(stock: u32) -> bool {
    stock > 0
}

/// True while one more unit still fits under the stock ceiling.
#[must_use]
pub const fn can_increment(current_quantity: u32, stock: u32) -> bool {
    current_quantity < stock
}

/// True while the quantity can shrink without reaching zero.
///
/// Hitting zero is not a decrement; removing the line is its own explicit
/// action.
#[must_use]
pub const fn can_decrement(current_quantity: u32) -> bool {
    current_quantity > 1
}

/// User-facing availability label: "1 unidad", "5 unidades", "Sin stock".
#[must_use]
pub fn availability_label(stock: u32) -> String {
    match stock {
        0 => "Sin stock".to_string(),
        1 => "1 unidad".to_string(),
        n => format!("{n} unidades"),
    }
}
