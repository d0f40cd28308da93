//! The WhatsApp hand-off: shipping form, message composition and the
//! cart clear that follows a completed order.

use chrono::Utc;

use chispa_client::api::CartApi;
use chispa_client::error::NoticeKind;
use chispa_core::checkout::ShippingField;
use chispa_integration_tests::{FakeStore, init_tracing};
use chispa_storefront::{CartPage, CheckoutPage};

fn fill_required(page: &mut CheckoutPage<'_>) {
    page.set_field(ShippingField::Name, "Carla");
    page.set_field(ShippingField::Lastname, "Rojas");
    page.set_field(ShippingField::Dni, "12345678-9");
    page.set_field(ShippingField::Province, "Santiago");
    page.set_field(ShippingField::City, "Providencia");
    page.set_field(ShippingField::Address, "Av. Italia");
    page.set_field(ShippingField::Number, "1234");
    page.set_field(ShippingField::PostalCode, "7500000");
    page.set_field(ShippingField::Phone, "+56 9 8765 4321");
    page.set_field(ShippingField::Email, "carla@example.com");
}

#[tokio::test]
async fn test_order_handoff_end_to_end() {
    init_tracing();
    let store = FakeStore::new();
    let interiores = store.seed_category("Interiores", None);
    let chispero = store.seed_product("Chispero frío 60 cm", 15_000, 5, interiores);
    store.seed_offer(chispero, 12_000);
    let base = store.seed_product("Base giratoria", 9_000, 4, interiores);
    store.add_to_cart(chispero, 2).await.unwrap();
    store.add_to_cart(base, 1).await.unwrap();

    let now = Utc::now();
    let mut cart_page = CartPage::new(&store);
    cart_page.load(now).await;
    assert_eq!(cart_page.total(now).to_string(), "$33.000");

    let mut checkout = CheckoutPage::new(&store, "56912345678");
    fill_required(&mut checkout);
    checkout.submit(cart_page.cart(), now).await;

    let handoff = checkout.handoff().unwrap();
    assert!(
        handoff.message.contains(
            "- Chispero frío 60 cm x2 | Precio unitario: $12.000 | Subtotal: $24.000"
        )
    );
    assert!(handoff.message.contains("- Base giratoria x1"));
    assert!(handoff.message.contains("*Total: $33.000*"));
    assert!(handoff.message.contains("Ciudad: Providencia"));
    assert!(handoff.url.starts_with("https://wa.me/56912345678?text="));

    // the order left; the cart empties on both sides and the form resets
    cart_page.clear_after_checkout(now).await;
    checkout.complete_handoff();
    assert!(cart_page.is_empty());
    assert!(store.cart_quantities().is_empty());
    assert!(checkout.handoff().is_none());
    assert_eq!(checkout.field_value(ShippingField::Name), "");
}

#[tokio::test]
async fn test_missing_fields_block_composition() {
    init_tracing();
    let store = FakeStore::new();
    let interiores = store.seed_category("Interiores", None);
    let chispero = store.seed_product("Chispero frío 60 cm", 15_000, 5, interiores);
    store.add_to_cart(chispero, 1).await.unwrap();

    let now = Utc::now();
    let mut cart_page = CartPage::new(&store);
    cart_page.load(now).await;

    let mut checkout = CheckoutPage::new(&store, "56912345678");
    checkout.submit(cart_page.cart(), now).await;

    assert!(checkout.has_errors());
    assert_eq!(
        checkout.field_error(ShippingField::Name),
        Some("Nombre es obligatorio")
    );
    assert!(checkout.handoff().is_none());
    assert_eq!(store.ops_named("compose_whatsapp_message"), 0);
}

#[tokio::test]
async fn test_composition_failure_keeps_the_form_for_retry() {
    init_tracing();
    let store = FakeStore::new();
    let interiores = store.seed_category("Interiores", None);
    let chispero = store.seed_product("Chispero frío 60 cm", 15_000, 5, interiores);
    store.add_to_cart(chispero, 1).await.unwrap();

    let now = Utc::now();
    let mut cart_page = CartPage::new(&store);
    cart_page.load(now).await;

    let mut checkout = CheckoutPage::new(&store, "56912345678");
    fill_required(&mut checkout);

    store.fail_once("compose_whatsapp_message");
    checkout.submit(cart_page.cart(), now).await;
    let notice = checkout.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Retry);
    assert!(checkout.handoff().is_none());
    assert_eq!(checkout.field_value(ShippingField::City), "Providencia");

    checkout.submit(cart_page.cart(), now).await;
    assert!(checkout.handoff().is_some());
    assert_eq!(store.ops_named("compose_whatsapp_message"), 2);
}
