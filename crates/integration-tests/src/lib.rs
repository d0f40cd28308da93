//! Cross-crate tests for Chispa Fría.
//!
//! The storefront and back-office crates are exercised together here,
//! against [`FakeStore`]: one in-memory Data API implementing all three
//! operation traits over shared state. A test can create an offer
//! through an admin form and watch the discount appear on a storefront
//! card, the way the deployed pages see each other through the real
//! backend.
//!
//! Every trait call lands in an operation log, so tests can also assert
//! what traffic a page generated (or, just as often, that it generated
//! none).

use std::sync::{Mutex, MutexGuard, Once, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use chispa_client::api::{
    AdminApi, ApiResult, CartApi, CartLineSnapshot, CartSnapshot, CatalogApi, CategoryFilters,
    CategoryInput, ComposedMessage, MediaInput, OfferInput, ProductFilters, ProductInput,
    StatusFilter, StockFilter,
};
use chispa_client::error::ApiError;
use chispa_core::catalog::{
    CategoryNode, CategoryRef, MediaItem, MediaKind, Offer, Page, Product, ProductRef,
};
use chispa_core::checkout::{OrderLine, ShippingInfo, compose_order_message};
use chispa_core::pricing::resolve_price;
use chispa_core::types::{CategoryId, MediaId, Money, OfferId, ProductId};

const PRODUCT_PAGE_SIZE: u32 = 12;
const CATEGORY_PAGE_SIZE: u32 = 50;
const OFFER_PAGE_SIZE: u32 = 15;

/// Route page logs through the test harness once per process.
/// `RUST_LOG` narrows the output the usual way.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| "chispa_core=info,chispa_client=info,chispa_storefront=info,chispa_admin=info".into(),
        );
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}

/// A category as the store keeps it; trees are assembled per request.
#[derive(Debug, Clone)]
struct CategoryRecord {
    id: CategoryId,
    name: String,
    slug: String,
    parent_id: Option<CategoryId>,
    is_active: bool,
    sort_order: i32,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Products without offers attached; serving embeds the offer.
    products: Vec<Product>,
    categories: Vec<CategoryRecord>,
    /// At most one per product, enforced on create.
    offers: Vec<Offer>,
    /// The session cart, in insertion order.
    cart: Vec<(ProductId, u32)>,
    next_id: i64,
}

/// In-memory Data API backing a whole test.
#[derive(Debug, Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
    ops: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl FakeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding (bypasses the operation log)
    // =========================================================================

    /// Insert a category; `parent` of `None` makes it a main category.
    pub fn seed_category(&self, name: &str, parent: Option<CategoryId>) -> CategoryId {
        let mut state = self.state();
        let id = CategoryId::new(alloc(&mut state));
        let sort_order = i32::try_from(state.categories.len()).unwrap_or(i32::MAX);
        state.categories.push(CategoryRecord {
            id,
            name: name.to_string(),
            slug: slug::slugify(name),
            parent_id: parent,
            is_active: true,
            sort_order,
        });
        id
    }

    /// Insert an active, non-featured product without media.
    pub fn seed_product(&self, title: &str, price: i64, stock: u32, category: CategoryId) -> ProductId {
        let mut state = self.state();
        let Some(record) = state.categories.iter().find(|c| c.id == category) else {
            panic!("seed_product: unknown category {category}");
        };
        let category = category_ref(record);
        let id = ProductId::new(alloc(&mut state));
        state.products.push(Product {
            id,
            title: title.to_string(),
            description: String::new(),
            price: Money::from(price),
            stock,
            is_active: true,
            is_featured: false,
            category,
            media: Vec::new(),
            current_offer: None,
        });
        id
    }

    /// Attach a gallery image to a product.
    pub fn seed_media(&self, product: ProductId, url: &str, is_primary: bool) -> MediaId {
        let mut state = self.state();
        let id = MediaId::new(alloc(&mut state));
        let Some(slot) = state.products.iter_mut().find(|p| p.id == product) else {
            panic!("seed_media: unknown product {product}");
        };
        slot.media.push(MediaItem {
            id,
            product_id: product,
            kind: MediaKind::Image,
            url: url.to_string(),
            alt_text: None,
            is_primary,
        });
        id
    }

    /// Attach an open-window active offer to a product.
    pub fn seed_offer(&self, product: ProductId, offer_price: i64) -> OfferId {
        let mut state = self.state();
        let id = OfferId::new(alloc(&mut state));
        state.offers.push(Offer {
            id,
            product_id: product,
            product: None,
            offer_price: Money::from(offer_price),
            percentage_discount: None,
            starts_at: None,
            ends_at: None,
            is_active: true,
        });
        id
    }

    /// Overwrite a product's visibility flags.
    pub fn set_product_flags(&self, id: ProductId, is_active: bool, is_featured: bool) {
        let mut state = self.state();
        let Some(slot) = state.products.iter_mut().find(|p| p.id == id) else {
            panic!("set_product_flags: unknown product {id}");
        };
        slot.is_active = is_active;
        slot.is_featured = is_featured;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// A product as the API would serve it, offer embedded.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<Product> {
        let state = self.state();
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| serve_product(&state, p))
    }

    /// Cart lines as `(product, quantity)` in insertion order.
    #[must_use]
    pub fn cart_quantities(&self) -> Vec<(ProductId, u32)> {
        self.state().cart.clone()
    }

    /// The full operation log, oldest first.
    #[must_use]
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many logged requests used `method`, failed attempts included.
    #[must_use]
    pub fn ops_named(&self, method: &str) -> usize {
        let prefix = format!("{method} ");
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|op| *op == method || op.starts_with(&prefix))
            .count()
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    /// Make the next call to `method` answer with a server error.
    pub fn fail_once(&self, method: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method.to_string());
    }

    fn log(&self, op: String) {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    fn check_fail(&self, method: &str) -> Result<(), ApiError> {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(position) = failures.iter().position(|m| m == method) {
            failures.remove(position);
            return Err(ApiError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        Ok(())
    }
}

fn alloc(state: &mut StoreState) -> i64 {
    state.next_id += 1;
    state.next_id
}

fn category_ref(record: &CategoryRecord) -> CategoryRef {
    CategoryRef {
        id: record.id,
        name: record.name.clone(),
        slug: record.slug.clone(),
    }
}

fn serve_product(state: &StoreState, product: &Product) -> Product {
    let mut served = product.clone();
    served.current_offer = state
        .offers
        .iter()
        .find(|o| o.product_id == product.id)
        .cloned();
    served
}

fn serve_category(state: &StoreState, record: &CategoryRecord, with_children: bool) -> CategoryNode {
    let children: Vec<CategoryNode> = if with_children {
        state
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(record.id))
            .map(|c| serve_category(state, c, false))
            .collect()
    } else {
        Vec::new()
    };
    let children_count = state
        .categories
        .iter()
        .filter(|c| c.parent_id == Some(record.id))
        .count();
    // Product counts roll up subcategories into their main.
    let mut scope: Vec<CategoryId> = vec![record.id];
    scope.extend(
        state
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(record.id))
            .map(|c| c.id),
    );
    let products_count = state
        .products
        .iter()
        .filter(|p| scope.contains(&p.category.id))
        .count();
    CategoryNode {
        id: record.id,
        name: record.name.clone(),
        slug: record.slug.clone(),
        parent: record
            .parent_id
            .and_then(|pid| state.categories.iter().find(|c| c.id == pid))
            .map(category_ref),
        is_active: record.is_active,
        sort_order: record.sort_order,
        children_count: u32::try_from(children_count).unwrap_or(u32::MAX),
        products_count: u32::try_from(products_count).unwrap_or(u32::MAX),
        children,
    }
}

fn snapshot(state: &StoreState) -> CartSnapshot {
    let now = Utc::now();
    let lines: Vec<CartLineSnapshot> = state
        .cart
        .iter()
        .filter_map(|(id, quantity)| {
            let product = state.products.iter().find(|p| p.id == *id)?;
            Some(CartLineSnapshot {
                product: serve_product(state, product),
                quantity: *quantity,
            })
        })
        .collect();
    let total = lines
        .iter()
        .map(|line| {
            resolve_price(line.product.price, line.product.current_offer.as_ref(), now)
                .effective_price
                .times(line.quantity)
        })
        .sum();
    CartSnapshot { lines, total }
}

fn page_of<T: Clone>(items: &[T], page: u32, per_page: u32) -> Page<T> {
    let page = page.max(1);
    let start = ((page - 1) * per_page) as usize;
    let data: Vec<T> = items
        .iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect();
    Page {
        data,
        current_page: page,
        last_page: u32::try_from(items.len())
            .unwrap_or(u32::MAX)
            .div_ceil(per_page)
            .max(1),
        per_page,
        total: items.len() as u64,
    }
}

// =============================================================================
// Catalog operations
// =============================================================================

#[async_trait]
impl CatalogApi for FakeStore {
    async fn list_products(&self, filters: &ProductFilters, page: u32) -> ApiResult<Page<Product>> {
        self.log(format!("list_products page={page}"));
        self.check_fail("list_products")?;
        let state = self.state();

        // A main category matches its whole subtree.
        let category_ids: Option<Vec<CategoryId>> = filters.category.map(|id| {
            let mut ids = vec![id];
            ids.extend(
                state
                    .categories
                    .iter()
                    .filter(|c| c.parent_id == Some(id))
                    .map(|c| c.id),
            );
            ids
        });
        let term = filters.search.as_ref().map(|t| t.to_lowercase());

        let matches: Vec<Product> = state
            .products
            .iter()
            .filter(|p| {
                term.as_ref().is_none_or(|t| {
                    p.title.to_lowercase().contains(t) || p.description.to_lowercase().contains(t)
                })
            })
            .filter(|p| {
                category_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&p.category.id))
            })
            .filter(|p| match filters.status {
                Some(StatusFilter::Active) => p.is_active,
                Some(StatusFilter::Inactive) => !p.is_active,
                None => true,
            })
            .filter(|p| match filters.stock {
                Some(StockFilter::InStock) => p.stock > 0,
                Some(StockFilter::OutOfStock) => p.stock == 0,
                None => true,
            })
            .map(|p| serve_product(&state, p))
            .collect();

        Ok(page_of(
            &matches,
            page,
            filters.per_page.unwrap_or(PRODUCT_PAGE_SIZE),
        ))
    }

    async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
        self.log(format!("get_product {id}"));
        self.check_fail("get_product")?;
        let state = self.state();
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| serve_product(&state, p))
            .ok_or_else(|| ApiError::NotFound("Producto no encontrado".to_string()))
    }

    async fn list_categories(
        &self,
        filters: &CategoryFilters,
        page: u32,
    ) -> ApiResult<Page<CategoryNode>> {
        self.log(format!("list_categories page={page}"));
        self.check_fail("list_categories")?;
        let state = self.state();
        let term = filters.search.as_ref().map(|t| t.to_lowercase());

        // The unfiltered listing is flat with children embedded on the
        // mains, so the storefront reads it as a tree and the back
        // office as rows. A parent filter narrows to that parent's
        // children.
        let matches: Vec<CategoryNode> = state
            .categories
            .iter()
            .filter(|c| {
                filters
                    .parent
                    .is_none_or(|parent| c.parent_id == Some(parent))
            })
            .filter(|c| {
                term.as_ref()
                    .is_none_or(|t| c.name.to_lowercase().contains(t))
            })
            .map(|c| serve_category(&state, c, c.parent_id.is_none()))
            .collect();

        Ok(page_of(
            &matches,
            page,
            filters.per_page.unwrap_or(CATEGORY_PAGE_SIZE),
        ))
    }

    async fn get_category(&self, id: CategoryId) -> ApiResult<CategoryNode> {
        self.log(format!("get_category {id}"));
        self.check_fail("get_category")?;
        let state = self.state();
        state
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| serve_category(&state, c, true))
            .ok_or_else(|| ApiError::NotFound("Categoría no encontrada".to_string()))
    }
}

// =============================================================================
// Cart operations
// =============================================================================

#[async_trait]
impl CartApi for FakeStore {
    async fn get_cart(&self) -> ApiResult<CartSnapshot> {
        self.log("get_cart".to_string());
        self.check_fail("get_cart")?;
        let state = self.state();
        Ok(snapshot(&state))
    }

    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> ApiResult<CartSnapshot> {
        self.log(format!("add_to_cart {product_id} x{quantity}"));
        self.check_fail("add_to_cart")?;
        let mut state = self.state();
        let stock = state
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock)
            .ok_or_else(|| ApiError::NotFound("Producto no encontrado".to_string()))?;

        let current = state
            .cart
            .iter()
            .find(|(id, _)| *id == product_id)
            .map_or(0, |(_, q)| *q);
        let merged = current.saturating_add(quantity.max(1));
        if merged > stock {
            return Err(ApiError::Validation {
                field: Some("quantity".to_string()),
                message: "Sin stock suficiente".to_string(),
            });
        }
        if let Some(line) = state.cart.iter_mut().find(|(id, _)| *id == product_id) {
            line.1 = merged;
        } else {
            state.cart.push((product_id, merged));
        }
        Ok(snapshot(&state))
    }

    async fn update_cart_line(&self, product_id: ProductId, quantity: u32) -> ApiResult<CartSnapshot> {
        self.log(format!("update_cart_line {product_id} -> {quantity}"));
        self.check_fail("update_cart_line")?;
        let mut state = self.state();
        if !state.cart.iter().any(|(id, _)| *id == product_id) {
            return Err(ApiError::NotFound(
                "El producto no está en el carrito".to_string(),
            ));
        }
        if quantity == 0 {
            state.cart.retain(|(id, _)| *id != product_id);
            return Ok(snapshot(&state));
        }
        let stock = state
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map_or(0, |p| p.stock);
        if quantity > stock {
            return Err(ApiError::Validation {
                field: Some("quantity".to_string()),
                message: "Sin stock suficiente".to_string(),
            });
        }
        if let Some(line) = state.cart.iter_mut().find(|(id, _)| *id == product_id) {
            line.1 = quantity;
        }
        Ok(snapshot(&state))
    }

    async fn remove_cart_line(&self, product_id: ProductId) -> ApiResult<CartSnapshot> {
        self.log(format!("remove_cart_line {product_id}"));
        self.check_fail("remove_cart_line")?;
        let mut state = self.state();
        let before = state.cart.len();
        state.cart.retain(|(id, _)| *id != product_id);
        if state.cart.len() == before {
            return Err(ApiError::NotFound(
                "El producto no está en el carrito".to_string(),
            ));
        }
        Ok(snapshot(&state))
    }

    async fn clear_cart(&self) -> ApiResult<()> {
        self.log("clear_cart".to_string());
        self.check_fail("clear_cart")?;
        self.state().cart.clear();
        Ok(())
    }

    async fn compose_whatsapp_message(
        &self,
        lines: &[OrderLine],
        customer: &ShippingInfo,
    ) -> ApiResult<ComposedMessage> {
        self.log("compose_whatsapp_message".to_string());
        self.check_fail("compose_whatsapp_message")?;
        let total: Money = lines.iter().map(|line| line.subtotal).sum();
        Ok(ComposedMessage {
            success: true,
            message: compose_order_message(lines, total, customer),
        })
    }
}

// =============================================================================
// Admin operations
// =============================================================================

#[async_trait]
impl AdminApi for FakeStore {
    async fn create_product(&self, input: &ProductInput, media: &[MediaInput]) -> ApiResult<Product> {
        self.log("create_product".to_string());
        self.check_fail("create_product")?;
        let mut state = self.state();
        let Some(record) = state.categories.iter().find(|c| c.id == input.category_id) else {
            return Err(ApiError::Validation {
                field: Some("category_id".to_string()),
                message: "La categoría no existe".to_string(),
            });
        };
        let category = category_ref(record);
        let id = ProductId::new(alloc(&mut state));
        let media: Vec<MediaItem> = media
            .iter()
            .map(|item| MediaItem {
                id: MediaId::new(alloc(&mut state)),
                product_id: id,
                kind: item.kind,
                url: item.url.clone(),
                alt_text: item.alt_text.clone(),
                is_primary: item.is_primary,
            })
            .collect();
        let product = Product {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price,
            stock: input.stock,
            is_active: input.is_active,
            is_featured: input.is_featured,
            category,
            media,
            current_offer: None,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
        media_add: &[MediaInput],
        media_remove: &[MediaId],
    ) -> ApiResult<Product> {
        self.log(format!("update_product {id}"));
        self.check_fail("update_product")?;
        let mut state = self.state();
        let Some(record) = state.categories.iter().find(|c| c.id == input.category_id) else {
            return Err(ApiError::Validation {
                field: Some("category_id".to_string()),
                message: "La categoría no existe".to_string(),
            });
        };
        let category = category_ref(record);
        let mut added: Vec<MediaItem> = media_add
            .iter()
            .map(|item| MediaItem {
                id: MediaId::new(alloc(&mut state)),
                product_id: id,
                kind: item.kind,
                url: item.url.clone(),
                alt_text: item.alt_text.clone(),
                is_primary: item.is_primary,
            })
            .collect();
        let Some(slot) = state.products.iter_mut().find(|p| p.id == id) else {
            return Err(ApiError::NotFound("Producto no encontrado".to_string()));
        };
        slot.title = input.title.clone();
        slot.description = input.description.clone();
        slot.price = input.price;
        slot.stock = input.stock;
        slot.is_active = input.is_active;
        slot.is_featured = input.is_featured;
        slot.category = category;
        slot.media.retain(|item| !media_remove.contains(&item.id));
        slot.media.append(&mut added);
        let updated = slot.clone();
        Ok(serve_product(&state, &updated))
    }

    async fn delete_product(&self, id: ProductId) -> ApiResult<()> {
        self.log(format!("delete_product {id}"));
        self.check_fail("delete_product")?;
        let mut state = self.state();
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(ApiError::NotFound("Producto no encontrado".to_string()));
        }
        state.offers.retain(|o| o.product_id != id);
        state.cart.retain(|(pid, _)| *pid != id);
        Ok(())
    }

    async fn set_primary_image(&self, product_id: ProductId, media_id: MediaId) -> ApiResult<()> {
        self.log(format!("set_primary_image {product_id} {media_id}"));
        self.check_fail("set_primary_image")?;
        let mut state = self.state();
        let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) else {
            return Err(ApiError::NotFound("Producto no encontrado".to_string()));
        };
        if !product.media.iter().any(|item| item.id == media_id) {
            return Err(ApiError::NotFound("Imagen no encontrada".to_string()));
        }
        for item in &mut product.media {
            item.is_primary = item.id == media_id;
        }
        Ok(())
    }

    async fn toggle_product_active(&self, id: ProductId) -> ApiResult<()> {
        self.log(format!("toggle_product_active {id}"));
        self.check_fail("toggle_product_active")?;
        let mut state = self.state();
        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Err(ApiError::NotFound("Producto no encontrado".to_string()));
        };
        product.is_active = !product.is_active;
        Ok(())
    }

    async fn toggle_product_featured(&self, id: ProductId) -> ApiResult<()> {
        self.log(format!("toggle_product_featured {id}"));
        self.check_fail("toggle_product_featured")?;
        let mut state = self.state();
        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Err(ApiError::NotFound("Producto no encontrado".to_string()));
        };
        product.is_featured = !product.is_featured;
        Ok(())
    }

    async fn create_category(&self, input: &CategoryInput) -> ApiResult<CategoryNode> {
        self.log("create_category".to_string());
        self.check_fail("create_category")?;
        let mut state = self.state();
        validate_category(&state, input, None)?;
        let id = CategoryId::new(alloc(&mut state));
        let record = CategoryRecord {
            id,
            name: input.name.clone(),
            slug: input.slug.clone(),
            parent_id: input.parent_id,
            is_active: input.is_active,
            sort_order: input.sort_order,
        };
        state.categories.push(record.clone());
        Ok(serve_category(&state, &record, true))
    }

    async fn update_category(&self, id: CategoryId, input: &CategoryInput) -> ApiResult<CategoryNode> {
        self.log(format!("update_category {id}"));
        self.check_fail("update_category")?;
        let mut state = self.state();
        validate_category(&state, input, Some(id))?;
        let Some(record) = state.categories.iter_mut().find(|c| c.id == id) else {
            return Err(ApiError::NotFound("Categoría no encontrada".to_string()));
        };
        record.name = input.name.clone();
        record.slug = input.slug.clone();
        record.parent_id = input.parent_id;
        record.is_active = input.is_active;
        record.sort_order = input.sort_order;
        let record = record.clone();
        Ok(serve_category(&state, &record, true))
    }

    async fn delete_category(&self, id: CategoryId) -> ApiResult<()> {
        self.log(format!("delete_category {id}"));
        self.check_fail("delete_category")?;
        let mut state = self.state();
        if !state.categories.iter().any(|c| c.id == id) {
            return Err(ApiError::NotFound("Categoría no encontrada".to_string()));
        }
        if state.categories.iter().any(|c| c.parent_id == Some(id)) {
            return Err(ApiError::Conflict(
                "La categoría tiene subcategorías asociadas".to_string(),
            ));
        }
        if state.products.iter().any(|p| p.category.id == id) {
            return Err(ApiError::Conflict(
                "La categoría tiene productos asociados".to_string(),
            ));
        }
        state.categories.retain(|c| c.id != id);
        Ok(())
    }

    async fn toggle_category_active(&self, id: CategoryId) -> ApiResult<()> {
        self.log(format!("toggle_category_active {id}"));
        self.check_fail("toggle_category_active")?;
        let mut state = self.state();
        let Some(record) = state.categories.iter_mut().find(|c| c.id == id) else {
            return Err(ApiError::NotFound("Categoría no encontrada".to_string()));
        };
        record.is_active = !record.is_active;
        Ok(())
    }

    async fn list_offers(&self, page: u32) -> ApiResult<Page<Offer>> {
        self.log(format!("list_offers page={page}"));
        self.check_fail("list_offers")?;
        let state = self.state();
        let offers: Vec<Offer> = state
            .offers
            .iter()
            .map(|offer| {
                let mut served = offer.clone();
                served.product = state
                    .products
                    .iter()
                    .find(|p| p.id == offer.product_id)
                    .map(|p| ProductRef {
                        id: p.id,
                        title: p.title.clone(),
                        price: p.price,
                    });
                served
            })
            .collect();
        Ok(page_of(&offers, page, OFFER_PAGE_SIZE))
    }

    async fn create_offer(&self, product_id: ProductId, input: &OfferInput) -> ApiResult<Offer> {
        self.log(format!("create_offer {product_id}"));
        self.check_fail("create_offer")?;
        let mut state = self.state();
        let Some(product) = state.products.iter().find(|p| p.id == product_id) else {
            return Err(ApiError::NotFound("Producto no encontrado".to_string()));
        };
        if state.offers.iter().any(|o| o.product_id == product_id) {
            return Err(ApiError::Conflict(
                "El producto ya tiene una oferta".to_string(),
            ));
        }
        if input.offer_price >= product.price {
            return Err(ApiError::Validation {
                field: Some("offer_price".to_string()),
                message: "La oferta debe ser menor al precio del producto".to_string(),
            });
        }
        let id = OfferId::new(alloc(&mut state));
        let offer = Offer {
            id,
            product_id,
            product: None,
            offer_price: input.offer_price,
            percentage_discount: input.percentage_discount,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            is_active: input.is_active,
        };
        state.offers.push(offer.clone());
        Ok(offer)
    }

    async fn update_offer(&self, id: OfferId, input: &OfferInput) -> ApiResult<Offer> {
        self.log(format!("update_offer {id}"));
        self.check_fail("update_offer")?;
        let mut state = self.state();
        let product_price = state
            .offers
            .iter()
            .find(|o| o.id == id)
            .and_then(|offer| state.products.iter().find(|p| p.id == offer.product_id))
            .map(|p| p.price);
        if let Some(price) = product_price
            && input.offer_price >= price
        {
            return Err(ApiError::Validation {
                field: Some("offer_price".to_string()),
                message: "La oferta debe ser menor al precio del producto".to_string(),
            });
        }
        let Some(offer) = state.offers.iter_mut().find(|o| o.id == id) else {
            return Err(ApiError::NotFound("Oferta no encontrada".to_string()));
        };
        offer.offer_price = input.offer_price;
        offer.percentage_discount = input.percentage_discount;
        offer.starts_at = input.starts_at;
        offer.ends_at = input.ends_at;
        offer.is_active = input.is_active;
        Ok(offer.clone())
    }

    async fn delete_offer(&self, id: OfferId) -> ApiResult<()> {
        self.log(format!("delete_offer {id}"));
        self.check_fail("delete_offer")?;
        let mut state = self.state();
        let before = state.offers.len();
        state.offers.retain(|o| o.id != id);
        if state.offers.len() == before {
            return Err(ApiError::NotFound("Oferta no encontrada".to_string()));
        }
        Ok(())
    }

    async fn toggle_offer_active(&self, id: OfferId) -> ApiResult<()> {
        self.log(format!("toggle_offer_active {id}"));
        self.check_fail("toggle_offer_active")?;
        let mut state = self.state();
        let Some(offer) = state.offers.iter_mut().find(|o| o.id == id) else {
            return Err(ApiError::NotFound("Oferta no encontrada".to_string()));
        };
        offer.is_active = !offer.is_active;
        Ok(())
    }
}

fn validate_category(
    state: &StoreState,
    input: &CategoryInput,
    updating: Option<CategoryId>,
) -> Result<(), ApiError> {
    if state
        .categories
        .iter()
        .any(|c| c.slug == input.slug && updating != Some(c.id))
    {
        return Err(ApiError::Conflict("El slug ya está en uso".to_string()));
    }
    if let Some(parent_id) = input.parent_id {
        let Some(parent) = state.categories.iter().find(|c| c.id == parent_id) else {
            return Err(ApiError::Validation {
                field: Some("parent_id".to_string()),
                message: "La categoría padre no existe".to_string(),
            });
        };
        // The hierarchy is exactly two levels deep.
        if parent.parent_id.is_some() {
            return Err(ApiError::Validation {
                field: Some("parent_id".to_string()),
                message: "Solo se permiten dos niveles de categorías".to_string(),
            });
        }
    }
    Ok(())
}
