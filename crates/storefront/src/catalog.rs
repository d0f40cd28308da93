//! Catalog page: product grid with search and category drill-down.
//!
//! The page keeps every product fetched so far (pages accumulate under
//! a "load more" control) and projects them into [`ProductCard`]s at
//! render time, so offer windows that open or close while the page is
//! on screen are reflected on the next render without a refetch.

use chrono::{DateTime, Utc};

use chispa_client::api::{CatalogApi, CategoryFilters, ProductFilters, StatusFilter};
use chispa_client::error::{ApiError, Notice};
use chispa_core::action::ActionState;
use chispa_core::catalog::{CategoryNode, Product};
use chispa_core::category::{self, CategoryView};
use chispa_core::pricing::resolve_price;
use chispa_core::stock;
use chispa_core::types::{CategoryId, ProductId};

/// Product display data for the catalog grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub id: ProductId,
    pub title: String,
    /// Effective price, formatted (`$12.000`).
    pub price: String,
    /// Struck-through list price, present only while an offer applies.
    pub list_price: Option<String>,
    /// Discount badge text (`-20%`).
    pub discount_badge: Option<String>,
    /// Savings line (`Ahorras $3.000`).
    pub savings_label: Option<String>,
    /// Availability line (`5 unidades`, `Sin stock`).
    pub availability: String,
    /// False disables the add-to-cart control.
    pub in_stock: bool,
    pub is_featured: bool,
    /// Representative image, when the gallery has one.
    pub image_url: Option<String>,
    pub category_name: String,
}

impl ProductCard {
    /// Project `product` into its grid card as of `now`.
    #[must_use]
    pub fn from_product(product: &Product, now: DateTime<Utc>) -> Self {
        let quote = resolve_price(product.price, product.current_offer.as_ref(), now);
        Self {
            id: product.id,
            title: product.title.clone(),
            price: quote.effective_price.to_string(),
            list_price: quote.has_offer.then(|| product.price.to_string()),
            discount_badge: quote.discount_percent.map(|pct| format!("-{pct}%")),
            savings_label: quote.savings.map(|saved| format!("Ahorras {saved}")),
            availability: stock::availability_label(product.stock),
            in_stock: stock::can_add(product.stock),
            is_featured: product.is_featured,
            image_url: product.primary_media().map(|media| media.url.clone()),
            category_name: product.category.name.clone(),
        }
    }
}

/// State of the catalog page.
pub struct CatalogPage<'a> {
    api: &'a dyn CatalogApi,
    /// Products accumulated across loaded pages.
    products: Vec<Product>,
    current_page: u32,
    last_page: u32,
    /// Full category tree, mains with children embedded.
    categories: Vec<CategoryNode>,
    search: String,
    selected_main: Option<CategoryId>,
    selected_sub: Option<CategoryId>,
    loading: ActionState,
    notice: Option<Notice>,
}

impl<'a> CatalogPage<'a> {
    #[must_use]
    pub fn new(api: &'a dyn CatalogApi) -> Self {
        Self {
            api,
            products: Vec::new(),
            current_page: 0,
            last_page: 0,
            categories: Vec::new(),
            search: String::new(),
            selected_main: None,
            selected_sub: None,
            loading: ActionState::default(),
            notice: None,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Initial load: the category tree plus the first page of products.
    pub async fn load(&mut self) {
        self.run_fetch(1).await;
    }

    /// Fetch the next page and append it to the grid.
    pub async fn load_more(&mut self) {
        if !self.has_more() {
            return;
        }
        let next = self.current_page + 1;
        self.run_fetch(next).await;
    }

    async fn run_fetch(&mut self, page: u32) {
        if self.loading.begin().is_err() {
            return;
        }
        self.notice = None;
        match self.fetch(page).await {
            Ok(()) => self.loading.succeed(),
            Err(e) => {
                tracing::error!(error = %e, page, "catalog load failed");
                self.notice = Some(Notice::from(&e));
                self.loading.fail(e.to_string());
            }
        }
    }

    async fn fetch(&mut self, page: u32) -> Result<(), ApiError> {
        if self.categories.is_empty() {
            let categories = self
                .api
                .list_categories(&CategoryFilters::default(), 1)
                .await?;
            self.categories = categories.data;
        }
        let filters = self.filters();
        let products = self.api.list_products(&filters, page).await?;
        self.current_page = products.current_page;
        self.last_page = products.last_page;
        if page <= 1 {
            self.products = products.data;
        } else {
            self.products.extend(products.data);
        }
        Ok(())
    }

    /// The server-side query the current selection translates to. The
    /// storefront only ever asks for active products.
    fn filters(&self) -> ProductFilters {
        let term = self.search.trim();
        ProductFilters {
            search: (!term.is_empty()).then(|| term.to_string()),
            category: self.selected_sub.or(self.selected_main),
            status: Some(StatusFilter::Active),
            stock: None,
            per_page: None,
        }
    }

    // =========================================================================
    // Search & drill-down
    // =========================================================================

    /// Apply a search term and reload from the first page.
    pub async fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.run_fetch(1).await;
    }

    /// Drill into a main category. Clears any subcategory selection.
    pub async fn select_main(&mut self, id: CategoryId) {
        self.selected_main = Some(id);
        self.selected_sub = None;
        self.run_fetch(1).await;
    }

    /// Narrow to a subcategory of the selected main category.
    pub async fn select_sub(&mut self, id: CategoryId) {
        self.selected_sub = Some(id);
        self.run_fetch(1).await;
    }

    /// Leave the drill-down. The search term survives the way back.
    pub async fn back_to_main(&mut self) {
        self.selected_main = None;
        self.selected_sub = None;
        self.run_fetch(1).await;
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Cards for the grid as of `now`. Products that went inactive or
    /// fell outside the selected categories since they were fetched are
    /// dropped here rather than shown stale.
    #[must_use]
    pub fn visible_products(&self, now: DateTime<Utc>) -> Vec<ProductCard> {
        let scope = self.category_scope();
        self.products
            .iter()
            .filter(|product| product.is_active)
            .filter(|product| {
                scope
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&product.category.id))
            })
            .map(|product| ProductCard::from_product(product, now))
            .collect()
    }

    /// Category IDs the current selection covers, `None` for the whole
    /// catalog. A main category covers its subcategories too.
    fn category_scope(&self) -> Option<Vec<CategoryId>> {
        if let Some(sub) = self.selected_sub {
            return Some(vec![sub]);
        }
        let main = self.selected_main?;
        let mut ids = vec![main];
        ids.extend(
            category::subcategories_of(&self.categories, main)
                .iter()
                .map(|child| child.id),
        );
        Some(ids)
    }

    /// Top-level categories for the landing strip, hidden ones excluded.
    #[must_use]
    pub fn main_categories(&self) -> Vec<&CategoryNode> {
        category::main_categories(&self.categories)
            .into_iter()
            .filter(|node| node.is_active)
            .collect()
    }

    /// Subcategories of the selected main category, in display order.
    #[must_use]
    pub fn subcategories(&self) -> Vec<&CategoryNode> {
        match self.selected_main {
            Some(main) => category::subcategories_of(&self.categories, main)
                .into_iter()
                .filter(|node| node.is_active)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Breadcrumbs for the current selection, `None` at the top level.
    #[must_use]
    pub fn breadcrumbs(&self) -> Option<CategoryView> {
        let id = self.selected_sub.or(self.selected_main)?;
        self.find_category(id).map(CategoryView::from)
    }

    fn find_category(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.categories.iter().find(|node| node.id == id).or_else(|| {
            self.categories
                .iter()
                .flat_map(|node| node.children.iter())
                .find(|node| node.id == id)
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn selected_main(&self) -> Option<CategoryId> {
        self.selected_main
    }

    #[must_use]
    pub const fn selected_sub(&self) -> Option<CategoryId> {
        self.selected_sub
    }

    /// True while further pages remain below the grid.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.current_page < self.last_page
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

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chispa_client::api::ApiResult;
    use chispa_core::catalog::{CategoryRef, MediaItem, MediaKind, Offer, Page};
    use chispa_core::types::{MediaId, Money, OfferId};

    use super::*;

    struct FakeCatalog {
        products: Vec<Product>,
        categories: Vec<CategoryNode>,
        per_page: u32,
        fail: bool,
        calls: Mutex<Vec<(ProductFilters, u32)>>,
    }

    impl FakeCatalog {
        fn new(products: Vec<Product>, categories: Vec<CategoryNode>) -> Self {
            Self {
                products,
                categories,
                per_page: 12,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn last_call(&self) -> (ProductFilters, u32) {
            self.calls.lock().unwrap().last().cloned().unwrap()
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
    impl CatalogApi for FakeCatalog {
        async fn list_products(
            &self,
            filters: &ProductFilters,
            page: u32,
        ) -> ApiResult<Page<Product>> {
            self.calls.lock().unwrap().push((filters.clone(), page));
            if self.fail {
                return Err(ApiError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(page_of(&self.products, page, self.per_page))
        }

        async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
            self.products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("no such product".to_string()))
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
                .ok_or_else(|| ApiError::NotFound("no such category".to_string()))
        }
    }

    fn category_node(id: i64, name: &str, parent: Option<&CategoryNode>) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            parent: parent.map(|p| CategoryRef {
                id: p.id,
                name: p.name.clone(),
                slug: p.slug.clone(),
            }),
            is_active: true,
            sort_order: 0,
            children_count: 0,
            products_count: 0,
            children: Vec::new(),
        }
    }

    fn product(id: i64, title: &str, price: i64, stock: u32, category: &CategoryNode) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: String::new(),
            price: Money::from(price),
            stock,
            is_active: true,
            is_featured: false,
            category: CategoryRef {
                id: category.id,
                name: category.name.clone(),
                slug: category.slug.clone(),
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

    fn offer(product_id: ProductId, offer_price: i64) -> Offer {
        Offer {
            id: OfferId::new(900),
            product_id,
            product: None,
            offer_price: Money::from(offer_price),
            percentage_discount: None,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    fn fixture() -> (Vec<Product>, Vec<CategoryNode>) {
        let mut chispas = category_node(1, "Chispas Frías", None);
        let interiores = category_node(2, "Interiores", Some(&chispas));
        let exteriores = category_node(3, "Exteriores", Some(&chispas));
        chispas.children = vec![interiores.clone(), exteriores.clone()];
        chispas.children_count = 2;
        let humo = category_node(4, "Humo", None);

        let products = vec![
            product(1, "Chispero frío 60 cm", 15_000, 5, &interiores),
            product(2, "Chispero frío 90 cm", 22_000, 3, &exteriores),
            product(3, "Bengala de humo azul", 8_000, 0, &humo),
        ];
        (products, vec![chispas, humo])
    }

    #[tokio::test]
    async fn test_load_requests_active_products_from_the_first_page() {
        let (products, categories) = fixture();
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);
        page.load().await;

        let (filters, page_number) = api.last_call();
        assert_eq!(page_number, 1);
        assert_eq!(filters.status, Some(StatusFilter::Active));
        assert_eq!(page.visible_products(Utc::now()).len(), 3);
        assert!(!page.is_loading());
        assert!(page.notice().is_none());
    }

    #[tokio::test]
    async fn test_load_more_appends_the_next_page() {
        let (products, categories) = fixture();
        let mut api = FakeCatalog::new(products, categories);
        api.per_page = 2;
        let mut page = CatalogPage::new(&api);

        page.load().await;
        assert_eq!(page.visible_products(Utc::now()).len(), 2);
        assert!(page.has_more());

        page.load_more().await;
        assert_eq!(page.visible_products(Utc::now()).len(), 3);
        assert!(!page.has_more());

        // a further call is a no-op
        page.load_more().await;
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_restarts_from_the_first_page() {
        let (products, categories) = fixture();
        let mut api = FakeCatalog::new(products, categories);
        api.per_page = 2;
        let mut page = CatalogPage::new(&api);

        page.load().await;
        page.load_more().await;
        page.set_search("chispero").await;

        let (filters, page_number) = api.last_call();
        assert_eq!(page_number, 1);
        assert_eq!(filters.search.as_deref(), Some("chispero"));
    }

    #[tokio::test]
    async fn test_drill_down_keeps_the_search_term() {
        let (products, categories) = fixture();
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);

        page.load().await;
        page.set_search("frío").await;
        page.select_main(CategoryId::new(1)).await;
        page.select_sub(CategoryId::new(2)).await;

        let (filters, _) = api.last_call();
        assert_eq!(filters.category, Some(CategoryId::new(2)));
        assert_eq!(filters.search.as_deref(), Some("frío"));

        page.back_to_main().await;
        let (filters, _) = api.last_call();
        assert_eq!(filters.category, None);
        assert_eq!(filters.search.as_deref(), Some("frío"));
        assert_eq!(page.search(), "frío");
    }

    #[tokio::test]
    async fn test_main_category_scope_covers_its_subcategories() {
        let (products, categories) = fixture();
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);

        page.load().await;
        page.select_main(CategoryId::new(1)).await;

        // products sit in the subcategories, not the main node itself
        let titles: Vec<String> = page
            .visible_products(Utc::now())
            .into_iter()
            .map(|card| card.title)
            .collect();
        assert_eq!(titles, vec!["Chispero frío 60 cm", "Chispero frío 90 cm"]);

        page.select_sub(CategoryId::new(3)).await;
        let cards = page.visible_products(Utc::now());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Chispero frío 90 cm");
    }

    #[tokio::test]
    async fn test_inactive_products_never_reach_the_grid() {
        let (mut products, categories) = fixture();
        products[0].is_active = false;
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);

        page.load().await;
        let cards = page.visible_products(Utc::now());
        assert!(cards.iter().all(|card| card.title != "Chispero frío 60 cm"));
    }

    #[tokio::test]
    async fn test_card_presents_offer_pricing() {
        let (mut products, categories) = fixture();
        products[0].current_offer = Some(offer(products[0].id, 12_000));
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);

        page.load().await;
        let cards = page.visible_products(Utc::now());
        let card = &cards[0];
        assert_eq!(card.price, "$12.000");
        assert_eq!(card.list_price.as_deref(), Some("$15.000"));
        assert_eq!(card.discount_badge.as_deref(), Some("-20%"));
        assert_eq!(card.savings_label.as_deref(), Some("Ahorras $3.000"));
        assert_eq!(card.availability, "5 unidades");
        assert!(card.in_stock);
    }

    #[tokio::test]
    async fn test_card_for_sold_out_product_disables_purchase() {
        let (products, categories) = fixture();
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);

        page.load().await;
        let cards = page.visible_products(Utc::now());
        let sold_out = cards
            .iter()
            .find(|card| card.title == "Bengala de humo azul")
            .unwrap();
        assert_eq!(sold_out.availability, "Sin stock");
        assert!(!sold_out.in_stock);
        assert_eq!(sold_out.list_price, None);
        assert_eq!(sold_out.discount_badge, None);
    }

    #[tokio::test]
    async fn test_failed_load_surfaces_a_retry_notice() {
        let (products, categories) = fixture();
        let mut api = FakeCatalog::new(products, categories);
        api.fail = true;
        let mut page = CatalogPage::new(&api);

        page.load().await;
        assert!(page.notice().is_some());
        assert!(page.visible_products(Utc::now()).is_empty());
        assert!(page.loading.error().is_some());
    }

    #[tokio::test]
    async fn test_breadcrumbs_follow_the_selection() {
        let (products, categories) = fixture();
        let api = FakeCatalog::new(products, categories);
        let mut page = CatalogPage::new(&api);

        page.load().await;
        assert!(page.breadcrumbs().is_none());

        page.select_main(CategoryId::new(1)).await;
        let crumbs = page.breadcrumbs().unwrap();
        assert!(crumbs.is_main);
        assert_eq!(crumbs.breadcrumbs.len(), 1);

        page.select_sub(CategoryId::new(2)).await;
        let crumbs = page.breadcrumbs().unwrap();
        assert!(!crumbs.is_main);
        let names: Vec<&str> = crumbs
            .breadcrumbs
            .iter()
            .map(|crumb| crumb.name.as_str())
            .collect();
        assert_eq!(names, vec!["Chispas Frías", "Interiores"]);
    }
}
