//! Product management handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crumb_core::{Category, ProductId};

use crate::db::{Page, ProductRepository, RepositoryError};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, FlashLevel, NewProduct, Product, ProductPatch};
use crate::routes::page::{AdminPage, SelectOption, non_blank};
use crate::routes::products::{category_options, parse_category};
use crate::state::AppState;

use super::PER_PAGE;

const NAV_PATH: &str = "/admin/products";

/// Product list query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
    pub page: Option<u32>,
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: AdminPage,
    pub products: Vec<Product>,
    pub categories: Vec<SelectOption>,
    pub category: Option<Category>,
    pub page_number: u32,
    pub has_next: bool,
}

/// Product detail / edit template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/show.html")]
pub struct ProductShowTemplate {
    pub page: AdminPage,
    pub product: Product,
    pub categories: Vec<SelectOption>,
}

/// New product template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/new.html")]
pub struct ProductNewTemplate {
    pub page: AdminPage,
    pub form: ProductForm,
    pub categories: Vec<SelectOption>,
    pub errors: Vec<String>,
}

/// Product form, shared by create and update.
///
/// Numbers arrive as text so bad input can be reported instead of rejected
/// by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: Option<String>,
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    match raw.trim_start_matches('$').parse::<Decimal>() {
        Ok(price) if price.is_sign_negative() => Err("Price cannot be negative.".to_string()),
        Ok(price) => Ok(price.round_dp(2)),
        Err(_) => Err(format!("\"{raw}\" is not a valid price.")),
    }
}

fn parse_stock(raw: &str) -> Result<i32, String> {
    match raw.parse::<i32>() {
        Ok(stock) if stock < 0 => Err("Stock cannot be negative.".to_string()),
        Ok(stock) => Ok(stock),
        Err(_) => Err(format!("\"{raw}\" is not a valid stock quantity.")),
    }
}

fn parse_form_category(raw: &str) -> Result<Category, String> {
    raw.parse::<Category>()
        .map_err(|_| format!("\"{raw}\" is not a known category."))
}

impl ProductForm {
    /// Selected category, for re-rendering the form.
    fn selected_category(&self) -> Option<Category> {
        self.category.as_deref().and_then(|c| c.parse().ok())
    }

    /// Validate a new product. Name and price are required.
    fn to_new_product(&self) -> Result<NewProduct, Vec<String>> {
        let mut errors = Vec::new();

        let name = non_blank(self.name.clone());
        if name.is_none() {
            errors.push("Name is required.".to_string());
        }

        let price = match non_blank(self.price.clone()) {
            Some(raw) => parse_price(&raw).map_err(|e| errors.push(e)).ok(),
            None => {
                errors.push("Price is required.".to_string());
                None
            }
        };

        let category = non_blank(self.category.clone())
            .and_then(|raw| parse_form_category(&raw).map_err(|e| errors.push(e)).ok());

        let stock_quantity = non_blank(self.stock_quantity.clone())
            .map_or(Some(0), |raw| parse_stock(&raw).map_err(|e| errors.push(e)).ok());

        match (name, price, stock_quantity) {
            (Some(name), Some(price), Some(stock_quantity)) if errors.is_empty() => {
                Ok(NewProduct {
                    name,
                    description: non_blank(self.description.clone()),
                    price,
                    category,
                    image_url: non_blank(self.image_url.clone()),
                    stock_quantity,
                })
            }
            _ => Err(errors),
        }
    }

    /// Convert into a patch. Blank fields are left unchanged.
    fn into_patch(self) -> Result<ProductPatch, String> {
        Ok(ProductPatch {
            price: non_blank(self.price)
                .map(|raw| parse_price(&raw))
                .transpose()?,
            category: non_blank(self.category)
                .map(|raw| parse_form_category(&raw))
                .transpose()?,
            stock_quantity: non_blank(self.stock_quantity)
                .map(|raw| parse_stock(&raw))
                .transpose()?,
            name: non_blank(self.name),
            description: non_blank(self.description),
            image_url: non_blank(self.image_url),
        })
    }
}

/// List products, optionally by category.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductsQuery>,
) -> impl IntoResponse {
    let category = parse_category(&session, query.category).await;
    let page_number = query.page.unwrap_or(1).max(1);

    let products = ProductRepository::new(state.pool())
        .list(category, Page::numbered(page_number, PER_PAGE))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to list products: {e}");
            Vec::new()
        });
    let has_next = i64::try_from(products.len()).is_ok_and(|n| n == PER_PAGE);

    ProductsIndexTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        products,
        categories: category_options(category),
        category,
        page_number,
        has_next,
    }
}

/// Product detail with edit form.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    match ProductRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(product)) => {
            let categories = category_options(product.category.as_ref().and_then(|c| c.known()));
            ProductShowTemplate {
                page: AdminPage::load(&session, admin, NAV_PATH).await,
                product,
                categories,
            }
            .into_response()
        }
        Ok(None) => {
            Flash::push(&session, FlashLevel::Error, "Product not found.").await;
            Redirect::to(NAV_PATH).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load product {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not load that product.").await;
            Redirect::to(NAV_PATH).into_response()
        }
    }
}

/// New product form.
#[instrument(skip(admin, session))]
pub async fn new(RequireAdmin(admin): RequireAdmin, session: Session) -> impl IntoResponse {
    ProductNewTemplate {
        page: AdminPage::load(&session, admin, NAV_PATH).await,
        form: ProductForm::default(),
        categories: category_options(None),
        errors: Vec::new(),
    }
}

/// Create a product.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Response {
    let product = match form.to_new_product() {
        Ok(product) => product,
        Err(errors) => {
            let categories = category_options(form.selected_category());
            return ProductNewTemplate {
                page: AdminPage::load(&session, admin, NAV_PATH).await,
                form,
                categories,
                errors,
            }
            .into_response();
        }
    };

    match ProductRepository::new(state.pool()).create(&product).await {
        Ok(id) => {
            tracing::info!(product_id = %id, "Product created");
            Flash::push(
                &session,
                FlashLevel::Success,
                format!("Created {}.", product.name),
            )
            .await;
            Redirect::to(&format!("{NAV_PATH}/{id}")).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create product: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not create the product.").await;
            Redirect::to(&format!("{NAV_PATH}/new")).into_response()
        }
    }
}

/// Apply edits to a product.
#[instrument(skip(_admin, state, session, form))]
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Redirect {
    let detail = format!("{NAV_PATH}/{id}");

    let patch = match form.into_patch() {
        Ok(patch) => patch,
        Err(message) => {
            Flash::push(&session, FlashLevel::Error, message).await;
            return Redirect::to(&detail);
        }
    };

    match ProductRepository::new(state.pool()).update(id, &patch).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product updated");
            Flash::push(&session, FlashLevel::Success, "Product updated.").await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::NothingToUpdate) => {
            Flash::push(&session, FlashLevel::Info, "Nothing to update.").await;
            Redirect::to(&detail)
        }
        Err(RepositoryError::NotFound) => {
            Flash::push(&session, FlashLevel::Error, "Product not found.").await;
            Redirect::to(NAV_PATH)
        }
        Err(e) => {
            tracing::error!("Failed to update product {id}: {e}");
            Flash::push(&session, FlashLevel::Error, "Could not update the product.").await;
            Redirect::to(&detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str) -> ProductForm {
        ProductForm {
            name: Some(name.to_string()),
            price: Some(price.to_string()),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_new_product_defaults() {
        let product = form("Bunny", "25.00")
            .to_new_product()
            .unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(product.price, Decimal::new(2500, 2));
        assert_eq!(product.stock_quantity, 0);
        assert_eq!(product.category, None);
    }

    #[test]
    fn test_new_product_requires_name_and_price() {
        let errors = ProductForm::default().to_new_product().err().unwrap_or_default();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(form("Bunny", "-1").to_new_product().is_err());

        let mut bad_stock = form("Bunny", "5");
        bad_stock.stock_quantity = Some("-3".to_string());
        assert!(bad_stock.to_new_product().is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut bad = form("Bunny", "5");
        bad.category = Some("amigurumi".to_string());
        assert!(bad.to_new_product().is_err());

        bad.category = Some("home_decor".to_string());
        assert_eq!(
            bad.to_new_product().ok().and_then(|p| p.category),
            Some(Category::HomeDecor)
        );
    }

    #[test]
    fn test_patch_keeps_blank_fields() {
        let patch = ProductForm {
            price: Some("$12.5".to_string()),
            name: Some(" ".to_string()),
            ..ProductForm::default()
        }
        .into_patch()
        .unwrap_or_default();
        assert_eq!(patch.price, Some(Decimal::new(1250, 2)));
        assert_eq!(patch.name, None);
    }
}
