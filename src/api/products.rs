//! api::products
//!
//! The user's product list. Every call goes through [`ApiClient`], so it is
//! signed and survives one access-token expiry.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::transport::{ApiClient, ApiRequest};

/// An entry of the user's order: when it was added and the product itself.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UserProduct {
    pub order_product: OrderProduct,
    pub product: Product,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OrderProduct {
    pub order_product_id: Uuid,
    #[serde(default)]
    pub product_date_start: Option<String>,
    #[serde(default)]
    pub product_date_end: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub product_desc: Option<String>,
    #[serde(default)]
    pub product_barcode: Option<i64>,
}

/// Product endpoints.
#[derive(Debug, Clone)]
pub struct ProductsApi {
    client: Arc<ApiClient>,
}

impl ProductsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `GET /order/getallproductsuser?user_id=...`
    pub async fn list_user_products(&self, user_id: &str) -> Result<Vec<UserProduct>, AuthError> {
        let request = ApiRequest::get("/order/getallproductsuser").with_query("user_id", user_id);
        self.client.send_json(request).await
    }

    /// `DELETE /delete_order_product_by_id?UUID=...`
    pub async fn delete_user_product(&self, order_product_id: Uuid) -> Result<(), AuthError> {
        let request = ApiRequest::delete("/delete_order_product_by_id")
            .with_query("UUID", order_product_id.to_string());
        self.client.send_empty(request).await
    }
}
