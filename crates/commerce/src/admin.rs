//! Admin GraphQL implementation of the remote stores.
//!
//! Bundles are stored as metaobjects of type [`BUNDLE_TYPE`] whose handle is
//! the bundle name. Discounts are automatic basic discounts whose
//! percentage applies to the bundle's product set.

use async_trait::async_trait;
use bundlewise_core::auto_bundle::CatalogProduct;
use bundlewise_core::bundle::{
    Bundle, BundleComponent, BundlePatch, BundleStatus, DiscountDraft, NewBundle,
};
use bundlewise_core::types::{RemoteId, Timestamp};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::config::CommerceConfig;
use crate::error::RemoteError;
use crate::graphql::{check_user_errors, GraphqlClient, UserError};
use crate::store::{BundleStore, DiscountStore, ProductCatalog};

/// Metaobject type holding bundle definitions.
pub const BUNDLE_TYPE: &str = "bundle";

/// Page size for list queries.
const PAGE_SIZE: i32 = 100;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

const METAOBJECT_FIELDS: &str = "id handle updatedAt fields { key value }";

const USER_ERRORS: &str = "userErrors { field message }";

fn create_bundle_doc() -> String {
    format!(
        "mutation BundleCreate($metaobject: MetaobjectCreateInput!) {{ \
           metaobjectCreate(metaobject: $metaobject) {{ metaobject {{ {METAOBJECT_FIELDS} }} {USER_ERRORS} }} }}"
    )
}

fn update_bundle_doc() -> String {
    format!(
        "mutation BundleUpdate($id: ID!, $metaobject: MetaobjectUpdateInput!) {{ \
           metaobjectUpdate(id: $id, metaobject: $metaobject) {{ metaobject {{ {METAOBJECT_FIELDS} }} {USER_ERRORS} }} }}"
    )
}

fn delete_bundle_doc() -> String {
    format!(
        "mutation BundleDelete($id: ID!) {{ metaobjectDelete(id: $id) {{ deletedId {USER_ERRORS} }} }}"
    )
}

fn get_bundle_doc() -> String {
    format!("query BundleGet($id: ID!) {{ metaobject(id: $id) {{ {METAOBJECT_FIELDS} }} }}")
}

fn bundle_by_handle_doc() -> String {
    format!(
        "query BundleByHandle($handle: MetaobjectHandleInput!) {{ \
           metaobjectByHandle(handle: $handle) {{ {METAOBJECT_FIELDS} }} }}"
    )
}

fn list_bundles_doc() -> String {
    format!(
        "query BundleList($type: String!, $first: Int!, $after: String) {{ \
           metaobjects(type: $type, first: $first, after: $after) {{ \
             nodes {{ {METAOBJECT_FIELDS} }} pageInfo {{ hasNextPage endCursor }} }} }}"
    )
}

fn create_discount_doc() -> String {
    format!(
        "mutation DiscountCreate($discount: DiscountAutomaticBasicInput!) {{ \
           discountAutomaticBasicCreate(automaticBasicDiscount: $discount) {{ \
             automaticDiscountNode {{ id }} {USER_ERRORS} }} }}"
    )
}

fn update_discount_doc() -> String {
    format!(
        "mutation DiscountUpdate($id: ID!, $discount: DiscountAutomaticBasicInput!) {{ \
           discountAutomaticBasicUpdate(id: $id, automaticBasicDiscount: $discount) {{ \
             automaticDiscountNode {{ id }} {USER_ERRORS} }} }}"
    )
}

fn delete_discount_doc() -> String {
    format!(
        "mutation DiscountDelete($id: ID!) {{ \
           discountAutomaticDelete(id: $id) {{ deletedAutomaticDiscountId {USER_ERRORS} }} }}"
    )
}

const LIST_PRODUCTS: &str = "query ProductList($first: Int!, $after: String) { \
    products(first: $first, after: $after) { \
      nodes { id title tags priceRangeV2 { minVariantPrice { amount } } collections(first: 50) { nodes { id } pageInfo { hasNextPage endCursor } } } \
      pageInfo { hasNextPage endCursor } } }";

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MetaobjectField {
    key: String,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaobjectNode {
    id: String,
    handle: String,
    updated_at: Timestamp,
    fields: Vec<MetaobjectField>,
}

impl MetaobjectNode {
    fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| f.value.as_deref())
    }

    fn into_bundle(self, shop: &str) -> Result<Bundle, RemoteError> {
        let decode = |what: &str, e: &dyn std::fmt::Display| {
            RemoteError::Decode(format!("bundle {} field {what}: {e}", self.id))
        };

        let discount_percent = self
            .field("discount_percent")
            .unwrap_or("0")
            .parse::<f64>()
            .map_err(|e| decode("discount_percent", &e))?;
        let components: Vec<BundleComponent> =
            serde_json::from_str(self.field("components").unwrap_or("[]"))
                .map_err(|e| decode("components", &e))?;
        let status = self
            .field("status")
            .unwrap_or("DRAFT")
            .parse::<BundleStatus>()
            .map_err(|e| decode("status", &e))?;
        let created_at = match self.field("created_at") {
            Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
                .map_err(|e| decode("created_at", &e))?
                .with_timezone(&Utc),
            None => self.updated_at,
        };

        Ok(Bundle {
            title: self.field("title").unwrap_or(&self.handle).to_string(),
            description: self.field("description").map(str::to_string),
            discount_percent,
            components,
            status,
            created_at,
            updated_at: self.updated_at,
            shop: shop.to_string(),
            name: self.handle,
            id: self.id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    nodes: Vec<T>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaobjectPayload {
    metaobject: Option<MetaobjectNode>,
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBundleData {
    metaobject_create: MetaobjectPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBundleData {
    metaobject_update: MetaobjectPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBundlePayload {
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBundleData {
    metaobject_delete: DeleteBundlePayload,
}

#[derive(Debug, Deserialize)]
struct GetBundleData {
    metaobject: Option<MetaobjectNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleByHandleData {
    metaobject_by_handle: Option<MetaobjectNode>,
}

#[derive(Debug, Deserialize)]
struct ListBundlesData {
    metaobjects: Connection<MetaobjectNode>,
}

#[derive(Debug, Deserialize)]
struct NodeId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscountPayload {
    automatic_discount_node: Option<NodeId>,
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDiscountData {
    discount_automatic_basic_create: DiscountPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDiscountData {
    discount_automatic_basic_update: DiscountPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDiscountPayload {
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDiscountData {
    discount_automatic_delete: DeleteDiscountPayload,
}

#[derive(Debug, Deserialize)]
struct Amount {
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRange {
    min_variant_price: Amount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    price_range_v2: PriceRange,
    collections: Connection<NodeId>,
}

impl ProductNode {
    fn into_product(self) -> Result<CatalogProduct, RemoteError> {
        let price = self
            .price_range_v2
            .min_variant_price
            .amount
            .parse::<f64>()
            .map_err(|e| RemoteError::Decode(format!("product {} price: {e}", self.id)))?;
        Ok(CatalogProduct {
            id: self.id,
            title: self.title,
            price,
            tags: self.tags,
            collections: self.collections.nodes.into_iter().map(|n| n.id).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListProductsData {
    products: Connection<ProductNode>,
}

// ---------------------------------------------------------------------------
// Input builders
// ---------------------------------------------------------------------------

fn field(key: &str, value: impl Into<String>) -> serde_json::Value {
    json!({ "key": key, "value": value.into() })
}

fn components_json(components: &[BundleComponent]) -> Result<String, RemoteError> {
    serde_json::to_string(components).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn bundle_fields(input: &NewBundle, now: Timestamp) -> Result<Vec<serde_json::Value>, RemoteError> {
    let mut fields = vec![
        field("title", input.title.as_str()),
        field("discount_percent", input.discount_percent.to_string()),
        field("components", components_json(&input.components)?),
        field("status", input.status.as_str()),
        field("created_at", now.to_rfc3339()),
    ];
    if let Some(description) = &input.description {
        fields.push(field("description", description.as_str()));
    }
    Ok(fields)
}

fn patch_fields(patch: &BundlePatch) -> Result<Vec<serde_json::Value>, RemoteError> {
    let mut fields = Vec::new();
    if let Some(title) = &patch.title {
        fields.push(field("title", title.as_str()));
    }
    if let Some(description) = &patch.description {
        fields.push(field("description", description.as_str()));
    }
    if let Some(percent) = patch.discount_percent {
        fields.push(field("discount_percent", percent.to_string()));
    }
    if let Some(components) = &patch.components {
        fields.push(field("components", components_json(components)?));
    }
    if let Some(status) = patch.status {
        fields.push(field("status", status.as_str()));
    }
    Ok(fields)
}

/// Platform percentages are fractions in `[0, 1]`.
fn as_fraction(percent: f64) -> f64 {
    percent / 100.0
}

fn discount_input(draft: &DiscountDraft) -> serde_json::Value {
    json!({
        "title": draft.title,
        "startsAt": draft.starts_at.to_rfc3339(),
        "endsAt": draft.ends_at.map(|t| t.to_rfc3339()),
        "customerGets": {
            "value": { "percentage": as_fraction(draft.percent) },
            "items": { "products": { "productsToAdd": draft.product_ids } }
        }
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Remote stores backed by the commerce platform's admin GraphQL API.
pub struct AdminApi {
    gql: GraphqlClient,
}

impl AdminApi {
    pub fn new(config: CommerceConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            gql: GraphqlClient::new(config)?,
        })
    }

    pub fn with_client(client: GraphqlClient) -> Self {
        Self { gql: client }
    }

    async fn update_discount(
        &self,
        shop: &str,
        id: &str,
        discount: serde_json::Value,
    ) -> Result<(), RemoteError> {
        let data: UpdateDiscountData = self
            .gql
            .execute(
                shop,
                &update_discount_doc(),
                json!({ "id": id, "discount": discount }),
            )
            .await?;
        let payload = data.discount_automatic_basic_update;
        check_user_errors(&payload.user_errors, "discount", Some(id))?;
        payload
            .automatic_discount_node
            .ok_or(RemoteError::MissingPayload("automaticDiscountNode"))?;
        Ok(())
    }
}

#[async_trait]
impl BundleStore for AdminApi {
    async fn create(&self, shop: &str, input: &NewBundle) -> Result<Bundle, RemoteError> {
        let metaobject = json!({
            "type": BUNDLE_TYPE,
            "handle": input.name,
            "fields": bundle_fields(input, Utc::now())?,
        });
        let data: CreateBundleData = self
            .gql
            .execute(shop, &create_bundle_doc(), json!({ "metaobject": metaobject }))
            .await?;
        let payload = data.metaobject_create;
        check_user_errors(&payload.user_errors, "bundle", None)?;
        payload
            .metaobject
            .ok_or(RemoteError::MissingPayload("metaobject"))?
            .into_bundle(shop)
    }

    async fn get(&self, shop: &str, id: &str) -> Result<Option<Bundle>, RemoteError> {
        let data: GetBundleData = self
            .gql
            .execute(shop, &get_bundle_doc(), json!({ "id": id }))
            .await?;
        data.metaobject.map(|m| m.into_bundle(shop)).transpose()
    }

    async fn find_by_name(&self, shop: &str, name: &str) -> Result<Option<Bundle>, RemoteError> {
        let data: BundleByHandleData = self
            .gql
            .execute(
                shop,
                &bundle_by_handle_doc(),
                json!({ "handle": { "type": BUNDLE_TYPE, "handle": name } }),
            )
            .await?;
        data.metaobject_by_handle
            .map(|m| m.into_bundle(shop))
            .transpose()
    }

    async fn list(&self, shop: &str) -> Result<Vec<Bundle>, RemoteError> {
        let doc = list_bundles_doc();
        let mut bundles = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let data: ListBundlesData = self
                .gql
                .execute(
                    shop,
                    &doc,
                    json!({ "type": BUNDLE_TYPE, "first": PAGE_SIZE, "after": after }),
                )
                .await?;
            for node in data.metaobjects.nodes {
                bundles.push(node.into_bundle(shop)?);
            }
            let page = data.metaobjects.page_info;
            match page.end_cursor {
                Some(cursor) if page.has_next_page => after = Some(cursor),
                _ => break,
            }
        }
        Ok(bundles)
    }

    async fn update(
        &self,
        shop: &str,
        id: &str,
        patch: &BundlePatch,
    ) -> Result<Bundle, RemoteError> {
        let metaobject = json!({ "fields": patch_fields(patch)? });
        let data: UpdateBundleData = self
            .gql
            .execute(
                shop,
                &update_bundle_doc(),
                json!({ "id": id, "metaobject": metaobject }),
            )
            .await?;
        let payload = data.metaobject_update;
        check_user_errors(&payload.user_errors, "bundle", Some(id))?;
        payload
            .metaobject
            .ok_or(RemoteError::MissingPayload("metaobject"))?
            .into_bundle(shop)
    }

    async fn delete(&self, shop: &str, id: &str) -> Result<(), RemoteError> {
        let data: DeleteBundleData = self
            .gql
            .execute(shop, &delete_bundle_doc(), json!({ "id": id }))
            .await?;
        check_user_errors(&data.metaobject_delete.user_errors, "bundle", Some(id))
    }
}

#[async_trait]
impl DiscountStore for AdminApi {
    async fn create(&self, shop: &str, draft: &DiscountDraft) -> Result<RemoteId, RemoteError> {
        let data: CreateDiscountData = self
            .gql
            .execute(
                shop,
                &create_discount_doc(),
                json!({ "discount": discount_input(draft) }),
            )
            .await?;
        let payload = data.discount_automatic_basic_create;
        check_user_errors(&payload.user_errors, "discount", None)?;
        payload
            .automatic_discount_node
            .map(|n| n.id)
            .ok_or(RemoteError::MissingPayload("automaticDiscountNode"))
    }

    async fn update_percentage(
        &self,
        shop: &str,
        id: &str,
        percent: f64,
    ) -> Result<(), RemoteError> {
        let discount = json!({
            "customerGets": { "value": { "percentage": as_fraction(percent) } }
        });
        self.update_discount(shop, id, discount).await
    }

    async fn delete(&self, shop: &str, id: &str) -> Result<(), RemoteError> {
        let data: DeleteDiscountData = self
            .gql
            .execute(shop, &delete_discount_doc(), json!({ "id": id }))
            .await?;
        check_user_errors(
            &data.discount_automatic_delete.user_errors,
            "discount",
            Some(id),
        )
    }

    async fn toggle(
        &self,
        shop: &str,
        id: &str,
        active: bool,
        now: Timestamp,
    ) -> Result<(), RemoteError> {
        let discount = if active {
            json!({ "startsAt": now.to_rfc3339(), "endsAt": null })
        } else {
            json!({ "endsAt": now.to_rfc3339() })
        };
        self.update_discount(shop, id, discount).await
    }
}

#[async_trait]
impl ProductCatalog for AdminApi {
    async fn list_products(&self, shop: &str) -> Result<Vec<CatalogProduct>, RemoteError> {
        let mut products = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let data: ListProductsData = self
                .gql
                .execute(
                    shop,
                    LIST_PRODUCTS,
                    json!({ "first": PAGE_SIZE, "after": after }),
                )
                .await?;
            for node in data.products.nodes {
                products.push(node.into_product()?);
            }
            let page = data.products.page_info;
            match page.end_cursor {
                Some(cursor) if page.has_next_page => after = Some(cursor),
                _ => break,
            }
        }
        Ok(products)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
