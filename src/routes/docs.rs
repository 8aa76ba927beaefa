//! OpenAPI document for the routes a host actually registers.

use crate::routes::common::{self, HealthBody, MessageBody};
use axum::http::Method;
use axum::Json;
use std::sync::Arc;
use utoipa::OpenApi;

pub const DOCS_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(common::root, common::health),
    components(schemas(MessageBody, HealthBody))
)]
struct ApiDoc;

/// Document titled `title`, limited to the (method, path) pairs in `routes`.
pub fn document(title: &str, routes: &[(Method, String)]) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = title.to_string();
    doc.paths.paths.retain(|path, item| {
        let registered = |method: Method| routes.iter().any(|(m, p)| *m == method && p == path);
        for (method, op) in [
            (Method::GET, &mut item.get),
            (Method::PUT, &mut item.put),
            (Method::POST, &mut item.post),
            (Method::DELETE, &mut item.delete),
            (Method::OPTIONS, &mut item.options),
            (Method::HEAD, &mut item.head),
            (Method::PATCH, &mut item.patch),
            (Method::TRACE, &mut item.trace),
        ] {
            if op.is_some() && !registered(method) {
                *op = None;
            }
        }
        [&item.get, &item.put, &item.post, &item.delete, &item.options, &item.head, &item.patch, &item.trace]
            .iter()
            .any(|op| op.is_some())
    });
    doc
}

pub async fn serve(doc: Arc<utoipa::openapi::OpenApi>) -> Json<utoipa::openapi::OpenApi> {
    Json(doc.as_ref().clone())
}
