//! Product catalog endpoints: list, create (multipart upload), delete

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::{Product, ProductDraft};
use crate::storage::{StagedUpload, UploadStore};

/// Error body shared by all product endpoints
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// Confirmation body for a successful delete
#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse { message })
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        message: "Product not found".to_string(),
    })
}

fn server_error(message: String) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse { message })
}

/// GET /api/products - List all products, newest first
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    responses(
        (status = 200, description = "All products, newest first", body = [Product]),
        (status = 500, description = "Record store failure", body = ErrorResponse)
    )
)]
pub async fn list_products(state: web::Data<AppState>) -> HttpResponse {
    match state.products.list_newest_first().await {
        Ok(products) => {
            info!(count = products.len(), "Retrieved product list");
            HttpResponse::Ok().json(products)
        }
        Err(e) => {
            error!(error = %e, "Failed to list products");
            server_error(e.to_string())
        }
    }
}

/// POST /api/products - Create a product from a multipart upload
///
/// Expects text fields `name` and `category` plus file fields `model` and
/// `thumbnail`. All parts are buffered and validated before anything is
/// written to the upload store, so a rejected request stores no files.
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Missing file, oversize file or invalid metadata", body = ErrorResponse),
        (status = 500, description = "Storage or record store failure", body = ErrorResponse)
    )
)]
pub async fn create_product(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    let form = match collect_form(payload, state.settings.uploads.max_file_size).await {
        Ok(form) => form,
        Err(FormError::Malformed(message)) => return bad_request(message),
        Err(FormError::TooLarge { field, limit }) => {
            return bad_request(format!(
                "File '{}' exceeds the upload limit of {} bytes.",
                field, limit
            ));
        }
    };

    let (model, thumbnail) = match (form.model, form.thumbnail) {
        (Some(model), Some(thumbnail)) => (model, thumbnail),
        _ => return bad_request("Both model and thumbnail files are required.".to_string()),
    };

    let (name, category) = match form.draft.validate() {
        Ok(validated) => validated,
        Err(e) => return bad_request(e.to_string()),
    };

    // Metadata is good; commit both files, then the record. If a later step
    // fails, already-committed files are discarded again.
    let model_url = match state.uploads.commit(&model).await {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "Failed to store model file");
            return server_error(e.to_string());
        }
    };

    let thumbnail_url = match state.uploads.commit(&thumbnail).await {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "Failed to store thumbnail file");
            discard(&state.uploads, &model_url).await;
            return server_error(e.to_string());
        }
    };

    match state
        .products
        .create(&name, category, &model_url, &thumbnail_url)
        .await
    {
        Ok(product) => {
            info!(product_id = %product.id, name = %product.name, "Product created");
            HttpResponse::Created().json(product)
        }
        Err(e) => {
            error!(error = %e, "Failed to persist product record");
            discard(&state.uploads, &model_url).await;
            discard(&state.uploads, &thumbnail_url).await;
            server_error(e.to_string())
        }
    }
}

/// DELETE /api/products/{id} - Delete a product and its stored files
///
/// The record is removed first; file deletion is best-effort afterwards. A
/// failed file delete leaves an orphaned upload, never a product record that
/// points at missing files.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeleteResponse),
        (status = 404, description = "No product with that id", body = ErrorResponse),
        (status = 500, description = "Record store failure", body = ErrorResponse)
    )
)]
pub async fn delete_product(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let raw_id = path.into_inner();
    let id = match Uuid::parse_str(&raw_id) {
        Ok(id) => id,
        // A malformed id cannot name any product.
        Err(_) => return not_found(),
    };

    let product = match state.products.find_by_id(id).await {
        Ok(Some(product)) => product,
        Ok(None) => return not_found(),
        Err(e) => {
            error!(error = %e, product_id = %id, "Failed to look up product");
            return server_error(e.to_string());
        }
    };

    if let Err(e) = state.products.delete_by_id(id).await {
        error!(error = %e, product_id = %id, "Failed to delete product record");
        return server_error(e.to_string());
    }

    discard(&state.uploads, &product.model_url).await;
    discard(&state.uploads, &product.thumbnail_url).await;

    info!(product_id = %id, "Product deleted");
    HttpResponse::Ok().json(DeleteResponse {
        message: "Product deleted".to_string(),
    })
}

/// Best-effort removal of a stored file; failures are logged and swallowed.
async fn discard(store: &UploadStore, public_path: &str) {
    if let Err(e) = store.delete(public_path).await {
        warn!(error = %e, path = %public_path, "Failed to remove uploaded file");
    }
}

/// Buffered multipart form for product creation
#[derive(Default)]
struct ProductForm {
    draft: ProductDraft,
    model: Option<StagedUpload>,
    thumbnail: Option<StagedUpload>,
}

enum FormError {
    Malformed(String),
    TooLarge { field: String, limit: usize },
}

/// Drain the multipart stream into memory. Unknown fields are read and
/// dropped; file fields are capped at `max_file_size` each.
async fn collect_form(mut payload: Multipart, max_file_size: usize) -> Result<ProductForm, FormError> {
    let mut form = ProductForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| FormError::Malformed(format!("Invalid multipart payload: {}", e)))?
    {
        let field_name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(String::from);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| FormError::Malformed(format!("Invalid multipart payload: {}", e)))?
        {
            if buf.len() + chunk.len() > max_file_size {
                return Err(FormError::TooLarge {
                    field: field_name,
                    limit: max_file_size,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        let data: Bytes = buf.freeze();

        match field_name.as_str() {
            "name" => form.draft.name = Some(String::from_utf8_lossy(&data).into_owned()),
            "category" => form.draft.category = Some(String::from_utf8_lossy(&data).into_owned()),
            "model" => {
                form.model = Some(StagedUpload {
                    filename: filename.unwrap_or_default(),
                    data,
                });
            }
            "thumbnail" => {
                form.thumbnail = Some(StagedUpload {
                    filename: filename.unwrap_or_default(),
                    data,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api;
    use crate::config::{DatabaseSettings, ServerSettings, Settings, UploadSettings};
    use crate::db::{DbPool, ProductRepository};
    use actix_web::{test, App};
    use tempfile::TempDir;

    fn test_state(uploads_dir: &TempDir) -> web::Data<AppState> {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            database: DatabaseSettings {
                // Never connected to: the handlers under test reject the
                // request before touching the record store.
                url: "postgres://user:pw@localhost:1/none".to_string(),
                max_connections: Some(1),
            },
            uploads: UploadSettings {
                path: uploads_dir.path().to_path_buf(),
                max_file_size: 1024 * 1024,
            },
        };

        let pool = DbPool::new(&settings.database.url, settings.database.max_connections)
            .expect("lazy pool");
        let uploads = UploadStore::new(&settings.uploads.path).expect("upload dir");

        web::Data::new(AppState {
            settings,
            products: ProductRepository::new(pool),
            uploads,
        })
    }

    const BOUNDARY: &str = "----webar-test-boundary";

    fn text_part(body: &mut Vec<u8>, name: &str, value: &str) {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    fn file_part(body: &mut Vec<u8>, name: &str, filename: &str, data: &[u8]) {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    fn close_form(body: &mut Vec<u8>) {
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    }

    fn multipart_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/products")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn create_without_thumbnail_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = test::init_service(
            App::new().app_data(state).configure(api::configure_routes),
        )
        .await;

        let mut body = Vec::new();
        text_part(&mut body, "name", "Chair");
        text_part(&mut body, "category", "floor");
        file_part(&mut body, "model", "chair.glb", b"glTF-bytes");
        close_form(&mut body);

        let resp = test::call_service(&app, multipart_request(body).to_request()).await;
        assert_eq!(resp.status(), 400);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Both model and thumbnail files are required.");

        // Nothing was committed to the blob store.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[actix_web::test]
    async fn create_with_bad_category_commits_nothing() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = test::init_service(
            App::new().app_data(state).configure(api::configure_routes),
        )
        .await;

        let mut body = Vec::new();
        text_part(&mut body, "name", "Chair");
        text_part(&mut body, "category", "invalid");
        file_part(&mut body, "model", "chair.glb", b"glTF-bytes");
        file_part(&mut body, "thumbnail", "chair.png", b"png-bytes");
        close_form(&mut body);

        let resp = test::call_service(&app, multipart_request(body).to_request()).await;
        assert_eq!(resp.status(), 400);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert!(json["message"].as_str().unwrap().contains("category"));

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[actix_web::test]
    async fn oversize_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let max = state.settings.uploads.max_file_size;
        let app = test::init_service(
            App::new().app_data(state).configure(api::configure_routes),
        )
        .await;

        let mut body = Vec::new();
        text_part(&mut body, "name", "Chair");
        text_part(&mut body, "category", "floor");
        file_part(&mut body, "model", "big.glb", &vec![0u8; max + 1]);
        file_part(&mut body, "thumbnail", "chair.png", b"png-bytes");
        close_form(&mut body);

        let resp = test::call_service(&app, multipart_request(body).to_request()).await;
        assert_eq!(resp.status(), 400);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[actix_web::test]
    async fn delete_with_malformed_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = test::init_service(
            App::new().app_data(state).configure(api::configure_routes),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/api/products/not-a-uuid")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Product not found");
    }
}
