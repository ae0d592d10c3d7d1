//! HTTP service implementations.
//!
//! This module contains the axum handlers for every resource of the API,
//! plus the response envelopes they share.

pub mod category_service;
pub mod health_service;
pub mod order_service;
pub mod product_service;
pub mod webshop_service;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error envelope.
///
/// Malformed or mistyped bodies become `400 VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    /// Total number of matching rows across all pages
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    /// Next page number, if any
    pub next: Option<u32>,
    /// Previous page number, if any
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(count: i64, page: u32, page_size: u32, results: Vec<T>) -> Self {
        let shown = i64::from(page) * i64::from(page_size);
        Paginated {
            count,
            page,
            page_size,
            next: (shown < count).then(|| page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }
}

/// Distinguishes an explicit `null` from an absent field in partial updates.
///
/// Use with `#[serde(default, deserialize_with = "explicit_null")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub(crate) fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_links() {
        let first: Paginated<()> = Paginated::new(20, 1, 9, vec![]);
        assert_eq!((first.previous, first.next), (None, Some(2)));

        let last: Paginated<()> = Paginated::new(20, 3, 9, vec![]);
        assert_eq!((last.previous, last.next), (Some(2), None));

        let exact: Paginated<()> = Paginated::new(18, 2, 9, vec![]);
        assert_eq!(exact.next, None);
    }

    #[test]
    fn test_explicit_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "explicit_null")]
            parent_id: Option<Option<i64>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.parent_id, None);
        let cleared: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(cleared.parent_id, Some(None));
        let set: Patch = serde_json::from_str(r#"{"parent_id": 4}"#).unwrap();
        assert_eq!(set.parent_id, Some(Some(4)));
    }
}
