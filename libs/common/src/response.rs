//! JSON response envelope and pagination helpers
//!
//! Every endpoint answers with `{ "success", "data", "message" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                message: message.into(),
            }),
        )
    }

    /// 201 with the created resource
    pub fn created(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                success: true,
                data: Some(data),
                message: message.into(),
            }),
        )
    }
}

/// 200 without a payload
pub fn message(message: impl Into<String>) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: None,
            message: message.into(),
        }),
    )
}

/// Failure envelope with the given status
pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Pagination block returned by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: i64,
    pub per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total_count: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total_count.max(0) as u64;
        let total_pages = total.div_ceil(per_page as u64) as u32;

        Self {
            current_page: page,
            total_pages,
            total_count: total as i64,
            per_page,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// Raw `page`/`limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Normalize to `(page, limit)` with page >= 1 and 1 <= limit <= max
    pub fn clamp(&self, default_limit: u32, max_limit: u32) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        (page, limit)
    }

    /// Row offset for the normalized page
    pub fn offset(page: u32, limit: u32) -> i64 {
        (page.saturating_sub(1)) as i64 * limit as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_middle_page() {
        let p = Pagination::new(2, 12, 30);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn pagination_last_and_exact_pages() {
        let p = Pagination::new(3, 10, 30);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next_page);

        let p = Pagination::new(1, 10, 31);
        assert_eq!(p.total_pages, 4);
    }

    #[test]
    fn pagination_empty_result() {
        let p = Pagination::new(1, 12, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.total_count, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let value = serde_json::to_value(Pagination::new(1, 12, 13)).unwrap();
        assert_eq!(value["currentPage"], 1);
        assert_eq!(value["totalPages"], 2);
        assert_eq!(value["hasNextPage"], true);
    }

    #[test]
    fn page_params_clamp() {
        let params = PageParams {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(params.clamp(12, 50), (1, 50));
        assert_eq!(PageParams::default().clamp(12, 50), (1, 12));
        assert_eq!(
            PageParams {
                page: Some(3),
                limit: Some(0)
            }
            .clamp(12, 50),
            (3, 1)
        );
        assert_eq!(PageParams::offset(3, 12), 24);
        assert_eq!(PageParams::offset(1, 12), 0);
    }
}
