use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{PageRequest, SummaryOrdering, SummaryQuery};
use crate::domain::UserId;
use crate::presentation::state::AppState;

use super::dto::{PageDto, SummaryDto};
use super::error::conversation_error_response;
use super::identity::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub user: Option<Uuid>,
    pub title: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl From<SummaryParams> for SummaryQuery {
    fn from(p: SummaryParams) -> Self {
        SummaryQuery {
            owner_id: p.user.map(UserId::from_uuid),
            title: p.title,
            search: p.search.map(|s| s.trim().to_string()),
            ordering: p
                .ordering
                .as_deref()
                .and_then(SummaryOrdering::parse)
                .unwrap_or_default(),
            page: PageRequest::new(p.page, p.page_size),
        }
    }
}

pub async fn conversation_summaries_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<SummaryParams>,
) -> Response {
    let query = SummaryQuery::from(params);

    match state.conversation_service.list_summaries(&query).await {
        Ok(page) => (StatusCode::OK, Json(PageDto::from_page(page, SummaryDto::from))).into_response(),
        Err(e) => conversation_error_response(e),
    }
}
