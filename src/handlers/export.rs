use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Html,
    Json,
};

use crate::dto::ExportQuery;
use crate::error::{AppError, AppResult};
use crate::export::{self, ExportView, GpsExport, SentimentExport, VlogExport};
use crate::models::ProjectedLog;
use crate::store::Page;
use crate::AppState;

pub async fn export_index() -> Html<&'static str> {
    Html(export::EXPORT_INDEX_HTML)
}

pub async fn export_sentiments(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Json<Vec<SentimentExport>>> {
    let records = read_view(&state, ExportView::Sentiments, query).await?;
    Ok(Json(export::sentiments(records)?))
}

pub async fn export_gps(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Json<Vec<GpsExport>>> {
    let records = read_view(&state, ExportView::Gps, query).await?;
    Ok(Json(export::gps(records)?))
}

pub async fn export_vlogs(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Json<Vec<VlogExport>>> {
    let records = read_view(&state, ExportView::Vlogs, query).await?;
    Ok(Json(export::vlogs(records)?))
}

async fn read_view(
    state: &AppState,
    view: ExportView,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Vec<ProjectedLog>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let page: Page = query.into();

    let records = state
        .store
        .query_projection(&view.projection(), page)
        .await?;

    tracing::debug!(?view, rows = records.len(), "Export read");
    Ok(records)
}
