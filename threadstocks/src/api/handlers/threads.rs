use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        models::threads::{ThreadBulkDelete, ThreadBulkUpdate, ThreadCreate, ThreadListQuery, ThreadResponse, ThreadUpdate},
        payload::Payload,
    },
    auth::current_user::CurrentUser,
    errors::Result,
    services::ThreadService,
    types::ThreadId,
};

#[utoipa::path(
    get,
    path = "/threads",
    tag = "threads",
    summary = "List threads",
    params(ThreadListQuery),
    responses(
        (status = 200, description = "The caller's threads, oldest first", body = Vec<ThreadResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn list_threads(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ThreadListQuery>,
) -> Result<Json<Vec<ThreadResponse>>> {
    let threads = ThreadService::from(&state).list(current_user.id, query.brand).await?;

    Ok(Json(threads.into_iter().map(ThreadResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/threads",
    tag = "threads",
    summary = "Create thread",
    request_body(
        content = ThreadCreate,
        content_type = "application/json",
        description = "Also accepted as multipart/form-data. A previously deleted thread with the same thread_id is restored."
    ),
    responses(
        (status = 201, description = "Thread created or restored", body = ThreadResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A live thread with this thread_id already exists"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn create_thread(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Payload(request): Payload<ThreadCreate>,
) -> Result<(StatusCode, Json<ThreadResponse>)> {
    let thread = ThreadService::from(&state).create(current_user.id, request).await?;

    Ok((StatusCode::CREATED, Json(ThreadResponse::from(thread))))
}

#[utoipa::path(
    get,
    path = "/threads/{id}",
    tag = "threads",
    summary = "Get thread",
    params(("id" = i64, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread", body = ThreadResponse),
        (status = 401, description = "Unauthorized or not the owner"),
        (status = 404, description = "Thread not found"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, thread = id))]
pub async fn get_thread(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ThreadId>,
) -> Result<Json<ThreadResponse>> {
    let thread = ThreadService::from(&state).get(current_user.id, id).await?;

    Ok(Json(ThreadResponse::from(thread)))
}

#[utoipa::path(
    patch,
    path = "/threads/{id}",
    tag = "threads",
    summary = "Update thread",
    description = "Only the fields present are changed. Also served on PUT.",
    params(("id" = i64, Path, description = "Thread ID")),
    request_body = ThreadUpdate,
    responses(
        (status = 200, description = "Updated thread", body = ThreadResponse),
        (status = 401, description = "Unauthorized or not the owner"),
        (status = 404, description = "Thread not found"),
        (status = 409, description = "thread_id already used by another of the caller's threads"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, thread = id))]
pub async fn update_thread(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ThreadId>,
    Json(changes): Json<ThreadUpdate>,
) -> Result<Json<ThreadResponse>> {
    let thread = ThreadService::from(&state).update(current_user.id, id, changes).await?;

    Ok(Json(ThreadResponse::from(thread)))
}

#[utoipa::path(
    delete,
    path = "/threads/{id}",
    tag = "threads",
    summary = "Delete thread",
    params(("id" = i64, Path, description = "Thread ID")),
    responses(
        (status = 204, description = "Thread deleted"),
        (status = 401, description = "Unauthorized or not the owner"),
        (status = 404, description = "Thread not found"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, thread = id))]
pub async fn delete_thread(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ThreadId>,
) -> Result<StatusCode> {
    ThreadService::from(&state).delete(current_user.id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/threads",
    tag = "threads",
    summary = "Update several threads",
    description = "All updates are applied or none. The first missing or foreign id aborts the batch. Also served on PUT.",
    request_body = Vec<ThreadBulkUpdate>,
    responses(
        (status = 200, description = "Updated threads, in request order", body = Vec<ThreadResponse>),
        (status = 401, description = "Unauthorized or not the owner of every thread"),
        (status = 404, description = "A thread was not found"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn update_threads(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(items): Json<Vec<ThreadBulkUpdate>>,
) -> Result<Json<Vec<ThreadResponse>>> {
    let threads = ThreadService::from(&state).update_many(current_user.id, items).await?;

    Ok(Json(threads.into_iter().map(ThreadResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/threads",
    tag = "threads",
    summary = "Delete several threads",
    description = "All listed threads are deleted or none. The first missing or foreign id aborts the batch.",
    request_body = ThreadBulkDelete,
    responses(
        (status = 204, description = "Threads deleted"),
        (status = 401, description = "Unauthorized or not the owner of every thread"),
        (status = 404, description = "A thread was not found"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn delete_threads(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ThreadBulkDelete>,
) -> Result<StatusCode> {
    ThreadService::from(&state).delete_many(current_user.id, &request.ids).await?;

    Ok(StatusCode::NO_CONTENT)
}
