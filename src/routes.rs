use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use log::info;
use serde::Deserialize;
use utoipa::OpenApi;

use crate::auth;
use crate::db::Store;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::models::{
    DailySummary, DailyTotal, LoginRequest, LoginResponse, MessageResponse, NewTask,
    SignupRequest, Task, TaskOwner, TaskUpdate, TimeUpdateRequest,
};
use crate::repository::TaskRepository;
use crate::stats;

/// Shared handler state. Cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub bcrypt_cost: u32,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered", body = MessageResponse),
        (status = 400, description = "Passwords differ, bad email, or email already registered")
    )
)]
#[post("/api/auth/signup")]
async fn signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let conn = state.store.conn()?;
    let body = auth::signup(&conn, &req, state.bcrypt_cost)?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 404, description = "User not found"),
        (status = 401, description = "Incorrect password")
    )
)]
#[post("/api/auth/login")]
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let conn = state.store.conn()?;
    let body = auth::login(&conn, &req)?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{user_id}",
    params(("user_id" = i64, Path, description = "Owner of the tasks")),
    responses((status = 200, description = "All tasks owned by the user", body = [Task]))
)]
#[get("/api/tasks/{user_id}")]
async fn list_tasks(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let conn = state.store.conn()?;
    let tasks = TaskRepository::list(&conn, user_id.into_inner())?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/tasks/",
    request_body = NewTask,
    responses(
        (status = 200, description = "Created task with defaults filled in", body = Task),
        (status = 400, description = "Title cannot be empty")
    )
)]
#[post("/api/tasks/")]
async fn create_task(
    state: web::Data<AppState>,
    req: web::Json<NewTask>,
) -> AppResult<HttpResponse> {
    let conn = state.store.conn()?;
    let task = TaskRepository::create(&conn, &req)?;
    info!("user {} created task {}", task.user_id, task.id);
    Ok(HttpResponse::Ok().json(task))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    request_body = TaskUpdate,
    params(("task_id" = i64, Path, description = "Task to replace")),
    responses(
        (status = 200, description = "Task updated successfully", body = MessageResponse),
        (status = 400, description = "Title cannot be empty"),
        (status = 404, description = "Task not found or not owned by the user")
    )
)]
#[put("/api/tasks/{task_id}")]
async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
    req: web::Json<TaskUpdate>,
) -> AppResult<HttpResponse> {
    let today = stats::today();
    let conn = state.store.conn()?;
    TaskRepository::update(&conn, task_id.into_inner(), &req, today)?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Task updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    request_body = TaskOwner,
    params(("task_id" = i64, Path, description = "Task to delete")),
    responses(
        (status = 200, description = "Task deleted successfully", body = MessageResponse),
        (status = 404, description = "Task not found or not owned by the user")
    )
)]
#[delete("/api/tasks/{task_id}")]
async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
    req: web::Json<TaskOwner>,
) -> AppResult<HttpResponse> {
    let task_id = task_id.into_inner();
    let conn = state.store.conn()?;
    TaskRepository::delete(&conn, task_id, req.user_id)?;
    info!("user {} deleted task {}", req.user_id, task_id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted successfully")))
}

#[utoipa::path(
    patch,
    path = "/api/tasks/{task_id}/time",
    request_body = TimeUpdateRequest,
    params(("task_id" = i64, Path, description = "Task whose timer total is replaced")),
    responses(
        (status = 200, description = "Time updated successfully", body = MessageResponse),
        (status = 400, description = "Negative time"),
        (status = 404, description = "Task not found or not owned by the user")
    )
)]
#[patch("/api/tasks/{task_id}/time")]
async fn update_time(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
    req: web::Json<TimeUpdateRequest>,
) -> AppResult<HttpResponse> {
    let conn = state.store.conn()?;
    TaskRepository::set_time_spent(&conn, task_id.into_inner(), req.user_id, req.time_spent_seconds)?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Time updated successfully")))
}

#[utoipa::path(
    get,
    path = "/api/stats/productivity/{user_id}",
    params(("user_id" = i64, Path, description = "Owner of the tasks")),
    responses((status = 200, description = "Completed time per day over the last 30 days", body = [DailyTotal]))
)]
#[get("/api/stats/productivity/{user_id}")]
async fn productivity_stats(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let today = stats::today();
    let conn = state.store.conn()?;
    let totals = stats::productivity_stats(&conn, user_id.into_inner(), today)?;
    Ok(HttpResponse::Ok().json(totals))
}

#[utoipa::path(
    get,
    path = "/api/stats/summary/daily/{user_id}",
    params(("user_id" = i64, Path, description = "Owner of the tasks")),
    responses((status = 200, description = "Time on tasks completed today", body = DailySummary))
)]
#[get("/api/stats/summary/daily/{user_id}")]
async fn daily_summary(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let today = stats::today();
    let conn = state.store.conn()?;
    let summary = stats::daily_summary(&conn, user_id.into_inner(), today)?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/export/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Owner of the tasks"),
        ("format" = String, Query, description = "`csv` or `pdf`")
    ),
    responses(
        (status = 200, description = "Task list as a file attachment"),
        (status = 400, description = "Invalid format specified")
    )
)]
#[get("/api/export/{user_id}")]
async fn export_tasks(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
    query: web::Query<ExportQuery>,
) -> AppResult<HttpResponse> {
    let format: ExportFormat = query.format.as_deref().unwrap_or_default().parse()?;
    let user_id = user_id.into_inner();

    let tasks = {
        let conn = state.store.conn()?;
        TaskRepository::list(&conn, user_id)?
    };
    let body = format.render(&tasks)?;
    info!("exported {} tasks for user {} as {:?}", tasks.len(), user_id, format);

    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(format.filename().to_string())],
        })
        .body(body))
}

#[get("/api-doc/openapi.json")]
async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Registers every route plus a JSON extractor that reports malformed bodies
/// in the same `{"detail": ...}` shape as handler errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .service(signup)
    .service(login)
    .service(list_tasks)
    .service(create_task)
    .service(update_task)
    .service(delete_task)
    .service(update_time)
    .service(productivity_stats)
    .service(daily_summary)
    .service(export_tasks)
    .service(openapi_json);
}

#[derive(OpenApi)]
#[openapi(
    paths(
        signup,
        login,
        list_tasks,
        create_task,
        update_task,
        delete_task,
        update_time,
        productivity_stats,
        daily_summary,
        export_tasks
    ),
    components(schemas(
        Task,
        NewTask,
        TaskUpdate,
        TaskOwner,
        TimeUpdateRequest,
        SignupRequest,
        LoginRequest,
        LoginResponse,
        MessageResponse,
        DailyTotal,
        DailySummary
    ))
)]
pub struct ApiDoc;
