use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use tasktrack::{configure, AppState, Store};

fn state() -> web::Data<AppState> {
    web::Data::new(AppState {
        store: Store::open_in_memory().unwrap(),
        bcrypt_cost: 4,
    })
}

/// Sends a request and returns the status with the body parsed as JSON
/// (`Value::Null` for non-JSON bodies).
macro_rules! call_json {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service($app, $req.to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }};
}

/// Signs up and logs in, yielding the new user's id.
macro_rules! register {
    ($app:expr, $email:expr) => {{
        let (status, _) = call_json!(
            $app,
            test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json(json!({"email": $email, "password": "pw", "confirmPassword": "pw"}))
        );
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call_json!(
            $app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({"email": $email, "password": "pw"}))
        );
        assert_eq!(status, StatusCode::OK);
        body["user_id"].as_i64().unwrap()
    }};
}

macro_rules! create_task {
    ($app:expr, $body:expr) => {{
        let (status, task) = call_json!(
            $app,
            test::TestRequest::post().uri("/api/tasks/").set_json($body)
        );
        assert_eq!(status, StatusCode::OK, "{task}");
        task
    }};
}

#[actix_web::test]
async fn signup_and_login_scenario() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"email": "a@x.com", "password": "p1", "confirmPassword": "p1"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"email": "a@x.com", "password": "p1", "confirmPassword": "p1"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "a@x.com", "password": "wrong"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect password");

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "a@x.com", "password": "p1"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["email"], "a@x.com");
    assert!(body["user_id"].as_i64().is_some());

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "nobody@x.com", "password": "p1"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[actix_web::test]
async fn signup_rejects_mismatched_passwords() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"email": "a@x.com", "password": "p1", "confirmPassword": "p2"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Passwords do not match");
}

#[actix_web::test]
async fn signup_rejects_malformed_emails() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"email": "a.x.com", "password": "p1", "confirmPassword": "p1"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid email address");
}

#[actix_web::test]
async fn task_lifecycle() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let user_id = register!(&app, "a@x.com");

    let task = create_task!(&app, json!({"title": "Write report", "user_id": user_id}));
    let task_id = task["id"].as_i64().unwrap();
    assert_eq!(task["priority"], "Medium");
    assert_eq!(task["deadline"], Value::Null);
    assert_eq!(task["is_completed"], false);
    assert_eq!(task["time_spent_seconds"], 0);

    let (status, tasks) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/tasks/{user_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([task]));

    let (status, body) = call_json!(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{task_id}/time"))
            .set_json(json!({"userId": user_id, "timeSpentSeconds": 5400}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Time updated successfully");

    let (status, body) = call_json!(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/tasks/{task_id}"))
            .set_json(json!({
                "title": "Write report",
                "description": "quarterly",
                "priority": "High",
                "isCompleted": true,
                "userId": user_id
            }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");

    let today = chrono::Utc::now().date_naive().to_string();
    let (_, tasks) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/tasks/{user_id}"))
    );
    assert_eq!(tasks[0]["is_completed"], true);
    assert_eq!(tasks[0]["priority"], "High");
    assert_eq!(tasks[0]["description"], "quarterly");
    assert_eq!(tasks[0]["completion_date"], today.as_str());
    assert_eq!(tasks[0]["time_spent_seconds"], 5400);

    let (status, summary) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/stats/summary/daily/{user_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, json!({"total_seconds": 5400}));

    let (status, stats) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/stats/productivity/{user_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!([{"date": today, "total_seconds": 5400}]));

    let (status, body) = call_json!(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/tasks/{task_id}"))
            .set_json(json!({"user_id": user_id}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, _) = call_json!(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/tasks/{task_id}"))
            .set_json(json!({"user_id": user_id}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn other_users_get_not_found() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let owner = register!(&app, "owner@x.com");
    let intruder = register!(&app, "intruder@x.com");

    let task = create_task!(&app, json!({"title": "Private", "user_id": owner}));
    let task_id = task["id"].as_i64().unwrap();

    let (status, body) = call_json!(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/tasks/{task_id}"))
            .set_json(json!({"title": "Mine now", "is_completed": true, "user_id": intruder}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Task not found or you don't have permission");

    let (status, _) = call_json!(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{task_id}/time"))
            .set_json(json!({"user_id": intruder, "time_spent_seconds": 10}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call_json!(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/tasks/{task_id}"))
            .set_json(json!({"user_id": intruder}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, tasks) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/tasks/{intruder}"))
    );
    assert_eq!(tasks, json!([]));

    let (_, tasks) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/tasks/{owner}"))
    );
    assert_eq!(tasks, json!([task]));
}

#[actix_web::test]
async fn blank_titles_are_bad_requests() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let user_id = register!(&app, "a@x.com");

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/tasks/")
            .set_json(json!({"title": "  ", "user_id": user_id}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Title cannot be empty");

    let task = create_task!(&app, json!({"title": "Real", "user_id": user_id}));
    let (status, _) = call_json!(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .set_json(json!({"title": "", "is_completed": false, "user_id": user_id}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_bodies_use_the_error_shape() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let (status, body) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/tasks/")
            .set_json(json!({"description": "no title or owner"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[actix_web::test]
async fn export_as_csv_and_pdf() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let user_id = register!(&app, "a@x.com");
    let task = create_task!(
        &app,
        json!({"title": "Focus", "user_id": user_id, "deadline": "2024-10-25"})
    );
    let (status, _) = call_json!(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{}/time", task["id"]))
            .set_json(json!({"user_id": user_id, "time_spent_seconds": 5400}))
    );
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/export/{user_id}?format=CSV"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("tasks.csv"));
    let body = test::read_body(resp).await;
    let csv = std::str::from_utf8(&body).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "ID,Title,Description,Priority,Deadline,Status,Time Spent (Seconds)"
    );
    assert_eq!(
        lines[1],
        format!("{},Focus,,Medium,2024-10-25,Pending,5400", task["id"])
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/export/{user_id}?format=pdf"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF-1.4"));
    let pdf = String::from_utf8_lossy(&body);
    assert!(pdf.contains("(1h 30m) Tj"));
    assert!(pdf.contains("(Focus) Tj"));
}

#[actix_web::test]
async fn export_rejects_unknown_formats() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    for uri in ["/api/export/1?format=xls", "/api/export/1"] {
        let (status, body) = call_json!(&app, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["detail"], "Invalid format specified. Use 'csv' or 'pdf'.");
    }
}

#[actix_web::test]
async fn stats_are_empty_for_new_users() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let user_id = register!(&app, "a@x.com");

    let (_, summary) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/stats/summary/daily/{user_id}"))
    );
    assert_eq!(summary, json!({"total_seconds": 0}));

    let (_, stats) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/stats/productivity/{user_id}"))
    );
    assert_eq!(stats, json!([]));
}

#[actix_web::test]
async fn openapi_document_lists_routes() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let (status, doc) = call_json!(&app, test::TestRequest::get().uri("/api-doc/openapi.json"));
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/tasks/{task_id}/time"].is_object());
    assert!(doc["paths"]["/api/export/{user_id}"].is_object());
}
