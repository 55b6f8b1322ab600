use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const DEFAULT_PRIORITY: &str = "Medium";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub user_id: i64,
    pub priority: String,
    #[schema(example = "2024-10-25")]
    pub deadline: Option<String>,
    pub time_spent_seconds: i64,
    pub completion_date: Option<NaiveDate>,
}

/// Fields accepted when creating a task.
#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: i64,
    pub priority: Option<String>,
    pub deadline: Option<String>,
}

/// Full replacement of a task's mutable fields.
#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "isCompleted")]
    pub is_completed: bool,
    #[serde(alias = "userId")]
    pub user_id: i64,
    pub priority: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct TaskOwner {
    #[serde(alias = "userId")]
    pub user_id: i64,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct TimeUpdateRequest {
    #[serde(alias = "userId")]
    pub user_id: i64,
    #[serde(alias = "timeSpentSeconds")]
    pub time_spent_seconds: i64,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword", alias = "confirm_password")]
    pub confirm_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user_id: i64,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Completed-task time for one calendar day. Serialized snake_case
/// (`total_seconds`) to match what existing clients read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_seconds: i64,
}

/// Today's completed-task time, serialized as `total_seconds` like [`DailyTotal`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub struct DailySummary {
    pub total_seconds: i64,
}
