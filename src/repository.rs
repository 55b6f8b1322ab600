//! Task and user persistence.
//!
//! All functions take a borrowed `&Connection` and are stateless. Every task
//! query filters on `user_id`; a task owned by somebody else is
//! indistinguishable from a missing one.

use chrono::NaiveDate;
use log::{debug, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::errors::{AppError, AppResult};
use crate::models::{NewTask, Task, TaskUpdate, User, DEFAULT_PRIORITY};

const TASK_COLUMNS: &str = "id, title, description, is_completed, user_id, priority, deadline, \
     time_spent_seconds, completion_date";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_completed: row.get(3)?,
        user_id: row.get(4)?,
        priority: row.get(5)?,
        deadline: row.get(6)?,
        time_spent_seconds: row.get(7)?,
        completion_date: row.get(8)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
    })
}

fn require_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("Title cannot be empty"));
    }
    Ok(())
}

/// Missing or blank priorities fall back to the column default.
pub fn priority_or_default(priority: Option<&str>) -> String {
    match priority.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => DEFAULT_PRIORITY.to_string(),
    }
}

fn constraint_violation(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation && e.extended_code == extended_code
    )
}

pub struct TaskRepository;

impl TaskRepository {
    pub fn list(conn: &Connection, user_id: i64) -> AppResult<Vec<Task>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY id"
        ))?;
        let tasks = stmt
            .query_map(params![user_id], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn get(conn: &Connection, task_id: i64, user_id: i64) -> AppResult<Option<Task>> {
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"),
                params![task_id, user_id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn create(conn: &Connection, new: &NewTask) -> AppResult<Task> {
        require_title(&new.title)?;
        let priority = priority_or_default(new.priority.as_deref());

        let inserted = conn.execute(
            "INSERT INTO tasks (title, description, user_id, priority, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.title, new.description, new.user_id, priority, new.deadline],
        );
        if let Err(err) = inserted {
            if constraint_violation(&err, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
                return Err(AppError::not_found("User not found"));
            }
            return Err(err.into());
        }

        let id = conn.last_insert_rowid();
        debug!("created task {} for user {}", id, new.user_id);
        Self::get(conn, id, new.user_id)?.ok_or_else(AppError::task_not_found)
    }

    /// Replaces every mutable field of the task in one statement.
    ///
    /// `completion_date` is stamped with `today` whenever `is_completed` is
    /// true in this call, including re-affirmations of an already completed
    /// task. Setting `is_completed` false leaves the last date in place.
    pub fn update(
        conn: &Connection,
        task_id: i64,
        update: &TaskUpdate,
        today: NaiveDate,
    ) -> AppResult<Task> {
        require_title(&update.title)?;
        let priority = priority_or_default(update.priority.as_deref());

        let changed = conn.execute(
            "UPDATE tasks
             SET title = ?1,
                 description = ?2,
                 is_completed = ?3,
                 priority = ?4,
                 deadline = ?5,
                 completion_date = CASE WHEN ?3 THEN ?6 ELSE completion_date END
             WHERE id = ?7 AND user_id = ?8",
            params![
                update.title,
                update.description,
                update.is_completed,
                priority,
                update.deadline,
                today,
                task_id,
                update.user_id,
            ],
        )?;
        if changed == 0 {
            warn!("update of task {} by user {} matched nothing", task_id, update.user_id);
            return Err(AppError::task_not_found());
        }

        Self::get(conn, task_id, update.user_id)?.ok_or_else(AppError::task_not_found)
    }

    pub fn delete(conn: &Connection, task_id: i64, user_id: i64) -> AppResult<()> {
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![task_id, user_id],
        )?;
        if deleted == 0 {
            warn!("delete of task {} by user {} matched nothing", task_id, user_id);
            return Err(AppError::task_not_found());
        }
        Ok(())
    }

    /// Overwrites the accumulated time with an absolute total.
    pub fn set_time_spent(
        conn: &Connection,
        task_id: i64,
        user_id: i64,
        seconds: i64,
    ) -> AppResult<()> {
        if seconds < 0 {
            return Err(AppError::validation("Time spent cannot be negative"));
        }
        let changed = conn.execute(
            "UPDATE tasks SET time_spent_seconds = ?1 WHERE id = ?2 AND user_id = ?3",
            params![seconds, task_id, user_id],
        )?;
        if changed == 0 {
            return Err(AppError::task_not_found());
        }
        Ok(())
    }
}

pub struct UserRepository;

impl UserRepository {
    /// Inserts a user. The unique index on `email` backs up the caller's own
    /// duplicate check.
    pub fn create(conn: &Connection, email: &str, password: &str) -> AppResult<i64> {
        let inserted = conn.execute(
            "INSERT INTO users (email, password) VALUES (?1, ?2)",
            params![email, password],
        );
        match inserted {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(err) if constraint_violation(&err, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, email, password FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}
