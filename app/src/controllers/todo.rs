//! Todo resource handlers
//!
//! `TodoCollection` serves `/todo`, `TodoEntity` serves `/todo/{id}`.
//! Reads run on the shared connection. Every mutation runs in its own
//! transaction, committed only once the response body has been encoded.

use async_trait::async_trait;
use kit::http::parse_bool;
use kit::{DbContext, FrameworkError, Handler, HttpResponse, Method, Request, Response};
use serde::{Deserialize, Serialize};

use crate::models::Todo;

/// Form fields accepted by create and update
///
/// Both fields are kept as raw strings so that a missing field and a
/// malformed boolean produce different messages.
#[derive(Debug, Default, Deserialize)]
struct TodoForm {
    #[serde(default)]
    task: String,
    #[serde(default)]
    complete: String,
}

/// Body of every successful entity response
#[derive(Serialize)]
struct EntityBody<'a> {
    entity: &'a Todo,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Validated `task` and `complete` from a form body
///
/// An undecodable body counts as missing fields.
fn read_input(
    req: &Request,
    missing: &str,
    invalid_bool: &str,
) -> Result<(String, bool), FrameworkError> {
    let form: TodoForm = req.form().unwrap_or_default();
    if form.task.is_empty() || form.complete.is_empty() {
        return Err(FrameworkError::validation(missing));
    }
    let complete =
        parse_bool(&form.complete).ok_or_else(|| FrameworkError::validation(invalid_bool))?;
    Ok((form.task, complete))
}

/// Parse an id segment made only of ASCII digits
///
/// `str::parse` alone would also take a sign, so `+1` and `-1` are refused here.
fn parse_id(segment: &str) -> Result<i64, FrameworkError> {
    let invalid = || FrameworkError::validation("Did not receive a valid integer ID.");
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    segment.parse().map_err(|_| invalid())
}

fn entity_response(todo: &Todo, message: Option<&str>) -> Result<HttpResponse, FrameworkError> {
    HttpResponse::to_json(&EntityBody {
        entity: todo,
        message,
    })
}

// ============================================================================
// /todo
// ============================================================================

pub struct TodoCollection {
    db: DbContext,
}

impl TodoCollection {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    async fn list(&self) -> Response {
        let todos = Todo::all(&self.db)
            .await
            .map_err(|e| HttpResponse::failure(e, "Failed to fetch todos"))?;

        HttpResponse::to_json(&todos)
            .map_err(|e| HttpResponse::failure(e, "Could not convert todos to JSON format"))
    }

    async fn create(&self, req: &Request) -> Response {
        let (task, complete) = read_input(
            req,
            "Request must contain 'task' and 'complete' fields.",
            "'complete' must be a valid boolean.",
        )?;

        let outcome = async {
            let tx = self.db.begin().await?;
            let result = async {
                let todo = Todo::create(&tx, &task, complete).await?;
                entity_response(&todo, Some("Todo successfully created."))
            }
            .await;
            tx.finish(result).await
        }
        .await;

        outcome
            .map(|response| response.status(201))
            .map_err(|e| HttpResponse::failure(e, "Could not create todo in database."))
    }
}

#[async_trait]
impl Handler for TodoCollection {
    async fn handle(&self, req: Request) -> Response {
        match *req.method() {
            Method::GET => self.list().await,
            Method::POST => self.create(&req).await,
            ref other => Err(FrameworkError::method_not_allowed(other.as_str()).into()),
        }
    }
}

// ============================================================================
// /todo/{id}
// ============================================================================

pub struct TodoEntity {
    db: DbContext,
}

impl TodoEntity {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Parse the id segment and load the todo it names
    async fn lookup(&self, req: &Request) -> Result<Todo, HttpResponse> {
        let id = parse_id(req.param("id")?)?;

        match Todo::find(&self.db, id).await {
            Ok(Some(todo)) => Ok(todo),
            Ok(None) => Err(FrameworkError::not_found(format!(
                "Could not find a todo with ID '{}'.",
                id
            ))
            .into()),
            Err(e) => Err(HttpResponse::failure(e, "Could not fetch todo.")),
        }
    }

    fn show(&self, todo: &Todo) -> Response {
        entity_response(todo, None).map_err(|e| HttpResponse::failure(e, "Unable to format todo."))
    }

    async fn update(&self, req: &Request, mut todo: Todo) -> Response {
        let (task, complete) = read_input(
            req,
            "PUT requests must include non-empty 'task' and 'complete' fields.",
            "'complete' field must be a valid boolean value.",
        )?;
        todo.task = task;
        todo.complete = complete;

        let outcome = async {
            let tx = self.db.begin().await?;
            let result = async {
                todo.update(&tx).await?;
                entity_response(&todo, Some("Update successful."))
            }
            .await;
            tx.finish(result).await
        }
        .await;

        outcome.map_err(|e| HttpResponse::failure(e, "Could not update todo."))
    }

    async fn delete(&self, mut todo: Todo) -> Response {
        let id = todo.rowid();

        let outcome = async {
            let tx = self.db.begin().await?;
            let result = todo.delete(&tx).await;
            tx.finish(result).await
        }
        .await;

        outcome
            .map(|()| HttpResponse::message(format!("Todo #{} deleted.", id)))
            .map_err(|e| HttpResponse::failure(e, "Could not delete todo."))
    }
}

#[async_trait]
impl Handler for TodoEntity {
    async fn handle(&self, req: Request) -> Response {
        let todo = self.lookup(&req).await?;

        match *req.method() {
            Method::GET => self.show(&todo),
            Method::PUT => self.update(&req, todo).await,
            Method::DELETE => self.delete(todo).await,
            ref other => Err(FrameworkError::method_not_allowed(other.as_str()).into()),
        }
    }
}
