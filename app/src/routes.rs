use kit::{DbContext, FrameworkError, RouteTable, JSON_CONTENT_TYPE};

use crate::controllers::{TodoCollection, TodoEntity};

/// Build the route table of the service
///
/// `{id}` captures any single segment; the entity handler rejects ids that
/// are not integers.
pub fn register(db: DbContext) -> Result<RouteTable, FrameworkError> {
    let routes = RouteTable::new()
        .bind("/todo", TodoCollection::new(db.clone()))?
        .content_type(JSON_CONTENT_TYPE)
        .bind("/todo/{id}", TodoEntity::new(db))?
        .content_type(JSON_CONTENT_TYPE)
        .into();

    Ok(routes)
}
