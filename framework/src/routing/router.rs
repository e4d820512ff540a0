use crate::error::FrameworkError;
use crate::http::{Request, Response};
use async_trait::async_trait;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Request handler bound to a route
///
/// A handler receives the request with its captured path parameters and
/// decides on the method itself, so one binding serves every method of a
/// resource.
///
/// # Example
///
/// ```rust,ignore
/// struct Health;
///
/// #[async_trait]
/// impl Handler for Health {
///     async fn handle(&self, _req: Request) -> Response {
///         HttpResponse::text("ok").ok()
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: Request) -> Response;
}

/// Plain async functions and closures are handlers too
#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn handle(&self, req: Request) -> Response {
        (self)(req).await
    }
}

/// One binding of the route table: path pattern, handler and default content type
pub struct Route {
    pattern: String,
    matcher: MatchitRouter<()>,
    handler: Arc<dyn Handler>,
    default_content_type: Option<String>,
}

impl Route {
    /// Compile a path pattern such as `/todo/{id}`
    pub fn new<H: Handler + 'static>(pattern: &str, handler: H) -> Result<Self, FrameworkError> {
        let mut matcher = MatchitRouter::new();
        matcher.insert(pattern, ()).map_err(|e| {
            FrameworkError::Config(format!("invalid route pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            handler: Arc::new(handler),
            default_content_type: None,
        })
    }

    /// Content type injected when the handler response carries none
    pub fn with_default_content_type(mut self, content_type: &str) -> Self {
        self.default_content_type = Some(content_type.to_string());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn default_content_type(&self) -> Option<&str> {
        self.default_content_type.as_deref()
    }

    /// Match a path against this route, returning the captured segments
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        self.matcher.at(path).ok().map(|matched| {
            matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
    }
}

/// Ordered route table, built once at startup
///
/// Resolution is first-match-wins in registration order. Patterns are
/// expected not to overlap; when they do, the earlier binding shadows the
/// later one.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let routes: RouteTable = RouteTable::new()
    ///     .bind("/todo", TodoCollection::new(db.clone()))?
    ///     .content_type("application/json")
    ///     .bind("/todo/{id}", TodoEntity::new(db))?
    ///     .content_type("application/json")
    ///     .into();
    /// ```
    pub fn bind<H: Handler + 'static>(
        mut self,
        pattern: &str,
        handler: H,
    ) -> Result<RouteBuilder, FrameworkError> {
        self.routes.push(Route::new(pattern, handler)?);
        Ok(RouteBuilder { table: self })
    }

    /// Find the first route matching `path` along with its captured parameters
    pub fn resolve(&self, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        self.routes
            .iter()
            .find_map(|route| route.matches(path).map(|params| (route, params)))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Builder returned after binding a route, enabling `.content_type()` chaining
pub struct RouteBuilder {
    table: RouteTable,
}

impl RouteBuilder {
    /// Set the default content type of the most recently bound route
    pub fn content_type(mut self, content_type: &str) -> Self {
        if let Some(route) = self.table.routes.pop() {
            self.table
                .routes
                .push(route.with_default_content_type(content_type));
        }
        self
    }

    /// Bind another route (for chaining)
    pub fn bind<H: Handler + 'static>(
        self,
        pattern: &str,
        handler: H,
    ) -> Result<RouteBuilder, FrameworkError> {
        self.table.bind(pattern, handler)
    }
}

impl From<RouteBuilder> for RouteTable {
    fn from(builder: RouteBuilder) -> Self {
        builder.table
    }
}
