//! Application assembly and the per-request pipeline
//!
//! An [`App`] owns every shared service (configuration, cipher, views, database,
//! session store, registered controllers). Each request gets its own [`Context`];
//! nothing is stored in process-wide globals.

use crate::cli::CliArgs;
use crate::config::{AppConfig, Environment, ViewConfig};
use crate::configuration::ConfigStore;
use crate::context::Context;
use crate::controller::{Controller, ControllerRegistry};
use crate::crypto::Cipher;
use crate::db::DbHandle;
use crate::error::{Error, Result};
use crate::http::{CookieJar, Request, Response, Server};
use crate::reply::Reply;
use crate::routing::RouteResolver;
use crate::session::SessionStore;
use crate::url::Url;
use crate::views::{RenderOutcome, View, ViewEngine};
use hyper::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Configuration files read by [`App::from_directory`]
pub const CONFIG_FILES: &[&str] = &["application", "database", "session", "views", "server"];

pub struct App {
    config: Arc<ConfigStore>,
    settings: Arc<AppConfig>,
    resolver: RouteResolver,
    controllers: ControllerRegistry,
    views: Arc<ViewEngine>,
    sessions: SessionStore,
    cipher: Cipher,
    db: DbHandle,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("base_path", &self.resolver.base_path())
            .field("controllers", &self.controllers)
            .field("sessions", &self.sessions)
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build every service from an already loaded store
    pub fn new(config: ConfigStore) -> Result<Self> {
        let settings = AppConfig::from_store(&config)?;

        let cipher = Cipher::new(&settings.application.key);
        let db = DbHandle::new(settings.database.clone());
        let sessions = SessionStore::from_config(&settings.session, cipher.clone(), &db)?;

        let views_dir = resolve_views_dir(config.directory(), &settings.views.directory);
        log::info!("Views directory: {}", views_dir.display());
        let views = ViewEngine::new(&views_dir)
            .with_extension(&settings.views.extension)
            .with_cache(settings.views.cache_enabled);

        Ok(Self {
            resolver: RouteResolver::new(&settings.application.base_path),
            config: Arc::new(config),
            settings: Arc::new(settings),
            controllers: ControllerRegistry::new(),
            views: Arc::new(views),
            sessions,
            cipher,
            db,
        })
    }

    /// Load [`CONFIG_FILES`] from `directory`, with an optional environment overlay
    pub fn from_directory<P: AsRef<Path>>(
        directory: P,
        environment: Option<Environment>,
    ) -> Result<Self> {
        let mut store = ConfigStore::new(directory.as_ref());
        if let Some(environment) = environment {
            log::info!("Configuration environment: {}", environment.as_str());
            store = store.with_environment(environment);
        }
        store.load_all(CONFIG_FILES)?;
        Self::new(store)
    }

    /// Configure from `--config`, `--views` and `--env`
    pub fn from_cli() -> Result<Self> {
        let args = CliArgs::parse()?;
        Self::from_args(&args)
    }

    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let directory = args
            .config_dir()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("config"));
        let environment = args.environment.as_deref().map(Environment::from_name);

        let app = Self::from_directory(&directory, environment)?;
        match args.views_path() {
            Some(views) => {
                log::info!("Overriding views directory from CLI: {}", views.display());
                let engine = ViewEngine::from_config(&ViewConfig {
                    directory: views.to_string_lossy().to_string(),
                    ..app.settings.views.clone()
                });
                Ok(app.with_views(engine))
            }
            None => Ok(app),
        }
    }

    /// Register a controller under a slash-separated path (`blog/posts`)
    pub fn controller<C: Controller>(mut self, path: &str) -> Self {
        self.controllers.register::<C>(path);
        self
    }

    pub fn with_views(mut self, views: ViewEngine) -> Self {
        self.views = Arc::new(views);
        self
    }

    pub fn settings(&self) -> &AppConfig {
        &self.settings
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn views(&self) -> &ViewEngine {
        &self.views
    }

    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one request through routing, dispatch and the session lifecycle
    pub async fn handle(&self, request: Request) -> Response {
        let started = Instant::now();
        let method = request.method.clone();
        let path = request.path().to_string();

        let response = match self.process(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("{} {} failed: {}", method, path, describe(&e));
                self.error_response(&e)
            }
        };

        log::info!(
            "{} {} -> {} ({:?})",
            method,
            path,
            response.status.as_u16(),
            started.elapsed()
        );
        response
    }

    async fn process(&self, request: Request) -> Result<Response> {
        let route = self
            .resolver
            .resolve(&request.method, request.path(), &self.controllers);
        let cookies = CookieJar::from_request(&request);
        let session = self.sessions.start(&cookies).await?;
        let url = Url::from_request(&request, self.resolver.base_path());

        let mut ctx = Context {
            request,
            route,
            session,
            cookies,
            config: Arc::clone(&self.config),
            settings: Arc::clone(&self.settings),
            cipher: self.cipher.clone(),
            db: self.db.clone(),
            url,
        };

        let result = match self.controllers.dispatch(&mut ctx).await {
            Ok(reply) => self.send(reply, &mut ctx),
            Err(e) => Err(e),
        };

        ctx.session.sweep();
        self.sessions
            .commit(&mut ctx.session, &mut ctx.cookies)
            .await?;

        let mut response = result?;
        for header in ctx.cookies.set_cookie_headers() {
            response.add_header("Set-Cookie", &header);
        }
        Ok(response)
    }

    /// Turn a controller reply into a response
    fn send(&self, reply: Reply, ctx: &mut Context) -> Result<Response> {
        match reply {
            Reply::View(view) => self.render(&view),
            Reply::Redirect(redirect) => {
                for (key, value) in redirect.flashes() {
                    ctx.session.flash_value(key, value.clone());
                }
                let location = redirect.location(&ctx.url, ctx.request.referrer());
                log::debug!("Redirecting to {}", location);
                Ok(Response::redirect(&location, redirect.status()))
            }
            Reply::Raw(body) => Ok(Response::html(body)),
        }
    }

    fn render(&self, view: &View) -> Result<Response> {
        // Error views are optional; fall back to a plain status page
        if let Some(status) = view.status().filter(|s| *s >= 400) {
            if !self.views.exists(view.name()) {
                log::debug!("No '{}' template, sending plain {}", view.name(), status);
                return Ok(plain_status(status));
            }
        }

        match view.render(&self.views) {
            RenderOutcome::Rendered { status, body } => {
                Ok(Response::html(body).with_status_code(status.unwrap_or(200)))
            }
            RenderOutcome::Failed(failure) => Err(failure
                .error
                .with_context(format!("Failed to render '{}'", failure.template))),
        }
    }

    fn error_response(&self, error: &Error) -> Response {
        let status = error.status_code();
        let display = self.settings.application.errors.display;

        let template = format!("error/{}", status);
        if self.views.exists(&template) {
            let mut view = View::new(&template)
                .with("status", status)
                .with_status(status);
            if display {
                view = view
                    .with("code", error.error_code())
                    .with("message", describe(error));
            }
            if let RenderOutcome::Rendered { body, .. } = view.render(&self.views) {
                return Response::html(body).with_status_code(status);
            }
        }

        if display {
            Response::text(format!("{} {}", error.error_code(), describe(error)))
                .with_status_code(status)
        } else {
            plain_status(status)
        }
    }

    /// Serve on `server.host:server.port` until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.settings.server_address();
        log::info!(
            "Starting with {} controller(s), session driver '{}'",
            self.controllers.len(),
            self.sessions.driver_name()
        );
        Server::new(self).serve(&addr).await
    }
}

/// Views live next to the config directory unless given absolutely
fn resolve_views_dir(config_dir: &Path, views: &str) -> PathBuf {
    let views = Path::new(views);
    if views.is_absolute() {
        return views.to_path_buf();
    }
    match config_dir.parent() {
        Some(root) => root.join(views),
        None => views.to_path_buf(),
    }
}

fn plain_status(status: u16) -> Response {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Error");
    Response::text(reason).with_status_code(status)
}

/// Error message including wrapped sources
fn describe(error: &Error) -> String {
    match error {
        Error::WithContext { message, source } => format!("{}: {}", message, describe(source)),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_dir_resolution() {
        assert_eq!(
            resolve_views_dir(Path::new("/srv/app/config"), "views"),
            PathBuf::from("/srv/app/views")
        );
        assert_eq!(
            resolve_views_dir(Path::new("config"), "templates"),
            PathBuf::from("templates")
        );
        assert_eq!(
            resolve_views_dir(Path::new("/srv/app/config"), "/opt/views"),
            PathBuf::from("/opt/views")
        );
    }

    #[test]
    fn test_describe_walks_context() {
        let err = Error::template("unexpected @{fi}").with_context("Failed to render 'home'");
        assert_eq!(
            describe(&err),
            "Failed to render 'home': Template error: unexpected @{fi}"
        );
    }

    #[test]
    fn test_plain_status_pages() {
        let response = plain_status(404);
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body_string(), "Not Found");
    }
}
