//! Convention-named controllers and their dispatch
//!
//! Controllers are registered under a slash-separated path (`blog/posts`). A request
//! resolved to that path creates a fresh controller, runs `before`, the action the
//! route names (or `missing_action`), then `after`.
//!
//! ```ignore
//! struct Posts;
//!
//! #[async_trait]
//! impl Controller for Posts {
//!     fn create(_ctx: &Context) -> Self {
//!         Posts
//!     }
//!
//!     fn actions() -> Actions<Self> {
//!         actions! {
//!             "actionIndex" => Self::index,
//!             "actionShow" => Self::show,
//!         }
//!     }
//! }
//! ```

use crate::context::Context;
use crate::error::Result;
use crate::reply::Reply;
use crate::routing::{ControllerLayout, Params};
use crate::views::View;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub type ActionFn<C> =
    for<'a> fn(&'a mut C, &'a mut Context, Params) -> BoxFuture<'a, Result<Reply>>;

/// Reply used for unknown controllers and actions
pub fn not_found() -> Reply {
    View::new("error/404").with_status(404).into()
}

#[async_trait]
pub trait Controller: Send + Sized + 'static {
    fn create(ctx: &Context) -> Self;

    /// Dispatch `get`/`post`/... prefixed methods instead of `action` ones
    fn restful() -> bool {
        false
    }

    fn actions() -> Actions<Self>;

    /// A returned reply replaces the action
    async fn before(&mut self, _ctx: &mut Context) -> Result<Option<Reply>> {
        Ok(None)
    }

    async fn after(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    async fn missing_action(&mut self, _ctx: &mut Context, _method: &str) -> Result<Reply> {
        Ok(not_found())
    }
}

pub enum ActionLookup<C> {
    Found(ActionFn<C>),
    NotFound,
}

/// Method table of a controller, keyed by dispatched method name
pub struct Actions<C> {
    table: HashMap<String, ActionFn<C>>,
}

impl<C> Default for Actions<C> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<C> Actions<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: &str, handler: ActionFn<C>) -> Self {
        self.table.insert(name.to_string(), handler);
        self
    }

    pub fn resolve(&self, name: &str) -> ActionLookup<C> {
        match self.table.get(name) {
            Some(handler) => ActionLookup::Found(*handler),
            None => ActionLookup::NotFound,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Build an [`Actions`] table from `"methodName" => handler` pairs
///
/// Handlers are async methods taking `(&mut self, &mut Context, Params)`.
#[macro_export]
macro_rules! actions {
    ($($name:literal => $handler:expr),* $(,)?) => {
        $crate::controller::Actions::new()
            $(
                .add($name, |controller, ctx, params| {
                    Box::pin(async move { $handler(controller, ctx, params).await })
                })
            )*
    };
}

trait DispatchTarget: Send + Sync {
    fn dispatch<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Reply>>;
}

struct ControllerEntry<C> {
    actions: Actions<C>,
    restful: bool,
}

impl<C: Controller> DispatchTarget for ControllerEntry<C> {
    fn dispatch<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let mut controller = C::create(ctx);
            let method = ctx.route.method_name(self.restful);

            let reply = match controller.before(ctx).await {
                Ok(Some(reply)) => {
                    log::debug!("before() of {} replied early", ctx.route.controller_class());
                    Ok(reply)
                }
                Ok(None) => match self.actions.resolve(&method) {
                    ActionLookup::Found(action) => {
                        log::debug!("Dispatching {}", ctx.route.handler_name(self.restful));
                        let params = ctx.route.params.clone();
                        action(&mut controller, ctx, params).await
                    }
                    ActionLookup::NotFound => {
                        log::warn!(
                            "Unknown action {}",
                            ctx.route.handler_name(self.restful)
                        );
                        controller.missing_action(ctx, &method).await
                    }
                },
                Err(e) => Err(e),
            };

            if let Err(e) = controller.after(ctx).await {
                log::error!("after() of {} failed: {}", ctx.route.controller_class(), e);
            }

            reply
        })
    }
}

/// Registered controllers, keyed by path
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn DispatchTarget>>,
    directories: HashSet<String>,
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<&String> = self.controllers.keys().collect();
        paths.sort();
        f.debug_struct("ControllerRegistry")
            .field("controllers", &paths)
            .finish()
    }
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `C` at `path`; every prefix of the path becomes a controller directory
    pub fn register<C: Controller>(&mut self, path: &str) {
        let path = path.trim_matches('/').to_string();

        let parts: Vec<&str> = path.split('/').collect();
        for depth in 1..parts.len() {
            self.directories.insert(parts[..depth].join("/"));
        }

        let entry = ControllerEntry::<C> {
            actions: C::actions(),
            restful: C::restful(),
        };
        log::debug!(
            "Registered controller '{}' with {} actions",
            path,
            entry.actions.len()
        );

        if self.controllers.insert(path.clone(), Arc::new(entry)).is_some() {
            log::warn!("Controller '{}' registered twice, keeping the last one", path);
        }
    }

    pub fn has(&self, path: &str) -> bool {
        self.controllers.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Run the controller the context's route names
    pub async fn dispatch(&self, ctx: &mut Context) -> Result<Reply> {
        let path = ctx.route.controller_path();
        match self.controllers.get(&path) {
            Some(target) => target.dispatch(ctx).await,
            None => {
                log::warn!(
                    "No controller registered for '{}' ({})",
                    path,
                    ctx.route.controller_class()
                );
                Ok(not_found())
            }
        }
    }
}

impl ControllerLayout for ControllerRegistry {
    fn is_directory(&self, path: &str) -> bool {
        self.directories.contains(path)
    }

    fn has_controller(&self, directory: &str, name: &str) -> bool {
        if directory.is_empty() {
            self.controllers.contains_key(name)
        } else {
            self.controllers
                .contains_key(&format!("{}/{}", directory, name))
        }
    }
}
