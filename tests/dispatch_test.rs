use base::prelude::*;
use hyper::StatusCode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Home;

impl Home {
    async fn index(&mut self, _ctx: &mut Context, _params: Params) -> Result<Reply> {
        Ok(View::new("home/index").with("title", "Welcome").into())
    }
}

#[async_trait]
impl Controller for Home {
    fn create(_ctx: &Context) -> Self {
        Home
    }

    fn actions() -> Actions<Self> {
        actions! { "actionIndex" => Self::index }
    }
}

struct Posts;

impl Posts {
    async fn show(&mut self, ctx: &mut Context, params: Params) -> Result<Reply> {
        Ok(format!(
            "{} {}",
            ctx.route().handler_name(false),
            params.get(1).unwrap_or("-")
        )
        .into())
    }

    async fn save(&mut self, _ctx: &mut Context, _params: Params) -> Result<Reply> {
        Ok(Redirect::to("blog/posts/show/1").with("notice", "Saved").into())
    }

    async fn away(&mut self, _ctx: &mut Context, _params: Params) -> Result<Reply> {
        Ok(Redirect::to("https://example.org/docs").with_status(301).into())
    }

    async fn crash(&mut self, _ctx: &mut Context, _params: Params) -> Result<Reply> {
        Err(Error::internal("db exploded"))
    }
}

#[async_trait]
impl Controller for Posts {
    fn create(_ctx: &Context) -> Self {
        Posts
    }

    fn actions() -> Actions<Self> {
        actions! {
            "actionShow" => Self::show,
            "actionSave" => Self::save,
            "actionAway" => Self::away,
            "actionCrash" => Self::crash,
        }
    }
}

fn write_views(dir: &Path) {
    let files = [
        (
            "home/index.html",
            "@{extend('layouts/main')}@{section('content')}<h1>@{title}</h1>@{close}",
        ),
        ("layouts/main.html", "<html>@{show('content')}</html>"),
    ];
    for (name, content) in files {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn merge(target: &mut Value, extra: Value) {
    match (target, extra) {
        (Value::Object(target), Value::Object(extra)) => {
            for (key, value) in extra {
                merge(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, extra) => *target = extra,
    }
}

fn app_with(extra: Value) -> (TempDir, App) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();

    let dir = TempDir::new().unwrap();
    write_views(dir.path());

    let mut config = json!({
        "application": {"key": "integration-test-key"},
        "views": {"directory": dir.path().to_string_lossy()},
    });
    merge(&mut config, extra);

    let app = App::new(ConfigStore::from_value(config))
        .unwrap()
        .controller::<Home>("index")
        .controller::<Posts>("blog/posts");
    (dir, app)
}

fn get(path: &str) -> Request {
    Request::new("GET", path).with_header("host", "localhost")
}

#[tokio::test]
async fn test_root_renders_layout() {
    let (_dir, app) = app_with(json!({}));
    let response = app.handle(get("/")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body_string(), "<html><h1>Welcome</h1></html>");
    assert_eq!(
        response.header("content-type"),
        Some("text/html; charset=utf-8")
    );
}

#[tokio::test]
async fn test_nested_controller_with_params() {
    let (_dir, app) = app_with(json!({}));
    let response = app.handle(get("/blog/posts/show/42")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body_string(), "BlogPostsController::actionShow 42");
}

#[tokio::test]
async fn test_unknown_action_and_controller_are_404() {
    let (_dir, app) = app_with(json!({}));

    let response = app.handle(get("/blog/posts/unknown")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body_string(), "Not Found");

    // resolves to index::actionNowhere
    let response = app.handle(get("/nowhere")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redirects() {
    let (_dir, app) = app_with(json!({}));

    let response = app.handle(get("/blog/posts/save")).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        Some("http://localhost/blog/posts/show/1")
    );
    assert!(response
        .header_values("set-cookie")
        .iter()
        .any(|c| c.starts_with("base_session=")));

    let response = app.handle(get("/blog/posts/away")).await;
    assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.header("location"), Some("https://example.org/docs"));
}

#[tokio::test]
async fn test_action_errors_become_500() {
    let (_dir, app) = app_with(json!({}));
    let response = app.handle(get("/blog/posts/crash")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body_string().contains("db exploded"));

    let (_dir, app) = app_with(json!({"application": {"errors": {"display": true}}}));
    let response = app.handle(get("/blog/posts/crash")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body_string().contains("db exploded"));
}

#[tokio::test]
async fn test_base_path_is_stripped() {
    let (_dir, app) = app_with(json!({"application": {"base_path": "/app"}}));

    let response = app.handle(get("/app/blog/posts/show/7")).await;
    assert_eq!(response.body_string(), "BlogPostsController::actionShow 7");

    let response = app.handle(get("/app/blog/posts/save")).await;
    assert_eq!(
        response.header("location"),
        Some("http://localhost/app/blog/posts/show/1")
    );
}
