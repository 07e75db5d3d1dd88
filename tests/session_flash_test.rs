use base::prelude::*;
use tempfile::TempDir;

struct Notes;

impl Notes {
    async fn save(&mut self, ctx: &mut Context, _params: Params) -> Result<Reply> {
        ctx.session().set_value("user", "ana");
        Ok(Redirect::to("notes/read").with("notice", "Saved").into())
    }

    async fn read(&mut self, ctx: &mut Context, _params: Params) -> Result<Reply> {
        let notice = ctx
            .session()
            .get::<String>("notice")
            .unwrap_or_else(|| "none".to_string());
        let user = ctx
            .session()
            .get::<String>("user")
            .unwrap_or_else(|| "anonymous".to_string());
        Ok(format!("{}/{}", notice, user).into())
    }

    async fn logout(&mut self, ctx: &mut Context, _params: Params) -> Result<Reply> {
        ctx.session().clear();
        Ok("bye".into())
    }

    async fn remember(&mut self, ctx: &mut Context, params: Params) -> Result<Reply> {
        let theme = params.get(1).unwrap_or("light").to_string();
        ctx.sealed_cookies()
            .set("prefs", &json!({"theme": theme}), CookieOptions::default())?;
        Ok("ok".into())
    }

    async fn prefs(&mut self, ctx: &mut Context, _params: Params) -> Result<Reply> {
        let prefs: Option<Value> = ctx.sealed_cookies().get("prefs");
        Ok(prefs
            .and_then(|p| p["theme"].as_str().map(str::to_string))
            .unwrap_or_else(|| "unset".to_string())
            .into())
    }
}

#[async_trait]
impl Controller for Notes {
    fn create(_ctx: &Context) -> Self {
        Notes
    }

    fn actions() -> Actions<Self> {
        actions! {
            "actionSave" => Self::save,
            "actionRead" => Self::read,
            "actionLogout" => Self::logout,
            "actionRemember" => Self::remember,
            "actionPrefs" => Self::prefs,
        }
    }
}

fn app(driver: &str) -> (TempDir, App) {
    let dir = TempDir::new().unwrap();
    let config = ConfigStore::from_value(json!({
        "application": {"key": "flash-test-key"},
        "session": {"driver": driver},
        "views": {"directory": dir.path().to_string_lossy()},
    }));
    let app = App::new(config).unwrap().controller::<Notes>("notes");
    (dir, app)
}

/// A browser that keeps the cookies it is sent
#[derive(Default)]
struct Browser {
    cookies: Vec<(String, String)>,
}

impl Browser {
    async fn get(&mut self, app: &App, path: &str) -> Response {
        let mut request = Request::new("GET", path).with_header("host", "localhost");
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.with_header("cookie", &header);
        }

        let response = app.handle(request).await;
        for set_cookie in response.header_values("set-cookie") {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.retain(|(existing, _)| existing != name);
                if !value.is_empty() {
                    self.cookies.push((name.to_string(), value.to_string()));
                }
            }
        }
        response
    }
}

async fn flash_lives_one_request(driver: &str) {
    let (_dir, app) = app(driver);
    let mut browser = Browser::default();

    let response = browser.get(&app, "/notes/save").await;
    assert_eq!(response.status.as_u16(), 302);

    let response = browser.get(&app, "/notes/read").await;
    assert_eq!(response.body_string(), "Saved/ana");

    let response = browser.get(&app, "/notes/read").await;
    assert_eq!(response.body_string(), "none/ana");
}

#[tokio::test]
async fn test_flash_with_native_driver() {
    flash_lives_one_request("native").await;
}

#[tokio::test]
async fn test_flash_with_cookie_driver() {
    flash_lives_one_request("cookie").await;
}

#[tokio::test]
async fn test_clearing_the_session_drops_the_cookie() {
    let (_dir, app) = app("native");
    let mut browser = Browser::default();

    browser.get(&app, "/notes/save").await;
    assert!(browser.cookies.iter().any(|(name, _)| name == "base_session"));

    browser.get(&app, "/notes/logout").await;
    assert!(browser.cookies.is_empty());

    let response = browser.get(&app, "/notes/read").await;
    assert_eq!(response.body_string(), "none/anonymous");
}

#[tokio::test]
async fn test_forged_session_cookie_starts_fresh() {
    let (_dir, app) = app("cookie");
    let mut browser = Browser::default();
    browser
        .cookies
        .push(("base_session".to_string(), "not-a-sealed-value".to_string()));

    let response = browser.get(&app, "/notes/read").await;
    assert_eq!(response.body_string(), "none/anonymous");
}

#[tokio::test]
async fn test_sealed_cookies_round_trip() {
    let (_dir, app) = app("native");
    let mut browser = Browser::default();

    browser.get(&app, "/notes/remember/dark").await;
    let sealed = browser
        .cookies
        .iter()
        .find(|(name, _)| name == "prefs")
        .map(|(_, value)| value.clone())
        .unwrap();
    assert!(!sealed.contains("dark"));

    let response = browser.get(&app, "/notes/prefs").await;
    assert_eq!(response.body_string(), "dark");
}
