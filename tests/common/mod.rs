//! Shared helpers for integration tests
#![allow(dead_code)]
#![allow(unused_macros)]

pub mod database;
pub mod fixtures;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test;

/// Name of the actix-session cookie.
pub const SESSION_COOKIE: &str = "id";

/// Builds the application service the way the server binary does, minus the
/// error pages. `$events` defaults to an empty registry.
macro_rules! test_app {
    ($db:expr) => {
        test_app!($db, kupolls::events::AuthEvents::new())
    };
    ($db:expr, $events:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new(
                    kupolls::app_config::AppConfig::default(),
                ))
                .app_data(actix_web::web::Data::new($events))
                .wrap(kupolls::middleware::ClientCtx::default())
                .wrap(actix_session::SessionMiddleware::new(
                    actix_session::storage::CookieSessionStore::default(),
                    actix_web::cookie::Key::from(&[7u8; 64]),
                ))
                .configure(kupolls::web::configure),
        )
        .await
    };
}

/// Carries the session cookie from one response to the next request.
#[derive(Default)]
pub struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_cookie(&self, req: test::TestRequest) -> test::TestRequest {
        match &self.cookie {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }

    pub fn get(&self, uri: &str) -> test::TestRequest {
        self.with_cookie(test::TestRequest::get().uri(uri))
    }

    pub fn post(&self, uri: &str, form: &[(&str, &str)]) -> test::TestRequest {
        self.with_cookie(test::TestRequest::post().uri(uri).set_form(form))
    }

    /// Keeps the session cookie if the response set a new one.
    pub fn store<B>(&mut self, resp: &ServiceResponse<B>) {
        if let Some(cookie) = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
        {
            self.cookie = Some(cookie.into_owned());
        }
    }
}

/// GET through the browser, storing any session cookie. Evaluates to the response.
macro_rules! browse_get {
    ($app:expr, $browser:expr, $uri:expr) => {{
        let resp = actix_web::test::call_service(&$app, $browser.get($uri).to_request()).await;
        $browser.store(&resp);
        resp
    }};
}

/// POST a form through the browser, storing any session cookie.
macro_rules! browse_post {
    ($app:expr, $browser:expr, $uri:expr, $form:expr) => {{
        let resp =
            actix_web::test::call_service(&$app, $browser.post($uri, $form).to_request()).await;
        $browser.store(&resp);
        resp
    }};
}

/// Fetches the login form, then submits the credentials with its CSRF token.
macro_rules! log_in {
    ($app:expr, $browser:expr, $name:expr, $password:expr) => {{
        let page = browse_get!($app, $browser, "/accounts/login/");
        let token = common::csrf_token(&common::body_string(page).await);
        browse_post!(
            $app,
            $browser,
            "/accounts/login/",
            &[
                ("csrf_token", token.as_str()),
                ("username", $name),
                ("password", $password),
            ]
        )
    }};
}

pub async fn body_string<B>(resp: ServiceResponse<B>) -> String
where
    B: actix_web::body::MessageBody,
{
    String::from_utf8(test::read_body(resp).await.to_vec()).expect("body is not utf-8")
}

/// Pulls the hidden CSRF field out of a rendered form.
pub fn csrf_token(body: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = body.find(marker).expect("page has no csrf_token field") + marker.len();
    let len = body[start..].find('"').expect("unterminated csrf_token value");
    body[start..start + len].to_string()
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
