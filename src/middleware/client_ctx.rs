use crate::app_config::{AppConfig, SiteConfig};
use crate::constants::GUEST_USERNAME;
use crate::session::current_user;
use crate::user::Profile;
use actix_session::{Session, SessionExt};
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Session key holding the authentication token issued at login.
pub const SESSION_TOKEN_KEY: &str = "token";

/// Client data stored for a single request cycle.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// User data. None is a guest.
    pub client: Option<Profile>,
    /// CSRF token for form protection
    pub csrf_token: String,
    /// Site name shown in page titles.
    pub site_name: String,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            client: None,
            csrf_token: String::new(),
            site_name: SiteConfig::default().name,
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    pub async fn from_session(session: &Session, db: &DatabaseConnection) -> Self {
        use crate::middleware::csrf::get_or_create_csrf_token;

        let client = match session_token(session) {
            Some(token) => {
                match current_user(db, token, chrono::Utc::now().naive_utc()).await {
                    Ok(user) => user,
                    Err(e) => {
                        log::error!("ClientCtx: current_user() {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let csrf_token = get_or_create_csrf_token(session).unwrap_or_else(|_| String::new());

        ClientCtxInner {
            client,
            csrf_token,
            ..Default::default()
        }
    }
}

/// Reads and parses the authentication token from the session cookie.
pub fn session_token(session: &Session) -> Option<Uuid> {
    match session.get::<String>(SESSION_TOKEN_KEY) {
        Ok(Some(raw)) => match Uuid::parse_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                log::debug!("session_token: parse_str() {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::error!("session_token: session.get() {}", e);
            None
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub async fn from_session(session: &Session, db: &DatabaseConnection) -> Self {
        Self(Data::new(ClientCtxInner::from_session(session, db).await))
    }

    fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            Some(cbox) => Self(cbox.clone()),
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.client {
            Some(user) => user.name.to_owned(),
            None => GUEST_USERNAME.to_owned(),
        }
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.client.as_ref()
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn get_site_name(&self) -> &str {
        &self.0.site_name
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let session = req.get_session();

        // Without a database there is no user to resolve; handlers then see a guest.
        Box::pin(async move {
            match req.app_data::<Data<DatabaseConnection>>().cloned() {
                Some(db) => {
                    let mut inner = ClientCtxInner::from_session(&session, &db).await;
                    if let Some(config) = req.app_data::<Data<AppConfig>>() {
                        inner.site_name = config.site.name.clone();
                    }
                    req.extensions_mut().insert(Data::new(inner));
                }
                None => log::error!("ClientCtx: no DatabaseConnection in app data"),
            }

            svc.call(req).await
        })
    }
}
