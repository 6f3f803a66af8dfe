//! Rendered pages for error statuses, installed through `ErrorHandlers`.

use crate::app_config::{AppConfig, SiteConfig};
use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::web::Data;
use actix_web::{HttpResponse, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    site_name: &'a str,
    status: u16,
    reason: &'a str,
    message: &'a str,
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "The request could not be understood.")
}

pub fn render_403<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "The request was refused. Reload the form and try again.")
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "The page you requested does not exist.")
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Something went wrong on our end.")
}

fn render_error<B>(res: ServiceResponse<B>, message: &str) -> Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    let (req, _) = res.into_parts();

    let site_name = match req.app_data::<Data<AppConfig>>() {
        Some(config) => config.site.name.clone(),
        None => SiteConfig::default().name,
    };

    let body = ErrorTemplate {
        site_name: &site_name,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error"),
        message,
    }
    .render()
    .map_err(|e| {
        log::error!("render_error: render() {}", e);
        actix_web::error::ErrorInternalServerError("Template error")
    })?;

    let new = HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body);

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, new).map_into_right_body(),
    ))
}
