use std::sync::Arc;

use actix_web::{web, Error, HttpRequest, HttpResponse, Responder};
use chrono::Local;
use serde::Serialize;
use tokio::task::spawn_local;

use crate::config::HandlerConfig;
use crate::error::ControlError;
use crate::log::EventLog;
use crate::message::parse_start_request;
use crate::registry::SubscriberRegistry;
use crate::scheduler::SchedulerHandle;
use crate::ws;

/// Everything the HTTP surface needs, shared across workers.
pub struct AppState {
    pub scheduler: SchedulerHandle,
    pub log: Arc<EventLog>,
    pub registry: Arc<SubscriberRegistry>,
    pub handler_config: HandlerConfig,
}

#[derive(Serialize)]
struct StatusResponse {
    running: bool,
}

#[derive(Serialize)]
struct TimeResponse {
    #[serde(rename = "currentTime")]
    current_time: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/start").route(web::post().to(start)))
        .service(web::resource("/stop").route(web::post().to(stop)))
        .service(web::resource("/status").route(web::get().to(status)))
        .service(web::resource("/logs").route(web::get().to(logs)))
        .service(web::resource("/clear_logs").route(web::post().to(clear_logs)))
        .service(web::resource("/time").route(web::get().to(current_time)))
        .service(web::resource("/ws").route(web::get().to(subscribe)));
}

async fn start(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ControlError> {
    let config = parse_start_request(&body)?;
    state.scheduler.start(config).await?;
    Ok(HttpResponse::Ok().body("Timer started\n"))
}

async fn stop(state: web::Data<AppState>) -> Result<HttpResponse, ControlError> {
    state.scheduler.stop().await?;
    Ok(HttpResponse::Ok().body("Timer stopped\n"))
}

async fn status(state: web::Data<AppState>) -> impl Responder {
    web::Json(StatusResponse {
        running: state.scheduler.is_running(),
    })
}

async fn logs(state: web::Data<AppState>) -> impl Responder {
    web::Json(state.log.snapshot())
}

async fn clear_logs(state: web::Data<AppState>) -> impl Responder {
    state.log.clear();
    HttpResponse::Ok().finish()
}

async fn current_time() -> impl Responder {
    web::Json(TimeResponse {
        current_time: Local::now().format("%H:%M:%S").to_string(),
    })
}

async fn subscribe(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (res, session, stream) = actix_ws::handle(&req, stream)?;

    spawn_local(ws::feed(
        session,
        stream,
        Arc::clone(&state.registry),
        state.handler_config.clone(),
    ));

    Ok(res)
}
