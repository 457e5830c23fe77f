use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use tracing::info;

use matchclock::broadcast::Broadcaster;
use matchclock::clock::SystemClock;
use matchclock::config::HandlerConfig;
use matchclock::log::EventLog;
use matchclock::registry::SubscriberRegistry;
use matchclock::routes::{self, AppState};
use matchclock::scheduler::Scheduler;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let log = Arc::new(EventLog::new());
    let registry = Arc::new(SubscriberRegistry::new());

    let (broadcaster, publisher) = Broadcaster::new(Arc::clone(&registry));
    tokio::spawn(broadcaster.run());

    let (scheduler, scheduler_handle) = Scheduler::new(SystemClock, Arc::clone(&log), publisher);
    tokio::spawn(scheduler.run());

    let state = web::Data::new(AppState {
        scheduler: scheduler_handle,
        log,
        registry,
        handler_config: HandlerConfig::default(),
    });

    info!("Starting server at http://127.0.0.1:3443");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
            .wrap(middleware::Logger::default())
    })
    .bind(("127.0.0.1", 3443))?
    .run()
    .await
}
