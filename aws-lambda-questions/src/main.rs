use ::std::net::{Ipv4Addr, SocketAddr};
use common_types_questions::Constants;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal, {err}");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), common_types_questions::E> {
    ::std::env::set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    tracing_subscriber::fmt()
            .with_max_level(match *Constants::DEVELOPMENT_MODE {
                true => tracing::Level::DEBUG,
                false => tracing::Level::INFO,
            })
            .with_target(false)
            .without_time()
            .init();

    let appstate = common_types_questions::State::make_state().await.map_err(|err| {
        tracing::error!("Failed to set up the question store, {err}");
        err
    })?;
    let router = common_types_questions::Routes::router(appstate.clone());

    let served = match lambda_web::is_running_on_lambda() {
        true => lambda_web::run_hyper_on_lambda(router).await,
        false => {
            let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, *Constants::PORT));
            tracing::info!("Listening on {address}");
            axum::Server::bind(&address)
                .serve(router.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(common_types_questions::E::from)
        },
    };

    appstate.questions.close().await;
    served
}
