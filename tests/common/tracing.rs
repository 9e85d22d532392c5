use tracing_subscriber::{
    Layer, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Safe to call from every test of a binary. Only the first call installs the subscriber.
pub fn init_subscriber() {
    let log_filter = tracing_subscriber::filter::Targets::new()
        .with_default(tracing::Level::INFO)
        .with_target("tokio", tracing::Level::WARN)
        .with_target("axum", tracing::Level::WARN)
        .with_target("hyper", tracing::Level::WARN)
        .with_target("reqwest", tracing::Level::WARN)
        .with_target("oidc_claims_request", tracing::Level::DEBUG);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_test_writer();

    let fmt_layer_filtered = fmt_layer.with_filter(log_filter);

    let _ = tracing_subscriber::Registry::default()
        .with(fmt_layer_filtered)
        .try_init();
}
