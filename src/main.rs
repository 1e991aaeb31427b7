use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bigpagos::config::Config;
use bigpagos::middleware::auth::JwtKeys;
use bigpagos::modules::auth::{controllers::auth_controller, AuthService, UserRepository};
use bigpagos::modules::customers::{
    controllers::customer_controller, CustomerRepository, CustomerService, MySqlCustomerRepository,
};
use bigpagos::modules::invoices::{
    controllers::invoice_controller, InvoiceRepository, InvoiceService, MySqlInvoiceRepository,
};
use bigpagos::modules::payments::{
    controllers::payment_controller, MySqlPaymentRepository, PaymentRepository, PaymentService,
};
use bigpagos::modules::pse::controllers::WebhookController;
use bigpagos::modules::pse::{
    EpaycoClient, PaymentIntentBuilder, PseGateway, ReconciliationEngine, SignatureCodec,
};

const OVERDUE_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bigpagos=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting BigPagos billing service");
    tracing::info!("Environment: {}", config.app.env);

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Repositories
    let customer_repo: Arc<dyn CustomerRepository> =
        Arc::new(MySqlCustomerRepository::new(db_pool.clone()));
    let invoice_repo: Arc<dyn InvoiceRepository> =
        Arc::new(MySqlInvoiceRepository::new(db_pool.clone()));
    let payment_repo: Arc<dyn PaymentRepository> =
        Arc::new(MySqlPaymentRepository::new(db_pool.clone()));
    let user_repo = Arc::new(UserRepository::new(db_pool.clone()));

    // PSE gateway components
    let codec = SignatureCodec::new(
        config.pse.client_id.clone(),
        config.pse.client_secret.clone(),
    );
    let gateway: Arc<dyn PseGateway> = Arc::new(EpaycoClient::new(config.pse.base_url.clone()));
    let engine = Arc::new(ReconciliationEngine::new(
        codec.clone(),
        invoice_repo.clone(),
        payment_repo.clone(),
    ));
    let intent_builder = Arc::new(PaymentIntentBuilder::new(
        codec,
        gateway.clone(),
        config.pse.public_base_url.clone(),
        config.pse.default_bank_code.clone(),
    ));

    // Services
    let jwt_keys = JwtKeys::from_secret(&config.auth.jwt_secret);
    let customer_service = Arc::new(CustomerService::new(customer_repo.clone()));
    let invoice_service = Arc::new(InvoiceService::new(
        invoice_repo.clone(),
        customer_repo.clone(),
    ));
    let payment_service = Arc::new(PaymentService::new(
        payment_repo.clone(),
        invoice_repo.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        user_repo,
        jwt_keys.clone(),
        config.auth.jwt_expires_in_secs,
    ));

    // Time-driven overdue sweep; webhook processing never touches this
    let sweep_service = invoice_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(OVERDUE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_service.mark_overdue_invoices().await {
                tracing::error!(error = %e, "Overdue invoice sweep failed");
            }
        }
    });

    let bind_address = config.server.bind_address();

    let server = HttpServer::new(move || {
        let webhook_controller = WebhookController::new(
            engine.clone(),
            intent_builder.clone(),
            gateway.clone(),
            invoice_repo.clone(),
            customer_repo.clone(),
        );

        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(jwt_keys.clone()))
            .app_data(web::Data::new(customer_service.clone()))
            .app_data(web::Data::new(invoice_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .service(
                web::scope("/api")
                    .configure(auth_controller::configure)
                    .configure(customer_controller::configure)
                    .configure(invoice_controller::configure)
                    .configure(payment_controller::configure)
                    .configure(|cfg| WebhookController::configure(cfg, webhook_controller)),
            )
            .route("/health", web::get().to(health_check))
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "bigpagos"
    }))
}
