use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::middleware::JwtMiddleware;
use crate::patients::PgPatientDirectory;
use crate::routes::{
    admin_create_user, forgot_password, get_profile, health_check, login, logout, refresh,
    register, resend_verification, reset_password, verify_email,
};
use crate::store::PgCredentialStore;

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let sender = settings
        .email
        .sender()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let email_client = EmailClient::new(
        settings.email.base_url.clone(),
        sender,
        reqwest::Client::new(),
    );

    let service = AuthService::new(
        Arc::new(PgCredentialStore::new(connection.clone())),
        Arc::new(PgPatientDirectory::new(connection)),
        Arc::new(email_client),
        settings.jwt.clone(),
        settings.email.frontend_url.clone(),
    );
    let service = web::Data::new(service);
    let jwt_config = settings.jwt;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    // Public routes
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/forgot-password", web::post().to(forgot_password))
                    .route("/reset-password", web::post().to(reset_password))
                    .route("/verify-email", web::post().to(verify_email))
                    // Routes behind a valid access token
                    .service(
                        web::scope("")
                            .wrap(JwtMiddleware::new(jwt_config.clone()))
                            .route("/profile", web::get().to(get_profile))
                            .route("/logout", web::post().to(logout))
                            .route(
                                "/resend-verification",
                                web::post().to(resend_verification),
                            )
                            .route("/admin/create-user", web::post().to(admin_create_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
