use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::{ApplicationSettings, AuthSettings};
use crate::logger::LoggerMiddleware;
use crate::middleware::AuthGuard;
use crate::routes::{create_user, delete_current_user, get_user, health_check, login, logout, refresh};
use crate::store::CredentialStore;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn CredentialStore>,
    auth_settings: AuthSettings,
    application: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(AuthService::new(store, &auth_settings));
    let application = web::Data::new(application);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth.clone())
            .app_data(application.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .service(
                web::resource("/user")
                    .guard(guard::Post())
                    .route(web::post().to(create_user)),
            )

            // Protected routes (require a bearer access token)
            .service(
                web::resource("/logout")
                    .wrap(AuthGuard)
                    .route(web::post().to(logout)),
            )
            .service(
                web::resource("/user")
                    .guard(guard::Delete())
                    .wrap(AuthGuard)
                    .route(web::delete().to(delete_current_user)),
            )
            .service(
                web::resource("/user/{email}")
                    .wrap(AuthGuard)
                    .route(web::get().to(get_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
