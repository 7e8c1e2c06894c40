use actix_files as fs;
use actix_multipart::form::{tempfile::TempFileConfig, MultipartFormConfig};
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{SessionManager, TokenIssuer};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::media::MediaHost;
use crate::middleware::{JwtMiddleware, RequestAuthenticator};
use crate::routes::{health_check, users};
use crate::store::UserStore;

/// Build the HTTP server on an already-bound listener.
///
/// The store and media host are injected so tests can run the full stack
/// against in-memory doubles.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    media: Arc<dyn MediaHost>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let application = settings.application;
    std::fs::create_dir_all(&application.upload_dir)?;

    let issuer = TokenIssuer::new(settings.tokens);
    let authenticator = RequestAuthenticator::new(store.clone(), issuer.clone());
    let manager = web::Data::new(SessionManager::new(store, media, issuer));

    let body_limit = application.body_limit_bytes;
    let upload_dir = application.upload_dir;
    let static_root = application.static_root;

    let server = HttpServer::new(move || {
        let protected = || JwtMiddleware::new(authenticator.clone());

        App::new()
            .wrap(LoggerMiddleware)
            .app_data(manager.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(body_limit)
                    .error_handler(|err, _req| {
                        AppError::from(ValidationError::MalformedBody(err.to_string())).into()
                    }),
            )
            .app_data(
                web::FormConfig::default()
                    .limit(body_limit)
                    .error_handler(|err, _req| {
                        AppError::from(ValidationError::MalformedBody(err.to_string())).into()
                    }),
            )
            .app_data(MultipartFormConfig::default().error_handler(|err, _req| {
                AppError::from(ValidationError::MalformedBody(err.to_string())).into()
            }))
            .app_data(TempFileConfig::default().directory(&upload_dir))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/users")
                    .route("/register", web::post().to(users::register))
                    .route("/login", web::post().to(users::login))
                    .route("/refresh-token", web::post().to(users::refresh_access_token))
                    .service(
                        web::resource("/logout")
                            .wrap(protected())
                            .route(web::post().to(users::logout)),
                    )
                    .service(
                        web::resource("/change-password")
                            .wrap(protected())
                            .route(web::post().to(users::change_password)),
                    )
                    .service(
                        web::resource("/current-user")
                            .wrap(protected())
                            .route(web::get().to(users::current_user)),
                    )
                    .service(
                        web::resource("/update-account")
                            .wrap(protected())
                            .route(web::patch().to(users::update_account)),
                    )
                    .service(
                        web::resource("/avatar")
                            .wrap(protected())
                            .route(web::patch().to(users::update_avatar)),
                    )
                    .service(
                        web::resource("/cover-image")
                            .wrap(protected())
                            .route(web::patch().to(users::update_cover_image)),
                    ),
            )
            // Static files last so they never shadow API routes
            .service(fs::Files::new("/", static_root.clone()).index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
