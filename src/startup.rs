use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::JwtSettings;
use crate::logger::RequestLogger;
use crate::middleware::AuthGuard;
use crate::models::Role;
use crate::routes::{
    create_car, delete_car, get_car, health_check, list_cars, login, register, rent_car,
    update_car, whoami,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(RequestLogger)
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/v1")
                    // Public auth surface
                    .route("/auth/register", web::post().to(register))
                    .route("/auth/login", web::post().to(login))
                    .service(
                        web::resource("/auth/whoami")
                            .wrap(AuthGuard::any(jwt_config.clone()))
                            .route(web::get().to(whoami)),
                    )
                    // Booking, gated on the CUSTOMER role. Registered before
                    // the catalog scopes so the longer path wins.
                    .service(
                        web::resource("/cars/{id}/rent")
                            .wrap(AuthGuard::role(jwt_config.clone(), Role::Customer))
                            .route(web::post().to(rent_car)),
                    )
                    // Public catalog reads; the method guard lets writes fall
                    // through to the admin scope below.
                    .service(
                        web::scope("/cars")
                            .guard(guard::Get())
                            .route("", web::get().to(list_cars))
                            .route("/{id}", web::get().to(get_car)),
                    )
                    // Catalog writes, gated on the ADMIN role.
                    .service(
                        web::scope("/cars")
                            .wrap(AuthGuard::role(jwt_config.clone(), Role::Admin))
                            .route("", web::post().to(create_car))
                            .route("/{id}", web::put().to(update_car))
                            .route("/{id}", web::delete().to(delete_car)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
