use crate::{
    api::{admin, health, logs, presence, student},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Only the password-gated endpoints are throttled; the scanner endpoint
    // has to absorb bursts of badge scans.
    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(admin::login)),
            )
            .service(
                web::resource("/reset_presence")
                    .wrap(build_limiter(config.rate_admin_per_min))
                    .route(web::post().to(admin::reset_presence)),
            )
            .service(
                web::resource("/reset_entry_exit")
                    .wrap(build_limiter(config.rate_admin_per_min))
                    .route(web::post().to(admin::reset_entry_exit)),
            )
            .service(
                web::resource("/wipe_all")
                    .wrap(build_limiter(config.rate_admin_per_min))
                    .route(web::post().to(admin::wipe_all)),
            )
            .service(
                web::resource("/mark_presence/{id}")
                    .route(web::post().to(presence::mark_presence)),
            )
            .service(web::resource("/logs/{matricule}").route(web::get().to(logs::student_logs)))
            .service(web::resource("/status").route(web::get().to(health::status)))
            .service(
                web::scope("/students")
                    // /students
                    .service(
                        web::resource("")
                            .route(web::get().to(student::list_students))
                            .route(web::post().to(student::create_student)),
                    )
                    // /students/full — legacy alias the admin list page uses
                    .service(web::resource("/full").route(web::get().to(student::list_students)))
                    // /students/{matricule}
                    .service(
                        web::resource("/{matricule}")
                            .route(web::put().to(student::update_student))
                            .route(web::delete().to(student::delete_student)),
                    ),
            ),
    );
}
