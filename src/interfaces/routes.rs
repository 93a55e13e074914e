use actix_web::web;

use crate::handlers::{contact, cron, deploy, github, home, system};
use crate::middlewares::cron_auth::CronAuth;

mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home::home);
    cfg.service(system::health_check);

    cfg.service(
        web::scope("/api")
            .service(contact::submit_contact)
            .service(github::github_stats)
            .service(
                web::scope("/cron")
                    .wrap(CronAuth)
                    .service(cron::sequence_stats)
                    .service(cron::run_sequences)
                    .service(cron::revalidate)
            )
            .service(
                web::scope("/deploy")
                    .wrap(CronAuth)
                    .service(deploy::trigger_deploy)
            )
    );

    cfg.configure(json_error::config_routes);
}
