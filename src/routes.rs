use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Context, Result};

pub type ImportGovernor = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter for the import endpoints. Built once so every worker shares
/// the same quota.
pub fn import_governor(requests_per_min: u32) -> Result<ImportGovernor> {
    let requests_per_min = requests_per_min.max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(60_000 / requests_per_min as u64)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid RATE_IMPORT_PER_MIN")
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, governor: &ImportGovernor) {
    // Protected routes; AuthUser enforces the bearer token per handler
    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance/import")
                .wrap(Governor::new(governor)) // rate limiting
                .app_data(web::PayloadConfig::new(config.max_upload_bytes))
                // /attendance/import
                .service(web::resource("").route(web::post().to(attendance::import_attendance)))
                // /attendance/import/preview
                .service(
                    web::resource("/preview").route(web::post().to(attendance::preview_import)),
                ),
        ),
    );
}
