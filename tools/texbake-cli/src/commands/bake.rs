//! Bake a named ship model with the textures for a date.

use texbake_common::config::ServiceConfig;
use texbake_render_engine::RenderService;

pub async fn run(
    config: &ServiceConfig,
    ship_model: String,
    texture_date: String,
) -> anyhow::Result<bool> {
    config.validate()?;
    tracing::info!(ship_model = %ship_model, texture_date = %texture_date, "Baking named model");

    let service = RenderService::from_config(config)?;
    let outcome = service.render_named(ship_model, texture_date).await;
    super::print_outcome(&outcome)
}
