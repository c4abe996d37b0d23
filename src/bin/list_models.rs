//! Prints the Gemini models that can serve `generateContent`.

use anyhow::Context;
use brito_lib::settings::AppConfig;

fn main() -> anyhow::Result<()> {
    brito_lib::init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    let handles = brito_lib::build_environment(&config)?;
    let models = handles
        .answer
        .generation_models()
        .context("failed to list models")?;

    println!("Modelos disponíveis para generateContent:");
    for model in models {
        println!("- {}", model.name);
    }
    Ok(())
}
