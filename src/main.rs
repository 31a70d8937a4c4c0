use anyhow::{bail, Result};
use quiz_pipeline::utils::logging;
use quiz_pipeline::{Config, GenerationMode, GenerationOptions, QuizPipeline};

/// Manual smoke runner: `quiz_pipeline <extract|generate> <file> [count]`.
///
/// Reads a text file, runs the corresponding pipeline operation and prints
/// the resulting draft as JSON. The real surface of this crate is the
/// library.
#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let (Some(mode), Some(path)) = (args.next(), args.next()) else {
        bail!("usage: quiz_pipeline <extract|generate> <file> [count]");
    };

    let config = Config::from_env();
    logging::log_startup(&config.model_name);

    let content = tokio::fs::read_to_string(&path).await?;
    let pipeline = QuizPipeline::new(config);

    let draft = match mode.as_str() {
        "extract" => pipeline.extract_from_text(&content)?,
        "generate" => {
            let mut options = GenerationOptions::default();
            if let Some(count) = args.next().and_then(|c| c.parse().ok()) {
                options.number_of_questions = count;
            }
            options.mode = GenerationMode::Generate;
            pipeline.generate_from_text(&content, &options).await?
        }
        other => bail!("unknown mode: {}", other),
    };

    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}
