//! Analyze a rock photograph, or build a record from manually entered values.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY=your_key_here
//! cargo run --example analyze_rock -- sandstone samples/sandstone.jpg
//!
//! # manual entry, no image and no API key needed
//! cargo run --example analyze_rock -- slate composition=quartz cleavage=good
//! ```

use rock_analyzer::logging::{LogLevel, init_logging};
use rock_analyzer::present::render_text;
use rock_analyzer::{AnalysisSession, ExtractionClient, ImageAsset, RockVariantTag};
use std::env;
use std::path::Path;
use std::process;
use std::str::FromStr;

fn usage() -> ! {
    eprintln!("Usage: analyze_rock <granite|limestone|shale|slate|sandstone|other> [IMAGE] [FIELD=VALUE ...]");
    process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogLevel::Warn);

    let mut args = env::args().skip(1);
    let tag = match args.next() {
        Some(name) => RockVariantTag::from_str(&name)?,
        None => usage(),
    };
    let rest: Vec<String> = args.collect();

    let mut session = AnalysisSession::new(tag);
    let mut image = None;
    for arg in &rest {
        match arg.split_once('=') {
            Some((name, value)) => session.set_field(name, value),
            None if image.is_none() => image = Some(arg.as_str()),
            None => usage(),
        }
    }

    let record = match image {
        Some(path) => {
            let asset = ImageAsset::load(Path::new(path)).await?;
            session.select_image(asset)?;

            let client = ExtractionClient::from_env()?;
            println!("Analyzing {} as {}...", path, tag.display_name());
            session.analyze(&client).await?
        }
        None => {
            println!("Manual entry for {}:", tag.display_name());
            for field in session.form_fields() {
                println!("  {:<18} {}", field.name, field.description);
            }
            println!();
            session.submit_manual()?
        }
    };

    println!("{}", render_text(&record));
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
