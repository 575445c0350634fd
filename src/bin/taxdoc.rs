//! CLI binary for taxdoc-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints results as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taxdoc_extract::{
    extract_fields, get_tax_advice, recognize, ExtractionConfig, ExtractionResult, FormType,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "taxdoc",
    version,
    about = "Extract structured fields from scanned tax-form PDFs",
    long_about = "Extract structured fields from scanned tax-form PDFs.\n\n\
        Requires a local Tesseract installation and, for the extract/advise\n\
        commands, an OPENAI_API_KEY in the environment."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Rendering DPI for page rasterization (72–600).
    #[arg(long, global = true, default_value_t = 300)]
    dpi: u32,

    /// Completion model identifier.
    #[arg(long, global = true, env = "TAXDOC_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Tesseract language code(s), e.g. "eng" or "eng+spa".
    #[arg(long, global = true, default_value = "eng")]
    ocr_language: String,
}

#[derive(Subcommand)]
enum Command {
    /// Extract fields from a PDF and print them as JSON.
    Extract {
        /// Path to the PDF file.
        pdf: PathBuf,

        /// Form type: w-2, 1099, or generic.
        #[arg(long, short = 't', default_value = "w-2")]
        form_type: String,

        /// Also generate tax advice from the extracted fields.
        #[arg(long)]
        advice: bool,
    },

    /// Generate tax advice from a previously extracted JSON field map.
    Advise {
        /// Path to a JSON file produced by `taxdoc extract`.
        fields: PathBuf,

        /// Form type: w-2, 1099, or generic.
        #[arg(long, short = 't', default_value = "w-2")]
        form_type: String,
    },

    /// Run only rasterization + OCR and print the recognized text.
    Recognize {
        /// Path to the PDF file.
        pdf: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .model(&cli.model)
        .ocr_language(&cli.ocr_language)
        .build()
        .context("invalid configuration")?;

    match cli.command {
        Command::Extract { pdf, form_type, advice } => {
            let form: FormType = parse_form_type(&form_type)?;
            let pdf_str = pdf.to_string_lossy();

            let fields = extract_fields(pdf_str.as_ref(), form, &config).await?;

            if advice {
                let advice_result = get_tax_advice(&fields, form, &config).await?;
                let combined = serde_json::json!({
                    "fields": fields,
                    "advice": advice_result,
                });
                println!("{}", serde_json::to_string_pretty(&combined)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            }
        }

        Command::Advise { fields, form_type } => {
            let form: FormType = parse_form_type(&form_type)?;
            let raw = std::fs::read_to_string(&fields)
                .with_context(|| format!("failed to read {}", fields.display()))?;
            let extracted: ExtractionResult =
                serde_json::from_str(&raw).context("fields file is not a valid field map")?;

            let advice_result = get_tax_advice(&extracted, form, &config).await?;
            println!("{}", serde_json::to_string_pretty(&advice_result)?);
        }

        Command::Recognize { pdf } => {
            let text = recognize(pdf.to_string_lossy().as_ref(), &config).await?;
            println!("{text}");
        }
    }

    Ok(())
}

fn parse_form_type(s: &str) -> Result<FormType> {
    s.parse::<FormType>().map_err(|e| anyhow::anyhow!(e))
}
