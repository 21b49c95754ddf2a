use clap::Parser;
use std::path::PathBuf;

use pdfscribe::configuration::SessionConfiguration;
use pdfscribe::document::Document;
use pdfscribe::error::SessionError;

/// Replays a JSON operation script into a PDF document.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct CliArguments {
    #[arg(short = 'd', long = "document", value_name = "json_file")]
    document_path: PathBuf,
    #[arg(short = 'o', long = "output", value_name = "pdf_file")]
    output_file_path: PathBuf,
    /// A JSON session configuration, replacing the one of the document.
    #[arg(short = 'c', long = "configuration", value_name = "json_file")]
    configuration_path: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), SessionError> {
    let arguments = CliArguments::parse();
    env_logger::builder()
        .filter_level(if arguments.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();
    log::debug!("{:?}", arguments);

    let mut document = Document::from_path(&arguments.document_path)?;
    if let Some(configuration_path) = &arguments.configuration_path {
        document.configuration = Some(SessionConfiguration::from_path(configuration_path)?);
    }
    document.render(&arguments.output_file_path)?;
    log::info!(
        "Saved the output file to the path: {:?}",
        arguments.output_file_path
    );
    Ok(())
}
