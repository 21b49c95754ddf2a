use clap::Parser as _;
use std::path::PathBuf;

use pdfscribe::document::{Document, Operation};
use pdfscribe::SessionError;

/// The command line arguments are the path of an optional JSON document and the
/// path of the output PDF file. Without a document, a small one is built in code.
#[derive(clap::Parser)]
struct CliArguments {
    /// The path of the JSON document.
    #[arg(short = 'd', long = "document", value_name = "document_file")]
    document_path: Option<PathBuf>,
    /// The path of the output PDF file.
    #[arg(short = 'o', long = "output", value_name = "output_file")]
    output_pdf_path: PathBuf,
}

fn main() -> Result<(), SessionError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    let cli_arguments = CliArguments::parse();

    let document = match &cli_arguments.document_path {
        Some(document_path) => Document::from_path(document_path)?,
        None => Document {
            document_id: Some("script-to-pdf".into()),
            configuration: None,
            operations: vec![
                Operation::BeginPage {
                    width: 300.0,
                    height: 200.0,
                },
                Operation::LoadFont {
                    name: "title".into(),
                    font: "Courier".into(),
                    encoding: "winansi".into(),
                    options: String::new(),
                },
                Operation::SetFont {
                    font: "title".into(),
                    size: 18.0,
                },
                Operation::ShowXy {
                    text: "From a script".into(),
                    x: 20.0,
                    y: 160.0,
                },
                Operation::SetColor {
                    usage: "fill".into(),
                    color_space: "rgb".into(),
                    components: vec![0.9, 0.3, 0.1],
                },
                Operation::Circle {
                    x: 150.0,
                    y: 80.0,
                    radius: 40.0,
                },
                Operation::Fill,
                Operation::EndPage,
            ],
        },
    };
    log::info!(
        "Replaying {} operations into {:?}",
        document.operations.len(),
        cli_arguments.output_pdf_path
    );
    document.render(&cli_arguments.output_pdf_path)
}
