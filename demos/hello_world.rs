use clap::Parser as _;
use std::path::PathBuf;

use pdfscribe::{Session, SessionError};

/// The only argument is the path of the output PDF file.
#[derive(clap::Parser)]
struct CliArguments {
    /// The path of the output PDF file.
    #[arg(short = 'o', long = "output", value_name = "output_file")]
    output_pdf_path: PathBuf,
}

fn main() -> Result<(), SessionError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    let cli_arguments = CliArguments::parse();

    let mut session = Session::open(&cli_arguments.output_pdf_path.to_string_lossy())?;
    session.set_info("Title", "Hello, world!")?;
    session.begin_page(595.0, 842.0)?;

    // A light frame around the page
    session.setrgbcolor_stroke(0.2, 0.4, 0.8)?;
    session.setlinewidth(2.0)?;
    session.rect(40.0, 40.0, 515.0, 762.0)?;
    session.stroke()?;

    let font = session.load_font("Helvetica-Bold", "winansi", "")?;
    session.setfont(font, 32.0)?;
    session.show_xy("Hello, world!", 60.0, 760.0)?;

    let body = session.load_font("Times-Roman", "winansi", "")?;
    session.setfont(body, 12.0)?;
    session.setgray_fill(0.2)?;
    session.show_boxed(
        "This page was written through a pdfscribe session: a frame, a title and a boxed \
         paragraph which is justified into its box.",
        60.0,
        600.0,
        300.0,
        120.0,
        "justify",
        "",
    )?;
    session.fit_textline(
        "Centered",
        297.5,
        100.0,
        "position=center boxsize={200 30} fitmethod=meet",
    )?;
    session.add_bookmark("Hello", 0, true)?;
    session.end_page()?;
    session.close()?;

    log::info!(
        "Saved the output file to the path: {:?}",
        cli_arguments.output_pdf_path
    );
    Ok(())
}
