mod common;

use common::*;
use lopdf::content::Operation;
use pdfscribe::{ErrorKind, Session};

fn text_runs(operations: &[Operation]) -> Vec<(f32, f32, String)> {
    let mut runs = Vec::new();
    let mut position = (0.0, 0.0);
    for operation in operations {
        match operation.operator.as_str() {
            "Td" => {
                let operands = floats(operation);
                position = (operands[0], operands[1]);
            }
            "Tj" => runs.push((position.0, position.1, literal(&operation.operands[0]))),
            _ => (),
        }
    }
    runs
}

#[test]
fn text_is_shown_in_self_contained_text_objects() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    session.setfont(font, 10.0).unwrap();
    session.show_xy("Hello", 20.0, 150.0).unwrap();
    session.show(" world").unwrap();
    session.continue_text("Next").unwrap();
    assert_eq!(session.get_value("textx", 0.0).unwrap(), 44.0);
    assert_eq!(session.get_value("texty", 0.0).unwrap(), 140.0);
    session.end_page().unwrap();
    session.close().unwrap();

    let document = load(&session.get_output_buffer().unwrap());
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations[..5]),
        vec!["BT", "Tf", "Td", "Tj", "ET"]
    );
    assert_eq!(literal(&operations[1].operands[0]), "F0");
    assert_eq!(operations[1].operands[1].as_float().unwrap(), 10.0);
    similar_asserts::assert_eq!(
        text_runs(&operations),
        vec![
            (20.0, 150.0, "Hello".to_string()),
            (50.0, 150.0, " world".to_string()),
            (20.0, 140.0, "Next".to_string()),
        ]
    );
    assert_eq!(page_resource_names(&document, 1, "Font"), vec!["F0"]);
}

#[test]
fn text_state_values_are_written_when_not_default() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Helvetica", "winansi", "").unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    session.setfont(font, 12.0).unwrap();
    session.set_value("charspacing", 2.0).unwrap();
    session.set_value("horizscaling", 50.0).unwrap();
    session.set_value("textrendering", 1.0).unwrap();
    session.show_xy("Styled", 10.0, 10.0).unwrap();
    session.end_page().unwrap();
    session.close().unwrap();

    let document = load(&session.get_output_buffer().unwrap());
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["BT", "Tf", "Tc", "Tz", "Tr", "Td", "Tj", "ET"]
    );
    assert_eq!(floats(&operations[3]), vec![50.0]);
}

#[test]
fn string_widths_follow_the_font_metrics() {
    let mut session = Session::open("").unwrap();
    let courier = session.load_font("Courier", "winansi", "").unwrap();
    let helvetica = session.load_font("Helvetica", "winansi", "").unwrap();
    assert_eq!(session.stringwidth("Hello", courier, 10.0).unwrap(), 30.0);
    // H 722, e 556, l 222
    assert_close(
        &[session.stringwidth("Hel", helvetica, 10.0).unwrap()],
        &[15.0],
    );
}

#[test]
fn text_needs_a_font_and_a_current_line() {
    let mut session = Session::open("").unwrap();
    let font = session.load_font("Times-Roman", "winansi", "").unwrap();
    assert_eq!(session.setfont(font, 10.0).unwrap_err().kind, ErrorKind::State);
    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(session.show("No font").unwrap_err().kind, ErrorKind::State);
    assert_eq!(session.setfont(font, 0.0).unwrap_err().kind, ErrorKind::Argument);
    session.setfont(font, 10.0).unwrap();
    assert_eq!(
        session.continue_text("No line").unwrap_err().kind,
        ErrorKind::State
    );
    session.set_text_pos(10.0, 50.0).unwrap();
    session.continue_text("Below").unwrap();
    assert_eq!(session.get_value("texty", 0.0).unwrap(), 40.0);
}

#[test]
fn font_parameters_describe_the_loaded_font() {
    let mut session = Session::open("").unwrap();
    let font = session
        .load_font("Helvetica", "winansi", "fontstyle=bolditalic")
        .unwrap();
    assert_eq!(
        session.get_parameter("fontname", font.value() as f64).unwrap(),
        "Helvetica-BoldOblique"
    );
    assert_eq!(
        session.get_parameter("fontencoding", font.value() as f64).unwrap(),
        "winansi"
    );
    assert_eq!(
        session.get_parameter("fontname", 0.0).unwrap_err().kind,
        ErrorKind::State
    );
    assert_eq!(
        session.load_font("Courier", "macroman", "").unwrap_err().kind,
        ErrorKind::Argument
    );
    assert_eq!(
        session.load_font("Courier", "winansi", "fontstyle=heavy").unwrap_err().kind,
        ErrorKind::Option
    );
}

#[test]
fn embedded_fonts_are_looked_up_and_validated() {
    let mut session = Session::open("").unwrap();
    assert_eq!(
        session.load_font("NoSuchFont", "identity-h", "").unwrap_err().kind,
        ErrorKind::ResourceNotFound
    );
    session
        .create_virtual_file("Broken.ttf", b"not a font at all", "")
        .unwrap();
    assert_eq!(
        session.load_font("Broken", "identity-h", "").unwrap_err().kind,
        ErrorKind::Format
    );
}

#[test]
fn boxed_text_is_broken_at_spaces() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    session.setfont(font, 10.0).unwrap();
    let text = "aaaa bbbb cccc dddd eeee";
    assert_eq!(
        session
            .show_boxed(text, 10.0, 10.0, 60.0, 20.0, "left", "blind")
            .unwrap(),
        4
    );
    assert_eq!(
        session
            .show_boxed(text, 10.0, 10.0, 60.0, 30.0, "left", "")
            .unwrap(),
        0
    );
    session.end_page().unwrap();
    session.close().unwrap();

    let document = load(&session.get_output_buffer().unwrap());
    similar_asserts::assert_eq!(
        text_runs(&page_operations(&document, 1)),
        vec![
            (10.0, 30.0, "aaaa bbbb".to_string()),
            (10.0, 20.0, "cccc dddd".to_string()),
            (10.0, 10.0, "eeee".to_string()),
        ]
    );
}

#[test]
fn a_zero_box_aligns_a_single_line() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    session.setfont(font, 10.0).unwrap();
    session
        .show_boxed("abcd", 100.0, 50.0, 0.0, 0.0, "right", "")
        .unwrap();
    session
        .show_boxed("abcd", 100.0, 40.0, 0.0, 0.0, "center", "")
        .unwrap();
    session.end_page().unwrap();
    session.close().unwrap();

    let document = load(&session.get_output_buffer().unwrap());
    similar_asserts::assert_eq!(
        text_runs(&page_operations(&document, 1)),
        vec![
            (76.0, 50.0, "abcd".to_string()),
            (88.0, 40.0, "abcd".to_string()),
        ]
    );
}

#[test]
fn boxed_text_arguments_are_validated() {
    let mut session = Session::open("").unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    assert_eq!(
        session
            .show_boxed("text", 0.0, 0.0, 10.0, 10.0, "left", "blind")
            .unwrap_err()
            .kind,
        ErrorKind::State
    );
    session.begin_page(100.0, 100.0).unwrap();
    session.setfont(font, 10.0).unwrap();
    assert_eq!(
        session
            .show_boxed("text", 0.0, 0.0, 10.0, 0.0, "left", "")
            .unwrap_err()
            .kind,
        ErrorKind::Argument
    );
    assert_eq!(
        session
            .show_boxed("text", 0.0, 0.0, 10.0, 10.0, "sideways", "")
            .unwrap_err()
            .kind,
        ErrorKind::Argument
    );
    assert_eq!(
        session
            .show_boxed("text", 0.0, 0.0, 10.0, 10.0, "left", "loud")
            .unwrap_err()
            .kind,
        ErrorKind::Argument
    );
}

#[test]
fn fitted_text_lines_are_scaled_into_their_box() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    session
        .fit_textline(
            "abc",
            50.0,
            60.0,
            &format!(
                "font={} fontsize=10 boxsize={{36 20}} fitmethod=meet position=center",
                font.value()
            ),
        )
        .unwrap();
    session.end_page().unwrap();
    session.close().unwrap();

    let document = load(&session.get_output_buffer().unwrap());
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["q", "cm", "cm", "BT", "Tf", "Td", "Tj", "ET", "Q"]
    );
    assert_close(&floats(&operations[1]), &[1.0, 0.0, 0.0, 1.0, 50.0, 60.0]);
    // Courier is 18 wide and 5.62 high at size 10, meeting the box doubles it
    assert_close(&floats(&operations[2]), &[2.0, 0.0, 0.0, 2.0, 0.0, 4.38]);
}

#[test]
fn fitted_text_lines_need_a_size_with_their_font() {
    let mut session = Session::open("").unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(
        session
            .fit_textline("abc", 0.0, 0.0, &format!("font={}", font.value()))
            .unwrap_err()
            .kind,
        ErrorKind::Option
    );
    assert_eq!(
        session.fit_textline("abc", 0.0, 0.0, "").unwrap_err().kind,
        ErrorKind::State
    );
    assert_eq!(
        session
            .fit_textline("abc", 0.0, 0.0, "fontsize=10 colour=red")
            .unwrap_err()
            .kind,
        ErrorKind::Option
    );
    session.setfont(font, 10.0).unwrap();
    session
        .fit_textline("abc", 0.0, 0.0, "margin=2 position={right top}")
        .unwrap();
}

#[test]
fn blind_boxes_measure_on_the_page_without_drawing() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Courier", "winansi", "").unwrap();
    let error = session
        .show_boxed("aaaa", 0.0, 0.0, 60.0, 20.0, "left", "blind")
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::State);

    session.begin_page(200.0, 200.0).unwrap();
    session.setfont(font, 10.0).unwrap();
    assert_eq!(
        session
            .show_boxed("aaaa bbbb", 0.0, 0.0, 60.0, 20.0, "left", "blind")
            .unwrap(),
        0
    );
    session.rect(0.0, 0.0, 1.0, 1.0).unwrap();
    session.fill().unwrap();
    session.end_page().unwrap();
    assert_eq!(
        session
            .show_boxed("aaaa", 0.0, 0.0, 60.0, 20.0, "left", "blind")
            .unwrap_err()
            .kind,
        ErrorKind::State
    );
    session.close().unwrap();

    let document = load(&session.get_output_buffer().unwrap());
    similar_asserts::assert_eq!(operators(&page_operations(&document, 1)), vec!["re", "f"]);
}
