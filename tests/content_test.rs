mod common;

use common::*;
use pdfscribe::{ErrorKind, Session};

fn render(draw: impl FnOnce(&mut Session)) -> lopdf::Document {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    draw(&mut session);
    session.end_page().unwrap();
    session.close().unwrap();
    load(&session.get_output_buffer().unwrap())
}

#[test]
fn paths_are_written_when_painted() {
    let document = render(|session| {
        session.setlinewidth(2.0).unwrap();
        session.setrgbcolor_fill(1.0, 0.0, 0.0).unwrap();
        session.rect(10.0, 20.0, 30.0, 40.0).unwrap();
        session.fill().unwrap();
        session.moveto(0.0, 0.0).unwrap();
        session.lineto(100.0, 100.0).unwrap();
        session.stroke().unwrap();
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["w", "rg", "re", "f", "m", "l", "S"]
    );
    assert_eq!(floats(&operations[0]), vec![2.0]);
    assert_eq!(floats(&operations[1]), vec![1.0, 0.0, 0.0]);
    assert_eq!(floats(&operations[2]), vec![10.0, 20.0, 30.0, 40.0]);
}

#[test]
fn the_fill_rule_selects_the_even_odd_operators() {
    let document = render(|session| {
        session.set_parameter("fillrule", "evenodd").unwrap();
        session.circle(100.0, 100.0, 50.0).unwrap();
        session.fill_stroke().unwrap();
        session.rect(0.0, 0.0, 10.0, 10.0).unwrap();
        session.clip().unwrap();
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["m", "c", "c", "c", "c", "h", "B*", "re", "W*", "n"]
    );
}

#[test]
fn state_changes_are_refused_while_a_path_is_open() {
    let mut session = Session::open("").unwrap();
    assert_eq!(session.moveto(0.0, 0.0).unwrap_err().kind, ErrorKind::State);
    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(session.lineto(5.0, 5.0).unwrap_err().kind, ErrorKind::State);
    assert_eq!(session.fill().unwrap_err().kind, ErrorKind::State);

    session.moveto(0.0, 0.0).unwrap();
    assert_eq!(session.setlinewidth(3.0).unwrap_err().kind, ErrorKind::State);
    assert_eq!(session.save().unwrap_err().kind, ErrorKind::State);
    assert_eq!(session.end_page().unwrap_err().kind, ErrorKind::State);
    session.lineto(10.0, 10.0).unwrap();
    session.endpath().unwrap();
    session.setlinewidth(3.0).unwrap();
    session.end_page().unwrap();
}

#[test]
fn transformations_are_concatenated() {
    let document = render(|session| {
        session.save().unwrap();
        session.translate(10.0, 20.0).unwrap();
        session.rotate(90.0).unwrap();
        session.scale(2.0, 3.0).unwrap();
        session.restore().unwrap();
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["q", "cm", "cm", "cm", "Q"]
    );
    assert_eq!(floats(&operations[1]), vec![1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
    assert_close(&floats(&operations[2]), &[0.0, 1.0, -1.0, 0.0, 0.0, 0.0]);
    assert_eq!(floats(&operations[3]), vec![2.0, 0.0, 0.0, 3.0, 0.0, 0.0]);
}

#[test]
fn degenerate_and_out_of_range_transformations_fail() {
    let mut session = Session::open("").unwrap();
    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(session.scale(0.0, 1.0).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(session.skew(90.0, 0.0).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(
        session.concat(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).unwrap_err().kind,
        ErrorKind::Argument
    );
    assert_eq!(
        session.setmatrix(0.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap_err().kind,
        ErrorKind::Argument
    );
    session.skew(10.0, -10.0).unwrap();
}

#[test]
fn setmatrix_undoes_the_current_transformation() {
    let document = render(|session| {
        session.translate(10.0, 0.0).unwrap();
        session.setmatrix(2.0, 0.0, 0.0, 2.0, 5.0, 5.0).unwrap();
    });
    let operations = page_operations(&document, 1);
    assert_eq!(operators(&operations), vec!["cm", "cm", "cm"]);
    assert_eq!(floats(&operations[1]), vec![1.0, 0.0, 0.0, 1.0, -10.0, 0.0]);
    assert_eq!(floats(&operations[2]), vec![2.0, 0.0, 0.0, 2.0, 5.0, 5.0]);
}

#[test]
fn line_styles_are_validated() {
    let mut session = Session::open("").unwrap();
    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(session.setlinewidth(-1.0).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(session.setlinejoin(3).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(session.setmiterlimit(0.5).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(session.setflat(101.0).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(session.setdash(-1.0, 2.0).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(
        session
            .setdashpattern("dasharray={1 2 3 4 5 6 7 8 9}")
            .unwrap_err()
            .kind,
        ErrorKind::Option
    );
    assert_eq!(
        session.setdashpattern("dashoffset=2").unwrap_err().kind,
        ErrorKind::Option
    );
}

#[test]
fn dash_patterns_are_emitted_as_arrays() {
    let document = render(|session| {
        session.setdash(3.0, 1.0).unwrap();
        session.setdash(0.0, 0.0).unwrap();
        session.setdashpattern("dasharray={2 4 6} dashphase=1").unwrap();
        session.setpolydash(&[1.0, 1.0, 5.0]).unwrap();
    });
    let operations = page_operations(&document, 1);
    assert_eq!(operators(&operations), vec!["d", "d", "d", "d"]);
    let array = |index: usize| -> Vec<f32> {
        operations[index].operands[0]
            .as_array()
            .unwrap()
            .iter()
            .map(|value| value.as_float().unwrap())
            .collect()
    };
    assert_eq!(array(0), vec![3.0, 1.0]);
    assert!(array(1).is_empty());
    assert_eq!(array(2), vec![2.0, 4.0, 6.0]);
    assert_eq!(operations[2].operands[1].as_float().unwrap(), 1.0);
    assert_eq!(array(3), vec![1.0, 1.0, 5.0]);
}

#[test]
fn colors_select_the_operators_of_their_space() {
    let document = render(|session| {
        session.setgray(0.5).unwrap();
        session.setcolor("stroke", "cmyk", 0.1, 0.2, 0.3, 0.4).unwrap();
        session.setrgbcolor_stroke(0.0, 1.0, 0.0).unwrap();
        session.setgray_stroke(1.0).unwrap();
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(operators(&operations), vec!["g", "G", "K", "RG", "G"]);
    assert_close(&floats(&operations[2]), &[0.1, 0.2, 0.3, 0.4]);
}

#[test]
fn colors_are_validated() {
    let mut session = Session::open("").unwrap();
    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(session.setgray(1.5).unwrap_err().kind, ErrorKind::Argument);
    assert_eq!(
        session.setcolor("both", "lab", 0.0, 0.0, 0.0, 0.0).unwrap_err().kind,
        ErrorKind::Argument
    );
    assert_eq!(
        session.setcolor("under", "gray", 0.0, 0.0, 0.0, 0.0).unwrap_err().kind,
        ErrorKind::Argument
    );
}

#[test]
fn initgraphics_restores_the_defaults() {
    let document = render(|session| {
        session.translate(5.0, 5.0).unwrap();
        session.setlinewidth(4.0).unwrap();
        session.initgraphics().unwrap();
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["cm", "w", "cm", "w", "J", "j", "M", "i", "d", "g", "G"]
    );
    assert_eq!(floats(&operations[2]), vec![1.0, 0.0, 0.0, 1.0, -5.0, -5.0]);
    assert_eq!(floats(&operations[3]), vec![1.0]);
}

#[test]
fn arcs_connect_to_the_current_point() {
    let document = render(|session| {
        session.moveto(0.0, 0.0).unwrap();
        session.arc(100.0, 100.0, 50.0, 0.0, 180.0).unwrap();
        session.arcn(100.0, 100.0, 20.0, 90.0, 0.0).unwrap();
        session.closepath_stroke().unwrap();
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["m", "l", "c", "c", "l", "c", "s"]
    );
    assert_eq!(floats(&operations[1]), vec![150.0, 100.0]);
}

#[test]
fn non_finite_numbers_never_reach_the_content_stream() {
    let document = render(|session| {
        let error = session.moveto(f32::NAN, 0.0).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Argument);
        assert_eq!(session.get_apiname(), "moveto");
        session.moveto(0.0, 0.0).unwrap();
        assert_eq!(session.lineto(f32::INFINITY, 10.0).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(
            session.curveto(0.0, 1.0, f32::NAN, 2.0, 3.0, 4.0).unwrap_err().kind,
            ErrorKind::Argument
        );
        session.lineto(10.0, 10.0).unwrap();
        session.stroke().unwrap();

        assert_eq!(session.translate(f32::NAN, 0.0).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(
            session.concat(1.0, 0.0, 0.0, 1.0, f32::INFINITY, 0.0).unwrap_err().kind,
            ErrorKind::Argument
        );
        assert_eq!(session.setlinewidth(f32::INFINITY).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(session.setmiterlimit(f32::NAN).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(session.setdash(f32::INFINITY, 1.0).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(
            session.rect(0.0, 0.0, f32::NEG_INFINITY, 5.0).unwrap_err().kind,
            ErrorKind::Argument
        );
        assert_eq!(session.set_text_pos(f32::NAN, 0.0).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(
            session.add_weblink(0.0, 0.0, f32::INFINITY, 10.0, "https://example.com").unwrap_err().kind,
            ErrorKind::Argument
        );
    });
    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(operators(&operations), vec!["m", "l", "S"]);
    assert_eq!(floats(&operations[1]), vec![10.0, 10.0]);
}

#[test]
fn huge_arc_angles_draw_at_most_one_turn() {
    let document = render(|session| {
        session.arc(100.0, 100.0, 50.0, 1e10, 0.0).unwrap();
        session.stroke().unwrap();
        session.arcn(100.0, 100.0, 50.0, 0.0, 1e12).unwrap();
        session.stroke().unwrap();
        assert_eq!(
            session.arc(100.0, 100.0, 50.0, f32::INFINITY, 0.0).unwrap_err().kind,
            ErrorKind::Argument
        );
        assert_eq!(session.get_apiname(), "arc");
    });
    let operations = page_operations(&document, 1);
    let curves = operators(&operations)
        .iter()
        .filter(|operator| operator.as_str() == "c")
        .count();
    assert!(curves <= 8, "{} curves were written", curves);
    for operation in operations.iter() {
        assert!(floats(operation).iter().all(|value| value.is_finite()));
    }
}
