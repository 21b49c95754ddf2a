mod common;

use common::*;
use lopdf::Object;
use pdfscribe::{ErrorKind, Session};

fn open_page() -> Session {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    session.begin_page(200.0, 200.0).unwrap();
    session
}

fn finish(mut session: Session) -> lopdf::Document {
    session.end_page().unwrap();
    session.close().unwrap();
    load(&session.get_output_buffer().unwrap())
}

#[test]
fn images_are_drawn_into_their_pixel_size() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    session
        .create_virtual_file("logo.png", &png_bytes(4, 2, true), "")
        .unwrap();
    let image = session.load_image("auto", "logo.png", "").unwrap();
    assert_eq!(session.resource_size(image).unwrap(), (4.0, 2.0));
    session.begin_page(200.0, 200.0).unwrap();
    session.fit_image(image, 10.0, 20.0, "").unwrap();
    session.place_image(image, 0.0, 0.0, 2.0).unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec!["q", "cm", "cm", "Do", "Q", "q", "cm", "cm", "Do", "Q"]
    );
    assert_close(&floats(&operations[1]), &[1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
    assert_close(&floats(&operations[2]), &[4.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
    assert_close(&floats(&operations[7]), &[8.0, 0.0, 0.0, 4.0, 0.0, 0.0]);
    assert_eq!(page_resource_names(&document, 1, "XObject"), vec!["X0"]);

    let xobject_id = page_dictionary(&document, 1)
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|resources| resources.get(b"XObject"))
        .and_then(Object::as_dict)
        .and_then(|xobjects| xobjects.get(b"X0"))
        .and_then(Object::as_reference)
        .unwrap();
    let stream = document.get_object(xobject_id).unwrap().as_stream().unwrap();
    assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 4);
    assert_eq!(literal(stream.dict.get(b"Subtype").unwrap()), "Image");
}

#[test]
fn transparent_images_carry_a_soft_mask() {
    let mut session = open_page();
    session
        .create_virtual_file("alpha.png", &png_bytes(3, 3, false), "")
        .unwrap();
    let image = session.load_image("png", "alpha.png", "").unwrap();
    session.fit_image(image, 0.0, 0.0, "").unwrap();
    let document = finish(session);

    let has_soft_mask = document.objects.values().any(|object| {
        object
            .as_stream()
            .map(|stream| stream.dict.has(b"SMask"))
            .unwrap_or(false)
    });
    assert!(has_soft_mask);
}

#[test]
fn images_are_validated() {
    let mut session = Session::open("").unwrap();
    assert_eq!(
        session.load_image("auto", "missing.png", "").unwrap_err().kind,
        ErrorKind::ResourceNotFound
    );
    session
        .create_virtual_file("garbage.png", b"definitely not a png", "")
        .unwrap();
    assert_eq!(
        session.load_image("png", "garbage.png", "").unwrap_err().kind,
        ErrorKind::Format
    );
    assert_eq!(
        session.load_image("webp", "garbage.png", "").unwrap_err().kind,
        ErrorKind::Argument
    );
    assert_eq!(
        session
            .load_image("png", "garbage.png", "dither=true")
            .unwrap_err()
            .kind,
        ErrorKind::Option
    );

    session
        .create_virtual_file("pixel.png", &png_bytes(1, 1, true), "")
        .unwrap();
    let image = session.load_image("auto", "pixel.png", "").unwrap();
    assert_eq!(
        session.fit_image(image, 0.0, 0.0, "").unwrap_err().kind,
        ErrorKind::State
    );
    session.close_image(image).unwrap();
    session.begin_page(10.0, 10.0).unwrap();
    assert_eq!(
        session.fit_image(image, 0.0, 0.0, "").unwrap_err().kind,
        ErrorKind::InvalidHandle
    );
}

#[test]
fn virtual_files_can_be_replaced_only_after_deletion() {
    let mut session = Session::open("").unwrap();
    session.create_virtual_file("data", b"one", "").unwrap();
    assert!(session.create_virtual_file("data", b"two", "").is_err());
    session.delete_virtual_file("data").unwrap();
    session.create_virtual_file("data", b"two", "").unwrap();
    assert!(session.delete_virtual_file("other").is_err());
}

#[test]
fn fitting_into_a_box_with_clipping() {
    let mut session = open_page();
    session
        .create_virtual_file("wide.png", &png_bytes(8, 2, true), "")
        .unwrap();
    let image = session.load_image("auto", "wide.png", "").unwrap();
    session
        .fit_image(image, 0.0, 0.0, "boxsize={4 4} fitmethod=clip")
        .unwrap();
    session
        .fit_image(image, 0.0, 0.0, "boxsize={4 4} fitmethod=meet position=center")
        .unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    similar_asserts::assert_eq!(
        operators(&operations),
        vec![
            "q", "cm", "re", "W", "n", "cm", "Do", "Q", "q", "cm", "cm", "Do", "Q"
        ]
    );
    assert_close(&floats(&operations[2]), &[0.0, 0.0, 4.0, 4.0]);
    // Half the size, centered vertically in the box
    assert_close(&floats(&operations[10]), &[4.0, 0.0, 0.0, 1.0, 0.0, 1.5]);
}

#[test]
fn templates_are_recorded_once_and_placed_many_times() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let template = session.begin_template(50.0, 30.0).unwrap();
    assert_eq!(
        session.begin_page(100.0, 100.0).unwrap_err().kind,
        ErrorKind::State
    );
    assert_eq!(
        session.fit_image(template, 0.0, 0.0, "").unwrap_err().kind,
        ErrorKind::State
    );
    session.rect(0.0, 0.0, 50.0, 30.0).unwrap();
    session.fill().unwrap();
    session.end_template().unwrap();
    assert_eq!(session.end_template().unwrap_err().kind, ErrorKind::State);
    assert_eq!(session.resource_size(template).unwrap(), (50.0, 30.0));

    session.begin_page(200.0, 200.0).unwrap();
    assert_eq!(
        session.begin_template(10.0, 10.0).unwrap_err().kind,
        ErrorKind::State
    );
    session.fit_image(template, 0.0, 0.0, "").unwrap();
    session.fit_image(template, 100.0, 100.0, "scale=2").unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    assert_eq!(
        operators(&operations)
            .iter()
            .filter(|operator| *operator == "Do")
            .count(),
        2
    );
    assert_close(&floats(&operations[7]), &[2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);

    let form_id = page_dictionary(&document, 1)
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|resources| resources.get(b"XObject"))
        .and_then(Object::as_dict)
        .and_then(|xobjects| xobjects.get(b"X0"))
        .and_then(Object::as_reference)
        .unwrap();
    let form = document.get_object(form_id).unwrap().as_stream().unwrap();
    assert_eq!(literal(form.dict.get(b"Subtype").unwrap()), "Form");
    let form_content = lopdf::content::Content::decode(&form.content).unwrap();
    assert_eq!(operators(&form_content.operations), vec!["re", "f"]);
}

/// A two page document to import from, the second page being wider.
fn source_document() -> Vec<u8> {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let font = session.load_font("Helvetica", "winansi", "").unwrap();
    session.begin_page(300.0, 400.0).unwrap();
    session.setfont(font, 12.0).unwrap();
    session.show_xy("First", 10.0, 10.0).unwrap();
    session.end_page().unwrap();
    session.begin_page(500.0, 200.0).unwrap();
    session.rect(0.0, 0.0, 10.0, 10.0).unwrap();
    session.stroke().unwrap();
    session.end_page().unwrap();
    session.close().unwrap();
    session.get_output_buffer().unwrap()
}

#[test]
fn imported_pages_become_form_xobjects() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    session
        .create_virtual_file("source.pdf", &source_document(), "")
        .unwrap();
    let source = session.open_pdi("source.pdf", "").unwrap();
    assert_eq!(session.pdi_value("pagecount", source, 1).unwrap(), 2.0);
    assert_eq!(session.pdi_value("width", source, 2).unwrap(), 500.0);
    assert_eq!(session.pdi_value("height", source, 1).unwrap(), 400.0);
    assert_eq!(
        session.pdi_value("author", source, 1).unwrap_err().kind,
        ErrorKind::Option
    );
    assert_eq!(
        session.open_pdi_page(source, 3, "").unwrap_err().kind,
        ErrorKind::Argument
    );

    let page = session.open_pdi_page(source, 1, "").unwrap();
    session.close_pdi(source).unwrap();
    assert_eq!(session.resource_size(page).unwrap(), (300.0, 400.0));

    session.begin_page(600.0, 800.0).unwrap();
    session.fit_pdi_page(page, 0.0, 0.0, "").unwrap();
    session.place_pdi_page(page, 300.0, 400.0, 0.5, 0.5).unwrap();
    assert_eq!(
        session.fit_image(page, 0.0, 0.0, "").unwrap_err().kind,
        ErrorKind::InvalidHandle
    );
    session.close_pdi_page(page).unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    assert_eq!(
        operators(&operations)
            .iter()
            .filter(|operator| *operator == "Do")
            .count(),
        2
    );
    assert_close(&floats(&operations[7]), &[0.5, 0.0, 0.0, 0.5, 0.0, 0.0]);

    // The imported page brings its font along
    let xobjects = page_dictionary(&document, 1)
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|resources| resources.get(b"XObject"))
        .and_then(Object::as_dict)
        .unwrap();
    assert_eq!(xobjects.len(), 1);
    let (_, form_reference) = xobjects.iter().next().unwrap();
    let form_id = form_reference.as_reference().unwrap();
    let form = document.get_object(form_id).unwrap().as_stream().unwrap();
    let form_resources = match form.dict.get(b"Resources").unwrap() {
        Object::Reference(id) => document.get_dictionary(*id).unwrap(),
        Object::Dictionary(dictionary) => dictionary,
        other => panic!("Unexpected resources {:?}", other),
    };
    assert!(form_resources.has(b"Font"));
}

#[test]
fn broken_documents_cannot_be_imported() {
    let mut session = Session::open("").unwrap();
    session
        .create_virtual_file("broken.pdf", b"%PDF-1.4 nothing else", "")
        .unwrap();
    assert_eq!(
        session.open_pdi("broken.pdf", "").unwrap_err().kind,
        ErrorKind::Format
    );
    assert_eq!(
        session.open_pdi("absent.pdf", "").unwrap_err().kind,
        ErrorKind::ResourceNotFound
    );
}

#[test]
fn icc_profiles_define_color_spaces_and_output_intents() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    session
        .create_virtual_file("rgb.icc", &icc_profile(b"RGB "), "")
        .unwrap();
    session
        .create_virtual_file("cmyk.icc", &icc_profile(b"CMYK"), "")
        .unwrap();
    session
        .create_virtual_file("lab.icc", &icc_profile(b"Lab "), "")
        .unwrap();
    let rgb = session.load_iccprofile("rgb.icc", "").unwrap();
    session
        .load_iccprofile("cmyk.icc", "usage=outputintent")
        .unwrap();
    assert_eq!(
        session.load_iccprofile("lab.icc", "").unwrap_err().kind,
        ErrorKind::Format
    );

    session.begin_page(100.0, 100.0).unwrap();
    assert_eq!(
        session
            .setcolor_icc("fill", rgb, &[0.1, 0.2])
            .unwrap_err()
            .kind,
        ErrorKind::Argument
    );
    session.setcolor_icc("fill", rgb, &[1.0, 0.5, 0.0]).unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    assert_eq!(operators(&operations), vec!["cs", "sc"]);
    assert_eq!(literal(&operations[0].operands[0]), "CS0");
    assert_eq!(page_resource_names(&document, 1, "ColorSpace"), vec!["CS0"]);

    let catalog_id = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = document.get_dictionary(catalog_id).unwrap();
    assert_eq!(
        catalog.get(b"OutputIntents").unwrap().as_array().unwrap().len(),
        1
    );
}

#[test]
fn graphics_state_objects_are_referenced_by_name() {
    let mut session = Session::open_with_configuration("", test_configuration()).unwrap();
    let gstate = session
        .create_gstate("linewidth=3 opacityfill=0.5 blendmode=Multiply")
        .unwrap();
    assert_eq!(
        session.create_gstate("opacityfill=2").unwrap_err().kind,
        ErrorKind::Option
    );
    assert_eq!(
        session.create_gstate("blendmode=Shiny").unwrap_err().kind,
        ErrorKind::Option
    );
    session.begin_page(100.0, 100.0).unwrap();
    session.set_gstate(gstate).unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    assert_eq!(operators(&operations), vec!["gs"]);
    assert_eq!(literal(&operations[0].operands[0]), "GS0");
    assert_eq!(page_resource_names(&document, 1, "ExtGState"), vec!["GS0"]);
}

#[test]
fn shadings_blend_from_the_fill_color() {
    let mut session = open_page();
    session.setrgbcolor_fill(1.0, 0.0, 0.0).unwrap();
    let axial = session
        .shading("axial", 0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 1.0, 0.0, "")
        .unwrap();
    assert_eq!(
        session
            .shading("radial", 0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 1.0, 0.0, "r0=0")
            .unwrap_err()
            .kind,
        ErrorKind::Option
    );
    assert_eq!(
        session
            .shading("conic", 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, "")
            .unwrap_err()
            .kind,
        ErrorKind::Argument
    );
    let radial = session
        .shading(
            "radial",
            50.0,
            50.0,
            50.0,
            50.0,
            0.0,
            1.0,
            0.0,
            0.0,
            "r0=0 r1=40 extend1=true",
        )
        .unwrap();
    session.shfill(axial).unwrap();
    session.shfill(radial).unwrap();
    let document = finish(session);

    let operations = page_operations(&document, 1);
    assert_eq!(operators(&operations), vec!["rg", "sh", "sh"]);
    let mut names = page_resource_names(&document, 1, "Shading");
    names.sort();
    assert_eq!(names, vec!["Sh0", "Sh1"]);
}
