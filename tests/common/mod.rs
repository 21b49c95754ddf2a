#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object};
use pdfscribe::SessionConfiguration;

/// Uncompressed and reproducible output, so that the content streams can be inspected.
pub fn test_configuration() -> SessionConfiguration {
    SessionConfiguration {
        compress: false,
        document_identifier: Some("pdfscribe-test".into()),
        timestamp: Some(1_700_000_000),
        ..SessionConfiguration::default()
    }
}

pub fn load(bytes: &[u8]) -> lopdf::Document {
    lopdf::Document::load_mem(bytes).unwrap()
}

/// The decoded content stream of a page, numbered from 1.
pub fn page_operations(document: &lopdf::Document, page_number: u32) -> Vec<Operation> {
    let page_id = document.get_pages()[&page_number];
    let content = document.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

pub fn operators(operations: &[Operation]) -> Vec<String> {
    operations
        .iter()
        .map(|operation| operation.operator.clone())
        .collect()
}

/// The numeric operands of an operation, integers and reals alike.
pub fn floats(operation: &Operation) -> Vec<f32> {
    operation
        .operands
        .iter()
        .map(|operand| operand.as_float().unwrap())
        .collect()
}

pub fn page_dictionary(document: &lopdf::Document, page_number: u32) -> &Dictionary {
    let page_id = document.get_pages()[&page_number];
    document.get_dictionary(page_id).unwrap()
}

/// The named entries of a resource category of a page, such as `Font` or `XObject`.
pub fn page_resource_names(document: &lopdf::Document, page_number: u32, category: &str) -> Vec<String> {
    let resources = page_dictionary(document, page_number)
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap();
    match resources.get(category.as_bytes()) {
        Ok(Object::Dictionary(entries)) => entries
            .iter()
            .map(|(name, _)| String::from_utf8_lossy(name).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn info_dictionary(document: &lopdf::Document) -> &Dictionary {
    let info_id = document
        .trailer
        .get(b"Info")
        .unwrap()
        .as_reference()
        .unwrap();
    document.get_dictionary(info_id).unwrap()
}

pub fn literal(object: &Object) -> String {
    match object {
        Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
        Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => panic!("Expected a string, got {:?}", object),
    }
}

/// A small RGBA image encoded as PNG.
pub fn png_bytes(width: u32, height: u32, opaque: bool) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if opaque { 255 } else { ((x + y) * 20 % 256) as u8 };
        image::Rgba([(x * 40) as u8, (y * 40) as u8, 128, alpha])
    });
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// The smallest header accepted as an ICC profile, for the given color space signature.
pub fn icc_profile(color_space: &[u8; 4]) -> Vec<u8> {
    let mut profile = vec![0u8; 128];
    profile[0..4].copy_from_slice(&128u32.to_be_bytes());
    profile[12..16].copy_from_slice(b"mntr");
    profile[16..20].copy_from_slice(color_space);
    profile[20..24].copy_from_slice(b"XYZ ");
    profile[36..40].copy_from_slice(b"acsp");
    profile
}

pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "{:?} != {:?}", actual, expected);
    for (actual_value, expected_value) in actual.iter().zip(expected) {
        assert!(
            (actual_value - expected_value).abs() < 1e-3,
            "{:?} != {:?}",
            actual,
            expected
        );
    }
}
