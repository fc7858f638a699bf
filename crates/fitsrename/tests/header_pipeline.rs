//! End-to-end tests from raw header bytes to rendered file names.
//!
//! Everything here runs on in-memory byte vectors; the filesystem side of
//! renaming is covered in `batch_rename.rs`.

use std::io::Cursor;

use fitsrename::{
    decode_flat_header, decode_xml_header, render, tokenize, DecodeError, HeaderMap, HeaderValue,
    RenderError, ResolutionContext, SpacePolicy, Template, Token, BLOCK_SIZE, CARD_SIZE,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fits_bytes(cards: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for c in cards.iter().chain(std::iter::once(&"END")) {
        let mut card = [b' '; CARD_SIZE];
        card[..c.len()].copy_from_slice(c.as_bytes());
        out.extend_from_slice(&card);
    }
    out.resize(out.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
    out
}

fn xisf_bytes_with_len(xml: &str, declared_len: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"XISF0100");
    out.extend_from_slice(&declared_len.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(xml.as_bytes());
    out
}

fn xisf_bytes(xml: &str) -> Vec<u8> {
    xisf_bytes_with_len(xml, xml.len() as u32)
}

fn xisf_document(keywords: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <xisf version=\"1.0\" xmlns=\"http://www.pixinsight.com/xisf\">\n\
         <Image geometry=\"16:16:1\" sampleFormat=\"UInt16\" location=\"attachment:4096:512\">\n",
    );
    for (name, value) in keywords {
        xml.push_str(&format!(
            "<FITSKeyword name=\"{name}\" value=\"{value}\" comment=\"\"/>\n"
        ));
    }
    xml.push_str("</Image>\n</xisf>\n");
    xml
}

fn render_keep(template: &str, header: &HeaderMap, ctx: &ResolutionContext) -> Result<String, RenderError> {
    render(&tokenize(template), header, ctx, SpacePolicy::Keep)
}

// ---------------------------------------------------------------------------
// XISF type inference
// ---------------------------------------------------------------------------

#[test]
fn xisf_values_are_typed() {
    let xml = xisf_document(&[
        ("EXPTIME", "600"),
        ("CCD-TEMP", "-12"),
        ("FILTER", "'L'"),
        ("COOLER", "T"),
        ("FOCRATIO", "5.6"),
        ("OBJECT", ""),
    ]);
    let header = decode_xml_header(Cursor::new(xisf_bytes(&xml))).unwrap();

    assert_eq!(header.get("EXPTIME"), Some(&HeaderValue::Integer(600)));
    assert_eq!(header.get("CCD-TEMP"), Some(&HeaderValue::Integer(-12)));
    assert_eq!(header.get("FILTER"), Some(&HeaderValue::from("L")));
    assert_eq!(header.get("COOLER"), Some(&HeaderValue::Boolean(true)));
    assert_eq!(header.get("FOCRATIO"), Some(&HeaderValue::Float(5.6)));
    assert_eq!(header.get("OBJECT"), Some(&HeaderValue::Absent));
}

#[test]
fn xisf_unparseable_value_is_dropped() {
    let xml = xisf_document(&[("SITENAME", "backyard"), ("GAIN", "100")]);
    let header = decode_xml_header(Cursor::new(xisf_bytes(&xml))).unwrap();
    assert!(!header.contains_key("SITENAME"));
    assert_eq!(header.len(), 1);
}

#[test]
fn xisf_absent_value_is_treated_as_missing() {
    let xml = xisf_document(&[("OBJECT", "")]);
    let header = decode_xml_header(Cursor::new(xisf_bytes(&xml))).unwrap();
    assert_eq!(
        render_keep("{OBJECT}", &header, &ResolutionContext::new()),
        Err(RenderError::MissingRequiredHeader(String::from("OBJECT")))
    );
}

#[test]
fn xisf_length_prefix_longer_than_stream() {
    let xml = xisf_document(&[("GAIN", "100")]);
    let data = xisf_bytes_with_len(&xml, xml.len() as u32 + 1000);
    let err = decode_xml_header(Cursor::new(data)).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidHeaderLength));
}

#[test]
fn xisf_bad_signature() {
    let mut data = xisf_bytes(&xisf_document(&[]));
    data[4] = b'9';
    assert!(matches!(
        decode_xml_header(Cursor::new(data)),
        Err(DecodeError::InvalidSignature)
    ));
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[test]
fn tokenizer_example() {
    let input = "{FILTER}_{EXPTIME:%0.2f}.fits";
    let tokens = tokenize(input);
    assert_eq!(
        tokens,
        vec![
            Token::placeholder("FILTER", None),
            Token::literal("_"),
            Token::placeholder("EXPTIME", Some("%0.2f")),
            Token::literal(".fits"),
        ]
    );
    let rebuilt: String = tokens.iter().map(ToString::to_string).collect();
    assert_eq!(rebuilt, input);
}

// ---------------------------------------------------------------------------
// FITS and XISF headers render the same way
// ---------------------------------------------------------------------------

#[test]
fn fits_and_xisf_render_identically() {
    let fits = decode_flat_header(Cursor::new(fits_bytes(&[
        "SIMPLE  =                    T",
        "OBJECT  = 'NGC 7000'",
        "FILTER  = 'Ha'",
        "EXPTIME =                  300",
        "DATE-OBS= '2023-05-01T01:02:03.5'",
    ])))
    .unwrap();
    let xisf = decode_xml_header(Cursor::new(xisf_bytes(&xisf_document(&[
        ("OBJECT", "'NGC 7000'"),
        ("FILTER", "'Ha'"),
        ("EXPTIME", "300"),
        ("DATE-OBS", "'2023-05-01T01:02:03.5'"),
    ]))))
    .unwrap();

    let template = Template::parse("{OBJECT}/{DATE-OBS:date2006-01-02}/{FILTER}_{EXPTIME:%0.2f}s_");
    let ctx = ResolutionContext::new();
    let expected = "NGC_7000/2023-05-01/Ha_300.00s_";
    assert_eq!(template.render(&fits, &ctx, SpacePolicy::Underscore).unwrap(), expected);
    assert_eq!(template.render(&xisf, &ctx, SpacePolicy::Underscore).unwrap(), expected);
}

#[test]
fn date_renders_in_utc() {
    let header: HeaderMap = [("DATE-OBS", HeaderValue::from("2023-05-01T01:02:03.5Z"))]
        .into_iter()
        .collect();
    let ctx = ResolutionContext::new();
    assert_eq!(
        render_keep("{DATE-OBS:date2006-01-02}", &header, &ctx).unwrap(),
        "2023-05-01"
    );
    assert_eq!(
        render_keep("{DATE-OBS:date15:04:05.000}", &header, &ctx).unwrap(),
        "01:02:03.500"
    );
    assert_eq!(
        render_keep("{DATE-OBS:dateunix}", &header, &ctx).unwrap(),
        "1682902923"
    );
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn override_beats_header_value() {
    let header: HeaderMap = [("FILTER", HeaderValue::from("R"))].into_iter().collect();
    let ctx = ResolutionContext::new().with_overrides(fitsrename::parse_assignments("FILTER=G").unwrap());
    assert_eq!(render_keep("{FILTER}", &header, &ctx).unwrap(), "G");
}

#[test]
fn exptime_falls_back_to_exposure() {
    let header = decode_xml_header(Cursor::new(xisf_bytes(&xisf_document(&[("EXPOSURE", "120")]))))
        .unwrap();
    assert_eq!(
        render_keep("{EXPTIME}", &header, &ResolutionContext::new()).unwrap(),
        "120"
    );
}

#[test]
fn missing_header_in_one_file_does_not_affect_another() {
    let template = Template::parse("{OBJECT}_{FILTER}");
    let ctx = ResolutionContext::new();
    let complete: HeaderMap = [
        ("OBJECT", HeaderValue::from("M42")),
        ("FILTER", HeaderValue::from("L")),
    ]
    .into_iter()
    .collect();
    let incomplete: HeaderMap = [("OBJECT", HeaderValue::from("M42"))].into_iter().collect();

    assert!(template.render(&incomplete, &ctx, SpacePolicy::Keep).is_err());
    assert_eq!(template.render(&complete, &ctx, SpacePolicy::Keep).unwrap(), "M42_L");
}
