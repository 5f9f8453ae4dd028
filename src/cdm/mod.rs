//! Deterministic CDM XML serialization (`spec.md` §4.8), grounded on
//! `original_source/src/ssa/cdm/cdm_export.py` for structure and element
//! order; written with `quick-xml` since the teacher carries no XML writer
//! of its own (`DESIGN.md`).

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::writer::Writer;

use crate::event::Event;

const ORIGINATOR: &str = "SSA-CORE";

/// Serializes `event` to the canonical CDM XML byte sequence described in
/// `spec.md` §4.8. Deterministic for a fixed `event` and `creation_date`:
/// callers needing reproducible bytes across runs (e.g. P7's round-trip
/// test) must supply a fixed `creation_date`.
pub fn to_cdm_xml(event: &Event, creation_date_iso: &str) -> Vec<u8> {
    let mut writer = Writer::new(Vec::new());

    let mut cdm_start = BytesStart::new("CDM");
    cdm_start.push_attribute(("xmlns", "urn:ccsds:schema:ndm-xml"));
    writer.write_event(XmlEvent::Start(cdm_start)).expect("writing to an in-memory buffer cannot fail");

    write_header(&mut writer, creation_date_iso);
    write_body(&mut writer, event);

    writer
        .write_event(XmlEvent::End(BytesEnd::new("CDM")))
        .expect("writing to an in-memory buffer cannot fail");

    writer.into_inner()
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) {
    writer.write_event(XmlEvent::Start(BytesStart::new(tag))).unwrap();
    writer.write_event(XmlEvent::Text(BytesText::new(text))).unwrap();
    writer.write_event(XmlEvent::End(BytesEnd::new(tag))).unwrap();
}

fn write_header(writer: &mut Writer<Vec<u8>>, creation_date_iso: &str) {
    writer.write_event(XmlEvent::Start(BytesStart::new("header"))).unwrap();
    write_text_element(writer, "CREATION_DATE", creation_date_iso);
    write_text_element(writer, "ORIGINATOR", ORIGINATOR);
    writer.write_event(XmlEvent::End(BytesEnd::new("header"))).unwrap();
}

fn write_body(writer: &mut Writer<Vec<u8>>, event: &Event) {
    writer.write_event(XmlEvent::Start(BytesStart::new("body"))).unwrap();

    write_metadata(writer, event);
    write_object(writer, "OBJECT1", event.close_approach.primary_id, &event.close_approach.primary_state);
    write_object(writer, "OBJECT2", event.close_approach.secondary_id, &event.close_approach.secondary_state);

    writer.write_event(XmlEvent::End(BytesEnd::new("body"))).unwrap();
}

fn write_metadata(writer: &mut Writer<Vec<u8>>, event: &Event) {
    writer.write_event(XmlEvent::Start(BytesStart::new("metadata"))).unwrap();

    write_text_element(writer, "EVENT_ID", &event.id.to_string());
    write_text_element(writer, "TCA", &format_epoch_iso(event.close_approach.tca));
    write_text_element(writer, "MISS_DISTANCE_KM", &format_fixed(event.close_approach.miss_distance_m / 1000.0, 6));
    write_text_element(
        writer,
        "REL_SPEED_KMS",
        &format_fixed(event.close_approach.relative_speed_m_s / 1000.0, 9),
    );
    write_text_element(writer, "COLLISION_PROBABILITY", &format_scientific_3sf(event.estimate.pc));
    write_text_element(writer, "RISK_LEVEL", &event.estimate.risk_band.to_string());

    writer.write_event(XmlEvent::End(BytesEnd::new("metadata"))).unwrap();
}

fn write_object(writer: &mut Writer<Vec<u8>>, object_id: &str, object_catalog_id: u64, state: &crate::state::State) {
    let mut object_start = BytesStart::new("object");
    object_start.push_attribute(("id", object_id));
    writer.write_event(XmlEvent::Start(object_start)).unwrap();

    write_text_element(writer, "OBJECT_ID", &object_catalog_id.to_string());
    write_text_element(writer, "SOURCE", ORIGINATOR);

    writer.write_event(XmlEvent::Start(BytesStart::new("stateVector"))).unwrap();
    let p = state.position_km();
    let v = state.velocity_km_s();
    write_text_element(writer, "X_KM", &format_fixed(p.x, 6));
    write_text_element(writer, "Y_KM", &format_fixed(p.y, 6));
    write_text_element(writer, "Z_KM", &format_fixed(p.z, 6));
    write_text_element(writer, "VX_KMS", &format_fixed(v.x, 9));
    write_text_element(writer, "VY_KMS", &format_fixed(v.y, 9));
    write_text_element(writer, "VZ_KMS", &format_fixed(v.z, 9));
    writer.write_event(XmlEvent::End(BytesEnd::new("stateVector"))).unwrap();

    writer.write_event(XmlEvent::End(BytesEnd::new("object"))).unwrap();
}

fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Scientific notation with 3 significant digits (`spec.md` §4.8).
fn format_scientific_3sf(value: f64) -> String {
    if value == 0.0 {
        return "0.00e0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    let mantissa = value / 10f64.powi(exponent);
    format!("{mantissa:.2}e{exponent}")
}

fn format_epoch_iso(epoch: hifitime::Epoch) -> String {
    format!("{epoch}")
}

/// Parses the fields this crate emits back out of a CDM XML document, for
/// the round-trip property test (`spec.md` §8 P7). Intentionally narrow:
/// it only reads back the handful of scalar fields the test needs, not a
/// general CDM reader.
pub struct ParsedCdm {
    pub event_id: String,
    pub miss_distance_km: f64,
    pub rel_speed_kms: f64,
    pub pc: f64,
    pub risk_level: String,
}

pub fn parse_cdm_xml(xml: &[u8]) -> Result<ParsedCdm, quick_xml::Error> {
    use quick_xml::events::Event as ReadEvent;
    use quick_xml::reader::Reader;

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current_tag = String::new();
    let mut event_id = String::new();
    let mut miss_distance_km = 0.0;
    let mut rel_speed_kms = 0.0;
    let mut pc = 0.0;
    let mut risk_level = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            ReadEvent::Start(e) => {
                current_tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
            }
            ReadEvent::Text(t) => {
                let text = t.unescape()?.to_string();
                match current_tag.as_str() {
                    "EVENT_ID" => event_id = text,
                    "MISS_DISTANCE_KM" => miss_distance_km = text.parse().unwrap_or(0.0),
                    "REL_SPEED_KMS" => rel_speed_kms = text.parse().unwrap_or(0.0),
                    "COLLISION_PROBABILITY" => pc = text.parse().unwrap_or(0.0),
                    "RISK_LEVEL" => risk_level = text,
                    _ => {}
                }
            }
            ReadEvent::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(ParsedCdm {
        event_id,
        miss_distance_km,
        rel_speed_kms,
        pc,
        risk_level,
    })
}
