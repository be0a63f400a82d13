//! Route-file preprocessing for the external route cutter.
//!
//! `cutRoutes.py` can only split *named* routes, but SUMO route files often
//! define routes inline, as a `<route>` child of each `<vehicle>`.  This pass
//! hoists every inline route into a top-level named route
//! (`custom_route0`, `custom_route1`, …) and points the vehicle at it:
//!
//! ```xml
//! <vehicle id="v0" depart="0">          <vehicle id="v0" depart="0" route="custom_route0"/>
//!     <route edges="a b c"/>       →    ...
//! </vehicle>                            <route id="custom_route0" edges="a b c"/>
//! ```
//!
//! The hoisted definitions are appended just before `</routes>`.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::config::xml_err;
use crate::error::{LaunchError, LaunchResult};

/// Rewrite `input` into `output`, hoisting inline vehicle routes.
///
/// Returns the number of routes hoisted.
pub fn preprocess_routes(input: &Path, output: &Path) -> LaunchResult<usize> {
    let text = std::fs::read_to_string(input)?;
    let mut reader = Reader::from_str(&text);
    let mut writer = Writer::new(Vec::new());

    // (id, edges) of every hoisted route, appended before </routes>.
    let mut hoisted: Vec<(String, String)> = Vec::new();
    // A <vehicle> start tag held back until we know whether an inline
    // <route> child follows.
    let mut pending_vehicle: Option<BytesStart<'static>> = None;
    // Set while skipping the </route> of a hoisted non-empty route element.
    let mut skip_route_end = false;

    loop {
        let event = reader.read_event().map_err(|e| xml_err(input, e))?;
        match event {
            Event::Eof => break,

            Event::Start(e) if e.name().as_ref() == b"vehicle" => {
                flush(&mut writer, &mut pending_vehicle, input)?;
                pending_vehicle = Some(e.into_owned());
            }

            Event::Empty(e) if e.name().as_ref() == b"route" && pending_vehicle.is_some() => {
                hoist(&mut writer, &mut pending_vehicle, &mut hoisted, &e, input)?;
            }
            Event::Start(e) if e.name().as_ref() == b"route" && pending_vehicle.is_some() => {
                hoist(&mut writer, &mut pending_vehicle, &mut hoisted, &e, input)?;
                skip_route_end = true;
            }
            Event::End(e) if e.name().as_ref() == b"route" && skip_route_end => {
                skip_route_end = false;
            }

            // Indentation between <vehicle> and its inline <route> must not
            // force an early flush; it is dropped with the hoisted element.
            Event::Text(t)
                if pending_vehicle.is_some()
                    && t.iter().all(|b| b.is_ascii_whitespace()) => {}

            Event::End(e) if e.name().as_ref() == b"routes" => {
                flush(&mut writer, &mut pending_vehicle, input)?;
                for (id, edges) in &hoisted {
                    let mut route = BytesStart::new("route");
                    route.push_attribute(("id", id.as_str()));
                    route.push_attribute(("edges", edges.as_str()));
                    writer
                        .write_event(Event::Empty(route))
                        .map_err(|e| xml_err(input, e))?;
                }
                writer
                    .write_event(Event::End(e))
                    .map_err(|e| xml_err(input, e))?;
            }

            other => {
                flush(&mut writer, &mut pending_vehicle, input)?;
                writer.write_event(other).map_err(|e| xml_err(input, e))?;
            }
        }
    }

    std::fs::write(output, writer.into_inner())?;
    Ok(hoisted.len())
}

/// Write a held-back vehicle start tag unchanged (it had no inline route).
fn flush(
    writer: &mut Writer<Vec<u8>>,
    pending: &mut Option<BytesStart<'static>>,
    path: &Path,
) -> LaunchResult<()> {
    if let Some(vehicle) = pending.take() {
        writer
            .write_event(Event::Start(vehicle))
            .map_err(|e| xml_err(path, e))?;
    }
    Ok(())
}

/// Replace a pending vehicle's inline route with a reference to a new named
/// route, recording the definition for later emission.
fn hoist(
    writer: &mut Writer<Vec<u8>>,
    pending: &mut Option<BytesStart<'static>>,
    hoisted: &mut Vec<(String, String)>,
    route: &BytesStart<'_>,
    path: &Path,
) -> LaunchResult<()> {
    let mut edges = None;
    for attr in route.attributes() {
        let attr = attr.map_err(|e| xml_err(path, e))?;
        if attr.key.as_ref() == b"edges" {
            edges = Some(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }
    let edges = edges.ok_or_else(|| LaunchError::Config {
        path: path.to_path_buf(),
        detail: "inline <route> is missing attribute 'edges'".to_owned(),
    })?;

    let id = format!("custom_route{}", hoisted.len());
    if let Some(mut vehicle) = pending.take() {
        vehicle.push_attribute(("route", id.as_str()));
        writer
            .write_event(Event::Start(vehicle))
            .map_err(|e| xml_err(path, e))?;
    }
    hoisted.push((id, edges));
    Ok(())
}
