//! Parsing the operator's `.sumocfg` and writing per-partition copies.

use std::path::{Path, PathBuf};

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use parsim_core::{PartitionId, SimTime};

use crate::error::{LaunchError, LaunchResult};
use crate::{config_file_name, net_file_name, route_file_name};

/// End time assumed when the configuration has no `time/end` element.
pub const DEFAULT_END_TIME_SECS: f64 = 1000.0;

/// The parts of a SUMO configuration file the coordinator consumes.
#[derive(Clone, Debug)]
pub struct SumoConfig {
    /// The configuration file itself.
    pub path: PathBuf,
    /// Its containing directory; relative input paths resolve against this.
    pub dir: PathBuf,
    /// Resolved path of the whole-network `net-file`.
    pub net_file: PathBuf,
    /// Resolved path of the `route-files` input.
    pub route_file: PathBuf,
    /// The `gui-settings-file` value as written (relative), if present.
    pub gui_settings: Option<PathBuf>,
    /// `time/end`, or [`DEFAULT_END_TIME_SECS`] if absent.
    pub end_time: SimTime,
}

impl SumoConfig {
    /// Load and validate a configuration file.
    ///
    /// `net-file` and `route-files` are required; a missing `time/end` falls
    /// back to [`DEFAULT_END_TIME_SECS`] with a warning, matching the
    /// simulator's own tolerance for open-ended configurations.
    pub fn load(path: &Path) -> LaunchResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let doc = roxmltree::Document::parse(&text).map_err(|e| xml_err(path, e))?;

        let configuration = doc
            .root()
            .children()
            .find(|n| n.has_tag_name("configuration"))
            .ok_or_else(|| config_err(path, "no <configuration> element"))?;
        let input = child(configuration, "input")
            .ok_or_else(|| config_err(path, "no <input> element"))?;

        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let net_file = dir.join(required_value(input, "net-file", path)?);
        let route_file = dir.join(required_value(input, "route-files", path)?);
        let gui_settings = child(input, "gui-settings-file")
            .and_then(|n| n.attribute("value"))
            .map(PathBuf::from);

        let end_time = match child(configuration, "time").and_then(|t| child(t, "end")) {
            Some(end) => {
                let value = end
                    .attribute("value")
                    .ok_or_else(|| config_err(path, "<end> is missing attribute 'value'"))?;
                let secs: f64 = value.parse().map_err(|_| {
                    config_err(path, &format!("invalid end time '{value}'"))
                })?;
                SimTime::at(secs)
            }
            None => {
                warn!(
                    "{}: no end time specified, defaulting to {} steps",
                    path.display(),
                    DEFAULT_END_TIME_SECS
                );
                SimTime::at(DEFAULT_END_TIME_SECS)
            }
        };

        Ok(SumoConfig {
            path: path.to_path_buf(),
            dir,
            net_file,
            route_file,
            gui_settings,
            end_time,
        })
    }
}

/// Write `part<i>.sumocfg` into `out_dir`: a copy of the original
/// configuration with `net-file` and `route-files` rewritten to the
/// partition-local files and `gui-settings-file` (if present) rewritten to an
/// absolute path, so the partition configs work from any working directory.
pub fn write_partition_config(
    config: &SumoConfig,
    id: PartitionId,
    out_dir: &Path,
) -> LaunchResult<PathBuf> {
    let text = std::fs::read_to_string(&config.path)?;
    let gui_abs = config.gui_settings.as_ref().map(|p| {
        let joined = config.dir.join(p);
        joined.canonicalize().unwrap_or(joined)
    });

    let mut reader = Reader::from_str(&text);
    let mut writer = Writer::new(Vec::new());
    loop {
        let event = reader.read_event().map_err(|e| xml_err(&config.path, e))?;
        match event {
            Event::Eof => break,
            Event::Empty(e) => {
                let e = rewrite_input_element(e, id, gui_abs.as_deref(), &config.path)?;
                writer
                    .write_event(Event::Empty(e))
                    .map_err(|e| xml_err(&config.path, e))?;
            }
            Event::Start(e) => {
                let e = rewrite_input_element(e, id, gui_abs.as_deref(), &config.path)?;
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| xml_err(&config.path, e))?;
            }
            other => writer
                .write_event(other)
                .map_err(|e| xml_err(&config.path, e))?,
        }
    }

    let out_path = out_dir.join(config_file_name(id));
    std::fs::write(&out_path, writer.into_inner())?;
    Ok(out_path)
}

/// Replace the `value` attribute on the three input elements the partitions
/// override; any other element passes through untouched.
fn rewrite_input_element(
    element: BytesStart<'_>,
    id: PartitionId,
    gui_abs: Option<&Path>,
    path: &Path,
) -> LaunchResult<BytesStart<'static>> {
    let new_value = match element.name().as_ref() {
        b"net-file" => Some(net_file_name(id)),
        b"route-files" => Some(route_file_name(id)),
        b"gui-settings-file" => gui_abs.map(|p| p.display().to_string()),
        _ => None,
    };
    let Some(value) = new_value else {
        return Ok(element.into_owned());
    };

    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in element.attributes() {
        let attr = attr.map_err(|e| xml_err(path, e))?;
        if attr.key.as_ref() == b"value" {
            out.push_attribute(("value", value.as_str()));
        } else {
            out.push_attribute(attr);
        }
    }
    Ok(out)
}

// ── Shared XML helpers (also used by the other modules in this crate) ────────

pub(crate) fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

pub(crate) fn xml_err(path: &Path, e: impl std::fmt::Display) -> LaunchError {
    LaunchError::Xml {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

pub(crate) fn config_err(path: &Path, detail: &str) -> LaunchError {
    LaunchError::Config {
        path: path.to_path_buf(),
        detail: detail.to_owned(),
    }
}

fn required_value<'a, 'input>(
    input: roxmltree::Node<'a, 'input>,
    name: &'static str,
    path: &Path,
) -> LaunchResult<&'a str> {
    child(input, name)
        .ok_or_else(|| config_err(path, &format!("no <{name}> element")))?
        .attribute("value")
        .ok_or_else(|| config_err(path, &format!("<{name}> is missing attribute 'value'")))
}
