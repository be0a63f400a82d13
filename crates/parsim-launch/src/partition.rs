//! Driving the external partitioning tools.
//!
//! The actual cutting is done by programs the coordinator shells out to:
//! `netconvert` extracts a sub-network per partition, `convertToMetis.py`
//! computes a METIS graph partitioning, and `cutRoutes.py` splits routes at
//! the cuts.  This module only sequences them and turns non-zero exits into
//! fatal errors.

use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use parsim_core::PartitionId;

use crate::config::{child, config_err, xml_err, write_partition_config, SumoConfig};
use crate::error::{LaunchError, LaunchResult};
use crate::install::SumoInstall;
use crate::routes::preprocess_routes;
use crate::{net_file_name, route_file_name};

/// How the network is cut into sub-networks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionScheme {
    /// Vertical strips of the network's bounding box.  Fast, no external
    /// dependencies beyond netconvert, but ignores road density.
    Grid,
    /// METIS graph partitioning via `convertToMetis.py`, which writes an
    /// `edgesPart<i>` keep-list per partition.
    Metis,
}

/// Produces `part<i>.net.xml`, `part<i>.rou.xml` and `part<i>.sumocfg` for
/// every partition in `work_dir`.
pub struct NetPartitioner<'a> {
    install: &'a SumoInstall,
    config: &'a SumoConfig,
    scheme: PartitionScheme,
    partitions: usize,
    work_dir: PathBuf,
}

impl<'a> NetPartitioner<'a> {
    pub fn new(
        install: &'a SumoInstall,
        config: &'a SumoConfig,
        scheme: PartitionScheme,
        partitions: usize,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        NetPartitioner {
            install,
            config,
            scheme,
            partitions,
            work_dir: work_dir.into(),
        }
    }

    /// Run the full pipeline.  Returns the per-partition network file paths,
    /// indexed by partition id.
    pub fn run(&self) -> LaunchResult<Vec<PathBuf>> {
        let processed_routes = self.work_dir.join("processed_routes.rou.xml");
        let hoisted = preprocess_routes(&self.config.route_file, &processed_routes)?;
        info!("hoisted {hoisted} inline vehicle routes for the route cutter");

        let strips = match self.scheme {
            PartitionScheme::Grid => Some(self.grid_strips()?),
            PartitionScheme::Metis => {
                let mut metis = Command::new("python3");
                metis
                    .arg("convertToMetis.py")
                    .arg(&self.config.net_file)
                    .arg(self.partitions.to_string());
                run_tool("convertToMetis.py", &mut metis)?;
                None
            }
        };

        let mut net_files = Vec::with_capacity(self.partitions);
        for i in 0..self.partitions {
            let id = PartitionId(i as u32);
            let net_out = self.work_dir.join(net_file_name(id));
            let route_out = self.work_dir.join(route_file_name(id));

            let mut convert = Command::new(self.install.netconvert_binary());
            match &strips {
                Some(bounds) => {
                    convert.arg("--keep-edges.in-boundary").arg(&bounds[i]);
                }
                None => {
                    convert
                        .arg("--keep-edges.input-file")
                        .arg(format!("edgesPart{i}"));
                }
            }
            convert
                .arg("-s")
                .arg(&self.config.net_file)
                .arg("-o")
                .arg(&net_out);
            run_tool("netconvert", &mut convert)?;

            let mut cut = Command::new("python3");
            cut.arg("cutRoutes.py")
                .arg(&net_out)
                .arg(&processed_routes)
                .arg("--routes-output")
                .arg(&route_out)
                .arg("--orig-net")
                .arg(&self.config.net_file)
                .arg("--disconnected-action")
                .arg("keep");
            run_tool("cutRoutes.py", &mut cut)?;

            write_partition_config(self.config, id, &self.work_dir)?;
            info!("partition {id} files written");
            net_files.push(net_out);
        }
        Ok(net_files)
    }

    /// Cut the network's `convBoundary` into vertical strips, one per
    /// partition, formatted as netconvert `x0,y0,x1,y1` boundary strings.
    fn grid_strips(&self) -> LaunchResult<Vec<String>> {
        let path = &self.config.net_file;
        let text = std::fs::read_to_string(path)?;
        let doc = roxmltree::Document::parse(&text).map_err(|e| xml_err(path, e))?;
        let net = doc
            .root()
            .children()
            .find(|n| n.has_tag_name("net"))
            .ok_or_else(|| config_err(path, "no <net> element"))?;
        let boundary = child(net, "location")
            .and_then(|l| l.attribute("convBoundary"))
            .ok_or_else(|| config_err(path, "no <location convBoundary=…> element"))?;

        let coords: Vec<f64> = boundary
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| config_err(path, &format!("malformed convBoundary '{boundary}'")))?;
        let &[x_min, y_min, x_max, y_max] = coords.as_slice() else {
            return Err(config_err(
                path,
                &format!("convBoundary '{boundary}' must have 4 coordinates"),
            ));
        };

        let width = (x_max - x_min) / self.partitions as f64;
        Ok((0..self.partitions)
            .map(|i| {
                let left = x_min + width * i as f64;
                let right = if i + 1 == self.partitions { x_max } else { left + width };
                format!("{left:.2},{y_min:.2},{right:.2},{y_max:.2}")
            })
            .collect())
    }
}

/// Run an external tool to completion; a non-zero exit is fatal.
fn run_tool(tool: &str, cmd: &mut Command) -> LaunchResult<()> {
    debug!("running {cmd:?}");
    let status = cmd.status().map_err(|e| LaunchError::Spawn {
        tool: tool.to_owned(),
        source: e,
    })?;
    if !status.success() {
        return Err(LaunchError::Tool { tool: tool.to_owned(), status });
    }
    info!("{tool} completed");
    Ok(())
}
