mod stats;
mod topology;

pub use stats::{parse_statistics, StatisticRecord};
pub use topology::{GeometryObject, GeometrySet, Member, Topology, Transform};

use crate::config;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Identifier that datasets carry either as a number or a string
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawKey {
    Int(i64),
    Str(String),
}

impl RawKey {
    pub fn to_key(&self) -> String {
        match self {
            RawKey::Int(n) => n.to_string(),
            RawKey::Str(s) => s.clone(),
        }
    }
}

/// Where a dataset comes from
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::Path(PathBuf::from(location))
        }
    }

    /// Read the whole payload
    pub fn fetch(&self, client: &Client) -> Result<Vec<u8>> {
        match self {
            Source::Url(url) => {
                let resp = client
                    .get(url)
                    .send()
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("GET {url} returned error status"))?;
                let bytes = resp.bytes().with_context(|| format!("read body of {url}"))?;
                Ok(bytes.to_vec())
            }
            Source::Path(path) => fs::read(path).with_context(|| format!("read {}", path.display())),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Both datasets, parsed
pub struct Datasets {
    pub geometry: GeometrySet,
    pub statistics: Vec<StatisticRecord>,
}

/// Fetch and parse both datasets concurrently; fails if either one fails
pub fn load(geometry: &Source, statistics: &Source, timeout: Duration) -> Result<Datasets> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .context("build HTTP client")?;

    let (geometry, statistics) = rayon::join(
        || load_geometry(&client, geometry),
        || load_statistics(&client, statistics),
    );

    Ok(Datasets {
        geometry: geometry?,
        statistics: statistics?,
    })
}

fn load_geometry(client: &Client, source: &Source) -> Result<GeometrySet> {
    let mut bytes = source.fetch(client)?;
    let topology = Topology::parse(&mut bytes).with_context(|| format!("parse geometry from {source}"))?;
    let set = topology.geometry_set(config::REGIONS_OBJECT, config::MESH_OBJECT)?;
    tracing::info!(
        %source,
        arcs = topology.arc_count(),
        regions = set.regions.features.len(),
        "loaded geometry"
    );
    Ok(set)
}

fn load_statistics(client: &Client, source: &Source) -> Result<Vec<StatisticRecord>> {
    let mut bytes = source.fetch(client)?;
    let records = parse_statistics(&mut bytes).with_context(|| format!("parse statistics from {source}"))?;
    tracing::info!(%source, records = records.len(), "loaded statistics");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tui-choropleth-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    const TOPOLOGY: &str = r#"{"type":"Topology","arcs":[[[0,0],[1,0],[1,1],[0,1],[0,0]]],
        "objects":{"counties":{"type":"GeometryCollection","geometries":[{"type":"Polygon","id":7,"arcs":[[0]]}]},
                   "states":{"type":"GeometryCollection","geometries":[{"type":"Polygon","arcs":[[0]]}]}}}"#;

    #[test]
    fn test_source_parse() {
        assert_eq!(Source::parse("https://x/y.json"), Source::Url("https://x/y.json".into()));
        assert_eq!(Source::parse("data/y.json"), Source::Path(PathBuf::from("data/y.json")));
    }

    #[test]
    fn test_load_from_files() {
        let geo = scratch_file("geo-ok.json", TOPOLOGY);
        let stats = scratch_file(
            "stats-ok.json",
            r#"[{"fips":7,"state":"ZZ","area_name":"Seven","bachelorsOrHigher":12.5}]"#,
        );

        let data = load(&Source::Path(geo), &Source::Path(stats), Duration::from_secs(1)).unwrap();
        assert_eq!(data.geometry.regions.features.len(), 1);
        assert_eq!(data.statistics[0].key, "7");
    }

    #[test]
    fn test_load_fails_as_a_whole() {
        let geo = scratch_file("geo-fail.json", TOPOLOGY);
        let missing = Source::Path(std::env::temp_dir().join("tui-choropleth-does-not-exist.json"));

        let err = load(&Source::Path(geo), &missing, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("does-not-exist"));
    }

    #[test]
    fn test_malformed_payload_fails_the_load() {
        let geo = scratch_file("geo-malformed-ok.json", TOPOLOGY);
        let stats = scratch_file("stats-malformed.json", r#"{"not":"an array"}"#);
        let err = load(&Source::Path(geo.clone()), &Source::Path(stats.clone()), Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("parse statistics"));

        let bad_geo = scratch_file("geo-malformed.json", r#"{"type":"Topology","arcs":"nope"}"#);
        let err = load(&Source::Path(bad_geo), &Source::Path(stats), Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("parse geometry"));
    }
}
