use super::RawKey;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// One row of the statistic dataset
#[derive(Clone, Debug, PartialEq)]
pub struct StatisticRecord {
    /// Join key, matches a region feature id
    pub key: String,
    pub name: String,
    pub group: String,
    pub metric: f64,
}

#[derive(Deserialize)]
struct RawRecord {
    fips: RawKey,
    state: String,
    area_name: String,
    #[serde(rename = "bachelorsOrHigher")]
    bachelors_or_higher: f64,
}

/// Parse the education array, keeping its order
pub fn parse_statistics(bytes: &mut [u8]) -> Result<Vec<StatisticRecord>> {
    let raw: Vec<RawRecord> =
        simd_json::serde::from_slice(bytes).context("statistics payload is not an array of education records")?;

    if raw.is_empty() {
        bail!("statistics payload contains no records");
    }

    Ok(raw
        .into_iter()
        .map(|r| StatisticRecord {
            key: r.fips.to_key(),
            name: r.area_name,
            group: r.state,
            metric: r.bachelors_or_higher,
        })
        .collect())
}
