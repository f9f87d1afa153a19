use serde::{Deserialize, Deserializer};

use crate::feed::NormalizedRecord;

pub const ID_PREFIX: &str = "CVE-";
pub const DETAIL_URL: &str = "https://nvd.nist.gov/vuln/detail";
pub const NO_SUMMARY: &str = "No summary provided.";

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Description {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CvssData {
    #[serde(rename = "baseScore", default, deserialize_with = "lenient_score")]
    pub base_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CvssMetric {
    #[serde(rename = "cvssData", default)]
    pub cvss_data: Option<CvssData>,
}

/// Scoring blocks, one list per CVSS version. The API may report more than
/// one scoring source per version, the primary one comes first.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Metrics {
    #[serde(rename = "cvssMetricV31", default, deserialize_with = "null_as_default")]
    pub metric_v31: Vec<CvssMetric>,
    #[serde(rename = "cvssMetricV30", default, deserialize_with = "null_as_default")]
    pub metric_v30: Vec<CvssMetric>,
    #[serde(rename = "cvssMetricV2", default, deserialize_with = "null_as_default")]
    pub metric_v2: Vec<CvssMetric>,
}

/// `null` is as good as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Scores come as numbers, but a numeric string is accepted too. Anything
/// else counts as no score rather than a broken record.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score.filter(|s| s.is_finite()))
}

impl Metrics {
    /// First available base score, looking at v3.1, v3.0 and v2.0 in this
    /// order. Only the first entry of each version is considered.
    pub fn base_score(&self) -> Option<f64> {
        [&self.metric_v31, &self.metric_v30, &self.metric_v2]
            .into_iter()
            .find_map(|group| group.first()?.cvss_data.as_ref()?.base_score)
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Info {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub descriptions: Vec<Description>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: Metrics,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[allow(clippy::upper_case_acronyms)]
pub struct CVE {
    #[serde(default)]
    pub cve: Info,
}

impl CVE {
    /// Trimmed identifier, only if it looks like a CVE id.
    pub fn id(&self) -> Option<&str> {
        self.cve
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| id.starts_with(ID_PREFIX))
    }

    /// English description, the first one wins.
    pub fn summary(&self) -> Option<&str> {
        self.cve
            .descriptions
            .iter()
            .find(|desc| desc.lang.as_deref() == Some("en"))
            .and_then(|desc| desc.value.as_deref())
            .filter(|value| !value.is_empty())
    }

    pub fn published(&self) -> &str {
        self.cve.published.as_deref().unwrap_or_default()
    }

    pub fn cvss(&self) -> Option<f64> {
        self.cve.metrics.base_score()
    }
}

pub fn detail_url(id: &str) -> String {
    format!("{}/{}", DETAIL_URL, id)
}

/// Maps one raw `vulnerabilities` entry to a feed record.
///
/// Returns `None` for entries that can't be decoded or don't carry a valid
/// CVE id.
pub fn normalize(item: &serde_json::Value) -> Option<NormalizedRecord> {
    let raw: CVE = match CVE::deserialize(item) {
        Ok(raw) => raw,
        Err(e) => {
            log::debug!("skipping undecodable record: {}", e);
            return None;
        }
    };

    let Some(id) = raw.id() else {
        log::debug!("skipping record with invalid id {:?}", raw.cve.id);
        return None;
    };

    Some(NormalizedRecord {
        id: id.to_string(),
        summary: raw.summary().unwrap_or(NO_SUMMARY).to_string(),
        published: raw.published().to_string(),
        cvss: raw.cvss(),
        url: detail_url(id),
    })
}
