use std::time::Duration;

use reqwest::header::{HeaderValue, InvalidHeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;

pub mod nist;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not create http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid user agent: {0}")]
    UserAgent(#[source] InvalidHeaderValue),
    #[error("error requesting {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One page of the NVD CVE API 2.0.
///
/// Vulnerabilities are kept as raw json so that a single malformed record
/// does not invalidate the whole page.
#[derive(Debug, Default, Deserialize)]
pub struct CveResponse {
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub vulnerabilities: Vec<serde_json::Value>,
}

/// Anything able to answer a CVE API query url with a decoded page.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<CveResponse, Error>;
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
    user_agent: HeaderValue,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let user_agent = HeaderValue::from_str(user_agent).map_err(Error::UserAgent)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Some(timeout))
            .build()
            .map_err(Error::Client)?;

        Ok(Self { client, user_agent })
    }

    fn request(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(url)
            .header(USER_AGENT, self.user_agent.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }
}

impl PageSource for HttpClient {
    fn fetch(&self, url: &str) -> Result<CveResponse, Error> {
        log::debug!("fetching {} ...", url);

        let res = self.request(url).send().map_err(|source| Error::Request {
            url: url.to_string(),
            source,
        })?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = res.text().map_err(|source| Error::Request {
            url: url.to_string(),
            source,
        })?;

        decode(url, &body)
    }
}

pub(crate) fn decode(url: &str, body: &str) -> Result<CveResponse, Error> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}
