//! Anonymous access to a public S3-compatible bucket (ListObjectsV2 + GetObject over HTTPS).

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::store::{ObjectFetcher, ObjectLister, read_exact_size};
use crate::types::{ListingPage, ObjectRef};
use crate::utils::config::PipelineDefaults;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
    #[serde(default)]
    contents: Vec<Contents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Contents {
    key: String,
    size: u64,
}

/// Parse a ListObjectsV2 XML body into a [`ListingPage`] for `bucket`.
pub fn parse_list_response(bucket: &str, xml: &str) -> Result<ListingPage> {
    let result: ListBucketResult =
        quick_xml::de::from_str(xml).context("parse ListObjectsV2 response")?;
    Ok(ListingPage {
        objects: result
            .contents
            .into_iter()
            .map(|c| ObjectRef::new(bucket, c.key, c.size))
            .collect(),
        continuation: result.next_continuation_token,
        truncated: result.is_truncated,
    })
}

/// Path-style URL `{endpoint}/{segments...}`, each segment percent-encoded.
fn endpoint_url<'a>(endpoint: &Url, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("endpoint {endpoint} cannot be a base URL"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub struct BucketStore {
    client: Client,
    endpoint: Url,
    bucket: String,
}

impl BucketStore {
    pub fn new(bucket: &str, endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid endpoint {endpoint:?}"))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("endpoint {endpoint} cannot be a base URL");
        }
        let client = Client::builder()
            .timeout(PipelineDefaults::HTTP_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.to_string(),
        })
    }

    /// `{endpoint}/{bucket}`: target of listing requests.
    pub fn bucket_url(&self) -> Result<Url> {
        endpoint_url(&self.endpoint, [self.bucket.as_str()])
    }

    /// `{endpoint}/{container}/{key}` with every key segment encoded.
    pub fn object_url(&self, object: &ObjectRef) -> Result<Url> {
        endpoint_url(
            &self.endpoint,
            std::iter::once(object.container.as_str()).chain(object.key.split('/')),
        )
    }
}

impl ObjectLister for BucketStore {
    fn list_page(&self, continuation: Option<&str>, max_keys: usize) -> Result<ListingPage> {
        let mut req = self
            .client
            .get(self.bucket_url()?)
            .query(&[("list-type", "2")])
            .query(&[("max-keys", max_keys.max(1).to_string())]);
        if let Some(token) = continuation {
            req = req.query(&[("continuation-token", token)]);
        }
        let body = req
            .send()
            .context("send list request")?
            .error_for_status()
            .context("list request rejected")?
            .text()
            .context("read list response")?;
        parse_list_response(&self.bucket, &body)
    }

    fn container(&self) -> &str {
        &self.bucket
    }
}

impl ObjectFetcher for BucketStore {
    fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(self.object_url(object)?)
            .send()
            .context("send get request")?
            .error_for_status()
            .context("get request rejected")?;
        read_exact_size(resp, object.size)
    }
}
