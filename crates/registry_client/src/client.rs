//! Person registry HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Persons are pulled a
//! page at a time with offset paging and handed out one by one; reports go
//! back as a PATCH on the person.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use thiserror::Error;

use idmatch_recon::{FetchError, PersonRecord, Registry, Report, SubmitError};

use crate::auth::RegistryCredentials;
use crate::wire::{PatchBody, PersonsPage, WirePerson};

/// The registry numbers its first person 1, not 0.
const FIRST_OFFSET: u64 = 1;

/// Client construction failed. Nothing was sent.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("registry token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("registry api_base {0:?} is not an http(s) base URL")]
    InvalidApiBase(String),
    #[error("could not build HTTP client: {0}")]
    Build(String),
    #[error("could not open person archive {path}: {message}")]
    Archive { path: PathBuf, message: String },
}

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Persons requested per `GET /persons`.
    pub page_size: u32,
    pub timeout: Duration,
    /// Append every fetched person, as received, to this JSONL file.
    pub archive: Option<PathBuf>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            timeout: Duration::from_secs(30),
            archive: None,
        }
    }
}

/// Registry API client (blocking).
///
/// Holds the paging cursor, so one client is one pass over the registry.
pub struct RegistryClient {
    http: reqwest::blocking::Client,
    api_base: String,
    base_url: Url,
    page_size: u32,
    offset: u64,
    buffered: VecDeque<serde_json::Value>,
    exhausted: bool,
    archive: Option<BufWriter<File>>,
}

impl RegistryClient {
    pub fn new(creds: &RegistryCredentials, opts: RegistryOptions) -> Result<Self, ClientError> {
        let base_url = Url::parse(&creds.api_base)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidApiBase(creds.api_base.clone()))?;

        let mut auth = HeaderValue::from_str(&creds.authorization())
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("idmatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let archive = match opts.archive {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| ClientError::Archive { path: path.clone(), message: e.to_string() })?;
                log::info!("archiving fetched persons to {}", path.display());
                Some(BufWriter::new(file))
            }
            None => None,
        };

        Ok(Self {
            http,
            api_base: creds.api_base.clone(),
            base_url,
            page_size: opts.page_size.max(1),
            offset: FIRST_OFFSET,
            buffered: VecDeque::new(),
            exhausted: false,
            archive,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `api_base` plus path segments, each percent-encoded as one segment so
    /// an id like `a/b` stays a single path component.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn fetch_page(&mut self) -> Result<(), FetchError> {
        let url = self.endpoint(&["persons"]);
        log::debug!("GET {url} offset={} limit={}", self.offset, self.page_size);

        let response = self
            .http
            .get(url)
            .query(&[
                ("limit", self.page_size.to_string()),
                ("offset", self.offset.to_string()),
                ("start", FIRST_OFFSET.to_string()),
            ])
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Http { status: status.as_u16(), body });
        }

        let page: PersonsPage = response
            .json()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        match page.persons {
            Some(persons) if !persons.is_empty() => {
                log::debug!("registry page at offset {} held {} persons", self.offset, persons.len());
                self.offset += u64::from(self.page_size);
                self.buffered.extend(persons);
            }
            _ => {
                log::info!("registry exhausted at offset {}", self.offset);
                self.exhausted = true;
            }
        }
        Ok(())
    }

    fn archive(&mut self, raw: &serde_json::Value) -> Result<(), FetchError> {
        let Some(out) = self.archive.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *out, raw)
            .map_err(|e| FetchError::Archive(e.to_string()))?;
        out.write_all(b"\n")
            .and_then(|_| out.flush())
            .map_err(|e| FetchError::Archive(e.to_string()))
    }
}

impl Registry for RegistryClient {
    fn fetch_next_person(&mut self) -> Result<Option<PersonRecord>, FetchError> {
        while self.buffered.is_empty() && !self.exhausted {
            self.fetch_page()?;
        }

        let Some(raw) = self.buffered.pop_front() else {
            return Ok(None);
        };

        self.archive(&raw)?;

        let person: WirePerson = serde_json::from_value(raw)
            .map_err(|e| FetchError::Malformed(format!("person object: {e}")))?;
        Ok(Some(person.into()))
    }

    fn submit_report(&mut self, person_id: &str, report: &Report) -> Result<(), SubmitError> {
        let url = self.endpoint(&["persons", person_id]);
        let body = PatchBody::from(report);
        log::debug!("PATCH {url} status={}", body.person.status);

        let response = self
            .http
            .patch(url)
            .json(&body)
            .send()
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SubmitError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}
