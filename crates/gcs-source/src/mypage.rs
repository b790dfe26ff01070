//! HTTP-backed [`RecordSource`] for the player "mypage" JSON API.
//!
//! Two endpoints are read:
//! - `GET {base}/music_list.php`: every played record, most recent first
//! - `GET {base}/music_detail.php?music_id=<id>`: per-tier results of one record
//!
//! Login is not handled here. When a session cookie is configured it is sent
//! verbatim; it is never logged.

use gcs_schemas::{RecordId, RecordSummary, Snapshot, TierResult, Tiers};
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::{RecordSource, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://mypage.groovecoaster.jp/sp/json";

#[derive(Clone)]
pub struct MypageSource {
    http: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl std::fmt::Debug for MypageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MypageSource")
            .field("base_url", &self.base_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl MypageSource {
    pub fn new(session_cookie: Option<String>) -> Self {
        Self::new_with_base_url(session_cookie, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(session_cookie: Option<String>, base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            session_cookie,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// GET `endpoint` and decode the JSON body. `None` means the service said 404.
    fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, SourceError> {
        let mut req = self.http.get(self.url(endpoint)).query(query);
        if let Some(cookie) = &self.session_cookie {
            req = req.header(COOKIE, cookie.as_str());
        }

        let resp = req
            .send()
            .map_err(|e| SourceError::Unavailable(format!("{endpoint} request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "{endpoint} http error status={}",
                status.as_u16()
            )));
        }

        let body = resp
            .json::<T>()
            .map_err(|e| SourceError::Decode(format!("{endpoint} json decode failed: {e}")))?;
        Ok(Some(body))
    }
}

impl RecordSource for MypageSource {
    fn name(&self) -> &'static str {
        "mypage"
    }

    fn list_summaries(&self) -> Result<Vec<RecordSummary>, SourceError> {
        let body: MusicListResponse = self
            .get_json("music_list.php", &[])?
            .ok_or_else(|| SourceError::Unavailable("music_list.php answered 404".to_string()))?;
        body.check_status()?;

        let list = body.music_list.unwrap_or_default();
        debug!(count = list.len(), "music list fetched");

        Ok(list
            .into_iter()
            .map(|m| RecordSummary::new(m.music_id, m.music_title, m.last_play_time))
            .collect())
    }

    fn fetch_detail(&self, id: &RecordId) -> Result<Snapshot, SourceError> {
        let body: MusicDetailResponse = self
            .get_json("music_detail.php", &[("music_id", id.as_str())])?
            .ok_or_else(|| SourceError::NotFound(id.clone()))?;
        body.check_status()?;

        let detail = body
            .music_detail
            .ok_or_else(|| SourceError::NotFound(id.clone()))?;
        Ok(detail.into_snapshot())
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MusicListResponse {
    #[serde(default)]
    status: i64,
    music_list: Option<Vec<MusicListEntry>>,
}

#[derive(Debug, Deserialize)]
struct MusicListEntry {
    music_id: i64,
    music_title: String,
    last_play_time: String,
}

#[derive(Debug, Deserialize)]
struct MusicDetailResponse {
    #[serde(default)]
    status: i64,
    music_detail: Option<MusicDetail>,
}

#[derive(Debug, Deserialize)]
struct MusicDetail {
    music_id: i64,
    music_title: String,
    #[serde(default)]
    ex_flag: i64,
    simple_result_data: Option<ResultData>,
    normal_result_data: Option<ResultData>,
    hard_result_data: Option<ResultData>,
    extra_result_data: Option<ResultData>,
}

/// Unplayed tiers arrive as `null`; flags arrive as `0`/`1`.
#[derive(Debug, Default, Deserialize)]
struct ResultData {
    #[serde(default)]
    play_count: u64,
    #[serde(default)]
    score: u64,
    #[serde(default)]
    max_chain: u64,
    #[serde(default)]
    perfect: i64,
    #[serde(default)]
    full_chain: i64,
    #[serde(default)]
    no_miss: i64,
}

fn check_status(endpoint: &str, status: i64) -> Result<(), SourceError> {
    // Non-zero status is how the service reports an expired or missing session.
    if status != 0 {
        return Err(SourceError::Unavailable(format!(
            "{endpoint} returned status={status}"
        )));
    }
    Ok(())
}

impl MusicListResponse {
    fn check_status(&self) -> Result<(), SourceError> {
        check_status("music_list.php", self.status)
    }
}

impl MusicDetailResponse {
    fn check_status(&self) -> Result<(), SourceError> {
        check_status("music_detail.php", self.status)
    }
}

impl ResultData {
    fn into_result(self) -> TierResult {
        TierResult {
            play_count: self.play_count,
            score: self.score,
            max_chain: self.max_chain,
            perfect: self.perfect == 1,
            full_chain: self.full_chain == 1,
            no_miss: self.no_miss == 1,
        }
    }
}

fn tier(data: Option<ResultData>) -> TierResult {
    data.map(ResultData::into_result).unwrap_or_default()
}

impl MusicDetail {
    fn into_snapshot(self) -> Snapshot {
        let has_extra_tier = self.ex_flag == 1;
        let extra = if has_extra_tier {
            Some(tier(self.extra_result_data))
        } else {
            None
        };

        Snapshot {
            id: RecordId::from(self.music_id),
            title: self.music_title,
            has_extra_tier,
            tiers: Tiers {
                simple: tier(self.simple_result_data),
                normal: tier(self.normal_result_data),
                hard: tier(self.hard_result_data),
                extra,
            },
        }
    }
}
