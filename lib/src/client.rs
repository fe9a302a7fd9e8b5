use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    credentials::Credentials,
    error::{self, Error},
    types::{ExchangeError, Kline, KlineRequest},
};

pub const BASE_URL: &str = "https://api.binance.com";
const KLINES_PATH: &str = "/api/v3/klines";

/// Source of historical klines.
///
/// [`Client`] talks to the exchange; tests substitute their own.
pub trait MarketData {
    /// Every kline of `request.interval` opening within
    /// `[request.start_ms, request.end_ms]`, in ascending time order.
    fn get_historical_klines(
        &self,
        request: &KlineRequest,
    ) -> impl Future<Output = Result<Vec<Kline>, Error>> + Send;
}

#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(credentials: &Credentials) -> Result<Self, Error> {
        Self::with_base_url(credentials, BASE_URL)
    }

    pub fn with_base_url(
        credentials: &Credentials,
        base_url: &str,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)
            .map_err(|_| error::Init::InvalidBaseUrl(base_url.to_string()))?;
        let mut api_key = HeaderValue::from_str(&credentials.api_key)
            .map_err(|_| error::Init::InvalidApiKey)?;
        api_key.set_sensitive(true);
        let headers = HeaderMap::from_iter([
            (HeaderName::from_static("x-mbx-apikey"), api_key),
            (header::ACCEPT, HeaderValue::from_static("application/json")),
        ]);
        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(error::Init::ClientInitialization)?;
        Ok(Self { inner, base_url })
    }

    /// A single request; the exchange caps it at `request.limit` klines.
    #[instrument(skip_all, err, fields(symbol = %request.symbol, start_ms = request.start_ms))]
    pub async fn get_klines(
        &self,
        request: &KlineRequest,
    ) -> Result<Vec<Kline>, Error> {
        let url = self
            .base_url
            .join(KLINES_PATH)
            .map_err(error::Api::InvalidUrl)?;
        let query = [
            ("symbol", request.symbol.clone()),
            ("interval", request.interval.clone()),
            ("startTime", request.start_ms.to_string()),
            ("endTime", request.end_ms.to_string()),
            ("limit", request.limit.to_string()),
        ];

        let response = self
            .inner
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(error::Api::SendRequest)?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body =
                response.text().await.map_err(error::Api::SendRequest)?;
            let err = match serde_json::from_str::<ExchangeError>(&body) {
                Ok(ExchangeError { code, msg }) => {
                    error::Api::Exchange { status, code, msg }
                }
                Err(_) => error::Api::UnexpectedStatus { status, body },
            };
            return Err(err.into());
        }
        let klines: Vec<Kline> = response
            .json()
            .await
            .map_err(error::Api::Deserialization)?;
        debug!(status = %status, num_results = klines.len(), "Got response");
        Ok(klines)
    }

    /// Walks `request`'s range one page at a time, each page starting just
    /// after the previous page's last open time.
    fn pages<'a>(
        &'a self,
        request: &'a KlineRequest,
    ) -> BoxStream<'a, Result<Vec<Kline>, Error>> {
        stream::unfold(Some(request.start_ms), move |cursor| async move {
            let Some(start_ms) = cursor else {
                return None;
            };
            let page = KlineRequest {
                start_ms,
                ..request.clone()
            };
            match self.get_klines(&page).await {
                Ok(klines) => {
                    let next = next_cursor(&klines, request.end_ms, request.limit);
                    if next.is_none() {
                        debug!(num_results = klines.len(), "Got final page of data");
                    }
                    Some((Ok(klines), next))
                }
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed()
    }
}

impl MarketData for Client {
    #[instrument(skip_all, err, fields(symbol = %request.symbol, interval = %request.interval))]
    async fn get_historical_klines(
        &self,
        request: &KlineRequest,
    ) -> Result<Vec<Kline>, Error> {
        self.pages(request).try_concat().await
    }
}

/// Where the next page starts, or `None` once the range is exhausted.
fn next_cursor(klines: &[Kline], end_ms: i64, limit: u32) -> Option<i64> {
    if klines.len() < limit as usize {
        return None;
    }
    let next = klines.last()?.open_time + 1;
    (next <= end_ms).then_some(next)
}
