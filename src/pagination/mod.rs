//! Cursor-driven, budget-bounded iteration over collection endpoints.
//!
//! A [`Paginator`] requests pages lazily through the request pipeline,
//! follows `links.next`, and never yields more than its limit.

mod pages;

pub use pages::{PageDecoder, PlayerPage, ServerPage, SessionPage};

use crate::error::Result;
use crate::http::{HttpClient, RequestOptions, Route, Transport};
use crate::types::Params;
use futures::stream::{self, Stream};
use log::{debug, warn};
use serde_json::Value;

/// Largest page the service will return.
pub const MAX_PAGE_SIZE: usize = 100;
pub const PAGE_SIZE_PARAM: &str = "page[size]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// Nothing requested yet; holds the caller's filters.
    NotStarted(Params),
    /// Parameters parsed from the last `links.next`.
    Next(Params),
    Exhausted,
}

/// Lazy sequence of decoded records from a paginated endpoint.
pub struct Paginator<'a, T: Transport, D: PageDecoder> {
    http: &'a HttpClient<T>,
    route: Route,
    decoder: D,
    remaining: usize,
    cursor: Cursor,
    // Reversed so `pop` yields server order.
    page: Vec<D::Item>,
}

impl<'a, T: Transport, D: PageDecoder> Paginator<'a, T, D> {
    pub fn new(http: &'a HttpClient<T>, route: Route, params: Params, limit: usize, decoder: D) -> Self {
        let cursor = if limit == 0 {
            Cursor::Exhausted
        } else {
            Cursor::NotStarted(params)
        };
        Self {
            http,
            route,
            decoder,
            remaining: limit,
            cursor,
            page: Vec::new(),
        }
    }

    /// Records still allowed to be fetched.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// True once no buffered records remain and no further page will be requested.
    pub fn is_exhausted(&self) -> bool {
        self.page.is_empty() && self.cursor == Cursor::Exhausted
    }

    /// The next record, fetching a page when the buffer is empty.
    ///
    /// A failed page request leaves the cursor in place, so calling again
    /// retries the same page.
    pub async fn next(&mut self) -> Result<Option<D::Item>> {
        if let Some(item) = self.page.pop() {
            return Ok(Some(item));
        }
        let params = match &self.cursor {
            Cursor::NotStarted(p) | Cursor::Next(p) => p.clone(),
            Cursor::Exhausted => return Ok(None),
        };
        self.request_page(params).await?;
        Ok(self.page.pop())
    }

    async fn request_page(&mut self, mut params: Params) -> Result<()> {
        let size = self.remaining.min(MAX_PAGE_SIZE);
        params.insert(PAGE_SIZE_PARAM, size);
        debug!("requesting {} records from {}", size, self.route);

        let doc = self
            .http
            .request_json(
                &self.route,
                RequestOptions {
                    params: Some(&params),
                    ..Default::default()
                },
            )
            .await?;
        let mut page = self.decoder.decode_page(&doc)?;

        let mut next = if page.is_empty() {
            None
        } else {
            // The page itself is good; a broken link only ends the sequence.
            next_params(&doc).unwrap_or_else(|e| {
                warn!("{}: ending pagination: {}", self.route, e);
                None
            })
        };

        page.truncate(self.remaining);
        self.remaining -= page.len();
        if self.remaining == 0 {
            next = None;
        }

        page.reverse();
        self.page = page;
        self.cursor = match next {
            Some(p) => Cursor::Next(p),
            None => Cursor::Exhausted,
        };
        Ok(())
    }

    /// Drive the sequence to the end and collect it in server order.
    pub async fn flatten(mut self) -> Result<Vec<D::Item>> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await? {
            out.push(item);
        }
        Ok(out)
    }

    /// Item-level view as a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<D::Item>> + 'a
    where
        D: 'a,
    {
        stream::try_unfold(self, |mut pager| async move {
            Ok(pager.next().await?.map(|item| (item, pager)))
        })
    }
}

/// Parameters for the following page, parsed from `links.next`.
fn next_params(doc: &Value) -> Result<Option<Params>> {
    let Some(next) = doc
        .get("links")
        .and_then(|l| l.get("next"))
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };
    let url = url::Url::parse(next).map_err(|e| {
        crate::error::Error::decode(format!("bad links.next {:?}: {}", next, e))
    })?;
    Ok(Some(Params::from_pairs(url.query_pairs().into_owned())))
}
