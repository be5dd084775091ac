//! Round trips through a caller-supplied search backend.

use std::future::Future;

use anyhow::Context as _;
use common::{
    search_query::{PageRequest, SearchRequest},
    search_response::SearchResponse,
};
use serde_json::Value;

use super::{ChangeScope, QueryContext, QueryEvent};

/// Sends a compiled request to whatever answers searches and returns the raw response.
pub trait SearchTransport {
    fn search(&self, request: &SearchRequest) -> impl Future<Output = anyhow::Result<Value>> + Send;
}

/// What a fetched page does to the results already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Replace,
    Append,
}

impl QueryContext {
    /// Compiles, sends and applies one search. `loading` is set for the duration and
    /// cleared whatever the outcome. Taking `&mut self` keeps fetches from overlapping.
    pub async fn fetch<T: SearchTransport>(
        &mut self,
        transport: &T,
        page: Option<PageRequest>,
        mode: FetchMode,
    ) -> anyhow::Result<()> {
        let request = self.build_search(page).context("compiling search request")?;
        self.set_loading(true);
        let outcome = self.round_trip(transport, &request, mode).await;
        self.set_loading(false);
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "search failed");
            self.listeners.emit(QueryEvent::FetchFailed { message: format!("{e:#}") }, ChangeScope::Results);
        }
        outcome
    }

    async fn round_trip<T: SearchTransport>(
        &mut self,
        transport: &T,
        request: &SearchRequest,
        mode: FetchMode,
    ) -> anyhow::Result<()> {
        let response = transport.search(request).await?;
        self.apply_response(response, mode).context("applying search response")?;
        Ok(())
    }

    pub async fn fetch_first_page<T: SearchTransport>(&mut self, transport: &T) -> anyhow::Result<()> {
        let page = self.first_page_request();
        tracing::info!(size = page.size, "fetching first page");
        self.fetch(transport, Some(page), FetchMode::Replace).await
    }

    /// Appends the next page. Does nothing once every result is held.
    pub async fn fetch_next_page<T: SearchTransport>(&mut self, transport: &T) -> anyhow::Result<()> {
        if !self.has_next_page() {
            tracing::debug!(total = self.total_results(), "no further page");
            return Ok(());
        }
        let page = self.next_page_request();
        tracing::info!(from = page.from, size = page.size, "fetching next page");
        self.fetch(transport, Some(page), FetchMode::Append).await
    }

    /// Re-counts the facets of one filter without touching results.
    pub async fn refresh_facets<T: SearchTransport>(&mut self, transport: &T, fieldname: &str) -> anyhow::Result<()> {
        let request = self.build_facet_search(fieldname).context("compiling facet request")?;
        let response = transport.search(&request).await?;
        let response: SearchResponse = serde_json::from_value(response).context("decoding facet response")?;
        let filter = self.filter_mut(fieldname)?;
        filter.refresh(&response)?;
        let count = filter.available_facets().len();
        tracing::debug!(fieldname, count, "refreshed facets");
        self.listeners.emit(
            QueryEvent::FacetsRefreshed { fieldname: fieldname.to_string(), count },
            ChangeScope::Filters,
        );
        Ok(())
    }
}
