//! Running queries in a project context
//!
//! A [`Dataset`] pairs a query service with the project/namespace it talks
//! to and the paging settings from [`Config`]. Running a query returns the
//! first page wrapped in [`QueryResults`], ready to be continued.

use tracing::info;

use crate::config::{Config, PagingConfig};
use crate::error::Result;
use crate::query::{Query, QueryContext};
use crate::results::{AsyncContinuation, AsyncQueryResults, Continuation, QueryResults};
use crate::service::{AsyncQueryService, QueryService};

/// Blocking entry point for running paginated queries
#[derive(Debug, Clone)]
pub struct Dataset<S> {
    service: S,
    context: QueryContext,
    paging: PagingConfig,
}

impl<S: QueryService> Dataset<S> {
    pub fn new(service: S, context: QueryContext) -> Self {
        Self {
            service,
            context,
            paging: PagingConfig::default(),
        }
    }

    /// Build a dataset from validated configuration
    pub fn from_config(service: S, config: &Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Using project '{}' (namespace: {})",
            config.project.project_id,
            config.project.namespace.as_deref().unwrap_or("default")
        );
        Ok(Self {
            service,
            context: QueryContext::from_config(&config.project),
            paging: config.paging.clone(),
        })
    }

    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Start a query over `kind`
    pub fn query(&self, kind: impl Into<String>) -> Query {
        Query::new().kind(kind)
    }

    /// Run `query` and return its first page
    ///
    /// # Returns
    /// * `Result<QueryResults<'_, S>>` - First page with its continuation,
    ///   or the service's error
    pub fn run(&self, query: Query) -> Result<QueryResults<'_, S>> {
        let continuation = Continuation::new(&self.service, self.context.clone());
        let page = continuation.run(query)?;
        Ok(QueryResults::new(page, continuation).with_request_limit(self.paging.request_limit))
    }
}

/// Async entry point for running paginated queries
#[derive(Debug, Clone)]
pub struct AsyncDataset<S> {
    service: S,
    context: QueryContext,
    paging: PagingConfig,
}

impl<S: AsyncQueryService> AsyncDataset<S> {
    pub fn new(service: S, context: QueryContext) -> Self {
        Self {
            service,
            context,
            paging: PagingConfig::default(),
        }
    }

    /// Build a dataset from validated configuration
    pub fn from_config(service: S, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            service,
            context: QueryContext::from_config(&config.project),
            paging: config.paging.clone(),
        })
    }

    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn query(&self, kind: impl Into<String>) -> Query {
        Query::new().kind(kind)
    }

    /// Run `query` and return its first page
    pub async fn run(&self, query: Query) -> Result<AsyncQueryResults<'_, S>> {
        let continuation = AsyncContinuation::new(&self.service, self.context.clone())
            .with_request_limit(self.paging.request_limit);
        let page = continuation.run(query).await?;
        Ok(AsyncQueryResults::new(page, continuation))
    }
}
