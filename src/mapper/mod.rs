//! Mappers: SELECT generation plus chunked execution.
//!
//! - [`builder`] - graph + query → [`SelectBuilder`], with extension hooks
//! - [`chunk`] - id-list partitioning and result aggregation
//! - [`connection`] - the execution capability supplied by the caller
//!
//! A [`Mapper`] owns the resolved reference graph of its entity type. Each
//! request is executed once, or, when the configured chunk path yields more
//! ids than `max_chunk_size`, once per chunk on a deep clone of the query
//! with the chunk's ids written back through the path:
//!
//! ```text
//!   query ──► chunk path ──► ≤ max? ──yes──► build ─► notify ─► connect ─► query
//!                              │
//!                              no
//!                              ▼
//!              partition ─► clone + rebind per chunk ─► (build ─► … ─► query)*
//!                                                             │
//!                                                   concat in chunk order
//! ```

pub mod builder;
pub mod chunk;
pub mod connection;

use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::try_join_all;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::config::MapperSettings;
use crate::entity::{resolve, resolve_graph, Entity, EntityDescriptor, ReferenceGraph};
use crate::error::{ExecuteError, MappingResult};
use crate::query::{clone_with, CloneOptions, PropertyPath, QuerySpec};
use crate::sql::{SelectBuilder, Statement};

pub use builder::{build_select, IdFilter, NoExtension, Scope, SelectExtension};
pub use connection::{AsyncConnection, AsyncConnector, Connection, Connector};

/// Maps query specs of type `Q` to rows of `T`.
///
/// `X` customizes the generated SELECT; see [`SelectExtension`].
pub struct Mapper<T, Q, X = NoExtension> {
    settings: MapperSettings,
    graph: Arc<ReferenceGraph>,
    chunk_on: Option<PropertyPath<Q>>,
    extension: X,
    _rows: PhantomData<fn() -> T>,
}

impl<T: Entity, Q: QuerySpec> Mapper<T, Q, NoExtension> {
    /// Mapper over `T`'s own table, without joins.
    pub fn new(settings: MapperSettings) -> MappingResult<Self> {
        let root = resolve::<T>()?;
        Self::from_graph(settings, ReferenceGraph::single(root))
    }

    /// Mapper over `T` and every table reachable through its references.
    /// `T` must be declared as a join-tree root.
    pub fn with_references(settings: MapperSettings) -> MappingResult<Self> {
        Self::from_graph(settings, resolve_graph::<T>()?)
    }

    fn from_graph(settings: MapperSettings, graph: ReferenceGraph) -> MappingResult<Self> {
        graph.validate_aliases()?;

        debug!(
            entity = graph.root().entity(),
            table = graph.root().table_name(),
            joins = graph.len(),
            max_chunk_size = settings.max_chunk_size.get(),
            "mapper initialized"
        );

        Ok(Self {
            settings,
            graph: Arc::new(graph),
            chunk_on: None,
            extension: NoExtension,
            _rows: PhantomData,
        })
    }
}

impl<T, Q, X> Mapper<T, Q, X> {
    /// Replace the SELECT extension.
    pub fn with_extension<Y>(self, extension: Y) -> Mapper<T, Q, Y> {
        Mapper {
            settings: self.settings,
            graph: self.graph,
            chunk_on: self.chunk_on,
            extension,
            _rows: PhantomData,
        }
    }

    /// Split requests on the id sequence at `path`.
    pub fn chunk_on(mut self, path: PropertyPath<Q>) -> Self {
        self.chunk_on = Some(path);
        self
    }

    pub fn set_chunk_on(&mut self, path: PropertyPath<Q>) -> &mut Self {
        self.chunk_on = Some(path);
        self
    }

    pub fn chunk_path(&self) -> Option<&PropertyPath<Q>> {
        self.chunk_on.as_ref()
    }

    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    pub fn root(&self) -> &EntityDescriptor {
        self.graph.root()
    }

    pub fn extension(&self) -> &X {
        &self.extension
    }
}

impl<T, Q, X> Mapper<T, Q, X>
where
    Q: QuerySpec,
    X: SelectExtension<Q>,
{
    /// The SELECT for `query`, before the notification fires.
    pub fn build_select(&self, query: &Q) -> SelectBuilder {
        build_select(&self.graph, query, &self.extension)
    }

    /// The statement one execution of `query` sends, notification included.
    pub fn statement(&self, query: &Q) -> Statement {
        let mut builder = self.build_select(query);
        query.after_builder_initialized(&mut builder);

        let statement = builder.build();
        debug!(sql = %statement.sql, params = statement.params.len(), "built statement");
        statement
    }

    /// Per-chunk queries, or `None` when the request runs as one statement.
    ///
    /// That is the case when no chunk path is set or the sequence fits in
    /// `max_chunk_size`. It is also the fallback, logged with `warn!`, when
    /// the path does not resolve on `query` or its setter rejects the values
    /// of any chunk.
    pub fn chunk_queries(&self, query: &Q) -> Option<Vec<Q>> {
        let path = self.chunk_on.as_ref()?;
        let Some(values) = path.get(query) else {
            warn!(path = path.path(), "chunk path did not resolve, executing unchunked");
            return None;
        };

        let max_chunk_size = self.settings.max_chunk_size;
        if !chunk::needs_chunking(values.len(), max_chunk_size) {
            return None;
        }

        let chunks = chunk::partition(values, max_chunk_size);
        debug!(
            path = path.path(),
            values = values.len(),
            chunks = chunks.len(),
            "splitting query into chunks"
        );

        let queries: Option<Vec<Q>> = chunks
            .into_iter()
            .map(|values| Self::rebind(query, path, values))
            .collect();
        if queries.is_none() {
            warn!(path = path.path(), "could not rebind chunk values, executing unchunked");
        }
        queries
    }

    fn rebind(query: &Q, path: &PropertyPath<Q>, values: Vec<i32>) -> Option<Q> {
        let mut copy = clone_with(query, &CloneOptions::deep());
        path.set(&mut copy, values).then_some(copy)
    }

    // =========================================================================
    // Blocking execution
    // =========================================================================

    fn execute<C: Connector<T>>(&self, query: &Q, connector: &C) -> Result<Vec<T>, C::Error> {
        let statement = self.statement(query);
        let mut connection = connector.connect(&self.settings.connection_string)?;
        connection.query(&statement)
    }

    fn execute_chunks<C>(&self, queries: &[Q], connector: &C) -> Result<Vec<Vec<T>>, C::Error>
    where
        T: Send,
        C: Connector<T>,
    {
        queries
            .par_iter()
            .enumerate()
            .map(|(index, query)| -> Result<Vec<T>, C::Error> {
                let rows = self.execute(query, connector)?;
                trace!(chunk = index, rows = rows.len(), "chunk completed");
                Ok(rows)
            })
            .collect()
    }

    /// Execute `query`, splitting it into concurrently executed chunks when
    /// its chunk sequence is too long. Rows come back in chunk order.
    ///
    /// The first failing chunk fails the whole request.
    pub fn get_results<C>(&self, query: &Q, connector: &C) -> Result<Vec<T>, C::Error>
    where
        T: Send,
        C: Connector<T>,
    {
        match self.chunk_queries(query) {
            Some(queries) => Ok(chunk::concat(self.execute_chunks(&queries, connector)?)),
            None => self.execute(query, connector),
        }
    }

    /// Like [`get_results`](Self::get_results), keeping only the first
    /// occurrence of rows repeated across or within chunks.
    pub fn get_results_distinct<C>(&self, query: &Q, connector: &C) -> Result<Vec<T>, C::Error>
    where
        T: Send + Eq + Hash,
        C: Connector<T>,
    {
        match self.chunk_queries(query) {
            Some(queries) => Ok(chunk::union(self.execute_chunks(&queries, connector)?)),
            None => Ok(chunk::union(vec![self.execute(query, connector)?])),
        }
    }

    /// First row of a single, unchunked execution.
    pub fn get_single_result<C>(&self, query: &Q, connector: &C) -> Result<Option<T>, C::Error>
    where
        C: Connector<T>,
    {
        Ok(self.execute(query, connector)?.into_iter().next())
    }

    // =========================================================================
    // Async execution
    // =========================================================================

    async fn execute_async<C>(&self, query: &Q, connector: &C) -> Result<Vec<T>, C::Error>
    where
        T: Send,
        C: AsyncConnector<T>,
    {
        let statement = self.statement(query);
        let mut connection = connector.connect(&self.settings.connection_string).await?;
        connection.query(&statement).await
    }

    async fn execute_chunks_async<C>(
        &self,
        queries: &[Q],
        connector: &C,
    ) -> Result<Vec<Vec<T>>, C::Error>
    where
        T: Send,
        C: AsyncConnector<T>,
    {
        let chunks = queries.iter().enumerate().map(|(index, query)| async move {
            let rows = self.execute_async(query, connector).await?;
            trace!(chunk = index, rows = rows.len(), "chunk completed");
            Ok::<_, C::Error>(rows)
        });

        try_join_all(chunks).await
    }

    /// Async [`get_results`](Self::get_results). Chunks run concurrently on
    /// the calling task.
    pub async fn get_results_async<C>(&self, query: &Q, connector: &C) -> Result<Vec<T>, C::Error>
    where
        T: Send,
        C: AsyncConnector<T>,
    {
        match self.chunk_queries(query) {
            Some(queries) => Ok(chunk::concat(
                self.execute_chunks_async(&queries, connector).await?,
            )),
            None => self.execute_async(query, connector).await,
        }
    }

    /// Async [`get_results_distinct`](Self::get_results_distinct).
    pub async fn get_results_distinct_async<C>(
        &self,
        query: &Q,
        connector: &C,
    ) -> Result<Vec<T>, C::Error>
    where
        T: Send + Eq + Hash,
        C: AsyncConnector<T>,
    {
        match self.chunk_queries(query) {
            Some(queries) => Ok(chunk::union(
                self.execute_chunks_async(&queries, connector).await?,
            )),
            None => Ok(chunk::union(vec![self.execute_async(query, connector).await?])),
        }
    }

    /// Async [`get_single_result`](Self::get_single_result).
    pub async fn get_single_result_async<C>(
        &self,
        query: &Q,
        connector: &C,
    ) -> Result<Option<T>, C::Error>
    where
        T: Send,
        C: AsyncConnector<T>,
    {
        Ok(self.execute_async(query, connector).await?.into_iter().next())
    }

    /// [`get_results_async`](Self::get_results_async) raced against `cancel`.
    ///
    /// When `cancel` completes first, every in-flight chunk is dropped and
    /// [`ExecuteError::Cancelled`] is returned.
    pub async fn get_results_cancellable<C, F>(
        &self,
        query: &Q,
        connector: &C,
        cancel: F,
    ) -> Result<Vec<T>, ExecuteError<C::Error>>
    where
        T: Send,
        C: AsyncConnector<T>,
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                debug!(entity = self.root().entity(), "query cancelled");
                Err(ExecuteError::Cancelled)
            }
            result = self.get_results_async(query, connector) => {
                result.map_err(ExecuteError::Execution)
            }
        }
    }
}
