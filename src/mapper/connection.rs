//! Statement execution capability supplied by the caller's driver.
//!
//! A mapper never talks to a database itself. It builds a [`Statement`],
//! asks a connector for a connection and hands the statement over; row
//! materialization belongs to the driver.

use async_trait::async_trait;

use crate::sql::Statement;

/// An open connection that can run a SELECT and materialize rows of `T`.
pub trait Connection<T> {
    type Error;

    fn query(&mut self, statement: &Statement) -> Result<Vec<T>, Self::Error>;
}

/// Opens blocking connections. Shared across worker threads while chunks run.
pub trait Connector<T>: Sync {
    type Error: Send;
    type Connection: Connection<T, Error = Self::Error>;

    fn connect(&self, connection_string: &str) -> Result<Self::Connection, Self::Error>;
}

/// Async counterpart of [`Connection`].
#[async_trait]
pub trait AsyncConnection<T: Send>: Send {
    type Error: Send;

    async fn query(&mut self, statement: &Statement) -> Result<Vec<T>, Self::Error>;
}

/// Async counterpart of [`Connector`].
#[async_trait]
pub trait AsyncConnector<T: Send>: Send + Sync {
    type Error: Send;
    type Connection: AsyncConnection<T, Error = Self::Error>;

    async fn connect(&self, connection_string: &str) -> Result<Self::Connection, Self::Error>;
}
