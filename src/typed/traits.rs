//! The handle surface the query layer is bound to.

use tokio_postgres::Client;

use crate::queries::Queries;

use super::core::{Idle, InTx, PgConnection};

/// Anything that can run a statement: an idle (auto-commit) connection, an
/// open transaction, or a bare driver client.
pub trait Queryable {
    fn client(&self) -> &Client;

    /// Query layer bound to this handle.
    fn queries(&self) -> Queries<'_> {
        Queries::new(self.client())
    }
}

impl Queryable for Client {
    fn client(&self) -> &Client {
        self
    }
}

impl Queryable for PgConnection<Idle> {
    fn client(&self) -> &Client {
        self.conn_ref()
    }
}

impl Queryable for PgConnection<InTx> {
    fn client(&self) -> &Client {
        self.conn_ref()
    }
}
