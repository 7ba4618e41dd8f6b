use crate::{config::CONFIG, Connection};
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use rocket::{
    http::Status,
    outcome::try_outcome,
    request::{self, FromRequest, Request},
    State,
};
use std::ops::{Deref, DerefMut};

pub type DbPool = Pool<ConnectionManager<Connection>>;

/// Opens the connection pool described by `CONFIG`.
pub fn init_pool() -> Option<DbPool> {
    let manager = ConnectionManager::<Connection>::new(CONFIG.database_url.as_str());
    let mut builder = Pool::builder().connection_customizer(Box::new(PragmaForeignKey));
    if let Some(max_size) = CONFIG.db_max_size {
        builder = builder.max_size(max_size);
    }
    builder.build(manager).ok()
}

/// SQLite only enforces the foreign keys declared by the migrations once
/// this pragma is set, and it has to be set on every connection.
#[derive(Clone, Copy, Debug)]
pub struct PragmaForeignKey;

impl CustomizeConnection<Connection, diesel::r2d2::Error> for PragmaForeignKey {
    #[allow(unused_variables)]
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), diesel::r2d2::Error> {
        #[cfg(feature = "sqlite")]
        {
            use diesel::RunQueryDsl;
            diesel::sql_query("PRAGMA foreign_keys = ON;")
                .execute(conn)
                .map_err(diesel::r2d2::Error::QueryError)?;
        }
        Ok(())
    }
}

// Connection request guard type: a wrapper around an r2d2 pooled connection.
pub struct DbConn(pub PooledConnection<ConnectionManager<Connection>>);

/// Attempts to retrieve a single connection from the managed database pool. If
/// no pool is currently managed, fails with an `InternalServerError` status. If
/// no connections are available, fails with a `ServiceUnavailable` status.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConn {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<DbConn, ()> {
        let pool = try_outcome!(request.guard::<&State<DbPool>>().await);
        match pool.get() {
            Ok(conn) => request::Outcome::Success(DbConn(conn)),
            Err(_) => request::Outcome::Error((Status::ServiceUnavailable, ())),
        }
    }
}

// For the convenience of using a &mut DbConn as a &mut Connection.
impl Deref for DbConn {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
