//! Data model and query layer for Gazette, a small blogging platform.
//!
//! Everything that touches the database lives here: the entities, the
//! schema, the connection pool and its Rocket request guard, and the
//! embedded migrations. The web crate on top of this one only ever
//! goes through the functions exposed by the model types.

#[cfg(all(feature = "sqlite", feature = "postgres"))]
compile_error!("Only one of the 'sqlite' and 'postgres' features can be enabled");

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("One of the 'sqlite' and 'postgres' features must be enabled");

#[cfg(feature = "postgres")]
pub type Connection = diesel::PgConnection;
#[cfg(feature = "sqlite")]
pub type Connection = diesel::SqliteConnection;

#[cfg(feature = "postgres")]
pub(crate) type Backend = diesel::pg::Pg;
#[cfg(feature = "sqlite")]
pub(crate) type Backend = diesel::sqlite::Sqlite;

#[derive(Debug)]
pub enum Error {
    Db(diesel::result::Error),
    Hash(bcrypt::BcryptError),
    Io(std::io::Error),
    Migration,
    NotFound,
    InvalidValue,
    Unauthorized,
    Render,
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            _ => Error::Db(err),
        }
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Hash(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &mut crate::Connection, id: i32) -> crate::Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(crate::Error::from)
        }
    };
}

macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &mut crate::Connection, $($col: $type),+) -> crate::Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(crate::Error::from)
        }
    };
}

macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// List all $table with a given $col
        pub fn $fn(conn: &mut crate::Connection, $($col: $type),+) -> crate::Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .load::<Self>(conn)
                .map_err(crate::Error::from)
        }
    };
}

macro_rules! insert {
    ($table:ident, $from:ty) => {
        pub fn insert(conn: &mut crate::Connection, new: $from) -> crate::Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .get_result(conn)
                .map_err(crate::Error::from)
        }
    };
}

pub mod comments;
pub mod config;
pub mod db_conn;
pub mod follows;
pub mod groups;
pub mod medias;
pub mod migrations;
pub mod posts;
pub mod schema;
pub mod users;
