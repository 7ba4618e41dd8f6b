use crate::{db_conn::DbConn, schema::users, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::{
    http::Status,
    outcome::{try_outcome, IntoOutcome},
    request::{self, FromRequest, Request},
};
use serde::Serialize;

pub const AUTH_COOKIE: &str = "user_id";

const BCRYPT_COST: u32 = 10;

#[derive(Clone, Queryable, Identifiable, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

impl User {
    insert!(users, NewUser);
    get!(users);
    find_by!(users, find_by_username, username as &str);
    find_by!(users, find_by_email, email as &str);

    pub fn hash_pass(pass: &str) -> Result<String> {
        bcrypt::hash(pass, BCRYPT_COST).map_err(Error::from)
    }

    pub fn auth(&self, pass: &str) -> bool {
        bcrypt::verify(pass, &self.hashed_password).unwrap_or(false)
    }

    pub fn is_following(&self, conn: &mut Connection, other_id: i32) -> Result<bool> {
        use crate::schema::follows;
        diesel::select(diesel::dsl::exists(
            follows::table
                .filter(follows::follower_id.eq(self.id))
                .filter(follows::followed_id.eq(other_id)),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }

    /// Deletes the account and, through the foreign keys, everything it owns.
    pub fn delete(&self, conn: &mut Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<User, ()> {
        let mut conn = try_outcome!(request.guard::<DbConn>().await);
        request
            .cookies()
            .get_private(AUTH_COOKIE)
            .and_then(|cookie| cookie.value().parse().ok())
            .and_then(|id| User::get(&mut conn, id).ok())
            .or_forward(Status::Unauthorized)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{tests::db, Connection, Error};
    use diesel::Connection as _;

    pub(crate) fn fill_database(conn: &mut Connection) -> Vec<User> {
        ["admin", "user", "other"]
            .iter()
            .map(|username| {
                User::insert(
                    conn,
                    NewUser {
                        username: (*username).to_owned(),
                        email: format!("{}@example.com", username),
                        hashed_password: User::hash_pass("test_password").unwrap(),
                    },
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn find_by() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            fill_database(conn);

            let user = User::find_by_username(conn, "user")?;
            assert_eq!(user.username, "user");
            assert_eq!(User::find_by_email(conn, "other@example.com")?.username, "other");
            assert!(matches!(
                User::find_by_username(conn, "nonexistent"),
                Err(Error::NotFound)
            ));

            Ok(())
        });
    }

    #[test]
    fn auth() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);

            assert!(users[0].auth("test_password"));
            assert!(!users[0].auth("wrong_password"));

            Ok(())
        });
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            fill_database(conn);

            let result = User::insert(
                conn,
                NewUser {
                    username: "user".to_owned(),
                    email: "else@example.com".to_owned(),
                    hashed_password: User::hash_pass("test_password")?,
                },
            );
            assert!(matches!(result, Err(Error::Db(_))));

            Ok(())
        });
    }
}
