use crate::{schema::comments, users::User, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Clone, Queryable, Identifiable, Serialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub body: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub body: String,
}

impl Comment {
    insert!(comments, NewComment);
    get!(comments);

    /// Comments of a post, oldest first.
    pub fn list_by_post(conn: &mut Connection, post_id: i32) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq(post_id))
            .order((comments::creation_date.asc(), comments::id.asc()))
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_post(conn: &mut Connection, post_id: i32) -> Result<i64> {
        comments::table
            .filter(comments::post_id.eq(post_id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &mut Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }
}
