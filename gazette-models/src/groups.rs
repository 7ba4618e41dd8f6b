use crate::{schema::groups, Connection, Error, Result};
use diesel::prelude::*;
use serde::Serialize;

/// A named topic posts can be filed under.
///
/// Groups are created out-of-band (seed scripts, operator tooling), there
/// is no public endpoint for them.
#[derive(Clone, Queryable, Identifiable, Serialize)]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Insertable)]
#[diesel(table_name = groups)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    insert!(groups, NewGroup);
    get!(groups);
    find_by!(groups, find_by_slug, slug as &str);

    pub fn list_all(conn: &mut Connection) -> Result<Vec<Group>> {
        groups::table
            .order(groups::title.asc())
            .load(conn)
            .map_err(Error::from)
    }
}
