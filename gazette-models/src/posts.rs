use crate::{
    groups::Group,
    medias::Media,
    schema::{follows, posts, users},
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::{define_sql_function, prelude::*};
use serde::Serialize;

define_sql_function! {
    /// Case folding on the database side, so that SQLite and PostgreSQL
    /// match the same rows.
    fn lower(text: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

type BoxedPostQuery<'a> = posts::BoxedQuery<'a, crate::Backend>;

#[derive(Clone, Queryable, Identifiable, Serialize)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub cover_id: Option<i32>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub cover_id: Option<i32>,
    pub creation_date: NaiveDateTime,
}

/// The fields a post's author may change after publication. The publish
/// date is not one of them.
#[derive(AsChangeset)]
#[diesel(table_name = posts, treat_none_as_null = true)]
pub struct PostChangeset {
    pub group_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub cover_id: Option<i32>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PubDate,
    Title,
}

impl SortField {
    /// Unrecognized field names fall back to the publish date instead of
    /// reaching the database.
    pub fn from_param(param: Option<&str>) -> SortField {
        match param {
            Some("title") => SortField::Title,
            _ => SortField::PubDate,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortField::PubDate => "pub_date",
            SortField::Title => "title",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` when absent or explicitly requested, ascending for any
    /// other value.
    pub fn from_param(param: Option<&str>) -> SortDirection {
        match param {
            None | Some("desc") => SortDirection::Desc,
            Some(_) => SortDirection::Asc,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The filters and ordering of the public feed.
pub struct FeedQuery {
    pub q: Option<String>,
    pub date_of: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for FeedQuery {
    fn default() -> FeedQuery {
        FeedQuery {
            q: None,
            date_of: None,
            date_to: None,
            sort: SortField::PubDate,
            direction: SortDirection::Desc,
        }
    }
}

impl FeedQuery {
    /// Builds a feed query from raw query-string values. Unparseable
    /// dates are treated as absent.
    pub fn from_params(
        q: Option<String>,
        date_of: Option<&str>,
        date_to: Option<&str>,
        sort: Option<&str>,
        direction: Option<&str>,
    ) -> FeedQuery {
        FeedQuery {
            q: q.filter(|q| !q.trim().is_empty()),
            date_of: date_of.and_then(parse_date),
            date_to: date_to.and_then(parse_date),
            sort: SortField::from_param(sort),
            direction: SortDirection::from_param(direction),
        }
    }

    fn apply_filters<'a>(&self, mut query: BoxedPostQuery<'a>) -> BoxedPostQuery<'a> {
        if let Some(q) = &self.q {
            let pattern = format!("%{}%", q.to_lowercase());
            let matching_authors = users::table
                .filter(lower(users::username).like(pattern.clone()))
                .select(users::id);
            query = query.filter(
                lower(posts::body)
                    .like(pattern)
                    .or(posts::author_id.eq_any(matching_authors)),
            );
        }

        // A lone `date_to` is ignored; a lone `date_of` means "exactly
        // that day".
        match (self.date_of, self.date_to) {
            (Some(from), Some(to)) => {
                query = query.filter(posts::creation_date.ge(from.and_time(NaiveTime::MIN)));
                if let Some(after) = to.succ_opt() {
                    query = query.filter(posts::creation_date.lt(after.and_time(NaiveTime::MIN)));
                }
            }
            (Some(day), None) => {
                query = query.filter(posts::creation_date.ge(day.and_time(NaiveTime::MIN)));
                if let Some(after) = day.succ_opt() {
                    query = query.filter(posts::creation_date.lt(after.and_time(NaiveTime::MIN)));
                }
            }
            _ => {}
        }

        query
    }

    fn apply_order<'a>(&self, query: BoxedPostQuery<'a>) -> BoxedPostQuery<'a> {
        match (self.sort, self.direction) {
            (SortField::PubDate, SortDirection::Desc) => {
                query.order((posts::creation_date.desc(), posts::id.desc()))
            }
            (SortField::PubDate, SortDirection::Asc) => {
                query.order((posts::creation_date.asc(), posts::id.asc()))
            }
            (SortField::Title, SortDirection::Desc) => {
                query.order((posts::title.desc(), posts::id.desc()))
            }
            (SortField::Title, SortDirection::Asc) => {
                query.order((posts::title.asc(), posts::id.asc()))
            }
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

impl Post {
    insert!(posts, NewPost);
    get!(posts);

    /// One page of the public feed, filtered and ordered by `feed`.
    pub fn feed_page(
        conn: &mut Connection,
        feed: &FeedQuery,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        feed.apply_order(feed.apply_filters(posts::table.into_boxed()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_feed(conn: &mut Connection, feed: &FeedQuery) -> Result<i64> {
        feed.apply_filters(posts::table.into_boxed())
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn for_group_page(
        conn: &mut Connection,
        group: &Group,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_group(conn: &mut Connection, group: &Group) -> Result<i64> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn for_author_page(
        conn: &mut Connection,
        author: &User,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_author(conn: &mut Connection, author: &User) -> Result<i64> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// One page of the posts written by the authors `user` follows.
    pub fn followed_page(
        conn: &mut Connection,
        user: &User,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        let followed = follows::table
            .filter(follows::follower_id.eq(user.id))
            .select(follows::followed_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_followed(conn: &mut Connection, user: &User) -> Result<i64> {
        let followed = follows::table
            .filter(follows::follower_id.eq(user.id))
            .select(follows::followed_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &mut Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn get_group(&self, conn: &mut Connection) -> Result<Option<Group>> {
        self.group_id.map(|id| Group::get(conn, id)).transpose()
    }

    pub fn get_cover(&self, conn: &mut Connection) -> Result<Option<Media>> {
        self.cover_id.map(|id| Media::get(conn, id)).transpose()
    }

    pub fn update(&self, conn: &mut Connection, changes: &PostChangeset) -> Result<Post> {
        diesel::update(self)
            .set(changes)
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn delete(&self, conn: &mut Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        groups::tests as group_tests,
        tests::db,
        users::{tests::fill_database, User},
        Connection, Error,
    };
    use chrono::{NaiveDate, NaiveTime};
    use diesel::Connection as _;

    fn post_on(conn: &mut Connection, author: &User, title: &str, body: &str, day: &str) -> Post {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
        Post::insert(
            conn,
            NewPost {
                author_id: author.id,
                group_id: None,
                title: title.to_owned(),
                body: body.to_owned(),
                cover_id: None,
                creation_date: date.and_time(NaiveTime::MIN),
            },
        )
        .unwrap()
    }

    fn titles(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.title.as_str()).collect()
    }

    #[test]
    fn search_matches_body_and_author() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            post_on(conn, &users[0], "Fruit", "Bananas are yellow", "2026-07-01");
            post_on(conn, &users[1], "Sky", "It is blue", "2026-07-02");
            post_on(conn, &users[2], "Empty", "Nothing here", "2026-07-03");

            let feed = FeedQuery::from_params(Some("BANANAS".into()), None, None, None, None);
            assert_eq!(titles(&Post::feed_page(conn, &feed, (0, 10))?), vec!["Fruit"]);

            // "user" also matches the author of "Sky"
            let feed = FeedQuery::from_params(Some("user".into()), None, None, None, None);
            assert_eq!(Post::count_feed(conn, &feed)?, 1);
            assert_eq!(titles(&Post::feed_page(conn, &feed, (0, 10))?), vec!["Sky"]);

            Ok(())
        });
    }

    #[test]
    fn date_range_is_inclusive() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            post_on(conn, &users[0], "Before", "a", "2026-06-30");
            post_on(conn, &users[0], "Start", "b", "2026-07-01");
            post_on(conn, &users[0], "End", "c", "2026-07-03");
            post_on(conn, &users[0], "After", "d", "2026-07-04");

            let feed =
                FeedQuery::from_params(None, Some("2026-07-01"), Some("2026-07-03"), None, None);
            assert_eq!(
                titles(&Post::feed_page(conn, &feed, (0, 10))?),
                vec!["End", "Start"]
            );
            assert_eq!(Post::count_feed(conn, &feed)?, 2);

            Ok(())
        });
    }

    #[test]
    fn single_date_means_that_day_only() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            post_on(conn, &users[0], "Eve", "a", "2026-06-30");
            post_on(conn, &users[0], "The day", "b", "2026-07-01");

            let feed = FeedQuery::from_params(None, Some("2026-07-01"), None, None, None);
            assert_eq!(
                titles(&Post::feed_page(conn, &feed, (0, 10))?),
                vec!["The day"]
            );

            // an unparseable date is the same as no date at all
            let feed = FeedQuery::from_params(None, Some("yesterday"), None, None, None);
            assert_eq!(Post::count_feed(conn, &feed)?, 2);

            Ok(())
        });
    }

    #[test]
    fn sort_field_and_direction() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            post_on(conn, &users[0], "Bravo", "a", "2026-07-02");
            post_on(conn, &users[0], "Alpha", "b", "2026-07-01");
            post_on(conn, &users[0], "Charlie", "c", "2026-07-03");

            let newest_first = FeedQuery::default();
            assert_eq!(
                titles(&Post::feed_page(conn, &newest_first, (0, 10))?),
                vec!["Charlie", "Bravo", "Alpha"]
            );

            let oldest_first = FeedQuery::from_params(None, None, None, None, Some("asc"));
            assert_eq!(
                titles(&Post::feed_page(conn, &oldest_first, (0, 10))?),
                vec!["Alpha", "Bravo", "Charlie"]
            );

            let by_title = FeedQuery::from_params(None, None, None, Some("title"), Some("asc"));
            assert_eq!(
                titles(&Post::feed_page(conn, &by_title, (0, 10))?),
                vec!["Alpha", "Bravo", "Charlie"]
            );

            // unknown sort fields fall back to the publish date, and any
            // direction other than "desc" sorts ascending
            let unknown = FeedQuery::from_params(None, None, None, Some("author"), Some("up"));
            assert_eq!(
                titles(&Post::feed_page(conn, &unknown, (0, 10))?),
                vec!["Alpha", "Bravo", "Charlie"]
            );

            Ok(())
        });
    }

    #[test]
    fn feed_pagination() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            for n in 0..13 {
                post_on(conn, &users[0], &format!("Post {}", n), "text", "2026-07-01");
            }

            let feed = FeedQuery::default();
            assert_eq!(Post::count_feed(conn, &feed)?, 13);
            assert_eq!(Post::feed_page(conn, &feed, (0, 10))?.len(), 10);
            assert_eq!(Post::feed_page(conn, &feed, (10, 20))?.len(), 3);

            Ok(())
        });
    }

    #[test]
    fn followed_feed_only_shows_followed_authors() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            use crate::follows::Follow;

            let users = fill_database(conn);
            post_on(conn, &users[1], "From followed", "a", "2026-07-01");
            post_on(conn, &users[2], "From stranger", "b", "2026-07-02");

            Follow::follow(conn, &users[0], &users[1])?;
            assert_eq!(
                titles(&Post::followed_page(conn, &users[0], (0, 10))?),
                vec!["From followed"]
            );
            assert_eq!(Post::count_followed(conn, &users[0])?, 1);

            Ok(())
        });
    }

    #[test]
    fn group_and_author_scopes() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            let group = group_tests::fill_database(conn);

            let mut post = post_on(conn, &users[0], "Grouped", "a", "2026-07-01");
            post = post.update(
                conn,
                &PostChangeset {
                    group_id: Some(group.id),
                    title: post.title.clone(),
                    body: post.body.clone(),
                    cover_id: None,
                },
            )?;
            post_on(conn, &users[1], "Loose", "b", "2026-07-02");

            assert_eq!(Post::count_for_group(conn, &group)?, 1);
            assert_eq!(
                titles(&Post::for_group_page(conn, &group, (0, 10))?),
                vec!["Grouped"]
            );
            assert_eq!(Post::count_for_author(conn, &users[0])?, 1);
            assert_eq!(post.get_group(conn)?.map(|g| g.id), Some(group.id));

            Ok(())
        });
    }

    #[test]
    fn edit_never_touches_the_publish_date() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            let post = post_on(conn, &users[0], "Original", "text", "2026-07-01");

            let updated = post.update(
                conn,
                &PostChangeset {
                    group_id: None,
                    title: "Edited".to_owned(),
                    body: "new text".to_owned(),
                    cover_id: None,
                },
            )?;
            assert_eq!(updated.title, "Edited");
            assert_eq!(updated.creation_date, post.creation_date);

            Ok(())
        });
    }

    #[test]
    fn deleting_the_author_deletes_their_posts() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);
            post_on(conn, &users[0], "Doomed", "text", "2026-07-01");

            users[0].delete(conn)?;
            assert_eq!(Post::count_for_author(conn, &users[0])?, 0);

            Ok(())
        });
    }
}
