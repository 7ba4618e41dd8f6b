use crate::{schema::follows, users::User, Connection, Error, Result};
use diesel::prelude::*;

/// A directed subscription edge between two users.
///
/// The table carries two invariants: a CHECK constraint rejecting
/// self-follows and a UNIQUE constraint on the (follower, followed) pair.
#[derive(Clone, Queryable, Identifiable)]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub followed_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: i32,
    pub followed_id: i32,
}

impl Follow {
    insert!(follows, NewFollow);
    get!(follows);

    pub fn find(conn: &mut Connection, from: i32, to: i32) -> Result<Follow> {
        follows::table
            .filter(follows::follower_id.eq(from))
            .filter(follows::followed_id.eq(to))
            .first(conn)
            .map_err(Error::from)
    }

    /// Makes sure an edge from `follower` to `followed` exists.
    ///
    /// Following someone twice is not an error, the existing edge is
    /// returned as-is.
    pub fn follow(conn: &mut Connection, follower: &User, followed: &User) -> Result<Follow> {
        match Follow::find(conn, follower.id, followed.id) {
            Ok(follow) => Ok(follow),
            Err(Error::NotFound) => Follow::insert(
                conn,
                NewFollow {
                    follower_id: follower.id,
                    followed_id: followed.id,
                },
            ),
            Err(err) => Err(err),
        }
    }

    /// Removes the edge from `follower` to `followed`.
    ///
    /// Fails with `Error::NotFound` when there is no such edge.
    pub fn unfollow(conn: &mut Connection, follower: &User, followed: &User) -> Result<()> {
        let follow = Follow::find(conn, follower.id, followed.id)?;
        diesel::delete(&follow)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    pub fn count(conn: &mut Connection) -> Result<i64> {
        follows::table
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::db, users::tests::fill_database, Error};
    use diesel::Connection as _;

    #[test]
    fn follow_is_idempotent() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);

            let first = Follow::follow(conn, &users[0], &users[1])?;
            let second = Follow::follow(conn, &users[0], &users[1])?;
            assert_eq!(first.id, second.id);
            assert_eq!(Follow::count(conn)?, 1);

            Ok(())
        });
    }

    #[test]
    fn self_follow_is_rejected_by_the_database() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);

            let result = Follow::insert(
                conn,
                NewFollow {
                    follower_id: users[0].id,
                    followed_id: users[0].id,
                },
            );
            assert!(matches!(result, Err(Error::Db(_))));
            assert_eq!(Follow::count(conn)?, 0);

            Ok(())
        });
    }

    #[test]
    fn duplicate_edge_is_rejected_by_the_database() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);

            Follow::insert(
                conn,
                NewFollow {
                    follower_id: users[0].id,
                    followed_id: users[1].id,
                },
            )?;
            let duplicate = Follow::insert(
                conn,
                NewFollow {
                    follower_id: users[0].id,
                    followed_id: users[1].id,
                },
            );
            assert!(matches!(duplicate, Err(Error::Db(_))));

            Ok(())
        });
    }

    #[test]
    fn unfollow_missing_edge_is_not_found() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);

            assert!(matches!(
                Follow::unfollow(conn, &users[0], &users[1]),
                Err(Error::NotFound)
            ));

            Ok(())
        });
    }

    #[test]
    fn unfollow_removes_the_edge() {
        let mut conn = db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let users = fill_database(conn);

            Follow::follow(conn, &users[0], &users[1])?;
            Follow::unfollow(conn, &users[0], &users[1])?;
            assert_eq!(Follow::count(conn)?, 0);

            Ok(())
        });
    }
}
