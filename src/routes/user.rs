use crate::{
    routes::{errors::ErrorPage, Page, Pagination},
    template_utils::{base_context, render, PostCard},
    utils,
};
use gazette_models::{
    db_conn::DbConn,
    follows::Follow,
    posts::Post,
    users::User,
    Connection,
};
use rocket::{
    get, post,
    response::{content::RawHtml, Flash, Redirect},
};

#[get("/profile/<username>?<page>")]
pub fn details(
    username: String,
    page: Option<i32>,
    mut conn: DbConn,
    account: Option<User>,
) -> Result<RawHtml<String>, ErrorPage> {
    let author = User::find_by_username(&mut conn, &username)?;
    let count = Post::count_for_author(&mut conn, &author)?;
    let page = Page::from_param(page).clamped(count);
    let posts = Post::for_author_page(&mut conn, &author, page.limits())?;
    let following = match &account {
        Some(user) => user.is_following(&mut conn, author.id)?,
        None => false,
    };

    let mut context = base_context(account.as_ref());
    context.insert("author", &author);
    context.insert("posts_count", &count);
    context.insert("following", &following);
    context.insert("posts", &PostCard::build_all(&mut conn, posts)?);
    context.insert("pagination", &Pagination::build(page, count));
    context.insert("base_query", &"");
    Ok(render("posts/profile.html", &context)?)
}

fn follow_impl(conn: &mut Connection, user: &User, username: &str) -> Result<Redirect, ErrorPage> {
    // Asking to follow yourself is a no-op, not an error.
    if user.username != username {
        let target = User::find_by_username(conn, username)?;
        Follow::follow(conn, user, &target)?;
    }
    Ok(Redirect::to(format!("/profile/{}", username)))
}

fn unfollow_impl(conn: &mut Connection, user: &User, username: &str) -> Result<Redirect, ErrorPage> {
    let target = User::find_by_username(conn, username)?;
    Follow::unfollow(conn, user, &target)?;
    Ok(Redirect::to(format!("/profile/{}", username)))
}

#[get("/profile/<username>/follow")]
pub fn follow(username: String, user: User, mut conn: DbConn) -> Result<Redirect, ErrorPage> {
    follow_impl(&mut conn, &user, &username)
}

#[post("/profile/<username>/follow")]
pub fn follow_post(username: String, user: User, mut conn: DbConn) -> Result<Redirect, ErrorPage> {
    follow_impl(&mut conn, &user, &username)
}

#[get("/profile/<username>/follow", rank = 2)]
pub fn follow_auth(username: String) -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in order to follow someone",
        &format!("/profile/{}/follow", username),
    )
}

#[post("/profile/<username>/follow", rank = 2)]
pub fn follow_post_auth(username: String) -> Flash<Redirect> {
    follow_auth(username)
}

#[get("/profile/<username>/unfollow")]
pub fn unfollow(username: String, user: User, mut conn: DbConn) -> Result<Redirect, ErrorPage> {
    unfollow_impl(&mut conn, &user, &username)
}

#[post("/profile/<username>/unfollow")]
pub fn unfollow_post(username: String, user: User, mut conn: DbConn) -> Result<Redirect, ErrorPage> {
    unfollow_impl(&mut conn, &user, &username)
}

#[get("/profile/<username>/unfollow", rank = 2)]
pub fn unfollow_auth(username: String) -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in order to unfollow someone",
        &format!("/profile/{}/unfollow", username),
    )
}

#[post("/profile/<username>/unfollow", rank = 2)]
pub fn unfollow_post_auth(username: String) -> Flash<Redirect> {
    unfollow_auth(username)
}

/// The personalized feed: posts by the authors the user follows.
#[get("/follow?<page>")]
pub fn follow_index(
    user: User,
    page: Option<i32>,
    mut conn: DbConn,
) -> Result<RawHtml<String>, ErrorPage> {
    let count = Post::count_followed(&mut conn, &user)?;
    let page = Page::from_param(page).clamped(count);
    let posts = Post::followed_page(&mut conn, &user, page.limits())?;

    let mut context = base_context(Some(&user));
    context.insert("posts", &PostCard::build_all(&mut conn, posts)?);
    context.insert("pagination", &Pagination::build(page, count));
    context.insert("base_query", &"");
    Ok(render("posts/follow.html", &context)?)
}

#[get("/follow", rank = 2)]
pub fn follow_index_auth() -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in order to read your feed",
        "/follow",
    )
}
