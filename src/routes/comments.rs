use crate::{page_cache::PageCache, routes::errors::ErrorPage, utils};
use gazette_models::{
    comments::{Comment, NewComment},
    db_conn::DbConn,
    posts::Post,
    users::User,
};
use rocket::{
    form::Form,
    post,
    response::{Flash, Redirect},
    FromForm, State,
};

#[derive(FromForm)]
pub struct CommentForm {
    pub body: String,
}

#[post("/posts/<id>/comment", data = "<form>")]
pub fn create(
    id: i32,
    user: User,
    mut conn: DbConn,
    cache: &State<PageCache>,
    form: Form<CommentForm>,
) -> Result<Redirect, ErrorPage> {
    let post = Post::get(&mut conn, id)?;

    // An empty comment is dropped on the floor; either way the reader
    // lands back on the post.
    if !form.body.trim().is_empty() {
        Comment::insert(
            &mut conn,
            NewComment {
                post_id: post.id,
                author_id: user.id,
                body: form.body.clone(),
            },
        )?;
        cache.clear();
    }

    Ok(Redirect::to(format!("/posts/{}", id)))
}

#[post("/posts/<id>/comment", rank = 2)]
pub fn create_auth(id: i32) -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in order to comment",
        &format!("/posts/{}", id),
    )
}
