use crate::{
    page_cache::PageCache,
    routes::{errors::ErrorPage, FormResponse, Page, Pagination},
    template_utils::{base_context, render, render_to_string, CommentCard, PostCard},
    utils,
};
use chrono::Utc;
use gazette_models::{
    comments::Comment,
    db_conn::DbConn,
    groups::Group,
    medias::{Media, NewMedia},
    posts::{FeedQuery, NewPost, Post, PostChangeset},
    users::User,
    Connection, Error,
};
use rocket::{
    form::Form,
    fs::TempFile,
    get, post,
    response::{content::RawHtml, Flash, Redirect},
    FromForm, State,
};
use tracing::info;

#[get("/?<page>&<q>&<date_of>&<date_to>&<sort>&<direction>")]
#[allow(clippy::too_many_arguments)]
pub fn index(
    mut conn: DbConn,
    account: Option<User>,
    cache: &State<PageCache>,
    page: Option<i32>,
    q: Option<String>,
    date_of: Option<String>,
    date_to: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
) -> Result<RawHtml<String>, ErrorPage> {
    let feed = FeedQuery::from_params(
        q.clone(),
        date_of.as_deref(),
        date_to.as_deref(),
        sort.as_deref(),
        direction.as_deref(),
    );
    let page = Page::from_param(page);

    // The viewer is part of the key: the navigation bar differs between
    // accounts, and cached pages must not cross that line.
    let key = format!(
        "/?page={}&q={}&date_of={}&date_to={}&sort={}&direction={}|viewer={}",
        page.number(),
        q.as_deref().unwrap_or(""),
        date_of.as_deref().unwrap_or(""),
        date_to.as_deref().unwrap_or(""),
        feed.sort.as_param(),
        feed.direction.as_param(),
        account.as_ref().map(|user| user.id).unwrap_or(0),
    );
    if let Some(body) = cache.get(&key) {
        return Ok(RawHtml(body));
    }

    let count = Post::count_feed(&mut conn, &feed)?;
    let page = page.clamped(count);
    let posts = Post::feed_page(&mut conn, &feed, page.limits())?;

    let base_query = format!(
        "q={}&date_of={}&date_to={}&sort={}&direction={}",
        q.as_deref().unwrap_or(""),
        date_of.as_deref().unwrap_or(""),
        date_to.as_deref().unwrap_or(""),
        feed.sort.as_param(),
        feed.direction.as_param(),
    );

    let mut context = base_context(account.as_ref());
    context.insert("posts", &PostCard::build_all(&mut conn, posts)?);
    context.insert("pagination", &Pagination::build(page, count));
    context.insert("base_query", &base_query);
    context.insert("q", &q.as_deref().unwrap_or(""));
    context.insert("date_of", &date_of.as_deref().unwrap_or(""));
    context.insert("date_to", &date_to.as_deref().unwrap_or(""));
    context.insert("sort", &feed.sort.as_param());
    context.insert("direction", &feed.direction.as_param());

    let body = render_to_string("posts/index.html", &context)?;
    cache.insert(key, body.clone());
    Ok(RawHtml(body))
}

#[get("/posts/<id>")]
pub fn details(
    id: i32,
    mut conn: DbConn,
    account: Option<User>,
) -> Result<RawHtml<String>, ErrorPage> {
    let post = Post::get(&mut conn, id)?;
    let comments = Comment::list_by_post(&mut conn, post.id)?;
    let is_author = account
        .as_ref()
        .map(|user| user.id == post.author_id)
        .unwrap_or(false);

    let mut context = base_context(account.as_ref());
    context.insert("is_author", &is_author);
    context.insert("comments", &CommentCard::build_all(&mut conn, comments)?);
    context.insert("post", &PostCard::build(&mut conn, post)?);
    Ok(render("posts/post_detail.html", &context)?)
}

#[derive(FromForm)]
pub struct PostForm<'f> {
    pub title: String,
    pub body: String,
    pub group: Option<i32>,
    pub image: Option<TempFile<'f>>,
}

/// The explicit validation the post form needs; nothing is persisted when
/// this returns a non-empty list.
fn validate_post_form(form: &PostForm<'_>) -> Vec<String> {
    let mut errors = Vec::new();
    if form.title.trim().is_empty() {
        errors.push("title: cannot be empty".to_owned());
    }
    if form.title.chars().count() > 200 {
        errors.push("title: cannot be longer than 200 characters".to_owned());
    }
    if form.body.trim().is_empty() {
        errors.push("body: cannot be empty".to_owned());
    }
    errors
}

/// Stores the uploaded cover, if there is one, and records it as a media.
async fn save_cover(
    conn: &mut Connection,
    user: &User,
    image: Option<&mut TempFile<'_>>,
    alt_text: &str,
) -> Result<Option<Media>, Error> {
    let file = match image {
        Some(file) if file.len() > 0 => file,
        _ => return Ok(None),
    };
    let ext = file
        .content_type()
        .and_then(|content_type| content_type.extension())
        .map(|ext| ext.as_str().to_owned())
        .ok_or(Error::InvalidValue)?;
    let path = Media::build_path(&ext)?;
    file.copy_to(&path).await?;
    Media::insert(
        conn,
        NewMedia {
            file_path: path.to_string_lossy().into_owned(),
            alt_text: alt_text.to_owned(),
            owner_id: user.id,
        },
    )
    .map(Some)
}

fn post_form_page(
    conn: &mut Connection,
    user: &User,
    errors: &[String],
    is_edit: bool,
    post_id: i32,
    form: serde_json::Value,
) -> Result<RawHtml<String>, ErrorPage> {
    let mut context = base_context(Some(user));
    context.insert("groups", &Group::list_all(conn)?);
    context.insert("errors", errors);
    context.insert("is_edit", &is_edit);
    context.insert("post_id", &post_id);
    context.insert("form", &form);
    Ok(render("posts/create_post.html", &context)?)
}

#[get("/create")]
pub fn new(user: User, mut conn: DbConn) -> Result<RawHtml<String>, ErrorPage> {
    post_form_page(
        &mut conn,
        &user,
        &[],
        false,
        0,
        serde_json::json!({ "title": "", "body": "", "group": null }),
    )
}

#[get("/create", rank = 2)]
pub fn new_auth() -> Flash<Redirect> {
    utils::requires_login("You need to be logged in order to write a post", "/create")
}

#[post("/create", data = "<form>")]
pub async fn create(
    user: User,
    mut conn: DbConn,
    cache: &State<PageCache>,
    mut form: Form<PostForm<'_>>,
) -> Result<FormResponse, ErrorPage> {
    let form = &mut *form;
    let mut errors = validate_post_form(form);

    let mut cover_id = None;
    if errors.is_empty() {
        match save_cover(&mut conn, &user, form.image.as_mut(), &form.title).await {
            Ok(cover) => cover_id = cover.map(|media| media.id),
            Err(Error::InvalidValue) => errors.push(
                "image: only png, jpg, jpeg, gif and webp files are accepted".to_owned(),
            ),
            Err(err) => return Err(err.into()),
        }
    }

    if !errors.is_empty() {
        let page = post_form_page(
            &mut conn,
            &user,
            &errors,
            false,
            0,
            serde_json::json!({ "title": form.title, "body": form.body, "group": form.group }),
        )?;
        return Ok(FormResponse::Page(page));
    }

    let group_id = match form.group {
        Some(id) => Some(Group::get(&mut conn, id)?.id),
        None => None,
    };

    // The author is always the authenticated requester, whatever the
    // submitted form pretended.
    let post = Post::insert(
        &mut conn,
        NewPost {
            author_id: user.id,
            group_id,
            title: form.title.clone(),
            body: form.body.clone(),
            cover_id,
            creation_date: Utc::now().naive_utc(),
        },
    )?;
    cache.clear();
    info!("{} published post {}", user.username, post.id);

    Ok(FormResponse::Redirect(Redirect::to(format!(
        "/profile/{}",
        user.username
    ))))
}

#[post("/create", rank = 2)]
pub fn create_auth() -> Flash<Redirect> {
    utils::requires_login("You need to be logged in order to write a post", "/create")
}

#[get("/posts/<id>/edit")]
pub fn edit(id: i32, user: User, mut conn: DbConn) -> Result<FormResponse, ErrorPage> {
    let post = Post::get(&mut conn, id)?;
    if post.author_id != user.id {
        return Ok(FormResponse::Redirect(Redirect::to(format!("/posts/{}", id))));
    }

    let page = post_form_page(
        &mut conn,
        &user,
        &[],
        true,
        post.id,
        serde_json::json!({ "title": post.title, "body": post.body, "group": post.group_id }),
    )?;
    Ok(FormResponse::Page(page))
}

#[get("/posts/<id>/edit", rank = 2)]
pub fn edit_auth(id: i32) -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in order to edit a post",
        &format!("/posts/{}/edit", id),
    )
}

#[post("/posts/<id>/edit", data = "<form>")]
pub async fn update(
    id: i32,
    user: User,
    mut conn: DbConn,
    cache: &State<PageCache>,
    mut form: Form<PostForm<'_>>,
) -> Result<FormResponse, ErrorPage> {
    let post = Post::get(&mut conn, id)?;
    if post.author_id != user.id {
        return Ok(FormResponse::Redirect(Redirect::to(format!("/posts/{}", id))));
    }

    let form = &mut *form;
    let mut errors = validate_post_form(form);

    let mut cover_id = post.cover_id;
    if errors.is_empty() {
        match save_cover(&mut conn, &user, form.image.as_mut(), &form.title).await {
            Ok(Some(media)) => cover_id = Some(media.id),
            Ok(None) => {}
            Err(Error::InvalidValue) => errors.push(
                "image: only png, jpg, jpeg, gif and webp files are accepted".to_owned(),
            ),
            Err(err) => return Err(err.into()),
        }
    }

    if !errors.is_empty() {
        let page = post_form_page(
            &mut conn,
            &user,
            &errors,
            true,
            post.id,
            serde_json::json!({ "title": form.title, "body": form.body, "group": form.group }),
        )?;
        return Ok(FormResponse::Page(page));
    }

    let group_id = match form.group {
        Some(group_id) => Some(Group::get(&mut conn, group_id)?.id),
        None => None,
    };

    post.update(
        &mut conn,
        &PostChangeset {
            group_id,
            title: form.title.clone(),
            body: form.body.clone(),
            cover_id,
        },
    )?;
    cache.clear();

    Ok(FormResponse::Redirect(Redirect::to(format!("/posts/{}", id))))
}

#[post("/posts/<id>/edit", rank = 2)]
pub fn update_auth(id: i32) -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in order to edit a post",
        &format!("/posts/{}/edit", id),
    )
}
