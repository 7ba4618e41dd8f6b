use crate::{
    routes::{errors::ErrorPage, Page, Pagination},
    template_utils::{base_context, render, PostCard},
};
use gazette_models::{db_conn::DbConn, groups::Group, posts::Post, users::User};
use rocket::{get, response::content::RawHtml};

#[get("/group/<slug>?<page>")]
pub fn details(
    slug: String,
    page: Option<i32>,
    mut conn: DbConn,
    account: Option<User>,
) -> Result<RawHtml<String>, ErrorPage> {
    let group = Group::find_by_slug(&mut conn, &slug)?;
    let count = Post::count_for_group(&mut conn, &group)?;
    let page = Page::from_param(page).clamped(count);
    let posts = Post::for_group_page(&mut conn, &group, page.limits())?;

    let mut context = base_context(account.as_ref());
    context.insert("group", &group);
    context.insert("posts", &PostCard::build_all(&mut conn, posts)?);
    context.insert("pagination", &Pagination::build(page, count));
    context.insert("base_query", &"");
    Ok(render("posts/group_list.html", &context)?)
}
