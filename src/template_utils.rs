use gazette_models::{
    comments::Comment, config::CONFIG, posts::Post, users::User, Connection, Error, Result,
};
use lazy_static::lazy_static;
use rocket::response::content::RawHtml;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::error;

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let glob = format!("{}/**/*.html", CONFIG.template_directory);
        match Tera::new(&glob) {
            Ok(tera) => tera,
            Err(err) => panic!("couldn't load the templates from {}: {}", glob, err),
        }
    };
}

/// Renders a template to a string, so the result can also go through the
/// page cache.
pub fn render_to_string(name: &str, context: &Context) -> Result<String> {
    TEMPLATES.render(name, context).map_err(|err| {
        error!("couldn't render {}: {}", name, err);
        Error::Render
    })
}

pub fn render(name: &str, context: &Context) -> Result<RawHtml<String>> {
    render_to_string(name, context).map(RawHtml)
}

/// Context every page extending the base template needs.
pub fn base_context(account: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("account", &account);
    context
}

/// A post dressed up for the templates.
#[derive(Serialize)]
pub struct PostCard {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub author: String,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub image_url: Option<String>,
    pub creation_date: String,
}

impl PostCard {
    pub fn build(conn: &mut Connection, post: Post) -> Result<PostCard> {
        let author = post.get_author(conn)?;
        let group = post.get_group(conn)?;
        let cover = post.get_cover(conn)?;
        Ok(PostCard {
            id: post.id,
            title: post.title,
            body: post.body,
            author: author.username,
            group_title: group.as_ref().map(|group| group.title.clone()),
            group_slug: group.map(|group| group.slug),
            image_url: cover.map(|cover| cover.url()),
            creation_date: post.creation_date.format("%Y-%m-%d %H:%M").to_string(),
        })
    }

    pub fn build_all(conn: &mut Connection, posts: Vec<Post>) -> Result<Vec<PostCard>> {
        posts
            .into_iter()
            .map(|post| PostCard::build(conn, post))
            .collect()
    }
}

#[derive(Serialize)]
pub struct CommentCard {
    pub author: String,
    pub body: String,
    pub creation_date: String,
}

impl CommentCard {
    pub fn build_all(conn: &mut Connection, comments: Vec<Comment>) -> Result<Vec<CommentCard>> {
        comments
            .into_iter()
            .map(|comment| {
                let author = comment.get_author(conn)?;
                Ok(CommentCard {
                    author: author.username,
                    body: comment.body,
                    creation_date: comment.creation_date.format("%Y-%m-%d %H:%M").to_string(),
                })
            })
            .collect()
    }
}
