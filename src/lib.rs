//! The web layer of Gazette: routes, forms, rendering and the feed cache.

use gazette_models::{
    config::CONFIG,
    db_conn::{self, DbPool},
    migrations,
};
use rocket::{fairing::AdHoc, fs::FileServer, Build, Rocket};
use std::{fs::DirBuilder, time::Duration};
use tracing::error;

pub mod page_cache;
pub mod routes;
pub mod template_utils;
pub mod utils;

use page_cache::PageCache;

pub fn rocket() -> Rocket<Build> {
    let pool = db_conn::init_pool().expect("couldn't open the database pool");

    DirBuilder::new()
        .recursive(true)
        .create(&CONFIG.media_directory)
        .expect("couldn't create the media directory");

    rocket::build()
        .manage(pool)
        .manage(PageCache::new(Duration::from_secs(CONFIG.feed_cache_ttl)))
        .attach(AdHoc::try_on_ignite("Database migrations", run_migrations))
        .mount(
            "/",
            rocket::routes![
                routes::posts::index,
                routes::posts::details,
                routes::posts::new,
                routes::posts::new_auth,
                routes::posts::create,
                routes::posts::create_auth,
                routes::posts::edit,
                routes::posts::edit_auth,
                routes::posts::update,
                routes::posts::update_auth,
                routes::groups::details,
                routes::comments::create,
                routes::comments::create_auth,
                routes::user::details,
                routes::user::follow,
                routes::user::follow_post,
                routes::user::follow_auth,
                routes::user::follow_post_auth,
                routes::user::unfollow,
                routes::user::unfollow_post,
                routes::user::unfollow_auth,
                routes::user::unfollow_post_auth,
                routes::user::follow_index,
                routes::user::follow_index_auth,
                routes::session::new,
                routes::session::create,
                routes::session::delete,
                routes::session::signup_new,
                routes::session::signup_create,
            ],
        )
        .mount("/media", FileServer::from(&CONFIG.media_directory))
        .register(
            "/",
            rocket::catchers![routes::errors::not_found, routes::errors::server_error],
        )
}

async fn run_migrations(rocket: Rocket<Build>) -> Result<Rocket<Build>, Rocket<Build>> {
    let pool = match rocket.state::<DbPool>() {
        Some(pool) => pool,
        None => return Err(rocket),
    };
    match pool.get() {
        Ok(mut conn) => match migrations::run_pending(&mut conn) {
            Ok(()) => Ok(rocket),
            Err(_) => Err(rocket),
        },
        Err(err) => {
            error!("couldn't get a database connection to run migrations: {}", err);
            Err(rocket)
        }
    }
}
