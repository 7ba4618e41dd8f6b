use crate::{
    routes::{errors::ErrorPage, FormResponse},
    template_utils::{base_context, render},
    utils,
};
use gazette_models::{
    db_conn::DbConn,
    users::{NewUser, User, AUTH_COOKIE},
    Error,
};
use rocket::{
    form::Form,
    get,
    http::{Cookie, CookieJar},
    post,
    request::FlashMessage,
    response::{content::RawHtml, Redirect},
    FromForm,
};
use tracing::info;
use validator::Validate;

#[get("/auth/login?<next>")]
pub fn new(
    account: Option<User>,
    flash: Option<FlashMessage<'_>>,
    next: Option<String>,
) -> Result<RawHtml<String>, ErrorPage> {
    let mut context = base_context(account.as_ref());
    context.insert("flash", &flash.as_ref().map(|flash| flash.message()));
    context.insert("errors", &Vec::<String>::new());
    context.insert("next", &next.as_deref().unwrap_or(""));
    context.insert("username", &"");
    Ok(render("session/login.html", &context)?)
}

#[derive(FromForm)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[post("/auth/login", data = "<form>")]
pub fn create(
    mut conn: DbConn,
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
) -> Result<FormResponse, ErrorPage> {
    match User::find_by_username(&mut conn, &form.username) {
        Ok(user) if user.auth(&form.password) => {
            cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));
            let next = form
                .next
                .as_deref()
                .filter(|next| next.starts_with('/'))
                .unwrap_or("/");
            Ok(FormResponse::Redirect(Redirect::to(next.to_owned())))
        }
        Ok(_) | Err(Error::NotFound) => {
            let mut context = base_context(None);
            context.insert("flash", &Option::<&str>::None);
            context.insert("errors", &["Invalid username or password"]);
            context.insert("next", &form.next.as_deref().unwrap_or(""));
            context.insert("username", &form.username);
            Ok(FormResponse::Page(render("session/login.html", &context)?))
        }
        Err(err) => Err(err.into()),
    }
}

#[get("/auth/logout")]
pub fn delete(cookies: &CookieJar<'_>) -> Redirect {
    cookies.remove_private(AUTH_COOKIE);
    Redirect::to("/")
}

#[derive(FromForm, Validate)]
pub struct SignupForm {
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(must_match = "password")]
    pub password_confirmation: String,
}

fn signup_page(
    account: Option<&User>,
    errors: &[String],
    username: &str,
    email: &str,
) -> Result<RawHtml<String>, ErrorPage> {
    let mut context = base_context(account);
    context.insert("errors", errors);
    context.insert("username", &username);
    context.insert("email", &email);
    Ok(render("session/signup.html", &context)?)
}

#[get("/auth/signup")]
pub fn signup_new(account: Option<User>) -> Result<RawHtml<String>, ErrorPage> {
    signup_page(account.as_ref(), &[], "", "")
}

#[post("/auth/signup", data = "<form>")]
pub fn signup_create(
    mut conn: DbConn,
    form: Form<SignupForm>,
    cookies: &CookieJar<'_>,
) -> Result<FormResponse, ErrorPage> {
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(validation) => utils::validation_messages(&validation),
    };
    if errors.is_empty() {
        if User::find_by_username(&mut conn, &form.username).is_ok() {
            errors.push("username: already taken".to_owned());
        } else if User::find_by_email(&mut conn, &form.email).is_ok() {
            errors.push("email: already registered".to_owned());
        }
    }
    if !errors.is_empty() {
        let page = signup_page(None, &errors, &form.username, &form.email)?;
        return Ok(FormResponse::Page(page));
    }

    let user = User::insert(
        &mut conn,
        NewUser {
            username: form.username.clone(),
            email: form.email.clone(),
            hashed_password: User::hash_pass(&form.password)?,
        },
    )?;
    cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));
    info!("new user {} registered", user.username);

    Ok(FormResponse::Redirect(Redirect::to("/")))
}
