use crate::template_utils::render_to_string;
use gazette_models::Error;
use rocket::{
    catch,
    http::Status,
    request::Request,
    response::{self, content::RawHtml, Responder},
};
use tera::Context;
use tracing::error;

/// Turns model-layer failures into the right error page.
pub struct ErrorPage(pub Error);

impl From<Error> for ErrorPage {
    fn from(err: Error) -> ErrorPage {
        ErrorPage(err)
    }
}

impl<'r> Responder<'r, 'static> for ErrorPage {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = match self.0 {
            Error::NotFound => Status::NotFound,
            Error::Unauthorized => Status::Unauthorized,
            ref err => {
                error!("error while handling {}: {:?}", req.uri(), err);
                Status::InternalServerError
            }
        };
        let template = if status == Status::NotFound {
            "errors/404.html"
        } else {
            "errors/500.html"
        };

        let mut context = Context::new();
        context.insert("path", req.uri().path().as_str());
        match render_to_string(template, &context) {
            Ok(body) => (status, RawHtml(body)).respond_to(req),
            Err(_) => Err(status),
        }
    }
}

#[catch(404)]
pub fn not_found(_req: &Request) -> ErrorPage {
    ErrorPage(Error::NotFound)
}

#[catch(500)]
pub fn server_error(_req: &Request) -> ErrorPage {
    ErrorPage(Error::Render)
}
