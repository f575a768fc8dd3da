//! HTTP routes, all mounted under `/api`.

use actix_web::{error, web, HttpRequest};
use tracing::debug;

use crate::auth;
use crate::error::ApiError;

pub mod expenses;
pub mod friends;
pub mod groups;

// Body and path rejections use the same `{"error": ...}` shape as everything else.
fn json_error(err: error::JsonPayloadError, request: &HttpRequest) -> actix_web::Error {
    debug!(path = %request.path(), error = %err, "rejected request body");
    ApiError::BadRequest(err.to_string()).into()
}

fn path_error(err: error::PathError, request: &HttpRequest) -> actix_web::Error {
    debug!(path = %request.path(), error = %err, "rejected request path");
    ApiError::BadRequest(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .service(auth::login)
            .service(friends::list_friends)
            .service(friends::add_friend)
            .service(friends::delete_friend)
            .service(groups::list_groups)
            .service(groups::add_group)
            .service(groups::get_group)
            .service(groups::delete_group)
            .service(groups::add_friend_to_group)
            .service(groups::get_balances)
            .service(groups::get_exchanges)
            .service(expenses::add_expense)
            .service(expenses::get_group_expenses)
            .service(expenses::get_balances),
    );
}
