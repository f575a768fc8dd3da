use actix_web::{delete, get, post, web, HttpResponse};
use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::ApiError;
use crate::schemas::{Friend, NewFriend};
use crate::validation::non_blank;
use crate::AppState;

#[get("/friends")]
pub async fn list_friends(
    state: web::Data<AppState>,
    _session: Session,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.store.list_friends().await?))
}

#[post("/friends")]
pub async fn add_friend(
    state: web::Data<AppState>,
    session: Session,
    json: web::Json<NewFriend>,
) -> Result<HttpResponse, ApiError> {
    let friend = Friend {
        id: Uuid::new_v4().to_string(),
        name: non_blank(&json.name, "name")?,
    };
    state.store.insert_friend(&friend).await?;
    info!(user = %session.username(), friend = %friend.id, "friend added");
    Ok(HttpResponse::Created().json(friend))
}

#[delete("/friends/{id}")]
pub async fn delete_friend(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    if state.store.get_friend(&id).await?.is_none() {
        return Err(ApiError::friend_not_found(&id));
    }
    if state.store.friend_in_use(&id).await? {
        return Err(ApiError::Conflict(
            "This friend is part of a group or has expenses".to_string(),
        ));
    }
    if !state.store.delete_friend(&id).await? {
        return Err(ApiError::friend_not_found(&id));
    }
    info!(user = %session.username(), friend = %id, "friend deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test as actix_test};
    use serde_json::json;

    use crate::schemas::Friend;
    use crate::test_support::{bearer, create_friend, create_group, test_app};

    #[actix_web::test]
    async fn friends_are_created_and_listed() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "  Ana ").await;
        assert_eq!(ana.name, "Ana");

        let request = actix_test::TestRequest::get()
            .uri("/api/friends")
            .insert_header(bearer())
            .to_request();
        let friends: Vec<Friend> = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(friends, vec![ana]);
    }

    #[actix_web::test]
    async fn blank_friend_name_is_a_bad_request() {
        let app = actix_test::init_service(test_app()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/friends")
            .insert_header(bearer())
            .set_json(json!({ "name": "   " }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn friends_in_a_group_cannot_be_deleted() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "Ana").await;
        let ben = create_friend(&app, "Ben").await;
        create_group(&app, "Trip", &[&ana.id]).await;

        let delete = |id: &str| {
            actix_test::TestRequest::delete()
                .uri(&format!("/api/friends/{id}"))
                .insert_header(bearer())
                .to_request()
        };
        let response = actix_test::call_service(&app, delete(&ana.id)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = actix_test::call_service(&app, delete(&ben.id)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = actix_test::call_service(&app, delete(&ben.id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn listing_needs_a_session() {
        let app = actix_test::init_service(test_app()).await;
        let request = actix_test::TestRequest::get().uri("/api/friends").to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
