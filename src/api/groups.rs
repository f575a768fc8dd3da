use actix_web::{delete, get, post, web, HttpResponse};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Session;
use crate::balance::{balances_by_name, compute_balances, MemberBalance};
use crate::error::ApiError;
use crate::exchange::settle_up;
use crate::schemas::{Group, NewGroup};
use crate::store::MemberAdded;
use crate::validation::{group_members, non_blank, ValidationError};
use crate::AppState;

async fn find_group(state: &AppState, id: &str) -> Result<Group, ApiError> {
    state
        .store
        .get_group(id)
        .await?
        .ok_or_else(|| ApiError::group_not_found(id))
}

/// Recomputes the group's balances from its whole expense history.
pub(crate) async fn group_balances(
    state: &AppState,
    id: &str,
) -> Result<Vec<MemberBalance>, ApiError> {
    let group = find_group(state, id).await?;
    let expenses = state.store.expenses_for_group(id).await?;
    debug!(group = %id, expenses = expenses.len(), "computing balances");
    Ok(compute_balances(&group.members, &expenses)?)
}

#[get("/groups")]
pub async fn list_groups(
    state: web::Data<AppState>,
    _session: Session,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.store.list_groups().await?))
}

#[post("/groups")]
pub async fn add_group(
    state: web::Data<AppState>,
    session: Session,
    json: web::Json<NewGroup>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();
    let name = non_blank(&request.name, "name")?;

    let mut friends = Vec::with_capacity(request.members.len());
    for member in &request.members {
        let friend = state
            .store
            .get_friend(&member.id)
            .await?
            .ok_or_else(|| ApiError::friend_not_found(&member.id))?;
        friends.push(friend);
    }

    let group = Group {
        id: Uuid::new_v4().to_string(),
        name,
        members: group_members(friends)?,
    };
    state.store.insert_group(&group).await?;
    info!(user = %session.username(), group = %group.id, members = group.members.len(), "group added");
    Ok(HttpResponse::Created().json(group))
}

#[get("/groups/{id}")]
pub async fn get_group(
    state: web::Data<AppState>,
    _session: Session,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(find_group(&state, &id).await?))
}

#[delete("/groups/{id}")]
pub async fn delete_group(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    if !state.store.delete_group(&id).await? {
        return Err(ApiError::group_not_found(&id));
    }
    info!(user = %session.username(), group = %id, "group deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[post("/groups/{id}/add-friend/{friend_id}")]
pub async fn add_friend_to_group(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, friend_id) = path.into_inner();
    let friend = state
        .store
        .get_friend(&friend_id)
        .await?
        .ok_or_else(|| ApiError::friend_not_found(&friend_id))?;

    match state.store.add_member(&id, &friend).await? {
        MemberAdded::Added => {}
        MemberAdded::GroupMissing => return Err(ApiError::group_not_found(&id)),
        MemberAdded::AlreadyMember => {
            return Err(ApiError::Conflict(format!(
                "{} is already a member of the group",
                friend.name
            )))
        }
        MemberAdded::NameTaken => {
            return Err(ValidationError::DuplicateMemberName(friend.name).into())
        }
    }
    info!(user = %session.username(), group = %id, friend = %friend.id, "member added");
    let group = find_group(&state, &id).await?;
    Ok(HttpResponse::Ok().json(group))
}

#[get("/groups/{id}/balances")]
pub async fn get_balances(
    state: web::Data<AppState>,
    _session: Session,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let balances = group_balances(&state, &id).await?;
    Ok(HttpResponse::Ok().json(balances_by_name(&balances)))
}

#[get("/groups/{id}/exchanges")]
pub async fn get_exchanges(
    state: web::Data<AppState>,
    _session: Session,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let balances = group_balances(&state, &id).await?;
    Ok(HttpResponse::Ok().json(settle_up(&balances)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use actix_web::{http::StatusCode, test as actix_test};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use crate::schemas::Group;
    use crate::test_support::{add_expense, bearer, create_friend, create_group, test_app};

    #[actix_web::test]
    async fn group_is_created_with_its_members() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "Ana").await;
        let ben = create_friend(&app, "Ben").await;
        let group = create_group(&app, "Trip", &[&ana.id, &ben.id, &ana.id]).await;
        assert_eq!(group.members, vec![ana, ben]);

        let request = actix_test::TestRequest::get()
            .uri(&format!("/api/groups/{}", group.id))
            .insert_header(bearer())
            .to_request();
        let fetched: Group = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(fetched, group);
    }

    #[actix_web::test]
    async fn group_creation_rules() {
        let app = actix_test::init_service(test_app()).await;
        let post = |body: Value| {
            actix_test::TestRequest::post()
                .uri("/api/groups")
                .insert_header(bearer())
                .set_json(body)
                .to_request()
        };

        let empty = post(json!({ "name": "Nobody", "members": [] }));
        let response = actix_test::call_service(&app, empty).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let unknown = post(json!({ "name": "Ghosts", "members": [{ "id": "nope" }] }));
        let response = actix_test::call_service(&app, unknown).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unknown_group_is_not_found() {
        let app = actix_test::init_service(test_app()).await;
        for uri in [
            "/api/groups/missing",
            "/api/groups/missing/balances",
            "/api/groups/missing/exchanges",
        ] {
            let request = actix_test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer())
                .to_request();
            let response = actix_test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[actix_web::test]
    async fn adding_a_member_is_retroactive() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "Ana").await;
        let ben = create_friend(&app, "Ben").await;
        let cy = create_friend(&app, "Cy").await;
        let group = create_group(&app, "Trip", &[&ana.id, &ben.id]).await;
        add_expense(
            &app,
            json!({
                "description": "Hotel",
                "amount": 100,
                "group": { "id": group.id },
                "paidBy": { "id": ana.id },
            }),
        )
        .await;

        let balances = |app_uri: String| {
            actix_test::TestRequest::get()
                .uri(&app_uri)
                .insert_header(bearer())
                .to_request()
        };
        let uri = format!("/api/groups/{}/balances", group.id);
        let before: BTreeMap<String, Decimal> =
            actix_test::call_and_read_body_json(&app, balances(uri.clone())).await;
        assert_eq!(before["Ana"], Decimal::from(50));
        assert_eq!(before["Ben"], Decimal::from(-50));

        let request = actix_test::TestRequest::post()
            .uri(&format!("/api/groups/{}/add-friend/{}", group.id, cy.id))
            .insert_header(bearer())
            .to_request();
        let updated: Group = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(updated.members.len(), 3);

        let after: BTreeMap<String, Decimal> =
            actix_test::call_and_read_body_json(&app, balances(uri)).await;
        assert_eq!(after["Ana"], Decimal::new(6666, 2));
        assert_eq!(after["Ben"], Decimal::new(-3333, 2));
        assert_eq!(after["Cy"], Decimal::new(-3333, 2));
    }

    #[actix_web::test]
    async fn adding_an_existing_member_is_a_conflict() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "Ana").await;
        let other_ana = create_friend(&app, "Ana").await;
        let group = create_group(&app, "Trip", &[&ana.id]).await;

        let add = |friend_id: &str| {
            actix_test::TestRequest::post()
                .uri(&format!("/api/groups/{}/add-friend/{friend_id}", group.id))
                .insert_header(bearer())
                .to_request()
        };
        let response = actix_test::call_service(&app, add(&ana.id)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = actix_test::call_service(&app, add(&other_ana.id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = actix_test::call_service(&app, add("missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn exchanges_settle_the_group() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "Ana").await;
        let ben = create_friend(&app, "Ben").await;
        let group = create_group(&app, "Trip", &[&ana.id, &ben.id]).await;
        add_expense(
            &app,
            json!({
                "description": "Fuel",
                "amount": 80,
                "group": { "id": group.id },
                "payments": [{ "friend": { "id": ben.id }, "amount": 80 }],
            }),
        )
        .await;

        let request = actix_test::TestRequest::get()
            .uri(&format!("/api/groups/{}/exchanges", group.id))
            .insert_header(bearer())
            .to_request();
        let exchanges: Value = actix_test::call_and_read_body_json(&app, request).await;
        let exchanges = exchanges.as_array().unwrap();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0]["payer"]["name"], "Ana");
        assert_eq!(exchanges[0]["receiver"]["name"], "Ben");
        assert_eq!(exchanges[0]["amount"].as_f64(), Some(40.0));
    }

    #[actix_web::test]
    async fn deleting_a_group() {
        let app = actix_test::init_service(test_app()).await;
        let ana = create_friend(&app, "Ana").await;
        let group = create_group(&app, "Trip", &[&ana.id]).await;

        let delete = || {
            actix_test::TestRequest::delete()
                .uri(&format!("/api/groups/{}", group.id))
                .insert_header(bearer())
                .to_request()
        };
        let response = actix_test::call_service(&app, delete()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = actix_test::call_service(&app, delete()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
