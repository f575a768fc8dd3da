use actix_web::{get, post, web, HttpResponse};
use tracing::info;

use crate::api::groups::group_balances;
use crate::auth::Session;
use crate::balance::balances_by_name;
use crate::error::ApiError;
use crate::schemas::{ExpenseView, NewExpense};
use crate::validation::build_expense;
use crate::AppState;

#[post("/expenses")]
pub async fn add_expense(
    state: web::Data<AppState>,
    session: Session,
    expense: web::Json<NewExpense>,
) -> Result<HttpResponse, ApiError> {
    let request = expense.into_inner();
    let group = state
        .store
        .get_group(&request.group.id)
        .await?
        .ok_or_else(|| ApiError::group_not_found(&request.group.id))?;

    let expense = build_expense(request, &group)?;
    state.store.insert_expense(&expense).await?;
    info!(
        user = %session.username(),
        group = %group.id,
        expense = %expense.id,
        amount = %expense.amount,
        payers = expense.payments.len(),
        "expense added"
    );
    Ok(HttpResponse::Created().json(ExpenseView::from(&expense)))
}

#[get("/expenses/group/{group_id}")]
pub async fn get_group_expenses(
    state: web::Data<AppState>,
    _session: Session,
    group_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if state.store.get_group(&group_id).await?.is_none() {
        return Err(ApiError::group_not_found(&group_id));
    }
    let expenses = state.store.expenses_for_group(&group_id).await?;
    let views: Vec<ExpenseView> = expenses.iter().map(ExpenseView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// Same payload as `/groups/{id}/balances`, at the path the browser client uses.
#[get("/expenses/balances/{group_id}")]
pub async fn get_balances(
    state: web::Data<AppState>,
    _session: Session,
    group_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let balances = group_balances(&state, &group_id).await?;
    Ok(HttpResponse::Ok().json(balances_by_name(&balances)))
}
