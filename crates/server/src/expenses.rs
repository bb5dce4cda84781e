//! Expense API endpoints

use api_types::expense::{
    ExpenseCreated, ExpenseDelete, ExpenseGet, ExpenseList, ExpenseListResponse, ExpenseNew,
    ExpenseUpdate, ExpenseView, SplitKind, SplitRequest, SplitView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};

use engine::{
    ExpenseCategory, ExpenseListFilter, Money, NewExpenseCmd, SplitSpec, UpdateExpenseCmd,
};

use crate::{ServerError, server::ServerState, user};

fn map_split(split: SplitRequest) -> Result<SplitSpec, ServerError> {
    match split.kind {
        SplitKind::Equal => {
            let participants = split.participants.ok_or_else(|| {
                ServerError::Generic("equal split requires participants".to_string())
            })?;
            Ok(SplitSpec::Equal { participants })
        }
        SplitKind::Unequal => {
            let shares = split
                .shares
                .ok_or_else(|| ServerError::Generic("unequal split requires shares".to_string()))?;
            let shares = shares
                .into_iter()
                .map(|share| {
                    let amount = share.amount_minor.ok_or_else(|| {
                        ServerError::Generic("unequal shares require amount_minor".to_string())
                    })?;
                    Ok((share.username, Money::new(amount)))
                })
                .collect::<Result<Vec<_>, ServerError>>()?;
            Ok(SplitSpec::Unequal { shares })
        }
        SplitKind::Percent => {
            let shares = split
                .shares
                .ok_or_else(|| ServerError::Generic("percent split requires shares".to_string()))?;
            let shares = shares
                .into_iter()
                .map(|share| {
                    let percent_bp = share.percent_bp.ok_or_else(|| {
                        ServerError::Generic("percent shares require percent_bp".to_string())
                    })?;
                    Ok((share.username, percent_bp))
                })
                .collect::<Result<Vec<_>, ServerError>>()?;
            Ok(SplitSpec::Percent { shares })
        }
    }
}

fn view(expense: engine::Expense, utc: FixedOffset) -> ExpenseView {
    let splits = expense
        .splits
        .into_iter()
        .map(|split| SplitView {
            username: split.user_id,
            amount_minor: split.amount.minor(),
            percent_bp: split.percent_bp,
            shares: split.shares,
        })
        .collect();

    ExpenseView {
        id: expense.id,
        title: expense.title,
        category: expense.category.as_str().to_string(),
        amount_minor: expense.amount.minor(),
        paid_by: expense.paid_by,
        expense_date: expense.expense_date.with_timezone(&utc),
        description: expense.description,
        receipt_ref: expense.receipt_ref,
        created_by: expense.created_by,
        splits,
    }
}

pub async fn expense_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let split = map_split(payload.split)?;
    let paid_by = payload.paid_by.unwrap_or_else(|| user.username.clone());
    let expense_date = payload
        .expense_date
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let mut cmd = NewExpenseCmd::new(
        payload.group_id,
        user.username.clone(),
        payload.title,
        Money::new(payload.amount_minor),
        paid_by,
        expense_date,
        split,
    );
    if let Some(category) = payload.category.as_deref() {
        cmd = cmd.category(ExpenseCategory::try_from(category)?);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(receipt_ref) = payload.receipt_ref {
        cmd = cmd.receipt_ref(receipt_ref);
    }

    let id = state.engine.new_expense(cmd).await?;

    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseList>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let mut filter = ExpenseListFilter::default();
    if let Some(category) = payload.category.as_deref() {
        filter = filter.category(ExpenseCategory::try_from(category)?);
    }
    if let Some(since) = payload.since {
        filter = filter.since(since.with_timezone(&Utc));
    }
    if let Some(until) = payload.until {
        filter = filter.until(until.with_timezone(&Utc));
    }
    if let Some(limit) = payload.limit {
        filter = filter.limit(limit);
    }

    let expenses = state
        .engine
        .list_expenses(&payload.group_id, &user.username, filter)
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let expenses = expenses
        .into_iter()
        .map(|expense| view(expense, utc))
        .collect();

    Ok(Json(ExpenseListResponse { expenses }))
}

pub async fn get_detail(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseGet>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state
        .engine
        .expense_detail(&payload.group_id, &payload.expense_id, &user.username)
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok(Json(view(expense, utc)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<StatusCode, ServerError> {
    let mut cmd = UpdateExpenseCmd::new(payload.group_id, expense_id, user.username.clone());
    if let Some(title) = payload.title {
        cmd = cmd.title(title);
    }
    if let Some(amount_minor) = payload.amount_minor {
        cmd = cmd.amount(Money::new(amount_minor));
    }
    if let Some(category) = payload.category.as_deref() {
        cmd = cmd.category(ExpenseCategory::try_from(category)?);
    }
    if let Some(paid_by) = payload.paid_by {
        cmd = cmd.paid_by(paid_by);
    }
    if let Some(expense_date) = payload.expense_date {
        cmd = cmd.expense_date(expense_date.with_timezone(&Utc));
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(receipt_ref) = payload.receipt_ref {
        cmd = cmd.receipt_ref(receipt_ref);
    }
    if let Some(split) = payload.split {
        cmd = cmd.split(map_split(split)?);
    }

    state.engine.update_expense(cmd).await?;

    Ok(StatusCode::OK)
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
    Json(payload): Json<ExpenseDelete>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(&payload.group_id, &expense_id, &user.username)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
