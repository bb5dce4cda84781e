//! Balance sheet and dashboard endpoints.

use api_types::balance::{
    BalanceSheetResponse, GroupBalanceView, MemberBalanceView, OverviewResponse, TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState, user};

fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Inr => api_types::Currency::Inr,
    }
}

/// Handle requests for a group's balance sheet and suggested transfers.
pub async fn group_sheet(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<BalanceSheetResponse>, ServerError> {
    let sheet = state
        .engine
        .group_balance_sheet(&group_id, &user.username)
        .await?;

    let balances = sheet
        .balances
        .into_iter()
        .map(|row| MemberBalanceView {
            username: row.user_id,
            display_name: row.display_name,
            paid_minor: row.paid.minor(),
            owes_minor: row.owes.minor(),
            settled_minor: row.settled.minor(),
            balance_minor: row.balance.minor(),
        })
        .collect();
    let transfers = sheet
        .transfers
        .into_iter()
        .map(|transfer| TransferView {
            from: transfer.from,
            to: transfer.to,
            amount_minor: transfer.amount.minor(),
        })
        .collect();

    Ok(Json(BalanceSheetResponse {
        group_id: sheet.group_id,
        currency: map_currency(sheet.currency),
        balances,
        transfers,
        residual_minor: sheet.residual.minor(),
    }))
}

/// Handle requests for the caller's cross-group overview.
pub async fn dashboard(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<OverviewResponse>, ServerError> {
    let overview = state.engine.user_balance_overview(&user.username).await?;

    let groups = overview
        .groups
        .into_iter()
        .map(|row| GroupBalanceView {
            group_id: row.group_id,
            group_name: row.group_name,
            balance_minor: row.balance.minor(),
        })
        .collect();

    Ok(Json(OverviewResponse {
        net_minor: overview.net.minor(),
        receivable_minor: overview.receivable.minor(),
        payable_minor: overview.payable.minor(),
        groups,
    }))
}
