//! Statistics API endpoints

use api_types::stats::{CategoryView, MemberSpendView, MonthlyView, Statistic, StatsGet};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user};

fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Inr => api_types::Currency::Inr,
    }
}

/// Handle requests for group statistics.
pub async fn get_stats(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<StatsGet>,
) -> Result<Json<Statistic>, ServerError> {
    let stats = state
        .engine
        .group_statistics(&payload.group_id, &user.username, payload.months)
        .await?;

    let categories = stats
        .categories
        .into_iter()
        .map(|row| CategoryView {
            category: row.category.as_str().to_string(),
            total_minor: row.total.minor(),
            share_bp: row.share_bp,
        })
        .collect();
    let members = stats
        .members
        .into_iter()
        .map(|row| MemberSpendView {
            username: row.user_id,
            display_name: row.display_name,
            paid_minor: row.paid.minor(),
        })
        .collect();
    let monthly = stats
        .monthly
        .into_iter()
        .map(|row| MonthlyView {
            year: row.year,
            month: row.month,
            total_minor: row.total.minor(),
        })
        .collect();

    Ok(Json(Statistic {
        currency: map_currency(stats.currency),
        total_spent_minor: stats.total_spent.minor(),
        expense_count: stats.expense_count,
        average_expense_minor: stats.average_expense.minor(),
        categories,
        members,
        monthly,
    }))
}
