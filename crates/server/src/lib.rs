use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod balances;
mod expenses;
mod group;
mod memberships;
mod server;
mod settlements;
mod statistics;
mod user;

pub mod types {
    pub mod group {
        pub use api_types::group::{
            GroupCreated, GroupGet, GroupNew, GroupUpdate, GroupView, GroupsResponse,
        };
    }

    pub mod user {
        pub use api_types::user::ProfileUpdate;
    }

    pub mod member {
        pub use api_types::member::{MemberUpsert, MemberView, MembersResponse, MembershipRole};
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseCreated, ExpenseDelete, ExpenseGet, ExpenseList, ExpenseListResponse,
            ExpenseNew, ExpenseUpdate, ExpenseView, ShareSpec, SplitKind, SplitRequest, SplitView,
        };
    }

    pub mod settlement {
        pub use api_types::settlement::{
            SettlementCreated, SettlementList, SettlementNew, SettlementView, SettlementsResponse,
        };
    }

    pub mod balance {
        pub use api_types::balance::{
            BalanceSheetResponse, GroupBalanceView, MemberBalanceView, OverviewResponse,
            TransferView,
        };
    }

    pub mod stats {
        pub use api_types::stats::{Statistic, StatsGet};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidSplit(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
