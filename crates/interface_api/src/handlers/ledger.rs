//! Ledger handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::{Amount, EntryId, OwnerRef};
use domain_ledger::{
    EntryDraft, EntryType, OwnerPolicy, PageRequest, PageToken, TimeRange, DEFAULT_PAGE_LIMIT,
};

use crate::dto::ledger::*;
use crate::{error::ApiError, AppState};

/// Largest page size a history request may ask for
const MAX_PAGE_LIMIT: usize = 1000;

/// Appends a new entry to its owner's sequence
pub async fn append_entry(
    State(state): State<AppState>,
    Json(request): Json<AppendEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    request.validate()?;

    // Compensating entries are only ever minted by the reversal path.
    if request.entry_type == EntryType::Reversal {
        return Err(ApiError::Validation(
            "Reversal entries are created via the reverse endpoint".to_string(),
        ));
    }

    let amount = Amount::new(request.amount, request.scale)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let mut draft = EntryDraft::new(
        OwnerRef::new(request.owner_kind, request.owner_id),
        amount,
        request.entry_type,
    )
    .with_metadata(request.metadata);
    if let Some(description) = request.description {
        draft = draft.with_description(description);
    }

    let policy = if state.config.allow_negative_balance {
        OwnerPolicy::default()
    } else {
        OwnerPolicy::no_overdraft()
    };

    let entry = state.ledger.append(draft, &policy).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Gets an entry by ID
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntryResponse>, ApiError> {
    let id = parse_entry_id(&id)?;
    let entry = state.queries.get(id).await?;
    Ok(Json(entry.into()))
}

/// Reverses an entry by appending a compensating entry
///
/// Idempotent: reversing an already-reversed entry returns the existing
/// compensation with `already_reversed` set.
pub async fn reverse_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReverseEntryRequest>,
) -> Result<Json<ReversalResponse>, ApiError> {
    request.validate()?;

    let id = parse_entry_id(&id)?;
    let outcome = state.ledger.reverse(id, request.reason).await?;

    Ok(Json(ReversalResponse {
        already_reversed: outcome.was_noop(),
        entry: outcome.into_entry().into(),
    }))
}

/// Gets an owner's balance, current or as of a point in time
pub async fn get_balance(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let owner = OwnerRef::new(kind, id);

    let balance = match query.as_of {
        Some(at) => state.queries.balance_as_of(&owner, at).await?,
        None => state.queries.current_balance(&owner).await?,
    };

    Ok(Json(BalanceResponse {
        owner_kind: owner.kind,
        owner_id: owner.id,
        balance: balance.value(),
        scale: balance.scale(),
        as_of: query.as_of,
    }))
}

/// Gets one page of an owner's history, voided entries included
pub async fn get_history(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let owner = OwnerRef::new(kind, id);

    let range = TimeRange {
        from: query.from,
        to: query.to,
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let page = match query.token {
        Some(token) => {
            let token: PageToken = token
                .parse()
                .map_err(|e: domain_ledger::store::PageTokenError| {
                    ApiError::BadRequest(e.to_string())
                })?;
            PageRequest::resume(token, limit)
        }
        None => PageRequest::first(limit),
    };

    let page = state.queries.history(&owner, &range, &page).await?;

    Ok(Json(HistoryResponse {
        entries: page.entries.into_iter().map(Into::into).collect(),
        next_token: page.next_token.map(|t| t.to_string()),
    }))
}

/// Exports an owner's full audit trail with explicit voided flags
pub async fn export_audit(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<AuditExportResponse>, ApiError> {
    let owner = OwnerRef::new(kind, id);
    let records = state.queries.audit_export(&owner).await?;

    Ok(Json(AuditExportResponse {
        owner_kind: owner.kind,
        owner_id: owner.id,
        records: records.into_iter().map(Into::into).collect(),
    }))
}

fn parse_entry_id(raw: &str) -> Result<EntryId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Malformed entry id '{raw}'")))
}
