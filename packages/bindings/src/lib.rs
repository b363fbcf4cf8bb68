use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Fixed assets
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FixedAssetReconInput {
    rollforward: month_end_core::fixed_assets::RollforwardReport,
    activity: month_end_core::fixed_assets::ActivityReport,
}

#[napi]
pub fn reconcile_fixed_assets(input_json: String) -> NapiResult<String> {
    let input: FixedAssetReconInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        month_end_core::fixed_assets::reconcile_reports(&input.rollforward, &input.activity)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// AR recon
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ArReconInput {
    aged: Vec<month_end_core::ar_recon::OpenInvoice>,
    trial_balance: Vec<month_end_core::ar_recon::OpenInvoice>,
}

#[napi]
pub fn reconcile_ar(input_json: String) -> NapiResult<String> {
    let input: ArReconInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = month_end_core::ar_recon::reconcile_invoices(&input.aged, &input.trial_balance)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn build_amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: month_end_core::amortization::LoanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        month_end_core::amortization::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Close calendar
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CloseScheduleInput {
    calendar: month_end_core::close_calendar::CloseCalendarInput,
    #[serde(default)]
    systems: Option<month_end_core::close_calendar::CloseSystems>,
}

#[napi]
pub fn build_close_schedule(input_json: String) -> NapiResult<String> {
    let input: CloseScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let systems = input.systems.unwrap_or_default();
    let output = month_end_core::close_calendar::build_schedule(&input.calendar, &systems)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn render_close_email(input_json: String) -> NapiResult<String> {
    let input: CloseScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let systems = input.systems.unwrap_or_default();
    let output = month_end_core::close_calendar::build_schedule(&input.calendar, &systems)
        .map_err(to_napi_error)?;
    Ok(month_end_core::close_calendar::render_email_markdown(
        &output.result,
        &systems,
    ))
}

// ---------------------------------------------------------------------------
// Forensics
// ---------------------------------------------------------------------------

#[napi]
pub fn find_target_sums(input_json: String) -> NapiResult<String> {
    let input: month_end_core::forensics::TargetSumInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = month_end_core::forensics::find_target_sums(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct DuplicatesInput {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    #[serde(default)]
    ignore_columns: Vec<String>,
}

#[napi]
pub fn find_duplicates(input_json: String) -> NapiResult<String> {
    let input: DuplicatesInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = month_end_core::forensics::find_duplicates(
        &input.headers,
        &input.rows,
        &input.ignore_columns,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
