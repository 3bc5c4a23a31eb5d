use serde::Serialize;
use tracing::{debug, info};

use crate::debuts::export::{export_xlsx, EXPORT_FILE_NAME};
use crate::debuts::presentation::StyledTable;
use crate::debuts::{
    apply_filters, filter_options, present, DebutTable, FilterOptions, FilterSelection,
    FinalTable, PresentedTable,
};
use crate::error::DashboardError;
use crate::services::session_store::SessionState;

pub const RESULTS_TITLE: &str = "Debütanten";
pub const RUN_PROMPT: &str = "Please set your filters and click Run to see results.";
pub const CLEARED_NOTICE: &str = "All filters cleared!";

/// User interaction driving one render
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    /// Re-render the current state
    Show,
    /// Change filter widgets without running
    Select(FilterSelection),
    /// Apply a selection and show the results
    Run(FilterSelection),
    /// Reset filters and results, keeping the login
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub title: String,
    pub summary: String,
    pub count: usize,
    pub table: StyledTable,
    /// Offered only when there is at least one row
    pub export_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub loaded_records: usize,
    pub options: FilterOptions,
    pub selection: FilterSelection,
    pub notice: Option<String>,
    pub prompt: Option<String>,
    pub results: Option<ResultView>,
}

/// Apply `action` to `state` against the loaded table.
///
/// Pure: the returned state replaces the session's state, and the view is
/// everything the page shows. `table` is never modified.
pub fn render(
    state: SessionState,
    action: DashboardAction,
    table: &DebutTable,
) -> (SessionState, DashboardView) {
    let mut notice = None;
    let state = match action {
        DashboardAction::Show => state,
        DashboardAction::Select(selection) => SessionState { selection, ..state },
        DashboardAction::Run(selection) => SessionState {
            selection,
            run_clicked: true,
            ..state
        },
        DashboardAction::Clear => {
            notice = Some(CLEARED_NOTICE.to_string());
            state.cleared()
        }
    };

    let results = run_pipeline(&state, table).map(|presented| {
        let count = presented.final_table.len();
        info!("Rendering {} debutants", count);
        ResultView {
            title: RESULTS_TITLE.to_string(),
            summary: format!("{count} {RESULTS_TITLE}"),
            count,
            table: presented.styled,
            export_file_name: (count > 0).then(|| EXPORT_FILE_NAME.to_string()),
        }
    });

    let view = DashboardView {
        loaded_records: table.len(),
        options: filter_options(table),
        selection: state.selection.clone(),
        notice,
        prompt: (!state.run_clicked).then(|| RUN_PROMPT.to_string()),
        results,
    };

    (state, view)
}

/// The table the user is currently looking at, with raw values
pub fn final_table(state: &SessionState, table: &DebutTable) -> Option<FinalTable> {
    run_pipeline(state, table).map(|presented| presented.final_table)
}

/// xlsx bytes of the displayed table; requires a run with at least one row
pub fn export(state: &SessionState, table: &DebutTable) -> Result<Vec<u8>, DashboardError> {
    let final_table = final_table(state, table).ok_or(DashboardError::NotRun)?;
    if final_table.is_empty() {
        return Err(DashboardError::EmptyExport);
    }
    export_xlsx(&final_table).map_err(|e| DashboardError::Export(e.to_string()))
}

fn run_pipeline(state: &SessionState, table: &DebutTable) -> Option<PresentedTable> {
    if !state.run_clicked {
        debug!("Run not clicked yet; skipping filters");
        return None;
    }
    let filtered = apply_filters(table, &state.selection);
    Some(present(&filtered))
}
