use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Invoice;
use crate::services::strings::Strings;
use crate::services::surface::{self, FormCommand, FormSurface};
use crate::utils::format_decimal;

/// Fixed settle times between steps. The remote page gives no completion signal, so these stand in for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Delays {
    /// After clicking "edit", before the line-detail fields exist.
    pub edit_settle_ms: u64,
    /// Between the line save and the chained document submit.
    pub chain_ms: u64,
    /// After "save document", before looking for error alerts.
    pub submit_settle_ms: u64,
    /// Each half of the hide/show swap after a submit.
    pub flash_ms: u64,
    /// Before filling the next invoice in auto mode.
    pub advance_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Delays {
            edit_settle_ms: 500,
            chain_ms: 500,
            submit_settle_ms: 700,
            flash_ms: 250,
            advance_ms: 500,
        }
    }
}

impl Delays {
    pub fn immediate() -> Self {
        Delays {
            edit_settle_ms: 0,
            chain_ms: 0,
            submit_settle_ms: 0,
            flash_ms: 0,
            advance_ms: 0,
        }
    }
}

async fn wait(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Filling,
    AwaitingSaveConfirmation,
    Submitting,
    AwaitingSubmitConfirmation,
    Error,
    AutoAdvancing,
    Done,
}

/// User-facing toasts.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

struct SubmissionState {
    phase: Phase,
    cursor: usize,
    auto: bool,
    surface: Option<Arc<dyn FormSurface>>,
}

enum Step {
    Fill,
    Submit,
}

/// Drives the remote form through fill, line save and document submit for a list of invoices.
///
/// Clones share one state, so a second task can turn auto mode off while a chain runs. The flag is
/// only read between steps; a fill or submit already under way always finishes.
#[derive(Clone)]
pub struct Submission {
    invoices: Arc<Vec<Invoice>>,
    state: Arc<Mutex<SubmissionState>>,
    notifier: Arc<dyn Notifier>,
    strings: Arc<Strings>,
    delays: Delays,
}

impl Submission {
    pub fn new(invoices: Vec<Invoice>, notifier: Arc<dyn Notifier>, strings: Arc<Strings>, delays: Delays) -> Self {
        Submission {
            invoices: Arc::new(invoices),
            state: Arc::new(Mutex::new(SubmissionState {
                phase: Phase::Idle,
                cursor: 0,
                auto: false,
                surface: None,
            })),
            notifier,
            strings,
            delays,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn mount(&self, surface: Arc<dyn FormSurface>) {
        self.lock().surface = Some(surface);
    }

    pub fn unmount(&self) -> Option<Arc<dyn FormSurface>> {
        self.lock().surface.take()
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    pub fn is_auto(&self) -> bool {
        self.lock().auto
    }

    pub fn current(&self) -> Option<Invoice> {
        let cursor = self.cursor();
        self.invoices.get(cursor).cloned()
    }

    fn last_index(&self) -> usize {
        self.invoices.len().saturating_sub(1)
    }

    pub fn previous(&self) -> usize {
        let mut state = self.lock();
        state.cursor = state.cursor.saturating_sub(1);
        state.cursor
    }

    pub fn next(&self) -> usize {
        let last = self.last_index();
        let mut state = self.lock();
        state.cursor = (state.cursor + 1).min(last);
        state.cursor
    }

    /// Jump to a 1-based position, clamped into the list.
    pub fn go_to(&self, position: i64) -> usize {
        let len = self.invoices.len().max(1) as i64;
        let index = (position.clamp(1, len) - 1) as usize;
        self.lock().cursor = index;
        index
    }

    /// Turning auto mode on fills the current invoice straight away and keeps chaining from there.
    pub async fn set_auto(&self, on: bool) {
        if !on {
            self.stop_auto();
            return;
        }
        self.lock().auto = true;
        tracing::info!(cursor = self.cursor(), "auto submission engaged");
        self.run(Step::Fill).await;
    }

    pub async fn toggle_auto(&self) {
        let on = !self.is_auto();
        self.set_auto(on).await;
    }

    pub fn stop_auto(&self) {
        let mut state = self.lock();
        if state.auto {
            tracing::info!(cursor = state.cursor, "auto submission disengaged");
        }
        state.auto = false;
    }

    pub async fn fill_current(&self) {
        self.run(Step::Fill).await;
    }

    pub async fn submit(&self) {
        self.run(Step::Submit).await;
    }

    async fn run(&self, first: Step) {
        let mut step = Some(first);
        while let Some(current) = step {
            step = match current {
                Step::Fill => self.fill_step().await,
                Step::Submit => self.submit_step().await,
            };
        }
    }

    async fn fill_step(&self) -> Option<Step> {
        let surface = self.surface()?;
        let cursor = self.cursor();
        let Some(invoice) = self.invoices.get(cursor).cloned() else {
            tracing::warn!(cursor, "no invoice at cursor");
            return None;
        };

        self.lock().phase = Phase::Filling;
        tracing::info!(cursor, number = %invoice.number, "filling invoice");
        if let Err(err) = surface.apply(&header_commands(&invoice)).await {
            self.fail(err);
            return None;
        }

        wait(self.delays.edit_settle_ms).await;
        if let Err(err) = surface.apply(&line_commands(&invoice)).await {
            self.fail(err);
            return None;
        }
        self.lock().phase = Phase::AwaitingSaveConfirmation;

        if self.is_auto() {
            wait(self.delays.chain_ms).await;
            return Some(Step::Submit);
        }
        None
    }

    async fn submit_step(&self) -> Option<Step> {
        let surface = self.surface()?;

        self.lock().phase = Phase::Submitting;
        if let Err(err) = surface
            .apply(&[FormCommand::click_id(surface::SAVE_DOCUMENT_BUTTON)])
            .await
        {
            self.fail(err);
            return None;
        }

        self.lock().phase = Phase::AwaitingSubmitConfirmation;
        wait(self.delays.submit_settle_ms).await;

        // A failing error check counts as "no errors".
        match surface.error_messages().await {
            Ok(messages) => {
                if let Some(first) = messages.into_iter().next() {
                    self.reject(AppError::RemoteForm(first));
                    return None;
                }
            }
            Err(err) => tracing::warn!(error = %err, "error alert check failed"),
        }

        wait(self.delays.flash_ms).await;
        if let Err(err) = surface.set_hidden(true).await {
            tracing::debug!(error = %err, "hide failed");
        }
        wait(self.delays.flash_ms).await;
        if let Err(err) = surface.set_hidden(false).await {
            tracing::debug!(error = %err, "show failed");
        }

        let last = self.last_index();
        let (next, finished) = {
            let mut state = self.lock();
            if !state.auto {
                if state.cursor < last {
                    state.cursor += 1;
                }
                state.phase = Phase::Idle;
                (None, false)
            } else if state.cursor < last {
                state.cursor += 1;
                state.phase = Phase::AutoAdvancing;
                (Some(Step::Fill), false)
            } else {
                state.auto = false;
                state.phase = Phase::Done;
                (None, true)
            }
        };

        if next.is_some() {
            wait(self.delays.advance_ms).await;
        } else if finished {
            tracing::info!(count = self.invoices.len(), "batch submitted");
            self.notifier.success(self.strings.get(
                "all_invoices_submitted_successfully",
                "All invoices submitted successfully!",
            ));
        } else {
            tracing::info!("invoice submitted");
            self.notifier.success(
                self.strings
                    .get("invoice_submission_success", "Invoice submitted successfully!"),
            );
        }
        next
    }

    fn surface(&self) -> Option<Arc<dyn FormSurface>> {
        let surface = self.lock().surface.clone();
        if surface.is_none() {
            tracing::warn!(error = %AppError::AutomationUnavailable, "automation requested without a surface");
            self.notifier.error(self.strings.get(
                "webview_not_available",
                "Webview not available for invoice submission.",
            ));
        }
        surface
    }

    /// Stop the chain and hand control back to the user.
    fn reject(&self, err: AppError) {
        {
            let mut state = self.lock();
            state.phase = Phase::Error;
            state.auto = false;
        }
        tracing::warn!(error = %err, cursor = self.cursor(), "submission stopped");
        let detail = match &err {
            AppError::RemoteForm(message) => message.clone(),
            other => other.to_string(),
        };
        self.notifier.error(&format!(
            "{}: {}",
            self.strings.get("invoice_submission_error", "Error submitting invoice"),
            detail
        ));
    }

    fn fail(&self, err: AppError) {
        tracing::error!(error = %err, "form command failed");
        self.reject(err);
    }
}

/// Header fields plus the click that opens the line editor.
pub fn header_commands(invoice: &Invoice) -> Vec<FormCommand> {
    let nif = if invoice.nif.trim().is_empty() {
        surface::PLACEHOLDER_NIF.to_string()
    } else {
        invoice.nif.clone()
    };
    vec![
        FormCommand::set(surface::NIF_FIELD, nif),
        FormCommand::set(surface::ATCUD_FIELD, invoice.atcud.clone()),
        FormCommand::set(surface::DOCUMENT_TYPE_FIELD, surface::DOCUMENT_TYPE),
        FormCommand::set(surface::DOCUMENT_NUMBER_FIELD, invoice.number.clone()),
        FormCommand::set(surface::ISSUE_DATE_FIELD, invoice.date.clone()),
        FormCommand::click_css(surface::EDIT_LINK),
    ]
}

/// VAT-exempt line detail for the whole amount, then the line save.
pub fn line_commands(invoice: &Invoice) -> Vec<FormCommand> {
    let amount = format_decimal(invoice.amount);
    vec![
        FormCommand::set(surface::VAT_RATE_FIELD, surface::VAT_EXEMPT),
        FormCommand::set(surface::EXEMPTION_REASON_FIELD, surface::EXEMPTION_REASON),
        FormCommand::set(surface::TOTAL_FIELD, amount.clone()),
        FormCommand::set(surface::TAXABLE_BASE_FIELD, amount),
        FormCommand::click_id(surface::SAVE_LINE_BUTTON),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::models::Language;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct RecordingSurface {
        batches: Mutex<Vec<Vec<FormCommand>>>,
        alerts: Mutex<VecDeque<Result<Vec<String>, String>>>,
        hidden: Mutex<Vec<bool>>,
        stop_on_first_submit: Mutex<Option<Submission>>,
        fail_apply: bool,
    }

    impl RecordingSurface {
        fn with_alerts(alerts: Vec<Result<Vec<String>, String>>) -> Self {
            RecordingSurface {
                alerts: Mutex::new(alerts.into()),
                ..RecordingSurface::default()
            }
        }

        fn values_of(&self, field: &str) -> Vec<String> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .flatten()
                .filter_map(|cmd| match cmd {
                    FormCommand::SetValue { field: f, value } if f == field => Some(value.clone()),
                    _ => None,
                })
                .collect()
        }

        fn submit_clicks(&self) -> usize {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .flatten()
                .filter(|cmd| **cmd == FormCommand::click_id(surface::SAVE_DOCUMENT_BUTTON))
                .count()
        }
    }

    #[async_trait]
    impl FormSurface for RecordingSurface {
        async fn apply(&self, commands: &[FormCommand]) -> AppResult<()> {
            if self.fail_apply {
                return Err(AppError::WebDriverCommand("no such element".to_string()));
            }
            self.batches.lock().unwrap().push(commands.to_vec());
            if commands.contains(&FormCommand::click_id(surface::SAVE_DOCUMENT_BUTTON)) {
                if let Some(handle) = self.stop_on_first_submit.lock().unwrap().take() {
                    handle.stop_auto();
                }
            }
            Ok(())
        }

        async fn error_messages(&self) -> AppResult<Vec<String>> {
            match self.alerts.lock().unwrap().pop_front() {
                Some(Ok(messages)) => Ok(messages),
                Some(Err(message)) => Err(AppError::WebDriverCommand(message)),
                None => Ok(Vec::new()),
            }
        }

        async fn set_hidden(&self, hidden: bool) -> AppResult<()> {
            self.hidden.lock().unwrap().push(hidden);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        successes: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.successes.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn invoice(n: usize, nif: &str) -> Invoice {
        Invoice {
            id: n.to_string(),
            number: format!("FS{:04}", n),
            atcud: format!("A/{:04}", n),
            nif: nif.to_string(),
            date: "2025-03-14".to_string(),
            amount: 12.5,
        }
    }

    fn machine(invoices: Vec<Invoice>, surface: Option<Arc<RecordingSurface>>) -> (Submission, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let submission = Submission::new(
            invoices,
            notifier.clone(),
            Arc::new(Strings::load(Language::En)),
            Delays::immediate(),
        );
        if let Some(surface) = surface {
            submission.mount(surface);
        }
        (submission, notifier)
    }

    #[tokio::test]
    async fn blank_nif_uses_placeholder() {
        let surface = Arc::new(RecordingSurface::default());
        let (submission, _) = machine(vec![invoice(1, "  ")], Some(surface.clone()));

        submission.fill_current().await;

        assert_eq!(surface.values_of(surface::NIF_FIELD), vec!["999999990"]);
        assert_eq!(submission.phase(), Phase::AwaitingSaveConfirmation);
        assert_eq!(surface.submit_clicks(), 0);
    }

    #[tokio::test]
    async fn fill_sends_header_then_line_detail() {
        let surface = Arc::new(RecordingSurface::default());
        let (submission, _) = machine(vec![invoice(7, "501234567")], Some(surface.clone()));

        submission.fill_current().await;

        let batches = surface.batches.lock().unwrap().clone();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], header_commands(&invoice(7, "501234567")));
        assert_eq!(batches[0][0], FormCommand::set(surface::NIF_FIELD, "501234567"));
        assert_eq!(batches[0][2], FormCommand::set(surface::DOCUMENT_TYPE_FIELD, "FS"));
        assert_eq!(batches[0][5], FormCommand::click_css(surface::EDIT_LINK));
        assert_eq!(batches[1][2], FormCommand::set(surface::TOTAL_FIELD, "12.50"));
        assert_eq!(batches[1][3], FormCommand::set(surface::TAXABLE_BASE_FIELD, "12.50"));
        assert_eq!(batches[1][4], FormCommand::click_id(surface::SAVE_LINE_BUTTON));
    }

    #[tokio::test]
    async fn auto_mode_walks_every_invoice_once() {
        let surface = Arc::new(RecordingSurface::default());
        let invoices = vec![invoice(1, ""), invoice(2, ""), invoice(3, "")];
        let (submission, notifier) = machine(invoices, Some(surface.clone()));

        submission.set_auto(true).await;

        assert_eq!(
            surface.values_of(surface::DOCUMENT_NUMBER_FIELD),
            vec!["FS0001", "FS0002", "FS0003"]
        );
        assert_eq!(surface.submit_clicks(), 3);
        assert_eq!(*surface.hidden.lock().unwrap(), vec![true, false, true, false, true, false]);
        assert!(!submission.is_auto());
        assert_eq!(submission.phase(), Phase::Done);
        assert_eq!(submission.cursor(), 2);
        assert_eq!(
            *notifier.successes.lock().unwrap(),
            vec!["All invoices submitted successfully!"]
        );
        assert!(notifier.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_error_stops_the_chain() {
        let surface = Arc::new(RecordingSurface::with_alerts(vec![
            Ok(vec![]),
            Ok(vec!["NIF inválido".to_string(), "second".to_string()]),
        ]));
        let invoices = vec![invoice(1, ""), invoice(2, ""), invoice(3, "")];
        let (submission, notifier) = machine(invoices, Some(surface.clone()));

        submission.set_auto(true).await;

        assert_eq!(surface.values_of(surface::DOCUMENT_NUMBER_FIELD), vec!["FS0001", "FS0002"]);
        assert_eq!(submission.phase(), Phase::Error);
        assert!(!submission.is_auto());
        assert_eq!(submission.cursor(), 1);
        assert_eq!(
            *notifier.errors.lock().unwrap(),
            vec!["Error submitting invoice: NIF inválido"]
        );
    }

    #[tokio::test]
    async fn failing_error_check_counts_as_success() {
        let surface = Arc::new(RecordingSurface::with_alerts(vec![Err("script threw".to_string())]));
        let (submission, notifier) = machine(vec![invoice(1, ""), invoice(2, "")], Some(surface));

        submission.submit().await;

        assert_eq!(submission.cursor(), 1);
        assert_eq!(submission.phase(), Phase::Idle);
        assert_eq!(
            *notifier.successes.lock().unwrap(),
            vec!["Invoice submitted successfully!"]
        );
    }

    #[tokio::test]
    async fn manual_submit_stays_on_last_invoice() {
        let surface = Arc::new(RecordingSurface::default());
        let (submission, notifier) = machine(vec![invoice(1, ""), invoice(2, "")], Some(surface));

        submission.next();
        submission.submit().await;

        assert_eq!(submission.cursor(), 1);
        assert_eq!(notifier.successes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn turning_auto_off_mid_chain_finishes_current_invoice() {
        let surface = Arc::new(RecordingSurface::default());
        let invoices = vec![invoice(1, ""), invoice(2, ""), invoice(3, "")];
        let (submission, notifier) = machine(invoices, Some(surface.clone()));
        *surface.stop_on_first_submit.lock().unwrap() = Some(submission.clone());

        submission.set_auto(true).await;

        assert_eq!(surface.values_of(surface::DOCUMENT_NUMBER_FIELD), vec!["FS0001"]);
        assert_eq!(surface.submit_clicks(), 1);
        assert_eq!(submission.cursor(), 1);
        assert_eq!(submission.phase(), Phase::Idle);
        assert_eq!(
            *notifier.successes.lock().unwrap(),
            vec!["Invoice submitted successfully!"]
        );
    }

    #[tokio::test]
    async fn missing_surface_is_reported_for_every_action() {
        let (submission, notifier) = machine(vec![invoice(1, "")], None);

        submission.fill_current().await;
        submission.submit().await;

        assert_eq!(notifier.errors.lock().unwrap().len(), 2);
        assert_eq!(
            notifier.errors.lock().unwrap()[0],
            "Webview not available for invoice submission."
        );
        assert_eq!(submission.phase(), Phase::Idle);
        assert_eq!(submission.cursor(), 0);
    }

    #[tokio::test]
    async fn failed_injection_is_surfaced() {
        let surface = Arc::new(RecordingSurface {
            fail_apply: true,
            ..RecordingSurface::default()
        });
        let (submission, notifier) = machine(vec![invoice(1, ""), invoice(2, "")], Some(surface));

        submission.set_auto(true).await;

        assert_eq!(submission.phase(), Phase::Error);
        assert!(!submission.is_auto());
        assert_eq!(notifier.errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn navigation_clamps() {
        let (submission, _) = machine(vec![invoice(1, ""), invoice(2, ""), invoice(3, "")], None);

        assert_eq!(submission.previous(), 0);
        assert_eq!(submission.next(), 1);
        assert_eq!(submission.next(), 2);
        assert_eq!(submission.next(), 2);
        assert_eq!(submission.go_to(0), 0);
        assert_eq!(submission.go_to(2), 1);
        assert_eq!(submission.go_to(99), 2);
        assert_eq!(submission.go_to(-5), 0);
    }

    #[test]
    fn navigation_on_empty_list() {
        let (submission, _) = machine(Vec::new(), None);
        assert_eq!(submission.next(), 0);
        assert_eq!(submission.go_to(3), 0);
        assert!(submission.current().is_none());
    }
}
