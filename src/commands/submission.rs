use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use console::style;

use crate::args::PeriodArgs;
use crate::commands::{open_book, print_invoices, prompt, resolve_period, style_invoice};
use crate::models::InvoiceQuery;
use crate::services::state::{AppState, HostApi};
use crate::services::strings::Strings;
use crate::services::submission::{Notifier, Phase, Submission};
use crate::services::surface::{FormSurface, FORM_URL};
use crate::services::webdriver::WebDriverSurface;

/// Toasts become coloured lines on the terminal.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        println!("{}", style(message).green().bold());
    }

    fn error(&self, message: &str) {
        eprintln!("{}", style(message).red().bold());
    }
}

pub async fn run(
    state: &AppState,
    period: PeriodArgs,
    webdriver: Option<String>,
    auto: bool,
    start: i64,
) -> Result<()> {
    let period = resolve_period(period);
    let book = open_book(state, period)?;
    let invoices = book.view(&InvoiceQuery::for_period(period));
    let strings = Arc::new(state.get_strings());
    if invoices.is_empty() {
        println!("{}", style(strings.get("no_invoices", "No invoices registered yet")).italic());
        return Ok(());
    }

    let config = state.config();
    let endpoint = webdriver
        .or(config.webdriver_url.clone())
        .ok_or_else(|| anyhow!("No WebDriver endpoint; pass --webdriver or set webdriverUrl in config.json"))?;
    let surface = Arc::new(
        WebDriverSurface::connect(&endpoint, FORM_URL)
            .await
            .with_context(|| format!("Could not open the portal form through {}", endpoint))?,
    );

    let submission = Submission::new(invoices, Arc::new(TerminalNotifier), strings.clone(), config.delays);
    let form: Arc<dyn FormSurface> = surface.clone();
    submission.mount(form);
    submission.go_to(start);

    prompt("Log in to the portal in the browser, then press enter", "")?;
    if auto {
        drive(&submission, submission.set_auto(true)).await;
    }

    let result = interact(&submission, &strings).await;

    submission.unmount();
    if let Err(err) = surface.close().await {
        tracing::warn!(error = %err, "could not close webdriver session");
    }
    result
}

async fn interact(submission: &Submission, strings: &Strings) -> Result<()> {
    loop {
        print_status(submission, strings);
        let answer = prompt(&menu(strings), "")?;
        let answer = answer.trim();
        match answer {
            "" => {}
            "n" => {
                submission.next();
            }
            "p" => {
                submission.previous();
            }
            "f" => drive(submission, submission.fill_current()).await,
            "s" => drive(submission, submission.submit()).await,
            "a" => drive(submission, submission.toggle_auto()).await,
            "l" => print_invoices(strings, submission.invoices()),
            "q" => return Ok(()),
            other => match other.parse::<i64>() {
                Ok(position) => {
                    submission.go_to(position);
                }
                Err(_) => println!("{}", style(format!("Unknown command '{}'", other)).yellow()),
            },
        }
    }
}

/// Once a chain has run, Ctrl-C belongs to the session (it stops auto mode), so `q` is the way out.
fn menu(strings: &Strings) -> String {
    format!(
        "[n]ext [p]rev [#] [f] {} [s] {} [a] {} [l]ist [q]uit (Ctrl-C stops auto, q quits)",
        strings.get("fill_in", "Fill in"),
        strings.get("submit", "Submit"),
        strings.get("auto_submit", "Auto submit"),
    )
}

/// Await a fill/submit chain; Ctrl-C turns auto mode off and lets the invoice in flight finish.
async fn drive<F: Future<Output = ()>>(submission: &Submission, chain: F) {
    tokio::pin!(chain);
    let interrupted = tokio::select! {
        _ = &mut chain => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        submission.stop_auto();
        println!(
            "{}",
            style("Stopping after the current invoice; enter q to leave the session").yellow()
        );
        chain.await;
    }
}

fn print_status(submission: &Submission, strings: &Strings) {
    let position = format!(
        "{} {} {} {}",
        strings.get("invoice", "Invoice"),
        submission.cursor() + 1,
        strings.get("of", "of"),
        submission.invoices().len()
    );
    let phase = match submission.phase() {
        Phase::Error => style(format!("{:?}", Phase::Error)).red(),
        Phase::Done => style(format!("{:?}", Phase::Done)).green(),
        other => style(format!("{:?}", other)).dim(),
    };
    let auto = if submission.is_auto() {
        style(strings.get("auto_submit", "Auto submit").to_string()).cyan()
    } else {
        style(String::new())
    };
    println!("{} {} {}", style(position).bold(), phase, auto);
    if let Some(invoice) = submission.current() {
        println!("     {}", style_invoice(&invoice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[test]
    fn menu_tells_how_to_leave_once_ctrl_c_is_taken() {
        for language in [Language::En, Language::Pt] {
            let text = menu(&Strings::load(language));
            assert!(text.contains("[q]uit"));
            assert!(text.contains("Ctrl-C stops auto"));
        }
    }
}
