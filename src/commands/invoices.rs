use anyhow::{Context as _, Result};
use chrono::Datelike;
use console::style;

use crate::args::{DraftArgs, PeriodArgs};
use crate::commands::{open_book, print_invoices, prompt, resolve_period, style_invoice, today};
use crate::models::{InvoiceDraft, InvoicePatch, InvoiceQuery, SortColumn, SortDirection};
use crate::services::book::InvoiceBook;
use crate::services::numbering;
use crate::services::state::{AppState, HostApi};
use crate::utils::{days_in_month, normalize_date, parse_decimal, period_date};

pub fn list(
    state: &AppState,
    period: PeriodArgs,
    search: Option<String>,
    sort: SortColumn,
    desc: bool,
) -> Result<()> {
    let period = resolve_period(period);
    let book = open_book(state, period)?;
    let query = InvoiceQuery {
        period,
        search,
        sort,
        direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
    };
    println!("{}", style(period.to_string()).bold());
    print_invoices(&state.get_strings(), &book.view(&query));
    Ok(())
}

/// Fill in what the flags left out: sequence defaults for number/ATCUD, today for the day.
fn build_draft(book: &InvoiceBook, base: InvoiceDraft, args: DraftArgs) -> Result<InvoiceDraft> {
    let amount = parse_decimal(&args.amount).context("Invalid amount")?;
    Ok(InvoiceDraft {
        number: args.number.unwrap_or(base.number),
        atcud: args.atcud.unwrap_or(base.atcud),
        nif: args.nif.trim().to_string(),
        date: args
            .day
            .map(|day| period_date(book.period(), day))
            .unwrap_or(base.date),
        amount,
    })
}

pub fn add(state: &AppState, period: PeriodArgs, args: DraftArgs) -> Result<()> {
    let mut book = open_book(state, resolve_period(period))?;
    let defaults = book.draft_defaults(today());
    let draft = build_draft(&book, defaults, args)?;
    match book.add(draft) {
        Some(invoice) => println!("{}", style_invoice(invoice)),
        None => println!("{}", style("Amount must be greater than zero; nothing saved").yellow()),
    }
    Ok(())
}

pub fn insert(state: &AppState, period: PeriodArgs, after: usize, args: DraftArgs) -> Result<()> {
    let mut book = open_book(state, resolve_period(period))?;
    let index = after.saturating_sub(1);
    let Some(template) = book.insert_template(index, today()) else {
        anyhow::bail!("No invoice at position {} in {}", after, book.period());
    };
    let draft = build_draft(&book, template, args)?;
    if book.insert_after(index, draft).is_none() {
        println!("{}", style("Amount must be greater than zero; nothing saved").yellow());
        return Ok(());
    }
    print_invoices(&state.get_strings(), book.invoices());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    state: &AppState,
    period: PeriodArgs,
    id: &str,
    number: Option<String>,
    atcud: Option<String>,
    nif: Option<String>,
    date: Option<String>,
    amount: Option<String>,
) -> Result<()> {
    let mut book = open_book(state, resolve_period(period))?;
    let amount = amount
        .map(|raw| parse_decimal(&raw))
        .transpose()
        .context("Invalid amount")?;
    let patch = InvoicePatch {
        number,
        atcud,
        nif,
        date: date.and_then(|raw| normalize_date(Some(raw))),
        amount,
    };
    if !book.update(id, patch) {
        anyhow::bail!("Invoice {} not found in {}", id, book.period());
    }
    if let Some(invoice) = book.get(id) {
        println!("{}", style_invoice(invoice));
    }
    Ok(())
}

pub fn delete(state: &AppState, period: PeriodArgs, id: &str) -> Result<()> {
    let mut book = open_book(state, resolve_period(period))?;
    if !book.delete(id) {
        anyhow::bail!("Invoice {} not found in {}", id, book.period());
    }
    Ok(())
}

/// Rapid entry: after each accepted invoice the number and ATCUD advance by one, keeping whatever
/// prefix the user last typed.
pub fn entry(state: &AppState, period: PeriodArgs) -> Result<()> {
    let mut book = open_book(state, resolve_period(period))?;
    let strings = state.get_strings();
    let defaults = book.draft_defaults(today());

    let mut number = defaults.number;
    let mut atcud = defaults.atcud;
    let mut number_prefix = numbering::DEFAULT_NUMBER_PREFIX.to_string();
    let mut atcud_prefix = numbering::DEFAULT_ATCUD_PREFIX.to_string();
    let mut day = today().day().min(days_in_month(book.period()));

    println!(
        "{} {}",
        style(book.period().to_string()).bold(),
        style("(empty amount to finish)").dim()
    );
    loop {
        number = prompt(strings.get("number", "Number"), &number)?;
        if let Some(prefix) = numbering::observed_prefix(&number) {
            number_prefix = prefix;
        }
        atcud = prompt(strings.get("atcud", "ATCUD"), &atcud)?;
        if let Some(prefix) = numbering::observed_prefix(&atcud) {
            atcud_prefix = prefix;
        }
        let nif = prompt(strings.get("nif", "NIF"), "")?;
        day = prompt("Day", &day.to_string())?.trim().parse::<u32>().unwrap_or(day);

        let raw_amount = prompt(strings.get("amount", "Amount"), "")?;
        if raw_amount.trim().is_empty() {
            break;
        }
        let amount = match parse_decimal(&raw_amount) {
            Ok(amount) => amount,
            Err(err) => {
                tracing::debug!(error = %err, "amount not accepted");
                continue;
            }
        };

        let draft = InvoiceDraft {
            number: number.clone(),
            atcud: atcud.clone(),
            nif: nif.trim().to_string(),
            date: period_date(book.period(), day),
            amount,
        };
        let Some(invoice) = book.add(draft) else {
            println!("{}", style("Amount must be greater than zero").yellow());
            continue;
        };
        println!(
            "{} {}",
            style(strings.get("invoice_added", "Invoice added")).green(),
            style_invoice(invoice)
        );

        number = numbering::next_with_prefix(&number, &number_prefix, numbering::NUMBER_PAD_WIDTH);
        atcud = numbering::next_with_prefix(&atcud, &atcud_prefix, numbering::ATCUD_PAD_WIDTH);
    }
    Ok(())
}

pub fn periods(state: &AppState) -> Result<()> {
    let db = state
        .database()
        .ok_or_else(|| anyhow::anyhow!("No workspace folder configured"))?;
    println!("{}", style(db.workspace().display()).dim());
    for period in db.list_periods() {
        let count = db.read_invoices(period).len();
        println!("{}  {}", style(period.to_string()).bold(), count);
    }
    Ok(())
}

pub fn open_file(state: &AppState, period: PeriodArgs) -> Result<()> {
    let db = state
        .database()
        .ok_or_else(|| anyhow::anyhow!("No workspace folder configured"))?;
    let path = db.period_path(resolve_period(period));
    if !path.exists() {
        anyhow::bail!("No invoice file at {}", path.display());
    }
    open::that(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(())
}
