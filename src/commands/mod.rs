use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};
use console::{pad_str, style, Alignment, StyledObject};
use dialoguer::{theme::ColorfulTheme, Input};

use crate::args::PeriodArgs;
use crate::models::{Invoice, Period};
use crate::services::book::InvoiceBook;
use crate::services::state::AppState;
use crate::services::strings::Strings;
use crate::utils::format_decimal;

pub mod invoices;
pub mod settings;
pub mod submission;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn resolve_period(args: PeriodArgs) -> Period {
    let now = today();
    Period::new(
        args.year.unwrap_or_else(|| now.year()),
        args.month.unwrap_or_else(|| now.month()),
    )
}

pub fn open_book(state: &AppState, period: Period) -> Result<InvoiceBook> {
    let db = state
        .database()
        .ok_or_else(|| anyhow!("No workspace folder configured"))?;
    Ok(InvoiceBook::open(db, period))
}

/// Free-text prompt with a prefilled default; an empty answer keeps the default.
pub fn prompt(prompt: &str, default: &str) -> Result<String> {
    Ok(Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default.to_string())
        .allow_empty(true)
        .interact_text()?)
}

pub fn print_invoices(strings: &Strings, invoices: &[Invoice]) {
    if invoices.is_empty() {
        println!("{}", style(strings.get("no_invoices", "No invoices registered yet")).italic());
        return;
    }
    println!(
        "{}",
        style_header(&format!(
            "{:>3}  {:<20} {:<20} {:<10} {:<10} {:>12}  id",
            "#",
            strings.get("number", "Number"),
            strings.get("atcud", "ATCUD"),
            strings.get("nif", "NIF"),
            strings.get("date", "Date"),
            strings.get("amount", "Amount"),
        ))
    );
    for (index, invoice) in invoices.iter().enumerate() {
        println!("{:>3}  {}", index + 1, style_invoice(invoice));
    }
}

pub fn style_invoice(invoice: &Invoice) -> String {
    format!(
        "{} {} {} {} {}  {}",
        pad_str(&style(&invoice.number).cyan().bold().to_string(), 20, Alignment::Left, None),
        pad_str(&invoice.atcud, 20, Alignment::Left, None),
        pad_str(&invoice.nif, 10, Alignment::Left, None),
        pad_str(&invoice.date, 10, Alignment::Left, None),
        pad_str(&style_amount(invoice.amount).to_string(), 12, Alignment::Right, None),
        style(&invoice.id).dim(),
    )
}

fn style_header(header: &str) -> StyledObject<&str> {
    style(header).bold().underlined()
}

fn style_amount(amount: f64) -> StyledObject<String> {
    style(format!("{} €", format_decimal(amount))).green()
}
