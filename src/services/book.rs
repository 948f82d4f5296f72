use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Invoice, InvoiceDraft, InvoicePatch, InvoiceQuery, Period, SortColumn, SortDirection};
use crate::services::numbering;
use crate::utils::{date_in_period, period_date, timestamp_id};

/// The cached invoice list of one month. Every mutation is written back straight away.
pub struct InvoiceBook {
    db: Database,
    period: Period,
    invoices: Vec<Invoice>,
}

impl InvoiceBook {
    pub fn open(db: Database, period: Period) -> Self {
        let invoices = db.read_invoices(period);
        tracing::debug!(%period, count = invoices.len(), "invoice book loaded");
        InvoiceBook { db, period, invoices }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn get(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|inv| inv.id == id)
    }

    /// Form defaults for a fresh entry: next number and ATCUD, blank NIF, `today` clamped into the period.
    pub fn draft_defaults(&self, today: NaiveDate) -> InvoiceDraft {
        InvoiceDraft {
            number: numbering::next_number(&self.invoices),
            atcud: numbering::next_atcud(&self.invoices),
            nif: String::new(),
            date: period_date(self.period, today.day()),
            amount: 0.0,
        }
    }

    /// Draft for inserting after `index`: a copy of that invoice's number and ATCUD.
    pub fn insert_template(&self, index: usize, today: NaiveDate) -> Option<InvoiceDraft> {
        let template = self.invoices.get(index)?;
        Some(InvoiceDraft {
            number: template.number.clone(),
            atcud: template.atcud.clone(),
            nif: String::new(),
            date: period_date(self.period, today.day()),
            amount: 0.0,
        })
    }

    pub fn add(&mut self, draft: InvoiceDraft) -> Option<&Invoice> {
        if let Err(err) = validate(&draft) {
            tracing::debug!(error = %err, "draft rejected");
            return None;
        }
        let invoice = draft.into_invoice(timestamp_id(&self.invoices));
        self.invoices.push(invoice);
        self.persist();
        self.invoices.last()
    }

    /// Insert right after `index`, keeping the draft's number and ATCUD, and shift everything behind it up by one.
    pub fn insert_after(&mut self, index: usize, draft: InvoiceDraft) -> Option<&Invoice> {
        if index >= self.invoices.len() {
            tracing::debug!(index, len = self.invoices.len(), "insert position out of range");
            return None;
        }
        if let Err(err) = validate(&draft) {
            tracing::debug!(error = %err, "draft rejected");
            return None;
        }
        let invoice = draft.into_invoice(timestamp_id(&self.invoices));
        let position = index + 1;
        self.invoices.insert(position, invoice);
        numbering::renumber_from(&mut self.invoices, position + 1);
        self.persist();
        self.invoices.get(position)
    }

    /// Merge `patch` into the invoice with `id`. Unknown ids change nothing.
    pub fn update(&mut self, id: &str, patch: InvoicePatch) -> bool {
        let Some(invoice) = self.invoices.iter_mut().find(|inv| inv.id == id) else {
            return false;
        };
        patch.apply(invoice);
        self.persist()
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.invoices.len();
        self.invoices.retain(|inv| inv.id != id);
        if self.invoices.len() == before {
            return false;
        }
        self.persist()
    }

    pub fn view(&self, query: &InvoiceQuery) -> Vec<Invoice> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());

        let mut rows: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|inv| date_in_period(&inv.date, query.period))
            .filter(|inv| search.map(|term| matches_search(inv, term)).unwrap_or(true))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort);
            match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }

    fn persist(&self) -> bool {
        self.db.write_invoices(self.period, &self.invoices)
    }
}

pub fn validate(draft: &InvoiceDraft) -> AppResult<()> {
    if !draft.amount.is_finite() || draft.amount <= 0.0 {
        return Err(AppError::Validation(format!(
            "amount must be positive, got {}",
            draft.amount
        )));
    }
    Ok(())
}

fn matches_search(invoice: &Invoice, term: &str) -> bool {
    let lower = term.to_lowercase();
    invoice.number.to_lowercase().contains(&lower)
        || invoice.atcud.to_lowercase().contains(&lower)
        || invoice.nif.to_lowercase().contains(&lower)
        || invoice.date.contains(term)
        || invoice.amount.to_string().contains(&lower)
}

fn compare(a: &Invoice, b: &Invoice, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Number => a.number.to_lowercase().cmp(&b.number.to_lowercase()),
        SortColumn::Atcud => a.atcud.to_lowercase().cmp(&b.atcud.to_lowercase()),
        SortColumn::Nif => a.nif.to_lowercase().cmp(&b.nif.to_lowercase()),
        SortColumn::Date => a.date.cmp(&b.date),
        SortColumn::Amount => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
    }
}
