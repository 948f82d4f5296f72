use std::fmt;

use serde::{Deserialize, Serialize};

use crate::services::submission::Delays;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub atcud: String,
    #[serde(default)]
    pub nif: String,
    pub date: String,
    pub amount: f64,
}

/// An invoice as typed into the entry form, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub number: String,
    pub atcud: String,
    pub nif: String,
    pub date: String,
    pub amount: f64,
}

impl InvoiceDraft {
    pub fn into_invoice(self, id: String) -> Invoice {
        Invoice {
            id,
            number: self.number,
            atcud: self.atcud,
            nif: self.nif,
            date: self.date,
            amount: self.amount,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoicePatch {
    pub number: Option<String>,
    pub atcud: Option<String>,
    pub nif: Option<String>,
    pub date: Option<String>,
    pub amount: Option<f64>,
}

impl InvoicePatch {
    pub fn apply(self, invoice: &mut Invoice) {
        if let Some(number) = self.number {
            invoice.number = number;
        }
        if let Some(atcud) = self.atcud {
            invoice.atcud = atcud;
        }
        if let Some(nif) = self.nif {
            invoice.nif = nif;
        }
        if let Some(date) = self.date {
            invoice.date = date;
        }
        if let Some(amount) = self.amount {
            invoice.amount = amount;
        }
    }
}

/// One invoice file: `<workspace>/<year>/<month>.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Period {
            year,
            month: month.clamp(1, 12),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemTheme {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pt,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub workspace_folder: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default)]
    pub delays: Delays,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            workspace_folder: None,
            theme: Theme::System,
            language: Language::En,
            webdriver_url: None,
            delays: Delays::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortColumn {
    #[default]
    Number,
    Atcud,
    Nif,
    Date,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// What the invoice table shows: the period filter, a free-text search and one sort key.
#[derive(Debug, Clone)]
pub struct InvoiceQuery {
    pub period: Period,
    pub search: Option<String>,
    pub sort: SortColumn,
    pub direction: SortDirection,
}

impl InvoiceQuery {
    pub fn for_period(period: Period) -> Self {
        InvoiceQuery {
            period,
            search: None,
            sort: SortColumn::Number,
            direction: SortDirection::Asc,
        }
    }
}
