use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;

pub const FORM_URL: &str = "https://faturas.portaldasfinancas.gov.pt/registarDocumentoEmitenteForm.action";

pub const NIF_FIELD: &str = "nifAdquirente";
pub const ATCUD_FIELD: &str = "atcud";
pub const DOCUMENT_TYPE_FIELD: &str = "tipoDocumento";
pub const DOCUMENT_NUMBER_FIELD: &str = "numeroDocumento";
pub const ISSUE_DATE_FIELD: &str = "dataEmissaoDocumento";
pub const EDIT_LINK: &str = r#"a[onclick="editar(this)"]"#;
pub const VAT_RATE_FIELD: &str = "taxaIvaVerba";
pub const EXEMPTION_REASON_FIELD: &str = "motivoIsencao";
pub const TOTAL_FIELD: &str = "totalInput";
pub const TAXABLE_BASE_FIELD: &str = "baseTributavelInput";
pub const SAVE_LINE_BUTTON: &str = "guardarDetalheLinhaModal";
pub const SAVE_DOCUMENT_BUTTON: &str = "guardarDocumentoBtn";
pub const ERROR_ALERTS: &str = ".alert-error:not(.hide)";

/// Tax id used when the buyer has none ("consumidor final").
pub const PLACEHOLDER_NIF: &str = "999999990";
pub const DOCUMENT_TYPE: &str = "FS";
pub const VAT_EXEMPT: &str = "ISE";
pub const EXEMPTION_REASON: &str = "M07";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", content = "target", rename_all = "lowercase")]
pub enum Selector {
    Id(String),
    Css(String),
}

/// One step against the remote form. Values travel as data and are never spliced into script text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FormCommand {
    SetValue { field: String, value: String },
    Click { selector: Selector },
}

impl FormCommand {
    pub fn set(field: &str, value: impl Into<String>) -> Self {
        FormCommand::SetValue {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn click_id(id: &str) -> Self {
        FormCommand::Click {
            selector: Selector::Id(id.to_string()),
        }
    }

    pub fn click_css(css: &str) -> Self {
        FormCommand::Click {
            selector: Selector::Css(css.to_string()),
        }
    }
}

/// The browser view showing the remote form. The machine never navigates it, only acts on the loaded page.
#[async_trait]
pub trait FormSurface: Send + Sync {
    /// Run a batch of commands in order, returning once the page has taken them.
    async fn apply(&self, commands: &[FormCommand]) -> AppResult<()>;

    /// Texts of the visible error alerts on the page.
    async fn error_messages(&self) -> AppResult<Vec<String>>;

    /// Swap the view for a loading placeholder and back.
    async fn set_hidden(&self, hidden: bool) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_as_tagged_data() {
        let batch = vec![
            FormCommand::set(NIF_FIELD, r#"1"; alert("x"#),
            FormCommand::click_css(EDIT_LINK),
        ];
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"kind": "setValue", "field": "nifAdquirente", "value": "1\"; alert(\"x"},
                {"kind": "click", "selector": {"by": "css", "target": "a[onclick=\"editar(this)\"]"}}
            ])
        );
    }
}
