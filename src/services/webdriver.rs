use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::surface::{FormCommand, FormSurface, ERROR_ALERTS};

const APPLY_SCRIPT: &str = r#"
const commands = arguments[0];
for (const cmd of commands) {
  if (cmd.kind === "setValue") {
    const el = document.getElementById(cmd.field);
    if (!el) throw new Error("missing field " + cmd.field);
    el.value = cmd.value;
  } else if (cmd.kind === "click") {
    const sel = cmd.selector;
    const el = sel.by === "id" ? document.getElementById(sel.target) : document.querySelector(sel.target);
    if (!el) throw new Error("missing element " + sel.target);
    el.click();
  }
}
return null;
"#;

const ALERTS_SCRIPT: &str =
    "return Array.from(document.querySelectorAll(arguments[0])).map((e) => e.innerText);";

const VISIBILITY_SCRIPT: &str =
    "document.documentElement.style.visibility = arguments[0] ? 'hidden' : ''; return null;";

#[derive(Serialize)]
struct NewSessionRequest {
    capabilities: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[derive(Serialize)]
struct NavigateRequest<'a> {
    url: &'a str,
}

#[derive(Serialize, Debug, PartialEq)]
struct ExecuteRequest<'a> {
    script: &'a str,
    args: Vec<Value>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(Deserialize)]
struct Failure {
    error: String,
    #[serde(default)]
    message: String,
}

/// A browser driven over the W3C WebDriver protocol (geckodriver, chromedriver, ...).
pub struct WebDriverSurface {
    client: reqwest::Client,
    base: String,
    session_id: String,
}

impl WebDriverSurface {
    /// Open a session and load `form_url`. Logging in to the portal is left to the user.
    pub async fn connect(endpoint: &str, form_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::new();
        let base = endpoint.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{}/session", base))
            .json(&NewSessionRequest {
                capabilities: json!({ "alwaysMatch": {} }),
            })
            .send()
            .await?;
        let session: NewSession = read_value(response).await?;
        tracing::info!(endpoint = %base, session = %session.session_id, "webdriver session opened");

        let surface = WebDriverSurface {
            client,
            base,
            session_id: session.session_id,
        };
        surface.navigate(form_url).await?;
        Ok(surface)
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base, self.session_id, path)
    }

    async fn navigate(&self, url: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.session_url("/url"))
            .json(&NavigateRequest { url })
            .send()
            .await?;
        let _: Value = read_value(response).await?;
        tracing::debug!(url, "navigated");
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(&self, script: &str, args: Vec<Value>) -> AppResult<T> {
        let response = self
            .client
            .post(self.session_url("/execute/sync"))
            .json(&ExecuteRequest { script, args })
            .send()
            .await?;
        read_value(response).await
    }

    pub async fn close(&self) -> AppResult<()> {
        let response = self.client.delete(self.session_url("")).send().await?;
        let _: Value = read_value(response).await?;
        tracing::info!(session = %self.session_id, "webdriver session closed");
        Ok(())
    }
}

#[async_trait]
impl FormSurface for WebDriverSurface {
    async fn apply(&self, commands: &[FormCommand]) -> AppResult<()> {
        let _: Value = self.execute(APPLY_SCRIPT, apply_args(commands)?).await?;
        Ok(())
    }

    async fn error_messages(&self) -> AppResult<Vec<String>> {
        self.execute(ALERTS_SCRIPT, vec![json!(ERROR_ALERTS)]).await
    }

    async fn set_hidden(&self, hidden: bool) -> AppResult<()> {
        let _: Value = self.execute(VISIBILITY_SCRIPT, vec![json!(hidden)]).await?;
        Ok(())
    }
}

fn apply_args(commands: &[FormCommand]) -> AppResult<Vec<Value>> {
    Ok(vec![serde_json::to_value(commands)?])
}

async fn read_value<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    let body = response.text().await?;
    decode_body(status.is_success(), &body)
}

fn decode_body<T: DeserializeOwned>(success: bool, body: &str) -> AppResult<T> {
    if !success {
        let message = match serde_json::from_str::<Envelope<Failure>>(body) {
            Ok(Envelope { value }) => format!("{}: {}", value.error, value.message),
            Err(_) => body.to_string(),
        };
        return Err(AppError::WebDriverCommand(message));
    }
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.value)
}
