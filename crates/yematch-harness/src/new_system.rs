//! New-system activities
//!
//! Each step's [`NewCall`] says what to ask of the New system. Read-only
//! calls report how many records came back; state-changing calls report a
//! fixed message or the counts the endpoint returns.

use crate::activity::Activity;
use crate::client::{record_count, NewSystemApi, TAKE_ALL};
use crate::config::ProfitShareParams;
use crate::outcome::Outcome;
use crate::steps::{Body, Fetch, HttpMethod, NewCall};
use chrono::{FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use yematch_reports::PAY426N_CRITERIA;

/// Year-end report endpoint, one request per criteria entry
pub const PROFIT_SHARING_REPORT_PATH: &str = "api/yearend/yearend-profit-sharing-report";

const MASTER_UPDATE_PATH: &str = "api/yearend/profit-master-update";

/// Criteria sub-reports the New system cannot produce yet
pub const SKIPPED_CRITERIA: &[&str] = &["PAY426N-10"];

/// Query parameters shared by every record-returning GET
#[must_use]
pub fn base_query(profit_year: i32) -> Vec<(String, String)> {
    vec![
        ("profitYear".to_string(), profit_year.to_string()),
        ("take".to_string(), TAKE_ALL.to_string()),
    ]
}

/// One New-system step
pub struct NewActivity {
    name: String,
    step_name: String,
    call: NewCall,
    api: Arc<dyn NewSystemApi>,
    profit_year: i32,
    profit_share: ProfitShareParams,
}

impl NewActivity {
    /// Counterpart of one step
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        step_name: impl Into<String>,
        call: NewCall,
        api: Arc<dyn NewSystemApi>,
        profit_year: i32,
    ) -> Self {
        Self {
            name: name.into(),
            step_name: step_name.into(),
            call,
            api,
            profit_year,
            profit_share: ProfitShareParams::default(),
        }
    }

    /// Send `params` with the profit-share calls
    #[inline]
    #[must_use]
    pub fn with_profit_share(mut self, params: ProfitShareParams) -> Self {
        self.profit_share = params;
        self
    }

    fn profit_share_pairs(&self) -> Vec<(&'static str, String)> {
        let p = &self.profit_share;
        vec![
            ("contributionPercent", p.contribution_percent.to_string()),
            ("incomingForfeitPercent", p.incoming_forfeit_percent.to_string()),
            ("earningsPercent", p.earnings_percent.to_string()),
            ("secondaryEarningsPercent", p.secondary_earnings_percent.to_string()),
            ("maxAllowedContributions", p.max_allowed_contributions.to_string()),
        ]
    }

    async fn fetch(&self, fetch: &Fetch) -> Result<String, String> {
        let count = match fetch.method {
            HttpMethod::Get => {
                let mut query = base_query(self.profit_year);
                query.extend(fetch.params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
                if fetch.profit_share {
                    query.extend(self.profit_share_pairs().into_iter().map(|(k, v)| (k.to_string(), v)));
                }
                record_count(self.api.get_json(fetch.path, query).await.map_err(|e| e.to_string())?)
            }
            HttpMethod::Post => {
                let body = request_body(fetch.body, self.profit_year)?;
                record_count(self.api.post_json(fetch.path, body).await.map_err(|e| e.to_string())?)
            }
        };
        Ok(format!("{}{count}", fetch.label))
    }

    async fn fetch_all(&self, fetches: &[Fetch]) -> Result<String, String> {
        let lines = futures::future::try_join_all(fetches.iter().map(|f| self.fetch(f))).await?;
        Ok(lines.join("\n"))
    }

    async fn profit_sharing_reports(&self) -> Result<String, String> {
        let mut lines = Vec::new();
        for criteria in PAY426N_CRITERIA {
            if SKIPPED_CRITERIA.contains(&criteria.report_id) {
                lines.push(format!("{}: skipped", criteria.report_id));
                continue;
            }
            let body = serde_json::to_value(criteria.request(self.profit_year)).map_err(|e| e.to_string())?;
            let response = self
                .api
                .post_json(PROFIT_SHARING_REPORT_PATH, body)
                .await
                .map_err(|e| format!("{}: {e}", criteria.report_id))?;
            lines.push(format!("{}: {} records", criteria.report_id, record_count(response)));
        }
        Ok(lines.join("\n"))
    }

    async fn master_update(&self) -> Result<String, String> {
        let p = &self.profit_share;
        let body = json!({
            "profitYear": self.profit_year,
            "contributionPercent": p.contribution_percent.to_f64(),
            "incomingForfeitPercent": p.incoming_forfeit_percent.to_f64(),
            "earningsPercent": p.earnings_percent.to_f64(),
            "secondaryEarningsPercent": p.secondary_earnings_percent.to_f64(),
            "maxAllowedContributions": p.max_allowed_contributions,
            "take": i32::MAX,
        });
        let response = self.api.post_json(MASTER_UPDATE_PATH, body).await.map_err(|e| e.to_string())?;
        let count = |field: &str| {
            response
                .get(field)
                .and_then(Value::as_i64)
                .ok_or_else(|| format!("{MASTER_UPDATE_PATH} response lacks {field}"))
        };
        Ok(format!(
            "beneficiariesEffected: {}, employeesEffected: {}, etvasEffected: {}",
            count("beneficiariesEffected")?,
            count("employeesEffected")?,
            count("etvasEffected")?
        ))
    }

    fn command(&self) -> String {
        match self.call {
            NewCall::Nothing | NewCall::Pending(_) => String::new(),
            NewCall::Fetch(fetches) => fetches
                .iter()
                .map(|f| format!("{} {}", method_name(f.method), f.path))
                .collect::<Vec<_>>()
                .join("; "),
            NewCall::Post { path, .. } => format!("POST {path}"),
            NewCall::ProfitSharingReports => format!("POST {PROFIT_SHARING_REPORT_PATH}"),
            NewCall::MasterUpdate => format!("POST {MASTER_UPDATE_PATH}"),
        }
    }
}

/// JSON body for `body` in `profit_year`
///
/// # Errors
/// When no freeze date exists for the year.
pub fn request_body(body: Body, profit_year: i32) -> Result<Value, String> {
    let year = profit_year;
    Ok(match body {
        Body::None => Value::Null,
        Body::Empty => json!({}),
        Body::ProfitYear => json!({ "profitYear": year }),
        Body::Freeze => json!({ "profitYear": year, "asOfDateTime": freeze_as_of(year)? }),
        Body::DateRange => json!({
            "profitYear": year,
            "beginningDate": format!("{year}-01-01"),
            "endingDate": format!("{year}-12-31"),
        }),
    })
}

const fn method_name(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
    }
}

/// Demographics are frozen as of January 3rd after the profit year, US Eastern
fn freeze_as_of(profit_year: i32) -> Result<String, String> {
    let eastern = FixedOffset::west_opt(4 * 3600).ok_or("invalid offset")?;
    NaiveDate::from_ymd_opt(profit_year + 1, 1, 3)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| dt.and_local_timezone(eastern).single())
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| format!("no freeze date for profit year {profit_year}"))
}

#[async_trait::async_trait]
impl Activity for NewActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn uses_new_system(&self) -> bool {
        !matches!(self.call, NewCall::Nothing | NewCall::Pending(_))
    }

    async fn execute(&self) -> Outcome {
        match self.call {
            NewCall::Nothing => return Outcome::no_operation(&self.name, &self.step_name),
            NewCall::Pending(message) => return Outcome::to_be_done(&self.name, &self.step_name, message),
            _ => {}
        }

        let command = self.command();
        info!(activity = %self.name, %command, "calling new system");
        let started = Instant::now();
        let result = match self.call {
            NewCall::Fetch(fetches) => self.fetch_all(fetches).await,
            NewCall::Post { path, body, message } => match request_body(body, self.profit_year) {
                Ok(body) => self
                    .api
                    .post_json(path, body)
                    .await
                    .map(|_| message.to_string())
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e),
            },
            NewCall::ProfitSharingReports => self.profit_sharing_reports().await,
            NewCall::MasterUpdate => self.master_update().await,
            NewCall::Nothing | NewCall::Pending(_) => Ok(String::new()),
        };

        let outcome = match result {
            Ok(message) => Outcome::ok(&self.name, &self.step_name, message),
            Err(message) => {
                error!(activity = %self.name, %message, "new system call failed");
                Outcome::error(&self.name, &self.step_name, message)
            }
        };
        outcome.with_command(command).with_duration(started.elapsed())
    }
}
