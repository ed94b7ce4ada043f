//! REST betting client: market discovery and order placement.
//!
//! Every call is an authenticated POST carrying the application key and
//! session token headers. Results only touch in-memory state through what
//! the staking engine explicitly applies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Betting API base.
const BETTING_URL: &str = "https://api.betfair.com/exchange/betting/rest/v1.0";

/// Tennis event type id on the exchange.
const TENNIS_EVENT_TYPE_ID: &str = "2";

/// Maximum catalogue entries per request.
const CATALOGUE_FETCH_LIMIT: u32 = 200;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("no instruction report in response")]
    MissingReport,
}

/// Catalogue entry for one open match-odds market.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub market_id: String,
    #[serde(default)]
    pub market_name: Option<String>,
    #[serde(default)]
    pub event: Option<EventInfo>,
    #[serde(default)]
    pub runners: Vec<RunnerSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerSummary {
    pub selection_id: u64,
    pub runner_name: String,
}

/// Confirmed placement, as reported by the venue.
#[derive(Debug, Clone)]
pub struct PlacementReport {
    pub order_id: String,
    pub average_price_matched: Option<f64>,
    pub size_matched: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrdersResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    instruction_reports: Vec<InstructionReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstructionReport {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    bet_id: Option<String>,
    #[serde(default)]
    average_price_matched: Option<f64>,
    #[serde(default)]
    size_matched: Option<f64>,
}

/// Authenticated client for the betting REST API.
#[derive(Debug, Clone)]
pub struct BettingClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    session: String,
}

impl BettingClient {
    pub fn new(app_key: String, session: String) -> Self {
        Self::with_base_url(app_key, session, BETTING_URL.to_string())
    }

    pub fn with_base_url(app_key: String, session: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url,
            app_key,
            session,
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, RestError> {
        let url = format!("{}/{}/", self.base_url, endpoint);
        debug!(url = %url, "betting API request");

        let response = self
            .http
            .post(&url)
            .header("X-Application", &self.app_key)
            .header("X-Authentication", &self.session)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response.text().await.unwrap_or_default();
            return Err(RestError::Http {
                endpoint: endpoint.to_string(),
                status,
                body: body_text,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetches the open tennis match-odds catalogue. Markets without
    /// exactly two runners cannot be tracked and are dropped here.
    pub async fn list_open_markets(&self) -> Result<Vec<MarketSummary>, RestError> {
        let body = json!({
            "filter": {
                "eventTypeIds": [TENNIS_EVENT_TYPE_ID],
                "marketTypeCodes": ["MATCH_ODDS"],
                "marketBettingTypes": ["ODDS"]
            },
            "maxResults": CATALOGUE_FETCH_LIMIT,
            "marketProjection": ["EVENT", "RUNNER_DESCRIPTION"],
            "sort": "FIRST_TO_START"
        });

        let catalogue: Vec<MarketSummary> = self.post("listMarketCatalogue", &body).await?;
        Ok(retain_two_runner_markets(catalogue))
    }

    /// Bounded-retry wrapper around the initial catalogue fetch.
    /// Returns an empty list once attempts are exhausted; the caller
    /// decides whether that is fatal.
    pub async fn list_open_markets_with_retry(
        &self,
        attempts: u32,
        backoff: Duration,
    ) -> Vec<MarketSummary> {
        for attempt in 1..=attempts.max(1) {
            match self.list_open_markets().await {
                Ok(markets) if !markets.is_empty() => return markets,
                Ok(_) => warn!(attempt, "catalogue fetch returned no markets"),
                Err(e) => warn!(attempt, error = %e, "catalogue fetch failed"),
            }
            if attempt < attempts {
                tokio::time::sleep(backoff).await;
            }
        }
        Vec::new()
    }

    /// Places a limit back bet; returns the venue order id and any matched
    /// size/price the venue reports.
    pub async fn place_order(
        &self,
        market_id: &str,
        selection_id: u64,
        size: f64,
        price: f64,
    ) -> Result<PlacementReport, RestError> {
        let body = json!({
            "marketId": market_id,
            "instructions": [{
                "orderType": "LIMIT",
                "selectionId": selection_id,
                "side": "BACK",
                "limitOrder": {
                    "size": size,
                    "price": price,
                    "persistenceType": "LAPSE"
                }
            }]
        });

        let response: OrdersResponse = self.post("placeOrders", &body).await?;
        let report = report_from_response(response)?;

        info!(
            market_id,
            selection_id,
            order_id = %report.order_id,
            size,
            price,
            "order placed"
        );
        Ok(report)
    }

    /// Replaces an order's remaining size and price.
    pub async fn replace_order(
        &self,
        market_id: &str,
        order_id: &str,
        new_size: f64,
        new_price: f64,
    ) -> Result<(), RestError> {
        let body = json!({
            "marketId": market_id,
            "instructions": [{
                "betId": order_id,
                "newSize": new_size,
                "newPrice": new_price
            }]
        });

        let response: OrdersResponse = self.post("replaceOrders", &body).await?;
        if response.status.as_deref() == Some("FAILURE") {
            let code = response
                .error_code
                .or_else(|| {
                    response
                        .instruction_reports
                        .into_iter()
                        .find_map(|r| r.error_code)
                })
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(RestError::OrderRejected(code));
        }

        info!(market_id, order_id, new_size, new_price, "order replaced");
        Ok(())
    }
}

fn retain_two_runner_markets(catalogue: Vec<MarketSummary>) -> Vec<MarketSummary> {
    catalogue
        .into_iter()
        .filter(|m| m.runners.len() == 2)
        .collect()
}

fn report_from_response(response: OrdersResponse) -> Result<PlacementReport, RestError> {
    if let Some(code) = response.error_code {
        return Err(RestError::OrderRejected(code));
    }
    if response.status.as_deref() == Some("FAILURE") {
        let code = response
            .instruction_reports
            .iter()
            .find_map(|r| r.error_code.clone())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(RestError::OrderRejected(code));
    }

    let report = response
        .instruction_reports
        .into_iter()
        .next()
        .ok_or(RestError::MissingReport)?;
    if report.status.as_deref() == Some("FAILURE") {
        return Err(RestError::OrderRejected(
            report.error_code.unwrap_or_else(|| "UNKNOWN".to_string()),
        ));
    }

    Ok(PlacementReport {
        order_id: report.bet_id.ok_or(RestError::MissingReport)?,
        average_price_matched: report.average_price_matched,
        size_matched: report.size_matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_summary_parse() {
        let raw = r#"[{
            "marketId": "1.2345",
            "marketName": "Match Odds",
            "event": {"id": "ev-7", "name": "Alcaraz v Sinner"},
            "runners": [
                {"selectionId": 101, "runnerName": "Alcaraz"},
                {"selectionId": 202, "runnerName": "Sinner"}
            ]
        }]"#;
        let parsed: Vec<MarketSummary> = serde_json::from_str(raw).unwrap();
        let market = &parsed[0];
        assert_eq!(market.market_id, "1.2345");
        assert_eq!(market.event.as_ref().unwrap().id.as_deref(), Some("ev-7"));
        assert_eq!(market.runners[1].selection_id, 202);
    }

    #[test]
    fn test_retain_two_runner_markets() {
        let raw = r#"[
            {"marketId": "1.1", "runners": [
                {"selectionId": 1, "runnerName": "A"},
                {"selectionId": 2, "runnerName": "B"}
            ]},
            {"marketId": "1.2", "runners": [
                {"selectionId": 1, "runnerName": "A"}
            ]}
        ]"#;
        let parsed: Vec<MarketSummary> = serde_json::from_str(raw).unwrap();
        let retained = retain_two_runner_markets(parsed);
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].market_id, "1.1");
    }

    #[test]
    fn test_report_from_successful_response() {
        let response: OrdersResponse = serde_json::from_str(
            r#"{
                "status": "SUCCESS",
                "instructionReports": [{
                    "status": "SUCCESS",
                    "betId": "bet-42",
                    "averagePriceMatched": 2.48,
                    "sizeMatched": 10.0
                }]
            }"#,
        )
        .unwrap();
        let report = report_from_response(response).unwrap();
        assert_eq!(report.order_id, "bet-42");
        assert_eq!(report.average_price_matched, Some(2.48));
    }

    #[test]
    fn test_report_from_failed_response() {
        let response: OrdersResponse = serde_json::from_str(
            r#"{
                "status": "FAILURE",
                "instructionReports": [{"status": "FAILURE", "errorCode": "INSUFFICIENT_FUNDS"}]
            }"#,
        )
        .unwrap();
        match report_from_response(response) {
            Err(RestError::OrderRejected(code)) => assert_eq!(code, "INSUFFICIENT_FUNDS"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_report_missing_is_an_error() {
        let response: OrdersResponse =
            serde_json::from_str(r#"{"status": "SUCCESS", "instructionReports": []}"#).unwrap();
        assert!(matches!(
            report_from_response(response),
            Err(RestError::MissingReport)
        ));
    }
}
