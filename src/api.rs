//! HTTP client for the portfolio metrics backend.
//!
//! All financial computation (CAGR, volatility, Sharpe/Sortino/Calmar,
//! drawdowns, monthly returns) lives server-side; this module only calls
//! the backend's JSON endpoints and reshapes the responses for rendering.

use std::collections::HashMap;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::editor::Asset;
use crate::error::ApiError;

/// Headline metrics for one portfolio, from `/api/portfolio-summary`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub net_worth: f64,
    pub initial: f64,
    pub profit: f64,
    pub cumulative_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    #[serde(rename = "longestDD")]
    pub longest_dd: i64,
}

/// Cumulative return series plus the monthly-return grid, from
/// `/api/timeseries`.
#[derive(Debug, Clone, Deserialize)]
pub struct Timeseries {
    pub labels: Vec<String>,
    pub strategy: Vec<f64>,
    pub benchmark: Vec<f64>,
    #[serde(rename = "monthlyReturns")]
    pub monthly_returns: MonthlyReturns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyReturns {
    pub labels: Vec<String>,
    pub datasets: Vec<MonthlyRow>,
}

/// One calendar year of monthly returns (fractions, January first).
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyRow {
    pub year: i32,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonTimeseries {
    pub labels: Vec<String>,
    pub portfolio_a: Vec<f64>,
    pub portfolio_b: Vec<f64>,
}

/// Risk/return coordinates for the scatter, from `/api/comparison_metrics`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonMetrics {
    pub summary: ComparisonSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonSummary {
    pub portfolio_a: RiskReturnPoint,
    pub portfolio_b: RiskReturnPoint,
    pub portfolio_spy: RiskReturnPoint,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RiskReturnPoint {
    pub cagr: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonRadar {
    pub portfolio_a: RadarMetrics,
    pub portfolio_b: RadarMetrics,
}

/// Radar axes for one portfolio. The backend omits ratios it could not
/// compute; missing values read as zero.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RadarMetrics {
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
}

/// Underwater curve, from `/api/portfolio-drawdown`. Values are fractions
/// at or below zero.
#[derive(Debug, Clone, Deserialize)]
pub struct Drawdown {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Per-constituent percent returns, from `/api/portfolio-top-movers`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopMovers {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// One stored portfolio as returned by the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioRecord {
    pub portfolio_id: i64,
    pub portfolio_name: String,
    pub allocation: String,
    pub creator_username: String,
    pub is_shared: bool,
    pub is_editable: bool,
    pub is_shareable: bool,
    pub current_value: f64,
    pub return_percent: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Serialize)]
struct MetricsRequest<'a> {
    weights: &'a HashMap<String, f64>,
    start_date: &'a str,
    initial_investment: f64,
}

#[derive(Debug, Serialize)]
struct ComparisonRequest<'a> {
    weights_a: &'a HashMap<String, f64>,
    weights_b: &'a HashMap<String, f64>,
    start_date: &'a str,
    initial_investment: f64,
}

#[derive(Debug, Serialize)]
struct TopMoversRequest<'a> {
    weights: &'a HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        ApiClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The asset catalog the create/edit form offers for selection.
    pub async fn assets(&self) -> Result<Vec<Asset>, ApiError> {
        self.get_json("/api/assets").await
    }

    pub async fn portfolio_summary(
        &self,
        weights: &HashMap<String, f64>,
        start_date: &str,
        initial_investment: f64,
    ) -> Result<PortfolioSummary, ApiError> {
        let body = MetricsRequest {
            weights,
            start_date,
            initial_investment,
        };
        self.post_json("/api/portfolio-summary", &body).await
    }

    pub async fn timeseries(
        &self,
        weights: &HashMap<String, f64>,
        start_date: &str,
        initial_investment: f64,
    ) -> Result<Timeseries, ApiError> {
        let body = MetricsRequest {
            weights,
            start_date,
            initial_investment,
        };
        self.post_json("/api/timeseries", &body).await
    }

    pub async fn drawdown(
        &self,
        weights: &HashMap<String, f64>,
        start_date: &str,
        initial_investment: f64,
    ) -> Result<Drawdown, ApiError> {
        let body = MetricsRequest {
            weights,
            start_date,
            initial_investment,
        };
        self.post_json("/api/portfolio-drawdown", &body).await
    }

    pub async fn top_movers(
        &self,
        weights: &HashMap<String, f64>,
    ) -> Result<TopMovers, ApiError> {
        let body = TopMoversRequest { weights };
        self.post_json("/api/portfolio-top-movers", &body).await
    }

    pub async fn comparison_timeseries(
        &self,
        weights_a: &HashMap<String, f64>,
        weights_b: &HashMap<String, f64>,
        start_date: &str,
        initial_investment: f64,
    ) -> Result<ComparisonTimeseries, ApiError> {
        let body = ComparisonRequest {
            weights_a,
            weights_b,
            start_date,
            initial_investment,
        };
        self.post_json("/api/comparison_timeseries", &body).await
    }

    pub async fn comparison_metrics(
        &self,
        weights_a: &HashMap<String, f64>,
        weights_b: &HashMap<String, f64>,
        start_date: &str,
        initial_investment: f64,
    ) -> Result<ComparisonMetrics, ApiError> {
        let body = ComparisonRequest {
            weights_a,
            weights_b,
            start_date,
            initial_investment,
        };
        self.post_json("/api/comparison_metrics", &body).await
    }

    pub async fn comparison_radar(
        &self,
        weights_a: &HashMap<String, f64>,
        weights_b: &HashMap<String, f64>,
        start_date: &str,
        initial_investment: f64,
    ) -> Result<ComparisonRadar, ApiError> {
        let body = ComparisonRequest {
            weights_a,
            weights_b,
            start_date,
            initial_investment,
        };
        self.post_json("/api/comparison-radar", &body).await
    }

    pub async fn list_portfolios(&self) -> Result<Vec<PortfolioRecord>, ApiError> {
        self.get_json("/portfolios").await
    }

    /// Submit a new portfolio. `fields` is the editor's serialized form:
    /// `portfolio_name` plus one `allocation[<code>]` entry per non-zero
    /// weight.
    pub async fn create_portfolio(&self, fields: &[(String, String)]) -> Result<(), ApiError> {
        self.post_form("/portfolios/new", fields).await
    }

    pub async fn update_portfolio(
        &self,
        portfolio_id: i64,
        fields: &[(String, String)],
    ) -> Result<(), ApiError> {
        self.post_form(&format!("/portfolios/{portfolio_id}/edit"), fields)
            .await
    }

    pub async fn delete_portfolio(&self, portfolio_id: i64) -> Result<(), ApiError> {
        self.post_form(&format!("/portfolios/{portfolio_id}/delete"), &[])
            .await
    }

    pub async fn share_portfolio(
        &self,
        portfolio_id: i64,
        username: &str,
    ) -> Result<(), ApiError> {
        let fields = [("username".to_string(), username.to_string())];
        self.post_form(&format!("/portfolios/{portfolio_id}/share"), &fields)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(url, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(url, response).await
    }

    async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<(), ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .form(fields)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: Self::error_message(response).await,
            });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(
        url: String,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: Self::error_message(response).await,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    // The backend reports failures as {"error": "..."}; fall back to the
    // raw body when it does not.
    async fn error_message(response: reqwest::Response) -> String {
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error,
            Err(_) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn summary_from_json() {
        let json = json!({
            "netWorth": 14689.75,
            "initial": 1000.0,
            "profit": 13689.75,
            "cumulativeReturn": 0.4689,
            "cagr": 0.1586,
            "volatility": 0.2782,
            "maxDrawdown": 0.3578,
            "longestDD": 187
        });
        let summary: PortfolioSummary = serde_json::from_value(json).unwrap();
        assert_eq!(summary.net_worth, 14689.75);
        assert_eq!(summary.longest_dd, 187);
        assert_eq!(summary.max_drawdown, 0.3578);
    }

    #[test]
    fn timeseries_from_json() {
        let json = json!({
            "labels": ["2015-01-02", "2015-01-05"],
            "strategy": [1.0, 1.013],
            "benchmark": [1.0, 0.997],
            "monthlyReturns": {
                "labels": ["Jan", "Feb", "Mar", "Apr", "May", "Jun",
                           "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"],
                "datasets": [
                    {"year": 2015, "values": [0.01, -0.02, 0.0, 0.03, 0.0, 0.0,
                                              0.0, 0.0, 0.0, 0.0, 0.0, 0.0]}
                ]
            }
        });
        let ts: Timeseries = serde_json::from_value(json).unwrap();
        assert_eq!(ts.labels.len(), 2);
        assert_eq!(ts.monthly_returns.labels[0], "Jan");
        assert_eq!(ts.monthly_returns.datasets[0].year, 2015);
        assert_eq!(ts.monthly_returns.datasets[0].values[1], -0.02);
    }

    #[test]
    fn radar_defaults_missing_ratios_to_zero() {
        let json = json!({
            "portfolio_a": {"cagr": 0.15, "volatility": 0.27, "sharpe": 0.9,
                            "sortino": 1.2, "calmar": 0.5,
                            "max_drawdown": -0.35, "win_rate": 0.54},
            "portfolio_b": {"cagr": 0.12, "volatility": 0.22}
        });
        let radar: ComparisonRadar = serde_json::from_value(json).unwrap();
        assert_eq!(radar.portfolio_a.sharpe, 0.9);
        assert_eq!(radar.portfolio_b.sharpe, 0.0);
        assert_eq!(radar.portfolio_b.win_rate, 0.0);
    }

    #[test]
    fn portfolio_record_from_json() {
        let json = json!([{
            "portfolio_id": 1,
            "portfolio_name": "Diversified Growth",
            "allocation": "AAPL: 30%, NVDA: 30%, BTC-USD: 40%",
            "creator_username": "johndoe",
            "is_shared": true,
            "is_editable": true,
            "is_shareable": true,
            "current_value": 14689.75,
            "return_percent": 0.4689,
            "cagr": 0.1586,
            "volatility": 0.2782,
            "max_drawdown": 0.3578
        }]);
        let records: Vec<PortfolioRecord> = serde_json::from_value(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].portfolio_name, "Diversified Growth");
        assert!(records[0].is_shared);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.url("/api/timeseries"),
            "http://localhost:5000/api/timeseries"
        );
    }

    #[test]
    fn metrics_request_serializes_weights_as_fractions() {
        let mut weights = HashMap::new();
        weights.insert("AAPL".to_string(), 0.5);
        let body = MetricsRequest {
            weights: &weights,
            start_date: "2015-01-01",
            initial_investment: 1000.0,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["weights"]["AAPL"], 0.5);
        assert_eq!(value["start_date"], "2015-01-01");
        assert_eq!(value["initial_investment"], 1000.0);
    }
}
