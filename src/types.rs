use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One normalized row of the daily operational sheet. Materialized only when
/// the date cell could be coerced; every other field carries a default on
/// coercion failure instead of rejecting the row.
#[derive(Debug, Clone, Serialize)]
pub struct OperationalRow {
    pub fecha: NaiveDate,
    pub producto: String,
    pub destino: String,
    pub ton_prog: f64,
    pub ton_real: f64,
    pub eq_prog: f64,
    pub eq_real: f64,
    pub regulacion: f64,
    pub sda_hours: f64,
    pub pang_hours: f64,
    pub faena_meta_hours: f64,
    pub faena_real_hours: f64,
}

/// One normalized equipment-arrival event. `hora` is the arrival time of day
/// in decimal hours.
#[derive(Debug, Clone, Serialize)]
pub struct ArrivalRow {
    pub fecha: NaiveDate,
    pub destino: String,
    pub empresa: String,
    pub hora: f64,
}

/// Derived KPI set for one report date (optionally narrowed to one product).
/// Recomputed from scratch on every filter change; nothing here is cached.
/// Every numeric field is finite by construction.
#[derive(Debug, Clone, Serialize)]
pub struct DailyKpis {
    pub ton_prog: f64,
    pub ton_real: f64,
    pub ton_compliance_pct: f64,
    pub eq_prog: f64,
    pub eq_real: f64,
    pub fleet_use_pct: f64,
    pub avg_load: f64,
    pub avg_regulacion: f64,
    pub avg_faena_real: f64,
    pub avg_faena_meta: f64,
    pub time_deviation_hours: f64,
    pub deviation_flagged: bool,
    pub avg_sda_hours: f64,
    pub avg_pang_hours: f64,
    pub top_destino: String,
    pub top_destino_count: usize,
}

/// Formatted label/value pair for console display and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Indicador")]
    #[tabled(rename = "Indicador")]
    pub label: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
}

/// Per-product tonnage/fleet breakdown for the report preview.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductBreakdownRow {
    #[serde(rename = "Producto")]
    #[tabled(rename = "Producto")]
    pub producto: String,
    #[serde(rename = "TonProg")]
    #[tabled(rename = "TonProg")]
    pub ton_prog: String,
    #[serde(rename = "TonReal")]
    #[tabled(rename = "TonReal")]
    pub ton_real: String,
    #[serde(rename = "Cumplimiento")]
    #[tabled(rename = "Cumplimiento")]
    pub cumplimiento: String,
    #[serde(rename = "EqReal")]
    #[tabled(rename = "EqReal")]
    pub eq_real: String,
}

/// Contract with the AI summary collaborator. Field names mirror the wire
/// format the service is prompted to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub summary: String,
    #[serde(rename = "suggestedKPIs")]
    pub suggested_kpis: Vec<SuggestedKpi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedKpi {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}
