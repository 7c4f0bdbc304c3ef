// Gemini collaborator: executive summary and text refinement.
//
// One client, one configuration. Credential lookup, model and endpoint are
// decoupled from the call contract: callers hand over day records and get a
// `DashboardConfig` back, always. Any failure on the way (missing key,
// network, HTTP status, malformed body) is logged and replaced by the local
// fallback built from the precomputed duration averages. The fallback is the
// offline-degradation path and its shape must not change.
use crate::types::{DashboardConfig, OperationalRow, SuggestedKpi};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

/// Rows sent to the model are capped; the prompt only needs a sample.
const MAX_PROMPT_ROWS: usize = 40;

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Primary credential variable, with a legacy fallback name kept for
    /// older deployments.
    pub api_key_env: String,
    pub legacy_key_env: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            legacy_key_env: "API_KEY".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct AiClient {
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> Option<String> {
        let lookup = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|k| !k.trim().is_empty() && k != "undefined")
        };
        lookup(&self.config.api_key_env).or_else(|| lookup(&self.config.legacy_key_env))
    }

    /// Executive summary for one report date. Never fails: collaborator
    /// problems degrade to the local fallback.
    pub fn analyze_logistics(
        &self,
        day: &[OperationalRow],
        date: NaiveDate,
        avg_sda: &str,
        avg_pang: &str,
    ) -> DashboardConfig {
        match self.request_analysis(day, date) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Gemini (análisis): {}", e);
                local_fallback(avg_sda, avg_pang, &e.to_string())
            }
        }
    }

    /// Rewrite a free-text justification for management. Returns the input
    /// unchanged when it is too short to bother or when the service fails.
    pub fn refine_justification(&self, producto: &str, raw_text: &str) -> String {
        if raw_text.len() < 5 {
            return raw_text.to_string();
        }
        match self.request_refinement(producto, raw_text) {
            Ok(refined) if !refined.is_empty() => refined,
            Ok(_) => raw_text.to_string(),
            Err(e) => {
                eprintln!("Gemini (refinar): {}", e);
                raw_text.to_string()
            }
        }
    }

    fn request_analysis(
        &self,
        day: &[OperationalRow],
        date: NaiveDate,
    ) -> Result<DashboardConfig, Box<dyn Error>> {
        let sample: Vec<AnalysisRow> = day.iter().take(MAX_PROMPT_ROWS).map(AnalysisRow::from).collect();
        let prompt = format!(
            "Actúa como un Gerente de Logística y Operaciones. \
             Analiza el desempeño operativo del día {date} basado en estos datos: {data}.\n\n\
             TU TAREA:\n\
             Genera un \"Resumen de Gestión de IA\" que sea altamente TÉCNICO, EJECUTIVO y \
             PROFESIONAL para la alta gerencia.\n\n\
             REGLAS DE SALIDA:\n\
             1. El resumen debe identificar causas raíz de desviaciones (si las hay) y destacar logros de eficiencia.\n\
             2. Usa términos como \"Throughput\", \"Ciclo Operativo\", \"Restricciones de flujo\", \"Cumplimiento de Plan\".\n\
             3. No menciones que eres una IA.\n\
             4. Responde ÚNICAMENTE en JSON con el formato:\n\
             {{\"summary\": \"Texto del resumen ejecutivo (máx 3-4 líneas)\", \
             \"suggestedKPIs\": [{{\"label\": \"KPI 1\", \"value\": \"valor\"}}]}}",
            date = date,
            data = serde_json::to_string(&sample)?,
        );
        let text = self.generate(&prompt, true)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn request_refinement(&self, producto: &str, raw_text: &str) -> Result<String, Box<dyn Error>> {
        let prompt = format!(
            "Reescribe esta justificación para el producto {producto} de forma profesional y \
             técnica para gerencia.\nTexto original: \"{raw_text}\"\n\
             Regla: Solo entrega el texto refinado, corto y profesional.",
        );
        Ok(self.generate(&prompt, false)?.trim().to_string())
    }

    fn generate(&self, prompt: &str, json_response: bool) -> Result<String, Box<dyn Error>> {
        let key = self
            .api_key()
            .ok_or("no se encontró API key en ninguna fuente conocida")?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: json_response.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()?;
        let response: GenerateResponse = client
            .post(&url)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or("la respuesta del modelo no contiene texto")?;
        Ok(text)
    }
}

/// Deterministic offline summary built from locally computed averages.
pub fn local_fallback(avg_sda: &str, avg_pang: &str, reason: &str) -> DashboardConfig {
    DashboardConfig {
        summary: format!("Análisis operativo disponible localmente. ({})", reason),
        suggested_kpis: vec![
            SuggestedKpi {
                label: "Tiempo SdA".to_string(),
                value: avg_sda.to_string(),
                change: None,
            },
            SuggestedKpi {
                label: "Tiempo PANG".to_string(),
                value: avg_pang.to_string(),
                change: None,
            },
            SuggestedKpi {
                label: "Estado".to_string(),
                value: "Modo Local".to_string(),
                change: None,
            },
        ],
    }
}

// Row subset shared with the model; field names are part of the prompt
// contract.
#[derive(Serialize)]
struct AnalysisRow<'a> {
    #[serde(rename = "Fecha")]
    fecha: NaiveDate,
    #[serde(rename = "Producto")]
    producto: &'a str,
    #[serde(rename = "Destino")]
    destino: &'a str,
    #[serde(rename = "Ton_Prog")]
    ton_prog: f64,
    #[serde(rename = "Ton_Real")]
    ton_real: f64,
    #[serde(rename = "Eq_Prog")]
    eq_prog: f64,
    #[serde(rename = "Eq_Real")]
    eq_real: f64,
    #[serde(rename = "Regulacion_Real")]
    regulacion: f64,
    #[serde(rename = "Tiempos")]
    tiempos: Tiempos,
}

#[derive(Serialize)]
struct Tiempos {
    #[serde(rename = "SdA")]
    sda: f64,
    #[serde(rename = "PANG")]
    pang: f64,
    #[serde(rename = "FaenaReal")]
    faena_real: f64,
    #[serde(rename = "FaenaMeta")]
    faena_meta: f64,
}

impl<'a> From<&'a OperationalRow> for AnalysisRow<'a> {
    fn from(r: &'a OperationalRow) -> Self {
        Self {
            fecha: r.fecha,
            producto: &r.producto,
            destino: &r.destino,
            ton_prog: r.ton_prog,
            ton_real: r.ton_real,
            eq_prog: r.eq_prog,
            eq_real: r.eq_real,
            regulacion: r.regulacion,
            tiempos: Tiempos {
                sda: r.sda_hours,
                pang: r.pang_hours,
                faena_real: r.faena_real_hours,
                faena_meta: r.faena_meta_hours,
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}
