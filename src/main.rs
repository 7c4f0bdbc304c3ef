// Entry point and high-level CLI flow.
//
// The binary mirrors the daily reporting routine of the desktop dashboard:
// - Options [1]/[3] load and normalize the operational / arrival workbooks,
//   printing load diagnostics.
// - Option [2] renders the KPI report for a selected date, exports CSV/JSON
//   and optionally requests the AI executive summary.
// - Option [4] renders the hour × destination arrival pivot for a selected
//   date and company.
mod ai;
mod coerce;
mod company;
mod header;
mod loader;
mod normalize;
mod output;
mod reports;
mod types;
mod util;

use ai::{AiClient, AiConfig};
use chrono::NaiveDate;
use coerce::{format_date_cl, format_hours_to_clock};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{ArrivalRow, DailyKpis, DashboardConfig, OperationalRow};

// Simple in-memory app state: each load replaces the collection wholesale,
// nothing is persisted across runs.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        operational: None,
        arrivals: None,
    })
});

struct AppState {
    operational: Option<Vec<OperationalRow>>,
    arrivals: Option<Vec<ArrivalRow>>,
}

/// Everything exported to `resumen_<fecha>.json` for one report date.
#[derive(Serialize)]
struct DailySummary {
    fecha: NaiveDate,
    kpis: DailyKpis,
    ai: Option<DashboardConfig>,
    justificacion: Option<Justificacion>,
}

#[derive(Serialize)]
struct Justificacion {
    producto: String,
    texto: String,
}

/// Read a single line of input after printing the common "Opción:" prompt.
fn read_choice() -> String {
    print!("Opción: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Prompt for a file path, falling back to `default` on empty input.
fn prompt_path(label: &str, default: &str) -> String {
    print!("{} [{}]: ", label, default);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    let trimmed = buf.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn prompt_yes_no(label: &str) -> bool {
    loop {
        print!("{} (Y/N): ", label);
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Opción inválida. Ingrese Y o N."),
        }
    }
}

/// Numbered selection over `items`; empty or invalid input selects the
/// first entry (the default filter).
fn choose_index(items_len: usize) -> usize {
    let choice = read_choice();
    match choice.parse::<usize>() {
        Ok(n) if (1..=items_len).contains(&n) => n - 1,
        _ => 0,
    }
}

fn print_load_report(report: &loader::LoadReport) {
    println!(
        "Procesando hoja \"{}\"... ({} filas leídas, {} aceptadas)",
        report.sheet,
        util::format_int(report.total_rows as i64),
        util::format_int(report.accepted_rows as i64)
    );
    if report.rejected_rows > 0 {
        println!(
            "Nota: {} filas descartadas por fecha no reconocible.",
            util::format_int(report.rejected_rows as i64)
        );
    }
    println!();
}

/// Option [1]: load and normalize the operational workbook.
fn handle_load_operational() {
    let path = prompt_path("Ruta del archivo Excel", "base_de_datos.xlsx");
    match loader::load_operational(&path) {
        Ok((data, report)) => {
            print_load_report(&report);
            let mut state = APP_STATE.lock().unwrap();
            state.operational = Some(data);
        }
        Err(e) => {
            eprintln!("No se pudo cargar el archivo: {}\n", e);
        }
    }
}

/// Option [3]: load and normalize the equipment-arrival workbook.
fn handle_load_arrivals() {
    let path = prompt_path("Ruta del archivo Excel", "llegada_equipos.xlsx");
    match loader::load_arrivals(&path) {
        Ok((data, report)) => {
            print_load_report(&report);
            let mut state = APP_STATE.lock().unwrap();
            state.arrivals = Some(data);
        }
        Err(e) => {
            eprintln!("No se pudo cargar el archivo: {}\n", e);
        }
    }
}

fn select_date(dates: &[NaiveDate]) -> NaiveDate {
    println!("Fechas disponibles:");
    for (i, d) in dates.iter().enumerate() {
        println!("[{}] {}", i + 1, format_date_cl(*d));
    }
    dates[choose_index(dates.len())]
}

/// Option [2]: KPI report for one date, with optional AI summary.
fn handle_daily_report() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.operational.clone()
    };
    let Some(data) = data else {
        println!("Error: sin datos operativos. Cargue primero el archivo (opción 1).\n");
        return;
    };

    let dates = loader::distinct_dates_desc(data.iter().map(|r| r.fecha));
    let date = select_date(&dates);
    let day = reports::filter_day(&data, date);
    let kpis = reports::compute_daily_kpis(&day);

    println!("\nInforme Operativo — {}\n", format_date_cl(date));
    let kpi_rows = reports::kpi_rows(&kpis);
    output::preview_table(&kpi_rows, kpi_rows.len());
    if kpis.deviation_flagged {
        println!(
            "Atención: desviación de tiempo de faena de {} sobre la meta (umbral 0:10).\n",
            format_hours_to_clock(kpis.time_deviation_hours)
        );
    }

    println!("Desglose por producto:\n");
    let breakdown = reports::product_breakdown(&day);
    output::preview_table(&breakdown, breakdown.len());

    if prompt_yes_no("¿Ver detalle de un producto?") {
        let products = reports::product_list(&day);
        println!("Productos del día:");
        for (i, p) in products.iter().enumerate() {
            println!("[{}] {}", i + 1, p);
        }
        let producto = &products[choose_index(products.len())];
        let product_day = reports::filter_product(&day, producto);
        let product_kpis = reports::kpi_rows(&reports::compute_daily_kpis(&product_day));
        println!("\nDetalle {} — {}\n", producto, format_date_cl(date));
        output::preview_table(&product_kpis, product_kpis.len());
    }

    let kpi_file = format!("informe_kpis_{}.csv", date);
    if let Err(e) = output::write_csv(&kpi_file, &kpi_rows) {
        eprintln!("Error de escritura: {}", e);
    }
    println!("(KPIs exportados a {})\n", kpi_file);

    let client = AiClient::new(AiConfig::default());
    let ai_config = if prompt_yes_no("¿Solicitar resumen ejecutivo de IA?") {
        let config = client.analyze_logistics(
            &day,
            date,
            &format_hours_to_clock(kpis.avg_sda_hours),
            &format_hours_to_clock(kpis.avg_pang_hours),
        );
        println!("\nResumen de Gestión: \"{}\"\n", config.summary);
        for kpi in &config.suggested_kpis {
            println!("  - {}: {}", kpi.label, kpi.value);
        }
        println!();
        Some(config)
    } else {
        None
    };

    let justificacion = if prompt_yes_no("¿Agregar justificación de desviaciones?") {
        let products = reports::product_list(&day);
        println!("Productos del día:");
        for (i, p) in products.iter().enumerate() {
            println!("[{}] {}", i + 1, p);
        }
        let producto = products[choose_index(products.len())].clone();
        print!("Justificación para {}: ", producto);
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let texto = client.refine_justification(&producto, buf.trim());
        println!("\n\"{}\"\n", texto);
        Some(Justificacion { producto, texto })
    } else {
        None
    };

    let summary = DailySummary {
        fecha: date,
        kpis,
        ai: ai_config,
        justificacion,
    };
    let summary_file = format!("resumen_{}.json", date);
    if let Err(e) = output::write_json(&summary_file, &summary) {
        eprintln!("Error de escritura: {}", e);
    }
    println!("(Resumen exportado a {})\n", summary_file);
}

/// Option [4]: arrival pivot for one date and company.
fn handle_arrival_report() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.arrivals.clone()
    };
    let Some(data) = data else {
        println!("Error: sin datos de llegadas. Cargue primero el archivo (opción 3).\n");
        return;
    };

    let dates = loader::distinct_dates_desc(data.iter().map(|r| r.fecha));
    let date = select_date(&dates);

    let companies = reports::arrival_companies(&data, date);
    println!("Empresas con llegadas el {}:", format_date_cl(date));
    for (i, c) in companies.iter().enumerate() {
        println!("[{}] {}", i + 1, c);
    }
    let empresa = companies[choose_index(companies.len())].clone();

    let destinations = reports::arrival_destinations(&data, date, &empresa);
    let filtered = reports::filter_arrivals(&data, date, &empresa, &destinations, (0, 23));
    let pivot = reports::arrival_pivot(&filtered, &destinations);

    println!(
        "\nLlegada de Equipos — {} — {}\n",
        empresa,
        format_date_cl(date)
    );
    output::preview_pivot(&pivot);

    let pivot_file = format!("llegadas_{}.csv", date);
    if let Err(e) = output::write_pivot_csv(&pivot_file, &pivot) {
        eprintln!("Error de escritura: {}", e);
    }
    println!("(Tabla exportada a {})\n", pivot_file);
}

fn main() {
    loop {
        println!("Informe Operativo Litio");
        println!("[1] Cargar base de datos operativa");
        println!("[2] Generar informe del día");
        println!("[3] Cargar llegadas de equipos");
        println!("[4] Reporte de llegada de equipos");
        println!("[5] Salir\n");
        match read_choice().as_str() {
            "1" => handle_load_operational(),
            "2" => {
                println!();
                handle_daily_report();
            }
            "3" => handle_load_arrivals(),
            "4" => {
                println!();
                handle_arrival_report();
            }
            "5" => {
                println!("Saliendo del programa.");
                break;
            }
            _ => println!("Opción inválida. Ingrese un número del 1 al 5.\n"),
        }
    }
}
