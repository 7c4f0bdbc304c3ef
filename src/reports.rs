// KPI aggregation over canonical records.
//
// Everything here is a pure transform of (records, active filter) → derived
// values, recomputed on every filter change. Divisions guard the zero
// denominator and return 0, so every derived figure is finite: the
// presentation side never branches on numeric validity.
use crate::coerce::format_hours_to_clock;
use crate::types::{ArrivalRow, DailyKpis, KpiRow, OperationalRow, ProductBreakdownRow};
use crate::util::{average, format_number, positive_mean};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Deviation threshold for the faena cycle time: 10 minutes, in hours.
const DEVIATION_THRESHOLD_HOURS: f64 = 10.0 / 60.0;

pub fn filter_day(data: &[OperationalRow], date: NaiveDate) -> Vec<OperationalRow> {
    data.iter().filter(|r| r.fecha == date).cloned().collect()
}

pub fn filter_product(day: &[OperationalRow], producto: &str) -> Vec<OperationalRow> {
    day.iter().filter(|r| r.producto == producto).cloned().collect()
}

/// Distinct products present in the day's rows, sorted.
pub fn product_list(day: &[OperationalRow]) -> Vec<String> {
    let mut products: Vec<String> = day.iter().map(|r| r.producto.clone()).collect();
    products.sort();
    products.dedup();
    products
}

fn ratio_pct(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den * 100.0
    } else {
        0.0
    }
}

pub fn compute_daily_kpis(day: &[OperationalRow]) -> DailyKpis {
    let ton_prog: f64 = day.iter().map(|r| r.ton_prog).sum();
    let ton_real: f64 = day.iter().map(|r| r.ton_real).sum();
    let eq_prog: f64 = day.iter().map(|r| r.eq_prog).sum();
    let eq_real: f64 = day.iter().map(|r| r.eq_real).sum();

    let regulaciones: Vec<f64> = day.iter().map(|r| r.regulacion).collect();
    let avg_faena_real = positive_mean(day.iter().map(|r| r.faena_real_hours));
    let avg_faena_meta = positive_mean(day.iter().map(|r| r.faena_meta_hours));
    let time_deviation_hours = avg_faena_real - avg_faena_meta;

    let (top_destino, top_destino_count) = top_destination(day);

    DailyKpis {
        ton_prog,
        ton_real,
        ton_compliance_pct: ratio_pct(ton_real, ton_prog),
        eq_prog,
        eq_real,
        fleet_use_pct: ratio_pct(eq_real, eq_prog),
        avg_load: if eq_real > 0.0 { ton_real / eq_real } else { 0.0 },
        avg_regulacion: average(&regulaciones),
        avg_faena_real,
        avg_faena_meta,
        time_deviation_hours,
        deviation_flagged: time_deviation_hours >= DEVIATION_THRESHOLD_HOURS,
        avg_sda_hours: positive_mean(day.iter().map(|r| r.sda_hours)),
        avg_pang_hours: positive_mean(day.iter().map(|r| r.pang_hours)),
        top_destino,
        top_destino_count,
    }
}

// Most frequent destination by row count; ties break in favor of the
// destination seen first. Iteration runs over the encounter order, never
// over the hash map.
fn top_destination(day: &[OperationalRow]) -> (String, usize) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for r in day {
        let entry = counts.entry(r.destino.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(r.destino.as_str());
        }
        *entry += 1;
    }
    let mut top = ("S/D".to_string(), 0usize);
    for dest in order {
        let count = counts[dest];
        if count > top.1 {
            top = (dest.to_string(), count);
        }
    }
    top
}

/// Formatted KPI cards for the daily report, in display order.
pub fn kpi_rows(k: &DailyKpis) -> Vec<KpiRow> {
    let deviation = format!(
        "{}{}",
        if k.time_deviation_hours > 0.0 { "+" } else { "" },
        format_hours_to_clock(k.time_deviation_hours)
    );
    vec![
        KpiRow {
            label: "Tonelaje Programado".to_string(),
            value: format_number(k.ton_prog, 1),
        },
        KpiRow {
            label: "Tonelaje Real".to_string(),
            value: format_number(k.ton_real, 1),
        },
        KpiRow {
            label: "Cumplimiento Tonelaje".to_string(),
            value: format!("{:.1}%", k.ton_compliance_pct),
        },
        KpiRow {
            label: "Carga Promedio (Ton/EQ)".to_string(),
            value: format!("{:.2}", k.avg_load),
        },
        KpiRow {
            label: "Uso de Flota (Real vs Prog)".to_string(),
            value: format!("{:.1}%", k.fleet_use_pct),
        },
        KpiRow {
            label: "Desviación Tiempo Faena".to_string(),
            value: deviation,
        },
        KpiRow {
            label: "Regulación Promedio".to_string(),
            value: format!("{:.2}", k.avg_regulacion),
        },
        KpiRow {
            label: "Destino Principal".to_string(),
            value: format!("{} ({})", k.top_destino, k.top_destino_count),
        },
    ]
}

/// Per-product tonnage/fleet summary for the day, sorted by product.
pub fn product_breakdown(day: &[OperationalRow]) -> Vec<ProductBreakdownRow> {
    #[derive(Default)]
    struct Acc {
        ton_prog: f64,
        ton_real: f64,
        eq_real: f64,
    }
    let mut map: BTreeMap<String, Acc> = BTreeMap::new();
    for r in day {
        let e = map.entry(r.producto.clone()).or_default();
        e.ton_prog += r.ton_prog;
        e.ton_real += r.ton_real;
        e.eq_real += r.eq_real;
    }
    map.into_iter()
        .map(|(producto, acc)| ProductBreakdownRow {
            producto,
            ton_prog: format_number(acc.ton_prog, 1),
            ton_real: format_number(acc.ton_real, 1),
            cumplimiento: format!("{:.1}%", ratio_pct(acc.ton_real, acc.ton_prog)),
            eq_real: format_number(acc.eq_real, 1),
        })
        .collect()
}

/// Distinct companies with arrivals on the given date, sorted.
pub fn arrival_companies(data: &[ArrivalRow], date: NaiveDate) -> Vec<String> {
    let mut companies: Vec<String> = data
        .iter()
        .filter(|r| r.fecha == date)
        .map(|r| r.empresa.clone())
        .collect();
    companies.sort();
    companies.dedup();
    companies
}

/// Distinct destinations for one date + company, sorted.
pub fn arrival_destinations(data: &[ArrivalRow], date: NaiveDate, empresa: &str) -> Vec<String> {
    let mut destinations: Vec<String> = data
        .iter()
        .filter(|r| r.fecha == date && r.empresa == empresa)
        .map(|r| r.destino.clone())
        .collect();
    destinations.sort();
    destinations.dedup();
    destinations
}

/// Arrival events for one date + company, limited to the given destinations
/// and the inclusive hour window `[lo, hi + 0.99]`.
pub fn filter_arrivals(
    data: &[ArrivalRow],
    date: NaiveDate,
    empresa: &str,
    destinations: &[String],
    hour_range: (u32, u32),
) -> Vec<ArrivalRow> {
    let lo = f64::from(hour_range.0);
    let hi = f64::from(hour_range.1) + 0.99;
    data.iter()
        .filter(|r| {
            r.fecha == date
                && r.empresa == empresa
                && destinations.iter().any(|d| *d == r.destino)
                && r.hora >= lo
                && r.hora <= hi
        })
        .cloned()
        .collect()
}

/// Hour × destination pivot of arrival counts. Only hours with at least one
/// arrival appear, in ascending order; `totals` follows `destinations`.
#[derive(Debug, Clone)]
pub struct ArrivalPivot {
    pub destinations: Vec<String>,
    pub rows: Vec<PivotRow>,
    pub totals: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct PivotRow {
    pub hour: i64,
    pub counts: Vec<usize>,
}

pub fn arrival_pivot(rows: &[ArrivalRow], destinations: &[String]) -> ArrivalPivot {
    let mut by_hour: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    let mut totals = vec![0usize; destinations.len()];
    for r in rows {
        let Some(col) = destinations.iter().position(|d| *d == r.destino) else {
            continue;
        };
        let counts = by_hour
            .entry(r.hora.floor() as i64)
            .or_insert_with(|| vec![0; destinations.len()]);
        counts[col] += 1;
        totals[col] += 1;
    }
    ArrivalPivot {
        destinations: destinations.to_vec(),
        rows: by_hour
            .into_iter()
            .map(|(hour, counts)| PivotRow { hour, counts })
            .collect(),
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn op_row(fecha: NaiveDate, producto: &str, ton_prog: f64, ton_real: f64) -> OperationalRow {
        OperationalRow {
            fecha,
            producto: producto.to_string(),
            destino: "S/D".to_string(),
            ton_prog,
            ton_real,
            eq_prog: 0.0,
            eq_real: 0.0,
            regulacion: 0.0,
            sda_hours: 0.0,
            pang_hours: 0.0,
            faena_meta_hours: 0.0,
            faena_real_hours: 0.0,
        }
    }

    fn arr_row(fecha: NaiveDate, destino: &str, empresa: &str, hora: f64) -> ArrivalRow {
        ArrivalRow {
            fecha,
            destino: destino.to_string(),
            empresa: empresa.to_string(),
            hora,
        }
    }

    #[test]
    fn daily_totals_and_compliance() {
        let data = vec![
            op_row(date(1), "LITIO A", 100.0, 90.0),
            op_row(date(1), "LITIO A", 50.0, 0.0),
            op_row(date(2), "LITIO B", 20.0, 25.0),
        ];
        let day = filter_day(&data, date(1));
        assert_eq!(day.len(), 2);
        let k = compute_daily_kpis(&day);
        assert_eq!(k.ton_prog, 150.0);
        assert_eq!(k.ton_real, 90.0);
        assert!((k.ton_compliance_pct - 60.0).abs() < 1e-9);
    }

    #[test]
    fn ratios_guard_zero_denominators() {
        let day = vec![op_row(date(1), "LITIO A", 0.0, 40.0)];
        let k = compute_daily_kpis(&day);
        assert_eq!(k.ton_compliance_pct, 0.0);
        assert_eq!(k.fleet_use_pct, 0.0);
        assert_eq!(k.avg_load, 0.0);
        assert!(k.ton_compliance_pct.is_finite());

        let empty = compute_daily_kpis(&[]);
        assert_eq!(empty.avg_regulacion, 0.0);
        assert_eq!(empty.top_destino, "S/D");
    }

    #[test]
    fn duration_means_ignore_zeroes_and_flag_deviation() {
        let mut a = op_row(date(1), "LITIO A", 10.0, 10.0);
        a.faena_real_hours = 10.5;
        a.faena_meta_hours = 10.0;
        let mut b = op_row(date(1), "LITIO A", 10.0, 10.0);
        b.faena_real_hours = 0.0; // not recorded, excluded from the mean
        b.faena_meta_hours = 0.0;
        let k = compute_daily_kpis(&[a, b]);
        assert_eq!(k.avg_faena_real, 10.5);
        assert_eq!(k.avg_faena_meta, 10.0);
        assert!((k.time_deviation_hours - 0.5).abs() < 1e-9);
        assert!(k.deviation_flagged);

        let formatted = kpi_rows(&k);
        let deviation = formatted
            .iter()
            .find(|r| r.label == "Desviación Tiempo Faena")
            .unwrap();
        assert_eq!(deviation.value, "+0:30");
    }

    #[test]
    fn top_destination_ties_break_on_first_seen() {
        let mut a = op_row(date(1), "LITIO A", 1.0, 1.0);
        a.destino = "PLANTA B".to_string();
        let mut b = op_row(date(1), "LITIO A", 1.0, 1.0);
        b.destino = "PLANTA A".to_string();
        let mut c = op_row(date(1), "LITIO A", 1.0, 1.0);
        c.destino = "PLANTA A".to_string();
        let mut d = op_row(date(1), "LITIO A", 1.0, 1.0);
        d.destino = "PLANTA B".to_string();
        let k = compute_daily_kpis(&[a, b, c, d]);
        assert_eq!(k.top_destino, "PLANTA B");
        assert_eq!(k.top_destino_count, 2);
    }

    #[test]
    fn product_breakdown_groups_and_sorts() {
        let data = vec![
            op_row(date(1), "LITIO B", 20.0, 10.0),
            op_row(date(1), "LITIO A", 100.0, 90.0),
            op_row(date(1), "LITIO B", 30.0, 40.0),
        ];
        let rows = product_breakdown(&data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].producto, "LITIO A");
        assert_eq!(rows[1].producto, "LITIO B");
        assert_eq!(rows[1].ton_prog, "50.0");
        assert_eq!(rows[1].cumplimiento, "100.0%");
    }

    #[test]
    fn arrival_filters_and_pivot() {
        let data = vec![
            arr_row(date(1), "PLANTA", "M&Q SPA", 6.25),
            arr_row(date(1), "PLANTA", "M&Q SPA", 6.75),
            arr_row(date(1), "PUERTO", "M&Q SPA", 7.5),
            arr_row(date(1), "PLANTA", "COSEDUCAM S A", 6.5),
            arr_row(date(2), "PLANTA", "M&Q SPA", 6.5),
            arr_row(date(1), "PLANTA", "M&Q SPA", 22.5), // outside hour window
        ];
        assert_eq!(
            arrival_companies(&data, date(1)),
            vec!["COSEDUCAM S A".to_string(), "M&Q SPA".to_string()]
        );
        let dests = arrival_destinations(&data, date(1), "M&Q SPA");
        assert_eq!(dests, vec!["PLANTA".to_string(), "PUERTO".to_string()]);

        let filtered = filter_arrivals(&data, date(1), "M&Q SPA", &dests, (6, 8));
        assert_eq!(filtered.len(), 3);

        let pivot = arrival_pivot(&filtered, &dests);
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(pivot.rows[0].hour, 6);
        assert_eq!(pivot.rows[0].counts, vec![2, 0]);
        assert_eq!(pivot.rows[1].hour, 7);
        assert_eq!(pivot.rows[1].counts, vec![0, 1]);
        assert_eq!(pivot.totals, vec![2, 1]);
    }
}
