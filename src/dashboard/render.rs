// Terminal rendering of the dashboard views. Thin presentation over the
// aggregation results; nothing here feeds back into ingestion.

use sales_metrics::*;

use crate::dashboard::feed::FeedOutcome;

const BAR_WIDTH: usize = 40;

fn bar(value: u32, max: u32) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (value as usize * BAR_WIDTH) / max as usize;
    "#".repeat(len)
}

fn attainment_label(pct: f64) -> &'static str {
    if pct >= 100.0 {
        "meta atingida"
    } else if pct >= 80.0 {
        "próximo da meta"
    } else {
        "abaixo da meta"
    }
}

fn month_list(months: &[Month]) -> String {
    if months.len() == Month::ALL.len() {
        return "Ano completo".to_string();
    }
    let names: Vec<&str> = months.iter().map(|m| m.name()).collect();
    names.join(", ")
}

fn print_aggregate_table(rows: &[AggregateRow]) {
    println!(
        "| {:<12} | {:>9} | {:>6} | {:>15} | {:>9} | {:<16} |",
        "Comercial", "Realizado", "Meta", "Atingimento (%)", "Diferença", "Status"
    );
    println!("{}", "-".repeat(88));
    for r in rows.iter() {
        println!(
            "| {:<12} | {:>9} | {:>6} | {:>15.2} | {:>9} | {:<16} |",
            r.representative.name(),
            r.realized,
            r.quota,
            r.attainment_pct,
            r.delta,
            attainment_label(r.attainment_pct)
        );
    }
}

fn print_totals(totals: &Totals) {
    println!(
        "Total Realizado: {}   Total Meta: {}   Atingimento: {:.1}%   Diferença: {}",
        totals.realized, totals.quota, totals.attainment_pct, totals.delta
    );
}

pub fn render_intro(records: &[CanonicalRecord], url: &str, outcome: &FeedOutcome) {
    println!("=== Dashboard de Performance Comercial ===");
    println!();
    println!("Acompanhamento do realizado da equipe comercial contra as metas mensais.");
    println!();
    println!("Fonte dos dados: {}", url);
    match outcome {
        FeedOutcome::Ok => println!("Carga: planilha carregada com sucesso."),
        FeedOutcome::Degraded { reason } => println!("Carga: dados reais em modo degradado ({})", reason),
        FeedOutcome::Fallback { reason } => println!("Carga: dados de exemplo ({})", reason),
    }
    println!();
    let min_year = records.iter().map(|r| r.year).min().unwrap_or(0);
    let max_year = records.iter().map(|r| r.year).max().unwrap_or(0);
    let mut actives: Vec<Representative> = Vec::new();
    for r in records.iter() {
        if !actives.contains(&r.representative) {
            actives.push(r.representative);
        }
    }
    println!("Total de registros: {}", records.len());
    println!("Período coberto: {} - {}", min_year, max_year);
    println!("Comerciais ativos: {}", actives.len());
    println!();
    println!("Prévia dos dados:");
    for r in records.iter().take(10) {
        println!("  {}  {}", r.completed_on, r.representative.name());
    }
}

pub fn render_monthly(
    records: &[CanonicalRecord],
    rows: &[AggregateRow],
    year: i32,
    months: &[Month],
    representatives: &[Representative],
) {
    println!("=== Performance Mensal {} ({}) ===", year, month_list(months));
    println!();
    if rows.is_empty() {
        println!("Nenhum dado encontrado para o filtro selecionado.");
        return;
    }
    print_totals(&summarize(rows));
    println!();
    print_aggregate_table(rows);
    println!();

    // Realizado vs meta, per representative.
    println!("Realizado vs Meta");
    let max = rows
        .iter()
        .map(|r| r.realized.max(r.quota))
        .max()
        .unwrap_or(0);
    for r in rows.iter() {
        println!(
            "  {:<12} realizado {:>4} |{}",
            r.representative.name(),
            r.realized,
            bar(r.realized, max)
        );
        println!(
            "  {:<12} meta      {:>4} |{}",
            "",
            r.quota,
            bar(r.quota, max)
        );
    }
    println!();

    // Month-by-month evolution of the realized count, in calendar order.
    println!("Evolução Mensal");
    let mut ordered: Vec<Month> = months.to_vec();
    ordered.sort_by_key(|m| m.number());
    ordered.dedup();
    let counts: Vec<(Month, u32)> = ordered
        .iter()
        .map(|&month| {
            let n = records
                .iter()
                .filter(|r| {
                    r.year == year
                        && r.month == month
                        && representatives.contains(&r.representative)
                })
                .count() as u32;
            (month, n)
        })
        .collect();
    let max_month = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (month, n) in counts.iter() {
        println!("  {:<10} {:>4} |{}", month.name(), n, bar(*n, max_month));
    }
}

pub fn render_annual(rows: &[AggregateRow], year: i32, months: &[Month]) {
    println!("=== Consolidado Anual {} ({}) ===", year, month_list(months));
    println!();
    if rows.is_empty() {
        println!("Nenhum dado encontrado para {} no período selecionado.", year);
        return;
    }
    print_totals(&summarize(rows));
    println!();
    print_aggregate_table(rows);
    println!();

    println!("Atingimento por Comercial (%)");
    let max_pct = rows
        .iter()
        .map(|r| r.attainment_pct.round() as u32)
        .max()
        .unwrap_or(0);
    for r in rows.iter() {
        println!(
            "  {:<12} {:>6.1}% |{}",
            r.representative.name(),
            r.attainment_pct,
            bar(r.attainment_pct.round() as u32, max_pct.max(100))
        );
    }
}

pub fn render_totals(records: &[CanonicalRecord]) {
    println!("=== Resultados Totais ===");
    println!();
    println!("Total geral de vendas: {}", records.len());

    // Counts per representative, in the canonical order; ties keep it.
    let rep_counts: Vec<(Representative, usize)> = Representative::ALL
        .iter()
        .map(|&rep| {
            (
                rep,
                records.iter().filter(|r| r.representative == rep).count(),
            )
        })
        .collect();
    if let Some((top_rep, top_n)) = rep_counts.iter().max_by_key(|(_, n)| *n) {
        println!("Top comercial: {} ({} vendas)", top_rep.name(), top_n);
    }

    let month_counts: Vec<(Month, usize)> = Month::ALL
        .iter()
        .map(|&month| (month, records.iter().filter(|r| r.month == month).count()))
        .collect();
    if let Some((top_month, top_n)) = month_counts.iter().max_by_key(|(_, n)| *n) {
        println!("Mês com mais vendas: {} ({} vendas)", top_month.name(), top_n);
    }

    let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    let year_counts: Vec<(i32, usize)> = years
        .iter()
        .map(|&y| (y, records.iter().filter(|r| r.year == y).count()))
        .collect();
    if let Some((top_year, top_n)) = year_counts.iter().max_by_key(|(_, n)| *n) {
        println!("Ano com mais vendas: {} ({} vendas)", top_year, top_n);
    }
    println!();

    println!("Evolução anual");
    let max_year = year_counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (y, n) in year_counts.iter() {
        println!("  {:<6} {:>4} |{}", y, n, bar(*n as u32, max_year as u32));
    }
    println!();

    println!("Distribuição por comercial");
    let max_rep = rep_counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (rep, n) in rep_counts.iter() {
        println!(
            "  {:<12} {:>4} |{}",
            rep.name(),
            n,
            bar(*n as u32, max_rep as u32)
        );
    }
}

pub fn render_help() {
    println!("=== Como usar o dashboard ===");
    println!();
    println!("Visões (--view):");
    println!("  intro    visão geral da carga de dados e prévia dos registros");
    println!("  monthly  análise detalhada por mês/ano, realizado vs meta (padrão)");
    println!("  annual   consolidado anual ou por semestre (--period ano|sem1|sem2)");
    println!("  totals   métricas gerais de todo o histórico");
    println!("  help     este texto");
    println!();
    println!("Filtros:");
    println!("  --year 2025                       restringe ao ano");
    println!("  --months Janeiro,Fevereiro        restringe aos meses listados");
    println!("  --reps Rafael,Danilo              restringe aos comerciais listados");
    println!();
    println!("Status de atingimento:");
    println!("  meta atingida     atingimento >= 100%");
    println!("  próximo da meta   atingimento entre 80% e 99%");
    println!("  abaixo da meta    atingimento < 80%");
    println!();
    println!("Os dados são lidos da planilha publicada em CSV e mantidos em cache");
    println!("por 5 minutos. Em caso de falha na carga, um conjunto fixo de dados");
    println!("de exemplo é usado para manter todas as visões renderizáveis.");
}
