use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use daletou_db::models::DrawRecord;
use daletou_db::reconcile::MergeSummary;
use daletou_sync::ladder::{AttemptOutcome, FetchAttempt};

use crate::advisor::Analysis;
use crate::analysis::NumberStats;
use crate::analysis::backtest::{PrizeTierResult, full_table};
use crate::analysis::sampler::Suggestion;
use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Période", "Date", "Zone avant", "Zone arrière", "Somme"]);
    for draw in draws {
        let mut front = draw.front;
        front.sort();
        let mut back = draw.back;
        back.sort();

        table.add_row(vec![
            draw.id.to_string(),
            draw.date.clone(),
            join_numbers(&front),
            join_numbers(&back),
            draw.front_sum().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Lignes lues       : {}", result.total_lines);
    println!("  Lignes mal formées: {}", result.malformed);
    println!("  Tirages invalides : {}", result.rejected);
    println!("  Nouveaux tirages  : {}", result.added);
    println!("  Total historique  : {}", result.total);
}

pub fn display_merge_summary(summary: &MergeSummary) {
    println!(
        "Fusion : {} reçus, {} écartés, {} nouveaux, {} tirages au total.",
        summary.received, summary.rejected, summary.added, summary.total
    );
}

pub fn display_attempts(attempts: &[FetchAttempt]) {
    let mut table = new_table(vec!["#", "Relais", "Limite", "Résultat"]);
    for (i, attempt) in attempts.iter().enumerate() {
        let outcome = match &attempt.outcome {
            AttemptOutcome::Accepted(n) => Cell::new(format!("{n} tirages")).fg(Color::Green),
            AttemptOutcome::Failed(e) => Cell::new(e.to_string()).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&attempt.endpoint),
            Cell::new(attempt.size_limit),
            outcome,
        ]);
    }
    println!("{table}");
}

pub fn display_backtest(front: &[u8; 5], back: &[u8; 2], results: &[PrizeTierResult], history_len: usize) {
    println!(
        "\n🎯 Grille {} + {} sur {} tirages\n",
        join_numbers(front),
        join_numbers(back),
        history_len
    );

    if results.is_empty() {
        println!("Aucun gain dans l'historique pour cette grille.");
        return;
    }

    let mut table = new_table(vec!["Rang", "Nom", "Occurrences"]);
    for r in full_table(results) {
        let count = if r.count > 0 {
            Cell::new(r.count).fg(Color::Green)
        } else {
            Cell::new("—")
        };
        table.add_row(vec![Cell::new(r.tier), Cell::new(&r.name), count]);
    }
    println!("{table}");
}

pub fn display_trend(predicted: u32, window: (u32, u32), sample: usize) {
    println!("\n📈 Tendance de la somme (zone avant) sur {} tirages", sample);
    println!("  Somme prévue : {}", predicted);
    println!("  Fourchette   : {} ~ {}", window.0, window.1);
}

pub fn display_stats(front_stats: &[NumberStats], back_stats: &[NumberStats], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    for (title, stats) in [("── Zone avant (1-35) ──", front_stats), ("── Zone arrière (1-12) ──", back_stats)] {
        println!("{title}");
        let mut table = new_table(vec!["Numéro", "Fréquence", "Retard"]);

        let mut sorted = stats.to_vec();
        sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));

        for stat in &sorted {
            table.add_row(vec![
                format!("{:02}", stat.number),
                stat.frequency.to_string(),
                stat.gap.to_string(),
            ]);
        }
        println!("{table}\n");
    }
}

pub fn display_suggestions(suggestions: &[(Suggestion, Vec<PrizeTierResult>)]) {
    println!("\n🎲 Suggestions de grilles\n");

    let mut table = new_table(vec!["#", "Zone avant", "Zone arrière", "Somme", "Gains historiques"]);
    for (i, (sug, results)) in suggestions.iter().enumerate() {
        let sum = if sug.in_window {
            Cell::new(sug.front_sum())
        } else {
            Cell::new(sug.front_sum()).fg(Color::Yellow)
        };
        let wins = if results.is_empty() {
            "—".to_string()
        } else {
            results
                .iter()
                .map(|r| format!("{}×{}", r.name, r.count))
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(join_numbers(&sug.front)),
            Cell::new(join_numbers(&sug.back)),
            sum,
            Cell::new(wins),
        ]);
    }
    println!("{table}");
}

pub fn display_analysis(analysis: &Analysis) {
    println!("\n🤖 Analyse externe\n");
    if !analysis.hot_numbers.is_empty() {
        println!("  Numéros chauds : {}", join_numbers(&analysis.hot_numbers));
    }
    if !analysis.cold_numbers.is_empty() {
        println!("  Numéros froids : {}", join_numbers(&analysis.cold_numbers));
    }
    println!("  Recommandation : {}", join_numbers(&analysis.recommendation));
    println!("\n{}", analysis.explanation);
}
