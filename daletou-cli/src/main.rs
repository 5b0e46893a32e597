use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;
use tracing_subscriber::EnvFilter;

use daletou_db::db::{SqliteStore, db_path};
use daletou_db::models::{DrawRecord, Pool, validate_draw};
use daletou_db::reconcile::Reconciler;
use daletou_sync::error::SyncError;
use daletou_sync::live::HttpFetcher;
use daletou_sync::static_source::read_static;
use daletou_sync::sync::{SyncOutcome, Synchronizer};

use daletou_cli::advisor::{DeepSeekClient, analyze_or_default};
use daletou_cli::analysis::backtest::backtest;
use daletou_cli::analysis::compute_stats;
use daletou_cli::analysis::sampler::generate_suggestions;
use daletou_cli::analysis::trend::{predict_sum_with, sum_window};
use daletou_cli::config::{AppConfig, load_config};
use daletou_cli::import::{import_csv, import_text};
use daletou_cli::display::{
    display_analysis, display_attempts, display_backtest, display_draws, display_import_summary,
    display_merge_summary, display_stats, display_suggestions, display_trend,
};

#[derive(Parser)]
#[command(name = "daletou", about = "Historique et statistiques du Super Lotto (大乐透)")]
struct Cli {
    /// Fichier de configuration JSON (relais, limites, fenêtre de tendance)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer des tirages depuis un fichier CSV (id,date,f1..f5,b1,b2) ou un texte libre
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, required_unless_present = "text", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Texte libre (copié d'un site ou d'un tableur), interprété par le service d'analyse
        #[arg(long)]
        text: Option<PathBuf>,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,

        /// Synchroniser en arrière-plan après l'affichage
        #[arg(long)]
        sync: bool,
    },

    /// Récupérer les derniers tirages en ligne et les fusionner
    Sync,

    /// Fréquences et retards des numéros
    Stats {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "100")]
        window: usize,
    },

    /// Compter les gains historiques d'une grille
    Backtest {
        /// 5 numéros avant + 2 numéros arrière (7 nombres)
        numbers: Vec<u8>,
    },

    /// Somme prévue de la zone avant
    Trend,

    /// Grilles aléatoires dans la fourchette de somme prévue
    Suggest {
        /// Nombre de grilles
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Demander une grille au service d'analyse externe
    Advise,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daletou=info,daletou_cli=info,daletou_db=info,daletou_sync=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Import { file, text } => cmd_import(&config, file, text).await,
        Command::DbPath => {
            println!("{}", db_path().display());
            Ok(())
        }
        Command::List { last, sync } => cmd_list(&config, last, sync).await,
        Command::Sync => cmd_sync(&config).await,
        Command::Stats { window } => cmd_stats(&config, window).await,
        Command::Backtest { numbers } => cmd_backtest(&config, &numbers).await,
        Command::Trend => cmd_trend(&config).await,
        Command::Suggest { count, seed } => cmd_suggest(&config, count, seed).await,
        Command::Advise => cmd_advise(&config).await,
    }
}

async fn load_reconciler(config: &AppConfig) -> Result<Reconciler<SqliteStore>> {
    let store = SqliteStore::open(&db_path())?;
    let static_records = read_static(&config.sync.static_path).await;
    let reconciler = Reconciler::bootstrap(store, static_records)?;
    if reconciler.is_seeded() {
        println!("(Aucun historique disponible, jeu de démarrage embarqué utilisé)");
    }
    Ok(reconciler)
}

fn build_synchronizer(config: &AppConfig, reconciler: Reconciler<SqliteStore>) -> Result<Synchronizer<HttpFetcher, SqliteStore>> {
    let fetcher = HttpFetcher::new(config.sync.timeout())?;
    Ok(Synchronizer::new(fetcher, reconciler, &config.sync))
}

async fn cmd_import(config: &AppConfig, file: Option<PathBuf>, text: Option<PathBuf>) -> Result<()> {
    let mut reconciler = load_reconciler(config).await?;
    let result = match (file, text) {
        (Some(file), _) => import_csv(&mut reconciler, &file)?,
        (None, Some(text)) => {
            let client = DeepSeekClient::from_env()?;
            let pb = spinner("Interprétation du texte...");
            let result = import_text(&mut reconciler, &client, &text).await;
            pb.finish_and_clear();
            result?
        }
        (None, None) => bail!("Indiquer --file ou --text"),
    };
    display_import_summary(&result);
    Ok(())
}

async fn cmd_list(config: &AppConfig, last: usize, sync: bool) -> Result<()> {
    let reconciler = load_reconciler(config).await?;
    display_draws(reconciler.history().latest(last));
    println!("{} tirages dans l'historique.", reconciler.history().len());

    if !sync {
        return Ok(());
    }

    let synchronizer = Arc::new(build_synchronizer(config, reconciler)?);
    let task = tokio::spawn({
        let synchronizer = Arc::clone(&synchronizer);
        async move { synchronizer.sync().await }
    });

    let pb = spinner("Synchronisation en cours...");
    let outcome = task.await?;
    pb.finish_and_clear();

    if report_sync(outcome) {
        display_draws(synchronizer.history().await.latest(last));
    }
    Ok(())
}

async fn cmd_sync(config: &AppConfig) -> Result<()> {
    let reconciler = load_reconciler(config).await?;
    println!("Historique actuel : {} tirages.", reconciler.history().len());

    let synchronizer = build_synchronizer(config, reconciler)?;
    println!("{} tentatives possibles (relais × limites).", synchronizer.plan().len());

    let pb = spinner("Synchronisation en cours...");
    let outcome = synchronizer.sync().await;
    pb.finish_and_clear();

    report_sync(outcome);
    Ok(())
}

/// Affiche le résultat d'une synchronisation ; `true` si l'historique a changé.
/// Un échec est journalisé et l'historique existant est conservé.
fn report_sync(outcome: Result<SyncOutcome, SyncError>) -> bool {
    match outcome {
        Ok(SyncOutcome::Merged { summary, attempts }) => {
            display_attempts(&attempts);
            display_merge_summary(&summary);
            true
        }
        Ok(SyncOutcome::AlreadyRunning) => {
            println!("Synchronisation déjà en cours.");
            false
        }
        Err(e) => {
            if let SyncError::Exhausted { attempts, .. } = &e {
                display_attempts(attempts);
            }
            error!("Échec de la synchronisation : {e}");
            println!("Synchronisation impossible, historique existant conservé.");
            false
        }
    }
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn cmd_stats(config: &AppConfig, window: usize) -> Result<()> {
    let reconciler = load_reconciler(config).await?;
    let draws = reconciler.history().latest(window);

    let front_stats = compute_stats(draws, Pool::Front);
    let back_stats = compute_stats(draws, Pool::Back);
    display_stats(&front_stats, &back_stats, draws.len());
    Ok(())
}

fn parse_grid(numbers: &[u8]) -> Result<([u8; 5], [u8; 2])> {
    if numbers.len() != 7 {
        bail!("Attendu 7 nombres : 5 avant + 2 arrière. Reçu : {}", numbers.len());
    }
    let mut front = [numbers[0], numbers[1], numbers[2], numbers[3], numbers[4]];
    let mut back = [numbers[5], numbers[6]];
    validate_draw(&front, &back)?;
    front.sort();
    back.sort();
    Ok((front, back))
}

async fn cmd_backtest(config: &AppConfig, numbers: &[u8]) -> Result<()> {
    let (front, back) = parse_grid(numbers)?;
    let reconciler = load_reconciler(config).await?;
    let history = reconciler.history();

    let results = backtest(&front, &back, history);
    display_backtest(&front, &back, &results, history.len());
    Ok(())
}

async fn cmd_trend(config: &AppConfig) -> Result<()> {
    let reconciler = load_reconciler(config).await?;
    let history = reconciler.history();

    let predicted = predict_sum_with(history, &config.trend);
    let window = sum_window(predicted, config.trend.tolerance);
    display_trend(predicted, window, config.trend.window.min(history.len()));
    Ok(())
}

async fn cmd_suggest(config: &AppConfig, count: usize, seed: Option<u64>) -> Result<()> {
    let reconciler = load_reconciler(config).await?;
    let history = reconciler.history();

    let predicted = predict_sum_with(history, &config.trend);
    let window = sum_window(predicted, config.trend.tolerance);
    display_trend(predicted, window, config.trend.window.min(history.len()));

    let scored: Vec<_> = generate_suggestions(count, window, seed)
        .into_iter()
        .map(|s| {
            let results = backtest(&s.front, &s.back, history);
            (s, results)
        })
        .collect();
    display_suggestions(&scored);
    Ok(())
}

async fn cmd_advise(config: &AppConfig) -> Result<()> {
    let reconciler = load_reconciler(config).await?;
    let history: &[DrawRecord] = reconciler.history();

    let predicted = predict_sum_with(history, &config.trend);
    let window = sum_window(predicted, config.trend.tolerance);
    display_trend(predicted, window, config.trend.window.min(history.len()));

    let client = DeepSeekClient::from_env()?;
    let pb = spinner("Analyse en cours...");
    let analysis = analyze_or_default(&client, history, predicted).await;
    pb.finish_and_clear();
    display_analysis(&analysis);

    match analysis.split() {
        Some((front, back)) => {
            let results = backtest(&front, &back, history);
            display_backtest(&front, &back, &results, history.len());
        }
        None => println!("Recommandation incomplète, pas de calcul des gains historiques."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_needs_one_source() {
        assert!(Cli::try_parse_from(["daletou", "import"]).is_err());
        assert!(Cli::try_parse_from(["daletou", "import", "--file", "a.csv", "--text", "b.txt"]).is_err());

        let cli = Cli::try_parse_from(["daletou", "import", "--text", "b.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Import { file: None, text: Some(_) }));
    }

    #[test]
    fn test_parse_grid_sorts() {
        let (front, back) = parse_grid(&[30, 2, 9, 17, 22, 11, 4]).unwrap();
        assert_eq!(front, [2, 9, 17, 22, 30]);
        assert_eq!(back, [4, 11]);
    }

    #[test]
    fn test_parse_grid_rejects() {
        assert!(parse_grid(&[1, 2, 3, 4, 5, 6]).is_err());
        assert!(parse_grid(&[1, 2, 3, 4, 36, 1, 2]).is_err());
        assert!(parse_grid(&[1, 2, 3, 4, 5, 7, 7]).is_err());
    }
}
