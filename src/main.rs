// src/main.rs

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use swing_coach::batch::{self, SwingFiles};
use swing_coach::pipeline::{AnalysisMetrics, SwingAnalyzer};
use swing_coach::reference::{FileReferenceRepository, ReferenceLibrary};
use swing_coach::store::{AnalysisStore, JsonDirStore};
use swing_coach::types::Config;
use swing_coach::AnalysisError;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config_found = Path::new(&config_path).is_file();
    let config = if config_found {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏌️ Swing Coach starting");
    if config_found {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        warn!("{} not found, using defaults", config_path);
    }

    let repository = FileReferenceRepository::new(&config.reference.dir);
    let library = ReferenceLibrary::preload(&repository, &config.reference.swing_types)
        .with_context(|| format!("loading reference data from {}", config.reference.dir))?;
    info!("✓ Reference data ready for {:?}", library.swing_types());

    let swings = batch::find_swings(Path::new(&config.io.input_dir))?;
    if swings.is_empty() {
        error!("No landmark files found in {}", config.io.input_dir);
        return Ok(());
    }

    let store: Arc<dyn AnalysisStore> = Arc::new(JsonDirStore::open(&config.io.output_dir)?);
    let metrics = AnalysisMetrics::new();
    let analyzer = Arc::new(
        SwingAnalyzer::new(config.clone(), Arc::new(library)).with_metrics(metrics.clone()),
    );
    let permits = Arc::new(Semaphore::new(config.io.max_parallel.max(1)));

    info!(
        "Analyzing {} swing(s), {} at a time",
        swings.len(),
        config.io.max_parallel.max(1)
    );

    let mut handles = Vec::with_capacity(swings.len());
    for swing in swings {
        let permit = permits.clone().acquire_owned().await?;
        let analyzer = analyzer.clone();
        let store = store.clone();
        let swing_type = config.io.default_swing_type.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let name = swing.name.clone();
            (name, process_swing(&swing, &swing_type, &analyzer, store.as_ref()))
        }));
    }

    for handle in handles {
        let (name, outcome) = handle.await?;
        match outcome {
            Ok(score) => info!("✓ {}: similarity {}", name, score),
            Err(e) => match e.downcast_ref::<AnalysisError>() {
                Some(analysis) => error!("✗ {} [{}]: {}", name, analysis.code(), analysis),
                None => error!("✗ {}: {:#}", name, e),
            },
        }
    }

    let summary = metrics.summary();
    info!("\n========================================");
    info!("Batch complete");
    info!("  Analyses: {}", summary.analyses_started);
    info!("  ✅ Completed: {}", summary.analyses_completed);
    info!("  ❌ Failed: {}", summary.analyses_failed);
    info!("  ⚠️  Missing phases: {}", summary.incomplete_phases);
    info!("  Average similarity: {:.1}", summary.avg_similarity);
    info!("========================================");
    info!("{}", serde_json::to_string(&summary)?);

    Ok(())
}

fn process_swing(
    swing: &SwingFiles,
    swing_type: &str,
    analyzer: &SwingAnalyzer,
    store: &dyn AnalysisStore,
) -> Result<u8> {
    let input = swing.load(swing_type)?;
    let report = analyzer.analyze(&input)?;
    for warning in &report.warnings {
        warn!("⚠️  {}: {}", swing.name, warning);
    }
    store.put(&swing.name, &report)?;
    Ok(report.similarity_score)
}
