//! Membership portal CLI
//!
//! Maps the portal pages onto subcommands: `lookup` (entry page),
//! `register` / `show` (member page), `save` (submit), `card` (download).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use card_render::{CardRenderer, FontGlyphEngine, GlyphEngine, ImageLoader, NullGlyphEngine};
use member_portal::flow::{
    CardDownloader, CardVariant, DownloadArtifact, FlowContext, LookupOutcome, MedicalGate,
    MemberForm, NextPage, Notice, PhotoFile, REDIRECT_DELAY,
};
use member_portal::gateway::HttpGateway;
use member_portal::{Config, FlowError, MemberFlow, RecordCache, logger};

#[derive(Parser)]
#[command(name = "member-portal", version, about = "Membership registration and ID-card portal")]
struct Cli {
    /// Log level (trace|debug|info|warn|error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Log directory for daily-rolling files
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up a membership record by civil id and date of birth
    Lookup { civil_id: String, dob: String },

    /// Open the registration page for a brand-new member
    Register { civil_id: String },

    /// Show the member page for the cached record
    Show {
        /// Keep watching for status changes until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Validate and save a form (JSON file)
    Save {
        /// Form JSON path
        form: PathBuf,

        /// Register a new record with this civil id instead of updating
        #[arg(long, value_name = "CIVIL_ID")]
        new: Option<String>,

        /// Photo file to upload with the save
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Render and download the ID card for the cached record
    Card {
        /// Use the in-place direct download path
        #[arg(long)]
        direct: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logger::init(&cli.log_level, cli.log_dir.as_deref());

    let config = Config::from_env();
    let gateway = Arc::new(HttpGateway::new(&config)?);
    let cache = RecordCache::new(&config.data_dir);
    let flow = MemberFlow::new(gateway, cache.clone());

    match cli.command {
        Command::Lookup { civil_id, dob } => lookup(&flow, &civil_id, &dob).await,
        Command::Register { civil_id } => register(&flow, &civil_id).await,
        Command::Show { watch } => show(&flow, watch).await,
        Command::Save { form, new, photo } => save(&flow, &form, new, photo).await,
        Command::Card { direct } => card(&config, cache, direct).await,
    }
}

fn notify(notice: &Notice) {
    if notice.blocking {
        println!("[!] {}", notice.message);
    } else {
        println!("{}", notice.message);
    }
}

async fn lookup(flow: &MemberFlow, civil_id: &str, dob: &str) -> anyhow::Result<()> {
    match flow.lookup(civil_id, dob).await? {
        LookupOutcome::Found { .. } => {
            println!("Member found; record cached. Continue with `show` or `card`.");
        }
        LookupOutcome::NotFound { notice } => notify(&notice),
    }
    Ok(())
}

async fn register(flow: &MemberFlow, civil_id: &str) -> anyhow::Result<()> {
    let mut ctx = FlowContext::new_record(civil_id);
    let page = flow.load(&mut ctx).await?;

    println!("New member registration (civil id {civil_id})");
    print_page_summary(&page.form, false, &page.medical_gate);
    println!(
        "{} districts, {} areas available",
        page.districts.len(),
        page.areas.len()
    );
    Ok(())
}

async fn show(flow: &MemberFlow, watch: bool) -> anyhow::Result<()> {
    let mut ctx = FlowContext::existing();
    let page = match flow.load(&mut ctx).await {
        Ok(page) => page,
        Err(FlowError::MissingRecord) => {
            notify(&Notice::alert("Member data not found."));
            println!("Returning to the lookup page.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    print_page_summary(&page.form, ctx.read_only, &page.medical_gate);
    if let Some(name) = shared::models::resolve_name(&page.districts, page.form.district_id) {
        println!("  district: {name}");
    }
    if let Some(name) = shared::models::resolve_name(&page.areas, page.form.area_id) {
        println!("  area: {name}");
    }
    if page.download_available {
        println!("Card download is available (`card --direct`).");
    }

    if watch {
        let civil_id = page.form.civil_id.clone();
        let dob = page.form.dob.clone();
        println!("Watching for status changes (ctrl-c to stop)...");
        let mut feed = flow.subscribe(&civil_id, &dob).await?;
        while let Some(change) = feed.recv().await {
            let outcome = flow.on_change(&civil_id, &dob, &change).await?;
            notify(&outcome.notice);
            // Re-enter the lifecycle from Loading with the fresh record.
            let mut ctx = FlowContext::existing();
            let page = flow.load(&mut ctx).await?;
            print_page_summary(&page.form, ctx.read_only, &page.medical_gate);
        }
    }
    Ok(())
}

async fn save(
    flow: &MemberFlow,
    form_path: &PathBuf,
    new: Option<String>,
    photo: Option<PathBuf>,
) -> anyhow::Result<()> {
    let form_json = std::fs::read_to_string(form_path)
        .with_context(|| format!("reading form {}", form_path.display()))?;
    let form: MemberForm = serde_json::from_str(&form_json).context("parsing form JSON")?;

    let mut ctx = match new {
        Some(civil_id) => FlowContext::new_record(civil_id),
        None => FlowContext::existing(),
    };
    if !ctx.mode.is_new() {
        // Populate photo URL and creation time from the cached record.
        match flow.load(&mut ctx).await {
            Ok(_) => {}
            Err(FlowError::MissingRecord) => {
                notify(&Notice::alert("Member data not found."));
                println!("Returning to the lookup page.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    if let Some(path) = photo {
        let bytes =
            std::fs::read(&path).with_context(|| format!("reading photo {}", path.display()))?;
        ctx.selected_photo = Some(PhotoFile {
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            bytes,
        });
    }

    match flow.save(&mut ctx, &form).await {
        Ok(outcome) => {
            notify(&outcome.notice);
            if outcome.next == NextPage::Landing {
                println!("Returning to the lookup page.");
            }
        }
        Err(FlowError::Validation(message)) => notify(&Notice::alert(message)),
        Err(e @ (FlowError::Gateway(_) | FlowError::Cache(_))) => {
            tracing::error!(error = %e, "save failed");
            notify(&Notice::alert("Save error."));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn card(config: &Config, cache: RecordCache, direct: bool) -> anyhow::Result<()> {
    let engine: Box<dyn GlyphEngine + Send + Sync> = match FontGlyphEngine::from_file(&config.card_font)
    {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            tracing::warn!(error = %e, "card font unavailable, rendering without text");
            Box::new(NullGlyphEngine)
        }
    };

    let downloader = CardDownloader::new(
        cache,
        CardRenderer::new(ImageLoader::new(), engine),
        config.card_theme(),
        config.download_dir.clone(),
    );

    let variant = if direct { CardVariant::Direct } else { CardVariant::Full };
    match downloader.download(variant).await {
        Ok(outcome) => {
            match &outcome.artifact {
                DownloadArtifact::File(path) => println!("Saved {}", path.display()),
                DownloadArtifact::DataUrl(url) => {
                    println!("Download fallback (data URL, {} bytes)", url.len());
                }
            }
            notify(&outcome.notice);
            tokio::time::sleep(REDIRECT_DELAY).await;
            println!("Returning to the lookup page.");
        }
        Err(FlowError::MissingRecord) => {
            notify(&Notice::alert("Member data not found."));
            println!("Returning to the lookup page.");
        }
        Err(e) => {
            notify(&Notice::alert(format!("Failed to generate card: {e}")));
        }
    }
    Ok(())
}

fn print_page_summary(form: &MemberForm, read_only: bool, gate: &MedicalGate) {
    println!(
        "{} {} (civil id {}, dob {})",
        form.name,
        if read_only { "[read-only]" } else { "[editable]" },
        form.civil_id,
        form.dob
    );
    println!(
        "  mobile {} | blood {} | medical {}",
        form.mobile_number,
        form.blood_group,
        if form.medical { "yes" } else { "no" }
    );
    match gate {
        MedicalGate::Enabled => println!("  medical enrollment: available"),
        MedicalGate::Blocked { message } => println!("  medical enrollment: {message}"),
    }
}
