use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use ersc_core::{
    BackupPolicy, CopyOptions, CopySession, SlotRole, SlotSummary, append_error_log,
    list_slots, owner_id, read_container, transplant, verify_container,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "ersc",
    about = "Copy Elden Ring characters between save files (ER0000.sl2 / ER0000.co2)",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show the owner id and the ten slots of a save file
    List(ListArgs),
    /// Copy a character from one save file into a slot of another
    Copy(CopyArgs),
    /// Check the stored checksums of a save file
    Verify(VerifyArgs),
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Save file to inspect
    path: PathBuf,
    /// Print JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct CopyArgs {
    /// Save file to copy the character from
    source: PathBuf,
    /// Source slot, 1-10
    #[arg(value_parser = clap::value_parser!(u8).range(1..=10))]
    source_slot: u8,
    /// Save file to copy the character into (overwritten, after a backup)
    target: PathBuf,
    /// Target slot, 1-10
    #[arg(value_parser = clap::value_parser!(u8).range(1..=10))]
    target_slot: u8,
    /// Do everything in memory and verify the result, but write nothing
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Backups to keep next to the target file (0 keeps all)
    #[arg(long, env = "ERSC_BACKUP_KEEP", default_value_t = 10)]
    backup_keep: usize,
    /// Leave the game's own ER0000.sl2.bak in place
    #[arg(long, default_value_t = false)]
    keep_game_bak: bool,
}

#[derive(ClapArgs, Debug)]
struct VerifyArgs {
    /// Save file to check
    path: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ersc=info,ersc_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::List(a) => cmd_list(a),
        Cmd::Copy(a) => cmd_copy(a),
        Cmd::Verify(a) => cmd_verify(a),
    }
}

fn cmd_list(args: ListArgs) -> Result<()> {
    let bytes = read_container(&args.path)?;
    let owner = owner_id(&bytes)?;
    let slots = list_slots(&bytes, SlotRole::Target)
        .with_context(|| format!("reading slots of {}", args.path.display()))?;
    if args.json {
        let list: Vec<serde_json::Value> = slots.iter().map(slot_json).collect();
        let out = serde_json::json!({
            "path": args.path.display().to_string(),
            "owner_id": hex::encode(owner),
            "slots": list,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    println!("{}", args.path.display());
    println!("owner id: {}", hex::encode(owner));
    for s in &slots {
        if s.active {
            println!(
                "{:>2}  {:<16}  lvl {:>3}  {}",
                s.index + 1,
                s.name,
                s.level,
                s.play_time()
            );
        } else {
            println!("{:>2}  (empty)", s.index + 1);
        }
    }
    Ok(())
}

fn slot_json(s: &SlotSummary) -> serde_json::Value {
    serde_json::json!({
        "slot": s.index + 1,
        "active": s.active,
        "name": s.name,
        "level": s.level,
        "seconds_played": s.seconds_played,
    })
}

fn cmd_copy(args: CopyArgs) -> Result<()> {
    let res = run_copy(&args);
    // Mirror the failure next to the target, where users look for it.
    if let Err(e) = &res
        && let Some(dir) = args.target.parent().filter(|d| d.is_dir())
        && let Err(log_err) = append_error_log(dir, "Copy failed", Some(&format!("{e:#}")))
    {
        tracing::warn!(error = %log_err, "could not write error.log");
    }
    res
}

fn run_copy(args: &CopyArgs) -> Result<()> {
    let (src_index, dst_index) = (args.source_slot as usize - 1, args.target_slot as usize - 1);
    let mut session = CopySession::new();
    session
        .load_source(&args.source)
        .with_context(|| format!("loading source {}", args.source.display()))?;
    session
        .load_target(&args.target)
        .with_context(|| format!("loading target {}", args.target.display()))?;
    session.select_source(src_index);
    session.select_target(dst_index);
    if session.selected_source().is_none() {
        bail!("source slot {} holds no character", args.source_slot);
    }
    if !session.can_copy() {
        bail!("source and target must be different files");
    }
    println!("{}", session.copy_label());

    if args.dry_run {
        return dry_run(&session, src_index, dst_index);
    }
    let options = CopyOptions {
        backup: BackupPolicy { keep: args.backup_keep },
        remove_game_backup: !args.keep_game_bak,
    };
    let outcome = session.copy(options)?;
    println!("backup: {}", outcome.backup.display());
    println!(
        "copied {} into slot {} of {}",
        outcome.character,
        outcome.target_slot + 1,
        outcome.target_path.display()
    );
    if !args.keep_game_bak && !outcome.removed_game_backup {
        println!("note: no ER0000.sl2.bak found next to the target");
    }
    Ok(())
}

fn dry_run(session: &CopySession, src_index: usize, dst_index: usize) -> Result<()> {
    let (Some(src), Some(dst)) = (&session.source, &session.target) else {
        bail!("nothing loaded");
    };
    let out = transplant(
        &src.bytes,
        src_index,
        &dst.bytes,
        dst_index,
        &src.owner_id()?,
        &dst.owner_id()?,
    )?;
    let report = verify_container(&out)?;
    if !report.is_ok() {
        bail!("dry run produced invalid checksums: {report:?}");
    }
    println!("dry run ok, nothing written");
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> Result<()> {
    let ok = verify_file(&args.path)?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn verify_file(path: &Path) -> Result<bool> {
    let bytes = read_container(path)?;
    let report = verify_container(&bytes)?;
    println!(
        "headers checksum: {}",
        if report.headers_ok { "ok" } else { "MISMATCH" }
    );
    for i in &report.bad_slots {
        println!("slot {} checksum: MISMATCH", i + 1);
    }
    if report.is_ok() {
        println!("all checksums ok");
    }
    Ok(report.is_ok())
}
