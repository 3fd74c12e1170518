//! Subcommand handlers.

use crate::cli::{Command, PriorityCommand, SlotArgs, TriageArgs, ViewArg};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike, Utc};
use executeos_core::assist::{
    parse_suggestions, AssistError, TriageAssistant, TriageRequest, TriageSuggestion,
};
use executeos_core::service::duration_service::{format_minutes, parse_custom_minutes};
use executeos_core::service::execution_service::{format_remaining, remaining};
use executeos_core::service::plan_service::{
    blocks_on_day, drop_start, visible_days, GridGeometry, ViewType,
};
use executeos_core::service::strategy_service::{partition_pinned, RankDirection};
use executeos_core::service::triage_service::{TriageEffect, TriageTarget};
use executeos_core::{
    CalendarBlock, CollectionRepository, CoreConfig, StrategicPriority, WorkflowError, Workspace,
};
use eyre::{eyre, Result, WrapErr};
use log::info;
use std::path::PathBuf;
use uuid::Uuid;

/// Reads a previously saved assistant response instead of calling a model.
struct ResponseFileAssistant {
    path: PathBuf,
}

impl TriageAssistant for ResponseFileAssistant {
    fn suggest(&self, _request: &TriageRequest) -> Result<Vec<TriageSuggestion>, AssistError> {
        let text = std::fs::read_to_string(&self.path).map_err(|err| {
            AssistError::Unavailable(format!("{}: {err}", self.path.display()))
        })?;
        parse_suggestions(&text)
    }
}

pub fn run<R: CollectionRepository>(
    command: Command,
    mut ws: Workspace<R>,
    config: &CoreConfig,
) -> Result<()> {
    let now = Utc::now();
    let geometry = config.geometry();
    match command {
        Command::Priorities(command) => priorities(&mut ws, command)?,
        Command::Dump { text } => {
            let text = match text {
                Some(text) => text,
                None => std::io::read_to_string(std::io::stdin()).wrap_err("failed to read stdin")?,
            };
            let ids = ws.capture_dump(&text, now)?;
            println!("Captured {} item(s).", ids.len());
        }
        Command::Inbox => {
            let inbox = ws.inbox();
            if inbox.is_empty() {
                println!("Inbox is empty.");
            }
            for item in inbox {
                println!("{}  {}", short(item.id), item.raw_text);
            }
        }
        Command::Triage(args) => triage(&mut ws, args)?,
        Command::Assist { response } => {
            let outcome = ws.assist_triage(&ResponseFileAssistant { path: response })?;
            println!(
                "Applied {} suggestion(s); {} used the fallback priority.",
                outcome.planned.len(),
                outcome.fallback_count()
            );
            if !outcome.unmatched_items.is_empty() {
                println!(
                    "{} item(s) left in the inbox: no priority to file them under.",
                    outcome.unmatched_items.len()
                );
            }
            for raw in &outcome.unclaimed {
                println!("No inbox item matched suggestion `{raw}`.");
            }
        }
        Command::Duration {
            commitment,
            minutes,
        } => {
            let id = resolve_id("commitment", &commitment, ws.commitments().iter().map(|c| c.id))?;
            let minutes = parse_custom_minutes(&minutes)
                .ok_or_else(|| eyre!("duration must be a positive whole number of minutes"))?;
            ws.set_duration(id, minutes)?;
            println!("Set {} to {}.", short(id), format_minutes(minutes));
        }
        Command::Durations => {
            for c in ws.commitments() {
                println!("{}  {:>7}  {}", short(c.id), format_minutes(c.duration_minutes), c.title);
            }
            match ws.finish_durations() {
                Ok(()) => println!("Ready to plan."),
                Err(WorkflowError::DurationsMissing(ids)) => {
                    println!("{} commitment(s) still need a duration.", ids.len())
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Schedule { commitment, slot } => {
            let id = resolve_id("commitment", &commitment, ws.commitments().iter().map(|c| c.id))?;
            let start = slot_start(&slot, &geometry)?;
            let block_id = ws.schedule_commitment(id, start, now, None)?;
            println!("Scheduled block {} at {}.", short(block_id), local_time(start));
        }
        Command::Move { block, slot } => {
            let id = resolve_id("block", &block, ws.blocks().iter().map(|b| b.id))?;
            let start = slot_start(&slot, &geometry)?;
            ws.move_block(id, start, now, None)?;
            println!("Moved block {} to {}.", short(id), local_time(start));
        }
        Command::Unschedule { block, yes } => {
            let id = resolve_id("block", &block, ws.blocks().iter().map(|b| b.id))?;
            ws.delete_block(id, yes)?;
            println!("Removed block {}.", short(id));
        }
        Command::Agenda { view, date } => {
            let anchor = match date {
                Some(date) => parse_date(&date)?,
                None => Local::now().date_naive(),
            };
            agenda(&ws, view_type(view), anchor);
        }
        Command::Review => review(&ws),
        Command::Finalize => {
            let session = ws.finalize_session(now)?;
            println!(
                "Saved session {} with alignment {:.0}%.",
                short(session.id),
                session.alignment_score
            );
        }
        Command::Sessions => {
            for session in ws.sessions()? {
                println!(
                    "{}  {}  {:>3.0}%  {} block(s)",
                    short(session.id),
                    session.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    session.alignment_score,
                    session.blocks.len()
                );
            }
        }
        Command::Now => now_view(&ws, now),
        Command::Complete { block } => {
            let id = resolve_id("block", &block, ws.blocks().iter().map(|b| b.id))?;
            ws.complete_block(id, now)?;
            println!("Completed block {}. Progress {:.0}%.", short(id), ws.progress_percent());
        }
    }
    info!("event=cli_command module=cli status=ok");
    Ok(())
}

fn priorities<R: CollectionRepository>(
    ws: &mut Workspace<R>,
    command: PriorityCommand,
) -> Result<()> {
    let lookup = |ws: &Workspace<R>, input: &str| {
        resolve_id("priority", input, ws.priorities().iter().map(|p| p.id))
    };
    match command {
        PriorityCommand::List => {
            let (focus, backlog) = partition_pinned(ws.priorities());
            print_priorities("Active focus", &focus);
            print_priorities("Backlog", &backlog);
        }
        PriorityCommand::Add { name, description } => {
            let id = ws.add_priority(&name, description.as_deref())?;
            println!("Added priority {}.", short(id));
        }
        PriorityCommand::Edit {
            priority,
            name,
            description,
        } => {
            let id = lookup(ws, &priority)?;
            ws.edit_priority(id, &name, description.as_deref())?;
        }
        PriorityCommand::Remove { priority } => {
            let id = lookup(ws, &priority)?;
            let removed = ws.remove_priority(id)?;
            println!("Removed `{}`.", removed.name);
        }
        PriorityCommand::Pin { priority } => {
            let id = lookup(ws, &priority)?;
            ws.set_pinned(id, true)?;
        }
        PriorityCommand::Unpin { priority } => {
            let id = lookup(ws, &priority)?;
            ws.set_pinned(id, false)?;
        }
        PriorityCommand::Move { priority, index } => {
            let id = lookup(ws, &priority)?;
            ws.move_priority(id, index)?;
        }
        PriorityCommand::Up { priority } => {
            let id = lookup(ws, &priority)?;
            ws.step_priority(id, RankDirection::Up)?;
        }
        PriorityCommand::Down { priority } => {
            let id = lookup(ws, &priority)?;
            ws.step_priority(id, RankDirection::Down)?;
        }
        PriorityCommand::Seed => {
            let added = ws.seed_priorities()?;
            println!("Added {added} starter priorities.");
        }
    }
    Ok(())
}

fn print_priorities(heading: &str, priorities: &[&StrategicPriority]) {
    println!("{heading}:");
    if priorities.is_empty() {
        println!("  (none)");
    }
    for p in priorities {
        println!("  {}  {}  {}", short(p.id), p.name, p.description);
    }
}

fn triage<R: CollectionRepository>(ws: &mut Workspace<R>, args: TriageArgs) -> Result<()> {
    let item_id = resolve_id("item", &args.item, ws.items().iter().map(|i| i.id))?;
    let effect = if args.discard {
        ws.triage(item_id, TriageTarget::Discard)?
    } else if let Some(name) = args.new_priority {
        ws.triage_to_new_priority(item_id, &name)?.1
    } else if let Some(priority) = args.priority {
        let priority_id =
            resolve_id("priority", &priority, ws.priorities().iter().map(|p| p.id))?;
        ws.triage(item_id, TriageTarget::Priority(priority_id))?
    } else {
        return Err(eyre!("pass --priority, --new-priority or --discard"));
    };
    match effect {
        TriageEffect::Created(id) => println!("Created commitment {}.", short(id)),
        TriageEffect::Reassigned(id) => println!("Re-filed commitment {}.", short(id)),
        TriageEffect::Discarded {
            removed_commitments,
        } => println!("Discarded ({removed_commitments} commitment(s) removed)."),
    }
    Ok(())
}

fn agenda<R: CollectionRepository>(ws: &Workspace<R>, view: ViewType, anchor: NaiveDate) {
    for day in visible_days(view, anchor) {
        let blocks = blocks_on_day(ws.blocks(), &Local, day.date);
        if blocks.is_empty() && view != ViewType::Day {
            continue;
        }
        let marker = if day.in_anchor_month { "" } else { " *" };
        println!("{}{marker}", day.date.format("%a %Y-%m-%d"));
        for block in blocks {
            println!("  {}", describe_block(ws, block));
        }
    }
    let unscheduled = ws.unscheduled();
    if !unscheduled.is_empty() {
        println!("Unscheduled:");
        for c in unscheduled {
            println!("  {}  {:>7}  {}", short(c.id), format_minutes(c.duration_minutes), c.title);
        }
    }
}

fn review<R: CollectionRepository>(ws: &Workspace<R>) {
    let stats = ws.review_stats();
    println!("Captured:  {}", stats.captured);
    println!("Discarded: {}", stats.discarded);
    println!("Scheduled: {} block(s), {} min", stats.scheduled, stats.total_minutes);
    for entry in &stats.by_priority {
        let pin = if entry.is_pinned { "*" } else { " " };
        println!("  {pin} {:<16} {:>5} min", entry.name, entry.minutes);
    }
    println!("Alignment: {:.0}%", stats.alignment_score);

    let report = ws.integrity_report();
    if !report.is_clean() {
        println!(
            "Warnings: {} commitment(s) with a missing priority, {} commitment(s) scheduled twice, {} orphan block(s)",
            report.dangling_priority_refs.len(),
            report.duplicate_blocks.len(),
            report.orphan_blocks.len()
        );
    }
}

fn now_view<R: CollectionRepository>(ws: &Workspace<R>, now: DateTime<Utc>) {
    match ws.current_block(now) {
        Some(block) => println!(
            "Now: {}  ({} left)",
            describe_block(ws, block),
            format_remaining(remaining(block, now))
        ),
        None => println!("Nothing scheduled right now."),
    }
    if let Some(block) = ws.next_block(now) {
        println!("Next: {}", describe_block(ws, block));
    }
    println!("Progress: {:.0}%", ws.progress_percent());
}

fn describe_block<R: CollectionRepository>(ws: &Workspace<R>, block: &CalendarBlock) -> String {
    let title = ws
        .commitment(block.commitment_id)
        .map_or("(missing commitment)", |c| c.title.as_str());
    let status = if block.is_completed() { " [done]" } else { "" };
    format!(
        "{}  {}-{}  {}{status}",
        short(block.id),
        local_time(block.start),
        block.end.with_timezone(&Local).format("%H:%M"),
        title
    )
}

/// Start instant for a grid slot, snapping the minute down to the interval.
fn slot_start(slot: &SlotArgs, geometry: &GridGeometry) -> Result<DateTime<Utc>> {
    let date = parse_date(&slot.date)?;
    let time = NaiveTime::parse_from_str(slot.time.trim(), "%H:%M")
        .wrap_err_with(|| format!("invalid time `{}`, expected HH:MM", slot.time))?;
    let minute = geometry.interval.snap(time.minute());
    if minute != time.minute() {
        println!(
            "Snapped to {:02}:{minute:02} ({}-minute grid).",
            time.hour(),
            geometry.interval.minutes()
        );
    }
    Ok(drop_start(&Local, date, time.hour(), minute)?)
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .wrap_err_with(|| format!("invalid date `{value}`, expected YYYY-MM-DD"))
}

fn view_type(view: ViewArg) -> ViewType {
    match view {
        ViewArg::Day => ViewType::Day,
        ViewArg::Week => ViewType::Week,
        ViewArg::Month => ViewType::Month,
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%a %Y-%m-%d %H:%M").to_string()
}

fn short(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// Accepts a full id or a unique prefix.
fn resolve_id(kind: &str, input: &str, ids: impl IntoIterator<Item = Uuid>) -> Result<Uuid> {
    let needle = input.trim().to_ascii_lowercase();
    if let Ok(id) = Uuid::parse_str(&needle) {
        return Ok(id);
    }
    if needle.is_empty() {
        return Err(eyre!("{kind} id is empty"));
    }
    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(eyre!("no {kind} matches `{input}`")),
        _ => Err(eyre!(
            "`{input}` matches {} {kind}s; use a longer prefix",
            matches.len()
        )),
    }
}
