use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use quizpop_core::SelectionError;
use quizpop_core::badges::{self, Badge, BadgeId};
use quizpop_core::lives::{MAX_LIVES, MercyOutcome, RefillOutcome, RegenOutcome};
use quizpop_core::profile::AVATARS;
use quizpop_core::ranks::{self, RANKS};
use quizpop_progression::ProgressionService;
use quizpop_utils::formatting::{format_compact_duration, format_hearts, format_xp_bar};

use crate::commands::{Command, HELP, parse_command};

const NOT_SIGNED_IN: &str = "not signed in (set QUIZPOP_USER_ID)";
const XP_BAR_WIDTH: usize = 20;

/// Read commands from stdin until `quit` or end of input.
pub async fn run(service: &mut ProgressionService) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout.write_all(render_status(service).as_bytes()).await?;
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let reply = match parse_command(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(service, command).await,
            Ok(None) => String::new(),
            Err(err) => format!("{err:#}\n"),
        };

        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Apply one command and describe the outcome.
pub async fn execute(service: &mut ProgressionService, command: Command) -> String {
    debug!(?command, "console command");

    match command {
        Command::Help => format!("{HELP}\n"),
        Command::Status => render_status(service),
        Command::Answer { correct } => {
            if correct {
                return line(service.answer(true).map(|_| "correct!".to_string()));
            }
            line(service.answer(false).map(|lives| {
                format!("wrong answer, {} left", format_hearts(lives))
            }))
        }
        Command::Finish(result) => {
            if service.profile().is_some() && !service.can_play() {
                return "no lives left; buy a refill or wait for regeneration\n".to_string();
            }
            line(service.finish_quiz(&result).map(|summary| {
                let mut out = format!(
                    "+{} XP (x{} bonus)",
                    summary.earned_xp, summary.multiplier
                );
                if summary.levels_gained > 0 {
                    let _ = write!(out, ", level up x{}! lives refilled", summary.levels_gained);
                }
                if summary.perfect {
                    out.push_str(", perfect quiz");
                }
                if summary.clutch {
                    out.push_str(", clutch win!");
                }
                out
            }))
        }
        Command::BuyRefill => line(service.buy_refill().map(|outcome| match outcome {
            RefillOutcome::Refilled { price } => format!("lives refilled for {price} XP"),
            RefillOutcome::AlreadyFull => "lives are already full".to_string(),
            RefillOutcome::InsufficientXp { price, balance } => {
                format!("a refill costs {price} XP, you have {balance} XP")
            }
        })),
        Command::Mercy => line(service.claim_mercy_life().map(|outcome| match outcome {
            MercyOutcome::Granted => "one last chance: +1 life".to_string(),
            MercyOutcome::NotEligible => {
                "mercy is only for players with no lives and not enough XP".to_string()
            }
        })),
        Command::Regen => line(service.check_regeneration().map(|outcome| match outcome {
            RegenOutcome::Regenerated { added } => format!("+{added} lives regenerated"),
            RegenOutcome::ClockStarted => "regeneration clock started".to_string(),
            RegenOutcome::ClockCleared | RegenOutcome::Unchanged => {
                "no lives regenerated yet".to_string()
            }
        })),
        Command::Badges => render_badges(service).await,
        Command::Select(id) => {
            let catalog = service.badge_catalog().await;
            match find_badge(&catalog, id) {
                Some(badge) => line(service.select_badge(badge).map(describe_selection)),
                None => format!("no badge with id {id}\n"),
            }
        }
        Command::Unselect(id) => line(service.deselect_badge(id).map(|removed| {
            if removed {
                format!("badge {id} removed from the showcase")
            } else {
                format!("badge {id} was not showcased")
            }
        })),
        Command::Toggle(id) => {
            let catalog = service.badge_catalog().await;
            match find_badge(&catalog, id) {
                Some(badge) => line(service.toggle_badge(badge).map(describe_selection)),
                None => format!("no badge with id {id}\n"),
            }
        }
        Command::Showcase(ids) => {
            let catalog = service.badge_catalog().await;
            line(
                service
                    .save_badge_selection(&ids, &catalog)
                    .map(describe_selection),
            )
        }
        Command::Rename { name, avatar } => {
            line(service.update_profile(&name, &avatar).map(|result| match result {
                Ok(true) => format!("you are now {avatar} {}", name.trim()),
                Ok(false) => "nothing changed".to_string(),
                Err(err) => err.to_string(),
            }))
        }
        Command::Ranks => render_ranks(service),
        Command::Rank(id) => line(service.select_rank(&id).map(|result| match result {
            Ok(_) => format!("rank set to {}", ranks::rank_title(&id)),
            Err(err) => err.to_string(),
        })),
        Command::Reset => line(service.reset_progress().map(|()| "progress reset".to_string())),
        Command::Refresh => match service.refresh_catalogs().await {
            Ok(()) => "catalogs reloaded\n".to_string(),
            Err(err) => {
                warn!(?err, "catalog refresh failed");
                format!("catalog refresh failed: {err:#}\n")
            }
        },
        Command::Sync => {
            service.flush_writes().await;
            "pending writes attempted\n".to_string()
        }
        Command::Quit => String::new(),
    }
}

fn line(reply: Option<String>) -> String {
    format!("{}\n", reply.as_deref().unwrap_or(NOT_SIGNED_IN))
}

fn find_badge(catalog: &[Badge], id: BadgeId) -> Option<&Badge> {
    catalog.iter().find(|badge| badge.id == id)
}

fn describe_selection(result: Result<bool, SelectionError>) -> String {
    match result {
        Ok(true) => "showcase updated".to_string(),
        Ok(false) => "showcase unchanged".to_string(),
        Err(err) => err.to_string(),
    }
}

pub fn render_status(service: &ProgressionService) -> String {
    let Some(profile) = service.profile() else {
        return format!("{NOT_SIGNED_IN}\n");
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} [{}] level {}",
        profile.avatar,
        profile.name,
        ranks::rank_title(&profile.selected_rank),
        profile.level
    );
    let _ = writeln!(out, "xp    {}", format_xp_bar(profile.xp, XP_BAR_WIDTH));

    let _ = write!(out, "lives {}", format_hearts(profile.lives));
    match service.seconds_until_next_life() {
        Some(seconds) if profile.lives < MAX_LIVES => {
            let _ = writeln!(out, " next life in {}", format_compact_duration(seconds));
        }
        _ => out.push('\n'),
    }

    let _ = writeln!(
        out,
        "games {} played, {} perfect{}",
        profile.games_played,
        profile.perfect_games,
        if profile.has_clutch_win { ", clutch winner" } else { "" }
    );

    match service.active_challenge() {
        Some(challenge) => {
            let _ = writeln!(
                out,
                "today {}: {} (x{} XP in {})",
                challenge.title,
                challenge.description,
                challenge.bonus_multiplier,
                challenge.category
            );
        }
        None => out.push_str("today no daily challenge\n"),
    }

    if service.mercy_available() {
        out.push_str("out of lives and XP: `mercy` grants one last chance\n");
    }

    out
}

async fn render_badges(service: &ProgressionService) -> String {
    let Some(profile) = service.profile() else {
        return format!("{NOT_SIGNED_IN}\n");
    };
    let catalog = service.badge_catalog().await;
    if catalog.is_empty() {
        return "badge catalog unavailable\n".to_string();
    }

    let unlocked = badges::unlocked_badges(&catalog, &profile);
    let mut out = format!("{}/{} badges unlocked\n", unlocked.len(), catalog.len());
    for badge in &catalog {
        let marker = if profile.selected_badges.contains(&badge.id) {
            '*'
        } else if badges::is_unlocked(badge, &profile) {
            '+'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {:>3} {:<14} {} (level {})",
            badge.id, badge.name, badge.description, badge.required_level
        );
    }

    let showcase: Vec<&str> = badges::showcased_badges(&catalog, &profile)
        .into_iter()
        .map(|badge| badge.name.as_str())
        .collect();
    let _ = writeln!(out, "showcase: {}", showcase.join(", "));
    out
}

fn render_ranks(service: &ProgressionService) -> String {
    let level = service.profile().map_or(1, |profile| profile.level);

    let mut out = String::new();
    for rank in &RANKS {
        let state = if rank.unlock_level <= level { "open" } else { "locked" };
        let _ = writeln!(
            out,
            "{:<11} {:<12} level {:>2} {state}",
            rank.id, rank.title, rank.unlock_level
        );
    }
    let _ = writeln!(out, "avatars: {}", AVATARS.join(" "));
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quizpop_core::{EngineConfig, UserId};
    use quizpop_database::{GameStore, MemoryStore};
    use quizpop_progression::ProgressionService;

    use super::{NOT_SIGNED_IN, execute, render_status};
    use crate::commands::parse_command;

    async fn run(service: &mut ProgressionService, line: &str) -> String {
        let command = parse_command(line).unwrap().unwrap();
        execute(service, command).await
    }

    async fn signed_in(memory: &MemoryStore) -> ProgressionService {
        let mut service =
            ProgressionService::new(GameStore::memory(memory.clone()), EngineConfig::default())
                .with_clock(Arc::new(|| 1_700_000_000));
        service
            .sign_in(UserId::parse("console-user"))
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn idle_console_reports_missing_session() {
        let mut service = ProgressionService::new(
            GameStore::memory(MemoryStore::seeded()),
            EngineConfig::default(),
        );
        assert!(run(&mut service, "buy").await.starts_with(NOT_SIGNED_IN));
        assert!(render_status(&service).starts_with(NOT_SIGNED_IN));
    }

    #[tokio::test]
    async fn status_shows_lives_countdown_and_challenge() {
        let memory = MemoryStore::seeded();
        let mut service = signed_in(&memory).await;

        assert_eq!(run(&mut service, "answer n").await, "wrong answer, ♥♥♥♥♡ left\n");
        let status = run(&mut service, "status").await;
        assert!(status.contains("next life in 3h"));
        assert_eq!(status.matches("0/100").count(), 1);
        assert!(status.contains("JavaScript Day"));
        service.shutdown().await;
    }

    #[tokio::test]
    async fn finishing_a_bonus_quiz_reports_the_multiplier() {
        let memory = MemoryStore::seeded();
        let mut service = signed_in(&memory).await;

        let reply = run(&mut service, "finish js 2 2").await;
        assert_eq!(reply, "+100 XP (x2 bonus), level up x1! lives refilled, perfect quiz\n");

        let badges = run(&mut service, "badges").await;
        assert!(badges.starts_with("2/6 badges unlocked"));
        assert_eq!(run(&mut service, "select 6").await, "badge 6 is still locked\n");
        service.shutdown().await;
    }

    #[tokio::test]
    async fn empty_lives_block_quizzes() {
        let memory = MemoryStore::seeded();
        let mut service = signed_in(&memory).await;
        for _ in 0..5 {
            run(&mut service, "answer n").await;
        }

        assert!(run(&mut service, "finish js 1 1").await.starts_with("no lives left"));
        assert_eq!(run(&mut service, "mercy").await, "one last chance: +1 life\n");
        service.shutdown().await;
    }
}
