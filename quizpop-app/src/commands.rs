use anyhow::{Context as _, bail};

use quizpop_core::badges::BadgeId;
use quizpop_core::quiz::QuizResult;
use quizpop_utils::parse::parse_badge_ids;

pub const HELP: &str = "\
commands:
  status                          profile, lives and challenge
  answer <y|n>                    answer one question
  finish <category> <ok> <total>  finish a quiz
  buy                             buy a full refill
  mercy                           claim the last-chance life
  regen                           check life regeneration now
  badges                          badge catalog and showcase
  select|unselect|toggle <id>     edit the showcase
  showcase <id,id,id>             replace the showcase
  rename <name> <avatar>          change name and avatar
  ranks / rank <id>               list or pick a rank
  reset                           reset all progress
  refresh                         reload catalogs
  sync                            wait for pending writes
  quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Answer { correct: bool },
    Finish(QuizResult),
    BuyRefill,
    Mercy,
    Regen,
    Badges,
    Select(BadgeId),
    Unselect(BadgeId),
    Toggle(BadgeId),
    Showcase(Vec<BadgeId>),
    Rename { name: String, avatar: String },
    Ranks,
    Rank(String),
    Reset,
    Refresh,
    Sync,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(name) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => Command::Help,
        ("status" | "s", []) => Command::Status,
        ("answer" | "a", [reply]) => Command::Answer {
            correct: parse_reply(reply)?,
        },
        ("finish", [category, correct, total]) => Command::Finish(QuizResult {
            category: (*category).to_string(),
            correct_answers: correct.parse().context("correct answers must be a number")?,
            total_questions: total.parse().context("total questions must be a number")?,
        }),
        ("buy", []) => Command::BuyRefill,
        ("mercy", []) => Command::Mercy,
        ("regen", []) => Command::Regen,
        ("badges", []) => Command::Badges,
        ("select", [id]) => Command::Select(parse_badge_id(id)?),
        ("unselect", [id]) => Command::Unselect(parse_badge_id(id)?),
        ("toggle", [id]) => Command::Toggle(parse_badge_id(id)?),
        ("showcase", ids) => {
            Command::Showcase(parse_badge_ids(&ids.join(" ")).context("badge ids must be numbers")?)
        }
        ("rename", [name, avatar]) => Command::Rename {
            name: (*name).to_string(),
            avatar: (*avatar).to_string(),
        },
        ("ranks", []) => Command::Ranks,
        ("rank", [id]) => Command::Rank((*id).to_string()),
        ("reset", []) => Command::Reset,
        ("refresh", []) => Command::Refresh,
        ("sync", []) => Command::Sync,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (other, _) => bail!("unknown command or arguments: `{other}` (try `help`)"),
    };

    Ok(Some(command))
}

fn parse_reply(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "y" | "yes" | "right" | "1" => Ok(true),
        "n" | "no" | "wrong" | "0" => Ok(false),
        _ => bail!("answer with `y` or `n`"),
    }
}

fn parse_badge_id(raw: &str) -> anyhow::Result<BadgeId> {
    raw.parse()
        .with_context(|| format!("`{raw}` is not a badge id"))
}
