//! Maps command words onto the tracker. Owns no state of its own; the
//! start/stop behavior is an explicit state machine over "is something
//! running" x "was an activity named".

use std::io::Write;

use anyhow::Result;

use crate::{
    error::TrackError,
    tracker::{ActivityTracker, session::ActiveSession},
};

use super::output::{format_activity, format_category_summary, format_duration, format_query_row};

pub const HELP_TEXT: &str = "Usage: whatidid [command] [args]

Commands:
  <activity>           Start tracking an activity
  (no arguments)       Stop current activity or prompt to start one
  tell <query>         Query your activity history in natural language
  category <command>   Manage activity categories
  help                 Show this help message

Examples:
  whatidid working on python project
  whatidid tell me how long I coded today
  whatidid tell me what I did yesterday
  whatidid category list

For more details on a command, use: whatidid <command> help
";

pub const CATEGORY_HELP_TEXT: &str = "Usage: whatidid category <command> [args]

Commands:
  list                List all categories with usage counts
  rename <old> <new>  Rename a category
  merge <from> <into> Merge one category into another
  show <name>         List activities in a category
  help                Show this help message

Examples:
  whatidid category list
  whatidid category rename \"Coding\" \"Programming\"
  whatidid category merge \"Dev\" \"Programming\"
  whatidid category show \"Programming\"
";

/// What the command words ask for, before any state is consulted.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Help,
    /// No words at all: stop-or-prompt.
    Bare,
    Tell(String),
    /// `tell` without a question.
    TellUsage,
    Category(CategoryCommand),
    /// Free text naming an activity to start.
    Start(String),
}

#[derive(Debug, PartialEq)]
pub enum CategoryCommand {
    Help,
    List,
    Rename { old: String, new: String },
    Merge { from: String, into: String },
    Show { name: String },
}

pub fn classify(words: &[String]) -> Invocation {
    if words.is_empty() {
        return Invocation::Bare;
    }
    if words.len() == 1 && words[0].eq_ignore_ascii_case("help") {
        return Invocation::Help;
    }
    if words[0].eq_ignore_ascii_case("tell") {
        if words.len() < 2 {
            return Invocation::TellUsage;
        }
        return Invocation::Tell(words[1..].join(" "));
    }
    if words[0].eq_ignore_ascii_case("category") {
        return Invocation::Category(classify_category(&words[1..]));
    }
    Invocation::Start(words.join(" "))
}

fn classify_category(words: &[String]) -> CategoryCommand {
    let command = words.first().map(|word| word.to_lowercase());
    match (command.as_deref(), words.len()) {
        (Some("list"), 1) => CategoryCommand::List,
        (Some("rename"), 3) => CategoryCommand::Rename {
            old: words[1].clone(),
            new: words[2].clone(),
        },
        (Some("merge"), 3) => CategoryCommand::Merge {
            from: words[1].clone(),
            into: words[2].clone(),
        },
        (Some("show"), 2) => CategoryCommand::Show {
            name: words[1].clone(),
        },
        // `category`, `category help`, and every wrong arity print usage.
        _ => CategoryCommand::Help,
    }
}

/// The start/stop state machine: presence of a running session crossed with
/// whether the user named an activity.
#[derive(Debug, PartialEq)]
pub enum Action {
    /// No session, no name: ask what to start.
    PromptForName,
    /// Session running, no name: stop it.
    StopCurrent,
    /// No session, name given: start directly.
    Start(String),
    /// Session running, name given: ask before switching.
    ConfirmSwitch { current: String, next: String },
}

pub fn plan(named: Option<String>, current: Option<&ActiveSession>) -> Action {
    match (named, current) {
        (None, None) => Action::PromptForName,
        (None, Some(_)) => Action::StopCurrent,
        (Some(name), None) => Action::Start(name),
        (Some(name), Some(session)) => Action::ConfirmSwitch {
            current: session.name.clone(),
            next: name,
        },
    }
}

pub async fn process(tracker: &mut ActivityTracker, words: &[String]) -> Result<()> {
    match classify(words) {
        Invocation::Help => print!("{HELP_TEXT}"),
        Invocation::Bare => run_tracking(tracker, None).await?,
        Invocation::Start(name) => run_tracking(tracker, Some(name)).await?,
        Invocation::Tell(question) => run_tell(tracker, &question).await?,
        Invocation::TellUsage => {
            println!("Please specify what you want to know. For example:");
            println!("  whatidid tell me how long I coded today");
            println!("  whatidid tell me my activities from yesterday");
        }
        Invocation::Category(command) => run_category(tracker, command)?,
    }
    Ok(())
}

async fn run_tracking(tracker: &mut ActivityTracker, named: Option<String>) -> Result<()> {
    let current = tracker.current();
    match plan(named, current.as_ref()) {
        Action::PromptForName => {
            let activity = prompt_line("What activity would you like to start?: ")?;
            if !activity.is_empty() {
                tracker.start(&activity)?;
                println!("Started tracking: {activity}");
            }
        }
        Action::StopCurrent => {
            if let Some(stopped) = tracker.stop().await? {
                println!("Stopped tracking: {}", stopped.name);
                println!("Duration: {}", format_duration(stopped.duration_secs));
                println!("Category: {}", stopped.category);
            }
        }
        Action::Start(name) => {
            tracker.start(&name)?;
            println!("Started tracking: {name}");
        }
        Action::ConfirmSwitch { current, next } => {
            let reply = prompt_line(&format!(
                "Activity '{current}' in progress. Stop and start '{next}'? [Y/n]: "
            ))?;
            if is_affirmative(&reply) {
                // The old activity's report is discarded; only the switch
                // gets announced.
                tracker.stop().await?;
                tracker.start(&next)?;
                println!("Started tracking: {next}");
            }
        }
    }
    Ok(())
}

async fn run_tell(tracker: &mut ActivityTracker, question: &str) -> Result<()> {
    let rows = tracker.tell(question).await?;
    if rows.is_empty() {
        println!("No activities found for your query.");
        return Ok(());
    }
    for row in &rows {
        println!("{}", format_query_row(row));
    }
    Ok(())
}

fn run_category(tracker: &mut ActivityTracker, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::Help => print!("{CATEGORY_HELP_TEXT}"),
        CategoryCommand::List => {
            let summaries = tracker.list_categories()?;
            if summaries.is_empty() {
                println!("No categories found");
                return Ok(());
            }
            for summary in &summaries {
                println!("{}", format_category_summary(summary));
            }
        }
        CategoryCommand::Rename { old, new } => {
            if tracker.rename_category(&old, &new)? {
                println!("Renamed category '{old}' to '{new}'");
            } else {
                println!("Failed to rename category");
            }
        }
        CategoryCommand::Merge { from, into } => match tracker.merge_category(&from, &into) {
            Ok(true) => println!("Merged category '{from}' into '{into}'"),
            Ok(false) => println!("Failed to merge categories"),
            Err(TrackError::NotFound(name)) => {
                println!("Failed to merge categories: category '{name}' was not found");
            }
            Err(e) => return Err(e.into()),
        },
        CategoryCommand::Show { name } => {
            let activities = tracker.activities_in_category(&name)?;
            if activities.is_empty() {
                println!("No activities found in category '{name}'");
                return Ok(());
            }
            for activity in &activities {
                println!("{}", format_activity(activity));
            }
        }
    }
    Ok(())
}

fn prompt_line(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn is_affirmative(reply: &str) -> bool {
    matches!(reply.to_lowercase().as_str(), "" | "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn classifies_help_and_bare() {
        assert_eq!(classify(&[]), Invocation::Bare);
        assert_eq!(classify(&words(&["help"])), Invocation::Help);
        assert_eq!(classify(&words(&["HELP"])), Invocation::Help);
        // `help something` is an activity named "help something".
        assert_eq!(
            classify(&words(&["help", "me"])),
            Invocation::Start("help me".into())
        );
    }

    #[test]
    fn classifies_tell() {
        assert_eq!(classify(&words(&["tell"])), Invocation::TellUsage);
        assert_eq!(
            classify(&words(&["tell", "me", "what", "I", "did"])),
            Invocation::Tell("me what I did".into())
        );
    }

    #[test]
    fn classifies_free_text_as_start() {
        assert_eq!(
            classify(&words(&["working", "on", "python", "project"])),
            Invocation::Start("working on python project".into())
        );
    }

    #[test]
    fn classifies_category_commands_with_exact_arity() {
        assert_eq!(
            classify(&words(&["category", "list"])),
            Invocation::Category(CategoryCommand::List)
        );
        assert_eq!(
            classify(&words(&["category", "rename", "Coding", "Programming"])),
            Invocation::Category(CategoryCommand::Rename {
                old: "Coding".into(),
                new: "Programming".into(),
            })
        );
        assert_eq!(
            classify(&words(&["category", "merge", "Dev", "Programming"])),
            Invocation::Category(CategoryCommand::Merge {
                from: "Dev".into(),
                into: "Programming".into(),
            })
        );
        assert_eq!(
            classify(&words(&["category", "show", "Programming"])),
            Invocation::Category(CategoryCommand::Show {
                name: "Programming".into(),
            })
        );
    }

    #[test]
    fn category_wrong_arity_prints_usage() {
        for command in [
            words(&["category"]),
            words(&["category", "help"]),
            words(&["category", "rename", "OnlyOld"]),
            words(&["category", "merge", "A", "B", "C"]),
            words(&["category", "show"]),
            words(&["category", "unknown"]),
        ] {
            assert_eq!(
                classify(&command),
                Invocation::Category(CategoryCommand::Help),
                "for {command:?}"
            );
        }
    }

    #[test]
    fn plan_covers_all_four_transitions() {
        let session = ActiveSession {
            activity_id: 1,
            name: "writing docs".into(),
            started_at: 1736900000,
        };

        assert_eq!(plan(None, None), Action::PromptForName);
        assert_eq!(plan(None, Some(&session)), Action::StopCurrent);
        assert_eq!(
            plan(Some("reading".into()), None),
            Action::Start("reading".into())
        );
        assert_eq!(
            plan(Some("reading".into()), Some(&session)),
            Action::ConfirmSwitch {
                current: "writing docs".into(),
                next: "reading".into(),
            }
        );
    }

    #[test]
    fn affirmative_replies() {
        assert!(is_affirmative(""));
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("YES"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("maybe"));
    }
}
