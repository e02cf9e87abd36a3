//! studysync command line: demo session and configuration dump

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use studysync_collections::{SyncState, SystemClock};
use studysync_core::{LocalIdentityProvider, StudySync, SyncConfig};
use studysync_model::{
    NewClass, NewGrade, NewNotification, NewSubject, NewTask, NewTopic, NotificationKind, Priority,
};
use studysync_session::{MemoryLocalStore, TracingNotifier};
use studysync_store::MemoryStore;
use tracing_subscriber::EnvFilter;

const READY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    user: String,
    tasks: usize,
    completed_tasks: usize,
    subjects: usize,
    overall_percentage: f64,
    overall_gpa: f64,
    letter_grade: String,
    classes_today: usize,
    study_time: String,
    unread_notifications: usize,
    unlocked_achievements: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_arg = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");

    let cli = Command::new("studysync")
        .version(studysync_core::VERSION)
        .about("Real-time study data synchronization")
        .subcommand_required(true)
        .subcommand(
            Command::new("demo")
                .about("Run a session against the in-memory store")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("user")
                        .long("user")
                        .default_value("demo-student")
                        .help("User id to sign up"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the summary as JSON"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(config_arg),
        );

    match cli.get_matches().subcommand() {
        Some(("demo", args)) => demo(args).await,
        Some(("config", args)) => {
            let config = load_config(args)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Some((other, _)) => bail!("unknown command {other}"),
        None => Ok(()),
    }
}

fn load_config(args: &ArgMatches) -> Result<SyncConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SyncConfig::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(SyncConfig::default()),
    }
}

async fn demo(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let user = args
        .get_one::<String>("user")
        .cloned()
        .unwrap_or_else(|| "demo-student".to_string());

    let provider = Arc::new(LocalIdentityProvider::new());
    let app = StudySync::new(
        config,
        Arc::new(MemoryStore::new()),
        provider.clone(),
        Arc::new(MemoryLocalStore::new()),
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
    )?;
    app.start();

    provider.sign_up(&user, "demo")?;
    wait_until(|| app.tasks().state() == SyncState::Live && !app.achievements().achievements().is_empty())
        .await
        .context("synchronizers did not become live")?;

    populate(&app).await?;
    app.achievements().check_achievements().await?;

    let stats = app.grades().grade_stats();
    let summary = Summary {
        user: user.clone(),
        tasks: app.tasks().tasks().len(),
        completed_tasks: app.tasks().tasks().iter().filter(|t| t.completed).count(),
        subjects: app.subjects().subjects().len(),
        overall_percentage: stats.overall_percentage,
        overall_gpa: stats.overall_gpa,
        letter_grade: stats.letter_grade,
        classes_today: app.timetable().today_classes().len(),
        study_time: app.daily_stats().study_hours_label(),
        unread_notifications: app.notifications().unread_count(),
        unlocked_achievements: app.achievements().unlocked_count(),
    };

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Session summary for {}", summary.user);
        println!("  Tasks: {} ({} completed)", summary.tasks, summary.completed_tasks);
        println!("  Subjects: {}", summary.subjects);
        println!(
            "  Grades: {:.1}% ({}), GPA {:.2}",
            summary.overall_percentage, summary.letter_grade, summary.overall_gpa
        );
        println!("  Classes today: {}", summary.classes_today);
        println!("  Studied today: {}", summary.study_time);
        println!("  Unread notifications: {}", summary.unread_notifications);
        println!("  Achievements unlocked: {}", summary.unlocked_achievements);
    }

    app.sign_out().await?;
    app.shutdown();
    Ok(())
}

async fn populate(app: &StudySync) -> Result<()> {
    let first = app
        .tasks()
        .add(NewTask {
            priority: Priority::High,
            ..NewTask::titled("Revise linear algebra")
        })
        .await?;
    app.tasks().add(NewTask::titled("Write lab report")).await?;
    app.tasks().toggle(&first).await?;

    let subject = app
        .subjects()
        .add_subject(NewSubject {
            name: "Mathematics".into(),
            color: "blue".into(),
        })
        .await?;
    app.subjects()
        .add_topic(
            &subject,
            NewTopic {
                name: "Eigenvalues".into(),
                completed: false,
            },
        )
        .await?;

    let today = app.context().clock.today_key();
    for (title, score) in [("Quiz 1", 82.0), ("Midterm", 91.0)] {
        app.grades()
            .add(NewGrade {
                subject_id: subject.clone(),
                subject_name: "Mathematics".into(),
                title: title.into(),
                score,
                max_score: 100.0,
                weight: 1.0,
                date: today.clone(),
                kind: None,
            })
            .await?;
    }

    app.timetable()
        .add(NewClass {
            day: app.context().clock.weekday_index(),
            time: "09:00".into(),
            duration: 90,
            subject: "Mathematics".into(),
            kind: "lecture".into(),
            color: "blue".into(),
        })
        .await?;

    app.daily_stats().add_study_time(25).await?;
    app.daily_stats().increment_focus_session().await?;
    app.notifications()
        .add(NewNotification::new(
            NotificationKind::General,
            "Welcome",
            "Your study data is now synchronized",
        ))
        .await?;
    Ok(())
}

async fn wait_until(ready: impl Fn() -> bool) -> Result<()> {
    tokio::time::timeout(READY_TIMEOUT, async {
        while !ready() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(())
}
