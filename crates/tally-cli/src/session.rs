//! Interactive tracking session.
//!
//! A [`Session`] owns the timer, the entry store and the project catalog and
//! turns line commands into operations on them. [`run_loop`] multiplexes
//! input lines with timer ticks on a single task.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, TimeZone, Utc};
use tally_core::aggregate::{self, DayBucket};
use tally_core::format::{
    format_clock, format_day_heading, format_duration, format_entry_duration, format_entry_time,
};
use tally_core::{
    EntryStore, Phase, Project, ProjectCatalog, Scheduler, Summary, Tick, TimeEntry, Timer,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  projects          list projects (* marks the selected one)
  add <name>        add a project and select it
  select <n|name>   select a project by number or name
  describe [text]   set the description, or clear it when empty
  start             start the timer
  pause, resume     pause or resume the timer
  toggle            pause if running, resume if paused
  stop              stop the timer and record the entry
  status            show the timer
  entries           list entries by day
  remove <id>       delete an entry by id prefix
  stats [--json]    today, this week, daily average, top project
  help              show this help
  quit              end the session";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Projects,
    AddProject(String),
    Select(String),
    Describe(String),
    Start,
    Pause,
    Resume,
    Toggle,
    Stop,
    Status,
    Entries,
    Remove(String),
    Stats { json: bool },
    Help,
    Quit,
}

impl Action {
    /// Parses one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        let action = match verb.to_lowercase().as_str() {
            "projects" => Self::Projects,
            "add" if rest.is_empty() => bail!("usage: add <name>"),
            "add" => Self::AddProject(rest.to_string()),
            "select" if rest.is_empty() => bail!("usage: select <n|name>"),
            "select" => Self::Select(rest.to_string()),
            "describe" => Self::Describe(rest.to_string()),
            "start" => Self::Start,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "toggle" => Self::Toggle,
            "stop" => Self::Stop,
            "status" => Self::Status,
            "entries" => Self::Entries,
            "remove" if rest.is_empty() => bail!("usage: remove <id>"),
            "remove" => Self::Remove(rest.to_string()),
            "stats" => match rest {
                "" => Self::Stats { json: false },
                "--json" => Self::Stats { json: true },
                _ => bail!("usage: stats [--json]"),
            },
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(Some(action))
    }
}

/// Whether the session should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Timer, entries and projects for one run of the tracker.
#[derive(Debug)]
pub struct Session<S: Scheduler> {
    timer: Timer<S>,
    store: EntryStore,
    catalog: ProjectCatalog,
}

impl<S: Scheduler> Session<S> {
    pub fn new(scheduler: S, catalog: ProjectCatalog) -> Self {
        Self {
            timer: Timer::new(scheduler),
            store: EntryStore::new(),
            catalog,
        }
    }

    pub const fn timer(&self) -> &Timer<S> {
        &self.timer
    }

    pub const fn store(&self) -> &EntryStore {
        &self.store
    }

    pub const fn catalog(&self) -> &ProjectCatalog {
        &self.catalog
    }

    pub fn tick(&mut self, tick: Tick) {
        self.timer.tick(tick);
    }

    /// Parses and executes one input line, reporting parse errors inline.
    pub fn handle_line<Tz, W>(&mut self, line: &str, now: &DateTime<Tz>, out: &mut W) -> Result<Flow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
        W: Write,
    {
        match Action::parse(line) {
            Ok(Some(action)) => self.execute(action, now, out),
            Ok(None) => Ok(Flow::Continue),
            Err(err) => {
                writeln!(out, "{err}")?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Executes an action at the reference instant `now`.
    pub fn execute<Tz, W>(&mut self, action: Action, now: &DateTime<Tz>, out: &mut W) -> Result<Flow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
        W: Write,
    {
        tracing::debug!(?action, "executing");
        match action {
            Action::Projects => self.list_projects(out)?,
            Action::AddProject(name) => self.add_project(&name, out)?,
            Action::Select(selector) => self.select_project(&selector, out)?,
            Action::Describe(text) => self.describe(text, out)?,
            Action::Start => self.start(out)?,
            Action::Pause => {
                if self.timer.pause() {
                    self.report_clock("Paused", out)?;
                } else {
                    writeln!(out, "Timer is not running.")?;
                }
            }
            Action::Resume => {
                if self.timer.resume() {
                    self.report_clock("Resumed", out)?;
                } else {
                    writeln!(out, "Timer is not paused.")?;
                }
            }
            Action::Toggle => {
                if self.timer.toggle_pause() {
                    let verb = match self.timer.phase() {
                        Phase::Paused => "Paused",
                        Phase::Running | Phase::Idle => "Resumed",
                    };
                    self.report_clock(verb, out)?;
                } else {
                    writeln!(out, "Timer is not running.")?;
                }
            }
            Action::Stop => self.stop(now, out)?,
            Action::Status => self.status(out)?,
            Action::Entries => self.list_entries(now, out)?,
            Action::Remove(prefix) => self.remove(&prefix, out)?,
            Action::Stats { json } => self.stats(now, json, out)?,
            Action::Help => writeln!(out, "{HELP}")?,
            Action::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn report_clock<W: Write>(&self, verb: &str, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "{verb} at {}",
            format_clock(self.timer.elapsed_seconds())
        )?;
        Ok(())
    }

    fn list_projects<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.catalog.is_empty() {
            writeln!(out, "No projects yet. Add one with 'add <name>'.")?;
            return Ok(());
        }
        let selected = self.timer.selected_project().map(Project::id);
        for (position, project) in self.catalog.iter().enumerate() {
            let marker = if Some(project.id()) == selected { '*' } else { ' ' };
            writeln!(out, "{marker} {}. {}", position + 1, project.name())?;
        }
        Ok(())
    }

    fn add_project<W: Write>(&mut self, name: &str, out: &mut W) -> Result<()> {
        let project = match self.catalog.add(name) {
            Ok(project) => project,
            Err(err) => {
                writeln!(out, "Cannot add project: {err}")?;
                return Ok(());
            }
        };
        writeln!(out, "Added project {}", project.name())?;
        if self.timer.select_project(project) {
            writeln!(out, "Selected {}", project.name())?;
        }
        Ok(())
    }

    fn select_project<W: Write>(&mut self, selector: &str, out: &mut W) -> Result<()> {
        let Some(project) = self.catalog.resolve(selector) else {
            writeln!(out, "No project matches '{selector}'.")?;
            return Ok(());
        };
        if self.timer.select_project(project) {
            writeln!(out, "Selected {}", project.name())?;
        } else {
            writeln!(
                out,
                "Project is locked while the timer is {}.",
                self.timer.phase()
            )?;
        }
        Ok(())
    }

    fn describe<W: Write>(&mut self, text: String, out: &mut W) -> Result<()> {
        let cleared = text.is_empty();
        if !self.timer.set_description(text) {
            writeln!(
                out,
                "Description is locked while the timer is {}.",
                self.timer.phase()
            )?;
        } else if cleared {
            writeln!(out, "Description cleared.")?;
        } else {
            writeln!(out, "Description set.")?;
        }
        Ok(())
    }

    fn start<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if self.timer.start() {
            let name = self.timer.selected_project().map_or("", Project::name);
            writeln!(out, "Started {name}")?;
        } else if self.timer.phase() == Phase::Idle {
            writeln!(out, "Select a project first (see 'projects').")?;
        } else {
            writeln!(out, "Timer is already {}.", self.timer.phase())?;
        }
        Ok(())
    }

    fn stop<Tz: TimeZone, W: Write>(&mut self, now: &DateTime<Tz>, out: &mut W) -> Result<()> {
        let was = self.timer.phase();
        match self.timer.stop(now.with_timezone(&Utc)) {
            Some(entry) => {
                writeln!(
                    out,
                    "Recorded {} on {} (id {})",
                    format_clock(entry.duration_secs()),
                    entry.project(),
                    entry.id().short()
                )?;
                self.store.append(entry);
            }
            None if was == Phase::Idle => writeln!(out, "Timer is not running.")?,
            None => writeln!(out, "Stopped; nothing recorded.")?,
        }
        Ok(())
    }

    fn status<W: Write>(&self, out: &mut W) -> Result<()> {
        let project = self
            .timer
            .selected_project()
            .map_or("(none)", Project::name);
        let description = match self.timer.description() {
            "" => "(none)",
            text => text,
        };
        writeln!(
            out,
            "Timer:       {} {}",
            self.timer.phase(),
            format_clock(self.timer.elapsed_seconds())
        )?;
        writeln!(out, "Project:     {project}")?;
        writeln!(out, "Description: {description}")?;
        Ok(())
    }

    fn list_entries<Tz, W>(&self, now: &DateTime<Tz>, out: &mut W) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
        W: Write,
    {
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            writeln!(
                out,
                "No entries yet. Start tracking your time to see entries here."
            )?;
            return Ok(());
        }

        let tz = now.timezone();
        let groups = aggregate::group_by_day(snapshot, now);
        let mut first = true;
        for (bucket, entries) in groups.buckets() {
            if entries.is_empty() {
                continue;
            }
            if !first {
                writeln!(out)?;
            }
            first = false;

            writeln!(out, "{}", bucket.label().to_uppercase())?;
            for entry in entries {
                let time = format_entry_time(entry.timestamp(), &tz);
                let when = match bucket {
                    DayBucket::Older => {
                        let day = entry.timestamp().with_timezone(&tz).date_naive();
                        format!("{} {time}", format_day_heading(day))
                    }
                    DayBucket::Today | DayBucket::Yesterday => time,
                };
                writeln!(
                    out,
                    "  {}  {when}  {} ({})",
                    entry.id().short(),
                    entry.project(),
                    format_entry_duration(entry.duration_secs())
                )?;
                if !entry.description().is_empty() {
                    writeln!(out, "            {}", entry.description())?;
                }
            }
        }
        Ok(())
    }

    fn remove<W: Write>(&mut self, prefix: &str, out: &mut W) -> Result<()> {
        let Some(id) = self.store.find_by_prefix(prefix).map(TimeEntry::id) else {
            writeln!(out, "No single entry matches '{prefix}'.")?;
            return Ok(());
        };
        if let Some(entry) = self.store.remove(id) {
            writeln!(
                out,
                "Removed {} ({}, {})",
                id.short(),
                entry.project(),
                format_entry_duration(entry.duration_secs())
            )?;
        }
        Ok(())
    }

    fn stats<Tz: TimeZone, W: Write>(&self, now: &DateTime<Tz>, json: bool, out: &mut W) -> Result<()> {
        let summary = Summary::compute(self.store.snapshot(), now);
        if json {
            let rendered =
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
            writeln!(out, "{rendered}")?;
            return Ok(());
        }

        writeln!(out, "Today:         {}", format_duration(summary.today_secs))?;
        writeln!(out, "This week:     {}", format_duration(summary.week_secs))?;
        writeln!(
            out,
            "Daily average: {}",
            format_duration(summary.daily_average_secs)
        )?;
        match &summary.top_project {
            Some(top) => writeln!(
                out,
                "Top project:   {} ({})",
                top.project,
                format_duration(top.seconds)
            )?,
            None => writeln!(out, "Top project:   None yet")?,
        }
        Ok(())
    }
}

/// Feeds input lines and ticks into `session` until input ends or `quit`.
///
/// Runs on a single task; ticks are applied between commands, never
/// concurrently with them.
pub async fn run_loop<S, R, W>(
    session: &mut Session<S>,
    input: R,
    out: &mut W,
    ticks: &mut mpsc::UnboundedReceiver<Tick>,
) -> Result<()>
where
    S: Scheduler,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    tracing::debug!("input closed");
                    break;
                };
                let flow = session.handle_line(&line, &Local::now(), out)?;
                out.flush().context("failed to flush output")?;
                if flow == Flow::Quit {
                    break;
                }
            }
            Some(tick) = ticks.recv() => session.tick(tick),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use insta::assert_snapshot;
    use tally_core::ManualScheduler;
    use tokio::io::{AsyncWriteExt, BufReader};

    use crate::ticker::IntervalScheduler;

    fn catalog() -> ProjectCatalog {
        ProjectCatalog::seeded(["Website Redesign", "Mobile App"]).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    /// Drives a session with scripted lines; `+N` delivers N ticks.
    struct Harness {
        session: Session<ManualScheduler>,
        scheduler: ManualScheduler,
        ids: Vec<String>,
        transcript: String,
    }

    impl Harness {
        fn new() -> Self {
            let scheduler = ManualScheduler::new();
            Self {
                session: Session::new(scheduler.clone(), catalog()),
                scheduler,
                ids: Vec::new(),
                transcript: String::new(),
            }
        }

        fn run(&mut self, now: DateTime<Utc>, script: &[&str]) {
            for line in script {
                if let Some(count) = line.strip_prefix('+') {
                    for _ in 0..count.parse::<u64>().unwrap() {
                        self.session.tick(self.scheduler.last_tick().unwrap());
                    }
                    continue;
                }
                let mut out = Vec::new();
                self.session.handle_line(line, &now, &mut out).unwrap();
                self.transcript.push_str("> ");
                self.transcript.push_str(line);
                self.transcript.push('\n');
                self.transcript.push_str(&String::from_utf8(out).unwrap());
                self.ids
                    .extend(self.session.store().snapshot().iter().map(|e| e.id().short()));
            }
        }

        /// Transcript with entry ids replaced by a stable placeholder.
        fn transcript(&self) -> String {
            self.ids
                .iter()
                .fold(self.transcript.clone(), |text, id| text.replace(id, "[ID]"))
        }
    }

    #[test]
    fn parse_handles_arguments_and_case() {
        assert_eq!(
            Action::parse("  ADD   Client X ").unwrap(),
            Some(Action::AddProject("Client X".to_string()))
        );
        assert_eq!(
            Action::parse("describe").unwrap(),
            Some(Action::Describe(String::new()))
        );
        assert_eq!(
            Action::parse("stats --json").unwrap(),
            Some(Action::Stats { json: true })
        );
        assert_eq!(Action::parse("exit").unwrap(), Some(Action::Quit));
        assert_eq!(Action::parse("   ").unwrap(), None);
    }

    #[test]
    fn parse_rejects_missing_arguments() {
        assert_eq!(
            Action::parse("select").unwrap_err().to_string(),
            "usage: select <n|name>"
        );
        assert_eq!(
            Action::parse("stats weekly").unwrap_err().to_string(),
            "usage: stats [--json]"
        );
        assert_eq!(
            Action::parse("launch").unwrap_err().to_string(),
            "unknown command 'launch' (try 'help')"
        );
    }

    #[test]
    fn tracking_round_trip() {
        let mut harness = Harness::new();
        harness.run(
            at(12, 17, 30),
            &[
                "projects",
                "select 2",
                "describe login flow",
                "start",
                "+90",
                "pause",
                "+15",
                "status",
                "resume",
                "+30",
                "stop",
                "status",
                "projects",
            ],
        );

        assert_snapshot!(harness.transcript(), @r"
        > projects
          1. Website Redesign
          2. Mobile App
        > select 2
        Selected Mobile App
        > describe login flow
        Description set.
        > start
        Started Mobile App
        > pause
        Paused at 00:01:30
        > status
        Timer:       paused 00:01:30
        Project:     Mobile App
        Description: login flow
        > resume
        Resumed at 00:01:30
        > stop
        Recorded 00:02:00 on Mobile App (id [ID])
        > status
        Timer:       idle 00:00:00
        Project:     Mobile App
        Description: (none)
        > projects
          1. Website Redesign
        * 2. Mobile App
        ");
        assert_eq!(
            harness.session.store().snapshot().latest().unwrap().duration_secs(),
            120
        );
    }

    #[test]
    fn entries_and_stats_over_a_week() {
        let mut harness = Harness::new();
        harness.run(at(10, 10, 0), &["select 1", "start", "+3600", "stop"]);
        harness.run(
            at(11, 16, 0),
            &["select 2", "describe api review", "start", "+1800", "stop"],
        );
        harness.run(at(12, 9, 15), &["select 1", "start", "+2700", "stop"]);
        harness.transcript.clear();

        harness.run(at(12, 17, 30), &["entries", "stats"]);

        assert_snapshot!(harness.transcript(), @r"
        > entries
        TODAY
          [ID]  09:15  Website Redesign (0h 45m)

        YESTERDAY
          [ID]  16:00  Mobile App (0h 30m)
                    api review

        OLDER
          [ID]  Mon, Mar 10 10:00  Website Redesign (1h 0m)
        > stats
        Today:         45m
        This week:     2h 15m
        Daily average: 45m
        Top project:   Website Redesign (1h 45m)
        ");
    }

    #[test]
    fn stats_json_reports_seconds() {
        let mut harness = Harness::new();
        harness.run(at(12, 9, 0), &["select 1", "start", "+3600", "stop"]);

        let mut out = Vec::new();
        harness
            .session
            .execute(Action::Stats { json: true }, &at(12, 17, 30), &mut out)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["week_start"], "2025-03-09");
        assert_eq!(json["today_secs"], 3600);
        assert_eq!(json["daily_average_secs"], 3600);
        assert_eq!(json["top_project"]["project"], "Website Redesign");
    }

    #[test]
    fn invalid_requests_are_reported_not_fatal() {
        let mut harness = Harness::new();
        harness.run(
            at(12, 17, 30),
            &[
                "start",
                "stop",
                "pause",
                "toggle",
                "select Nope",
                "bogus",
                "remove",
                "add   Client X",
                "start",
                "select 1",
                "describe late",
                "start",
                "resume",
                "stop",
                "entries",
                "stats",
            ],
        );

        assert_snapshot!(harness.transcript(), @r"
        > start
        Select a project first (see 'projects').
        > stop
        Timer is not running.
        > pause
        Timer is not running.
        > toggle
        Timer is not running.
        > select Nope
        No project matches 'Nope'.
        > bogus
        unknown command 'bogus' (try 'help')
        > remove
        usage: remove <id>
        > add   Client X
        Added project Client X
        Selected Client X
        > start
        Started Client X
        > select 1
        Project is locked while the timer is running.
        > describe late
        Description is locked while the timer is running.
        > start
        Timer is already running.
        > resume
        Timer is not paused.
        > stop
        Stopped; nothing recorded.
        > entries
        No entries yet. Start tracking your time to see entries here.
        > stats
        Today:         0m
        This week:     0m
        Daily average: 0m
        Top project:   None yet
        ");
    }

    #[test]
    fn toggle_flips_between_paused_and_running() {
        let mut harness = Harness::new();
        harness.run(
            at(12, 8, 0),
            &["select 1", "start", "+5", "toggle", "+5", "toggle", "+5", "stop"],
        );

        let transcript = harness.transcript();
        assert!(transcript.contains("Paused at 00:00:05"));
        assert!(transcript.contains("Resumed at 00:00:05"));
        assert!(transcript.contains("Recorded 00:00:10 on Website Redesign"));
    }

    #[test]
    fn remove_by_short_id() {
        let mut harness = Harness::new();
        harness.run(at(12, 8, 0), &["select 1", "start", "+61", "stop"]);
        let short = harness.session.store().snapshot().latest().unwrap().id().short();
        harness.transcript.clear();

        let remove = format!("remove {short}");
        harness.run(at(12, 9, 0), &[remove.as_str(), remove.as_str(), "entries"]);

        assert_snapshot!(harness.transcript(), @r"
        > remove [ID]
        Removed [ID] (Website Redesign, 0h 1m)
        > remove [ID]
        No single entry matches '[ID]'.
        > entries
        No entries yet. Start tracking your time to see entries here.
        ");
        assert!(harness.session.store().is_empty());
    }

    #[test]
    fn add_blank_project_is_rejected() {
        let mut harness = Harness::new();
        let mut out = Vec::new();
        harness
            .session
            .execute(Action::AddProject("  ".to_string()), &at(12, 8, 0), &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Cannot add project: project name cannot be empty\n"
        );
        assert_eq!(harness.session.catalog().len(), 2);
    }

    #[test]
    fn quit_ends_the_session() {
        let mut harness = Harness::new();
        let mut out = Vec::new();
        let flow = harness
            .session
            .handle_line("quit", &at(12, 8, 0), &mut out)
            .unwrap();

        assert_eq!(flow, Flow::Quit);
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_counts_only_running_seconds() {
        let (scheduler, mut ticks) = IntervalScheduler::channel();
        let mut session = Session::new(scheduler, catalog());
        let (mut writer, reader) = tokio::io::duplex(256);

        let feeder = tokio::spawn(async move {
            writer.write_all(b"select 1\nstart\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(3500)).await;
            writer.write_all(b"pause\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            writer.write_all(b"resume\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(2500)).await;
            writer.write_all(b"stop\n").await.unwrap();
        });

        let mut out = Vec::new();
        run_loop(&mut session, BufReader::new(reader), &mut out, &mut ticks)
            .await
            .unwrap();
        feeder.await.unwrap();

        let entry = session.store().snapshot().latest().unwrap();
        assert_eq!(entry.project(), "Website Redesign");
        assert_eq!(entry.duration_secs(), 5);
        assert!(!session.timer().is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_on_quit() {
        let (scheduler, mut ticks) = IntervalScheduler::channel();
        let mut session = Session::new(scheduler, catalog());
        let input: &[u8] = b"select 1\nstart\nquit\nstop\n";

        let mut out = Vec::new();
        run_loop(&mut session, input, &mut out, &mut ticks)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("Started Website Redesign\n"));
        assert!(session.store().is_empty());
    }
}
