use std::path::PathBuf;

use crate::keybindings::{dashboard_keybindings, DashboardAction, DashboardKeybindings};
use crate::services::selection::{self, SelectionSummary};
use crate::services::size_cache::SizeTracker;
use crate::services::transfer::{
    AttachedRun, Operation, OutputType, RunConfig, RunMode, RunOutcome, TransferRunner,
};
use crate::ui::file_panel::FilePanel;
use crate::ui::output_log::OutputLog;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSide {
    Source,
    Destination,
}

/// Whether an attached transfer currently owns the run slot.
pub enum RunState {
    Idle,
    Running(AttachedRun),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running(_))
    }
}

pub struct App {
    pub source: FilePanel,
    pub destination: FilePanel,
    pub active_panel: PanelSide,
    pub output: OutputLog,
    pub run_config: RunConfig,
    pub run_state: RunState,
    pub sizes: SizeTracker,
    pub runner: TransferRunner,
    pub keybindings: DashboardKeybindings,
    pub theme: Theme,
    /// Listing rows per panel as of the last frame
    pub panel_rows: usize,
}

impl App {
    pub fn new(source: PathBuf, destination: PathBuf, runner: TransferRunner, sizes: SizeTracker) -> Self {
        Self {
            source: FilePanel::new(source),
            destination: FilePanel::new(destination),
            active_panel: PanelSide::Source,
            output: OutputLog::new(),
            run_config: RunConfig::default(),
            run_state: RunState::Idle,
            sizes,
            runner,
            keybindings: dashboard_keybindings(),
            theme: Theme::default(),
            panel_rows: 1,
        }
    }

    pub fn active_panel_mut(&mut self) -> &mut FilePanel {
        match self.active_panel {
            PanelSide::Source => &mut self.source,
            PanelSide::Destination => &mut self.destination,
        }
    }

    pub fn switch_panel(&mut self) {
        self.active_panel = match self.active_panel {
            PanelSide::Source => PanelSide::Destination,
            PanelSide::Destination => PanelSide::Source,
        };
    }

    /// Apply one action. Returns true when the dashboard should exit.
    pub fn dispatch(&mut self, action: DashboardAction) -> bool {
        let rows = self.panel_rows;
        match action {
            DashboardAction::Quit => return true,
            DashboardAction::MoveUp => self.active_panel_mut().move_cursor(-1, Some(rows)),
            DashboardAction::MoveDown => self.active_panel_mut().move_cursor(1, Some(rows)),
            DashboardAction::FocusSource => self.active_panel = PanelSide::Source,
            DashboardAction::FocusDestination => self.active_panel = PanelSide::Destination,
            DashboardAction::SwitchPanel => self.switch_panel(),
            DashboardAction::Open => self.active_panel_mut().enter(),
            DashboardAction::ParentDir => self.active_panel_mut().go_to_parent(),
            DashboardAction::ToggleSelect => self.active_panel_mut().toggle_select(),
            DashboardAction::SetCopy => self.run_config.operation = Operation::Copy,
            DashboardAction::SetMove => self.run_config.operation = Operation::Move,
            DashboardAction::OutputProgress => self.run_config.output_type = OutputType::Progress,
            DashboardAction::OutputLog => self.run_config.output_type = OutputType::Log,
            DashboardAction::Attached => self.run_config.run_mode = RunMode::Attached,
            DashboardAction::Detached => self.run_config.run_mode = RunMode::Detached,
            DashboardAction::ScrollOutputUp => self.output.scroll(1),
            DashboardAction::ScrollOutputDown => self.output.scroll(-1),
            DashboardAction::Run => self.run_transfer(),
        }
        false
    }

    /// Totals over both panels' selections.
    pub fn selection_summary(&self) -> SelectionSummary {
        let paths = self.source.selected.iter().chain(self.destination.selected.iter());
        selection::aggregate(paths, self.sizes.cache())
    }

    /// Start the configured transfer of the source selection into the
    /// destination panel's directory.
    pub fn run_transfer(&mut self) {
        if self.run_state.is_running() {
            self.output.append("A transfer is already running.");
            return;
        }

        let sources = self.source.selected_sorted();
        let dest_dir = self.destination.path.clone();
        match self.runner.run(self.run_config, &sources, &dest_dir) {
            RunOutcome::Done(lines) => {
                for line in lines {
                    self.output.append(&line);
                }
            }
            RunOutcome::Started(run) => {
                self.run_state = RunState::Running(run);
            }
        }
    }

    /// Per-frame housekeeping: move transfer output into the log and reap
    /// finished detached jobs.
    pub fn tick(&mut self) {
        if let RunState::Running(run) = &mut self.run_state {
            let output = &mut self.output;
            if run.poll(|line| output.append(&line)) {
                tracing::info!("attached {} of {} items finished", run.operation.verb(), run.item_count);
                self.run_state = RunState::Idle;
            }
        }
        self.runner.reap_detached();
    }

    /// Background work is in flight and the screen should refresh sooner.
    pub fn is_busy(&self) -> bool {
        self.run_state.is_running() || self.sizes.is_busy()
    }

    /// Stop the attached run and the size workers, waiting for both.
    pub fn shutdown(&mut self) {
        if let RunState::Running(run) = std::mem::replace(&mut self.run_state, RunState::Idle) {
            tracing::info!("stopping attached {}", run.operation.verb());
            run.stop();
        }
        self.sizes.shutdown();
        tracing::info!(
            "shutdown: {} size walks submitted, {} detached jobs still running",
            self.sizes.jobs_submitted(),
            self.runner.detached_running()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, Instant};

    const MISSING_TOOL: &str = "rclone-tui-test-no-such-tool";

    fn app_for(src: &std::path::Path, dst: &std::path::Path) -> App {
        let runner = TransferRunner::new(MISSING_TOOL, dst.join("rclone_tui.log"));
        App::new(src.to_path_buf(), dst.to_path_buf(), runner, SizeTracker::new(1))
    }

    fn wait_idle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.run_state.is_running() && Instant::now() < deadline {
            app.tick();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!app.run_state.is_running());
    }

    #[test]
    fn test_focus_keys() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut app = app_for(src.path(), dst.path());

        assert_eq!(app.active_panel, PanelSide::Source);
        app.dispatch(DashboardAction::FocusDestination);
        assert_eq!(app.active_panel, PanelSide::Destination);
        app.dispatch(DashboardAction::FocusDestination);
        assert_eq!(app.active_panel, PanelSide::Destination);
        app.dispatch(DashboardAction::SwitchPanel);
        assert_eq!(app.active_panel, PanelSide::Source);
        app.dispatch(DashboardAction::FocusSource);
        assert_eq!(app.active_panel, PanelSide::Source);
    }

    #[test]
    fn test_config_keys_only_change_config() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut app = app_for(src.path(), dst.path());

        app.dispatch(DashboardAction::SetMove);
        app.dispatch(DashboardAction::OutputLog);
        app.dispatch(DashboardAction::Detached);
        assert_eq!(
            app.run_config,
            RunConfig {
                operation: Operation::Move,
                output_type: OutputType::Log,
                run_mode: RunMode::Detached,
            }
        );
        assert_eq!(app.output.len(), 0);

        app.dispatch(DashboardAction::SetCopy);
        app.dispatch(DashboardAction::OutputProgress);
        app.dispatch(DashboardAction::Attached);
        assert_eq!(app.run_config, RunConfig::default());
    }

    #[test]
    fn test_quit_returns_true() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut app = app_for(src.path(), dst.path());
        assert!(!app.dispatch(DashboardAction::MoveDown));
        assert!(app.dispatch(DashboardAction::Quit));
    }

    #[test]
    fn test_run_without_selection() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut app = app_for(src.path(), dst.path());
        app.dispatch(DashboardAction::Run);
        assert_eq!(app.output.lines(), &["No items selected.".to_string()]);
        assert!(!app.run_state.is_running());
    }

    #[test]
    fn test_summary_spans_both_panels() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.bin"), vec![0u8; 100]).unwrap();
        fs::write(dst.path().join("b.bin"), vec![0u8; 50]).unwrap();
        let mut app = app_for(src.path(), dst.path());

        app.dispatch(DashboardAction::MoveDown);
        app.dispatch(DashboardAction::ToggleSelect);
        app.dispatch(DashboardAction::FocusDestination);
        app.dispatch(DashboardAction::MoveDown);
        app.dispatch(DashboardAction::ToggleSelect);

        let summary = app.selection_summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_bytes, 150);
        assert!(!summary.pending);
    }

    #[test]
    fn test_attached_run_reports_missing_tool_and_returns_to_idle() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.txt"), b"a").unwrap();
        fs::write(src.path().join("b.txt"), b"b").unwrap();
        let mut app = app_for(src.path(), dst.path());

        app.dispatch(DashboardAction::MoveDown);
        app.dispatch(DashboardAction::ToggleSelect);
        app.dispatch(DashboardAction::MoveDown);
        app.dispatch(DashboardAction::ToggleSelect);
        app.dispatch(DashboardAction::Run);
        assert!(app.run_state.is_running());
        assert!(app.is_busy());

        wait_idle(&mut app);
        let not_found = app.output.lines().iter().filter(|l| l.contains("not found")).count();
        assert_eq!(not_found, 2);
    }

    #[test]
    fn test_second_run_refused_while_running() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.txt"), b"a").unwrap();
        let mut app = app_for(src.path(), dst.path());

        app.dispatch(DashboardAction::MoveDown);
        app.dispatch(DashboardAction::ToggleSelect);
        app.dispatch(DashboardAction::Run);
        app.dispatch(DashboardAction::Run);
        assert!(app
            .output
            .lines()
            .iter()
            .any(|l| l == "A transfer is already running."));
        wait_idle(&mut app);
    }

    #[cfg(unix)]
    #[test]
    fn test_shutdown_stops_running_transfer() {
        use std::os::unix::fs::PermissionsExt;
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.txt"), b"a").unwrap();
        let tool = dst.path().join("slow-tool");
        fs::write(&tool, "#!/bin/sh\nexec sleep 30\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let runner = TransferRunner::new(tool.display().to_string(), dst.path().join("rclone_tui.log"));
        let mut app = App::new(src.path().to_path_buf(), dst.path().to_path_buf(), runner, SizeTracker::new(1));
        app.dispatch(DashboardAction::MoveDown);
        app.dispatch(DashboardAction::ToggleSelect);
        app.dispatch(DashboardAction::Run);
        assert!(app.run_state.is_running());
        std::thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        app.shutdown();
        assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
        assert!(!app.run_state.is_running());
    }

    #[test]
    fn test_output_scroll_keys() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut app = app_for(src.path(), dst.path());
        app.output.append("one");
        app.output.append("two");

        app.dispatch(DashboardAction::ScrollOutputUp);
        assert_eq!(app.output.scroll_offset(), 1);
        app.dispatch(DashboardAction::ScrollOutputDown);
        app.dispatch(DashboardAction::ScrollOutputDown);
        assert_eq!(app.output.scroll_offset(), 0);
    }

    #[test]
    fn test_parent_dir_key() {
        let root = tempfile::tempdir().unwrap();
        let child = root.path().join("child");
        fs::create_dir(&child).unwrap();
        let mut app = app_for(&child, root.path());

        app.dispatch(DashboardAction::ParentDir);
        assert_eq!(app.source.path, root.path());
        assert_eq!(app.source.current_entry().map(|e| e.name.as_str()), Some("child"));
    }
}
