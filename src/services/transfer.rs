use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::error::TransferError;
use crate::utils::format::strip_ansi;

/// Default log file for detached jobs
pub const DEFAULT_LOG_FILE: &str = "/var/log/rclone_tui.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Copy,
    Move,
}

impl Operation {
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Copy => "copy",
            Operation::Move => "move",
        }
    }

    /// "Copying" / "Moving", for the run banner
    pub fn gerund(&self) -> &'static str {
        match self {
            Operation::Copy => "Copying",
            Operation::Move => "Moving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Progress,
    Log,
}

impl OutputType {
    pub fn flag(&self) -> &'static str {
        match self {
            OutputType::Progress => "-P",
            OutputType::Log => "-vv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputType::Progress => "progress",
            OutputType::Log => "log",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Attached,
    Detached,
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Attached => "attached",
            RunMode::Detached => "detached",
        }
    }
}

/// What the next run will do. Changed only by explicit keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub operation: Operation,
    pub output_type: OutputType,
    pub run_mode: RunMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            operation: Operation::Copy,
            output_type: OutputType::Progress,
            run_mode: RunMode::Attached,
        }
    }
}

/// Target passed to the tool for `source`.
///
/// A directory is nested under `dest_dir` by its base name so that it lands
/// inside the destination instead of replacing its contents.
pub fn effective_destination(source: &Path, dest_dir: &Path) -> PathBuf {
    if source.is_dir() {
        if let Some(name) = source.file_name() {
            return dest_dir.join(name);
        }
    }
    dest_dir.to_path_buf()
}

/// One tool invocation for one selected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    pub operation: Operation,
    pub output_type: OutputType,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl TransferJob {
    pub fn new(operation: Operation, output_type: OutputType, source: &Path, dest_dir: &Path) -> Self {
        Self {
            operation,
            output_type,
            source: source.to_path_buf(),
            destination: effective_destination(source, dest_dir),
        }
    }

    /// `<copy|move> <source> <destination> <flag>`
    pub fn args(&self) -> Vec<OsString> {
        vec![
            OsString::from(self.operation.verb()),
            self.source.clone().into_os_string(),
            self.destination.clone().into_os_string(),
            OsString::from(self.output_type.flag()),
        ]
    }

    fn command(&self, tool: &str) -> Command {
        let mut command = Command::new(tool);
        command.args(self.args()).stdin(Stdio::null());
        command
    }

    fn completion_line(&self, code: Option<i32>) -> String {
        let code = code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string());
        format!(
            "Completed {} {} -> {} (exit {})",
            self.operation.verb(),
            self.source.display(),
            self.destination.display(),
            code
        )
    }
}

/// Build the job list for `sources`, in selection order.
pub fn plan_jobs(config: &RunConfig, sources: &[PathBuf], dest_dir: &Path) -> Vec<TransferJob> {
    sources
        .iter()
        .map(|src| TransferJob::new(config.operation, config.output_type, src, dest_dir))
        .collect()
}

/// Split a byte stream into display lines.
///
/// Both `\n` and `\r` end a line so that progress redraws appear as
/// separate lines. Escape sequences are stripped and blank lines dropped.
/// Reading stops early when `emit` returns false.
pub fn forward_lines<R: Read>(reader: R, mut emit: impl FnMut(String) -> bool) -> io::Result<()> {
    let mut pending: Vec<u8> = Vec::new();
    let mut flush = |pending: &mut Vec<u8>| -> bool {
        if pending.is_empty() {
            return true;
        }
        let line = strip_ansi(&String::from_utf8_lossy(pending));
        pending.clear();
        if line.trim().is_empty() {
            return true;
        }
        emit(line)
    };

    for byte in BufReader::new(reader).bytes() {
        let byte = byte?;
        if byte == b'\n' || byte == b'\r' {
            if !flush(&mut pending) {
                return Ok(());
            }
        } else {
            pending.push(byte);
        }
    }
    flush(&mut pending);
    Ok(())
}

fn stamp(line: &str) -> String {
    format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), line)
}

/// Process of the attached job currently running, if any.
type ChildSlot = Mutex<Option<Child>>;

fn lock_slot(slot: &ChildSlot) -> MutexGuard<'_, Option<Child>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Run one job with stdout and stderr sharing a single pipe, returning the
/// completion line once the process exits.
fn run_attached_job(
    tool: &str,
    job: &TransferJob,
    tx: &Sender<String>,
    slot: &ChildSlot,
    cancel_flag: &AtomicBool,
) -> Result<String, TransferError> {
    let pipe_error = |source| TransferError::Spawn {
        tool: tool.to_string(),
        source,
    };
    let (reader, writer) = io::pipe().map_err(pipe_error)?;
    let writer_err = writer.try_clone().map_err(pipe_error)?;

    let mut command = job.command(tool);
    command.stdout(writer).stderr(writer_err);
    let child = command.spawn().map_err(|e| TransferError::from_spawn(tool, e))?;
    // The command still owns the parent's write ends; the reader only sees
    // EOF once they are closed.
    drop(command);
    tracing::info!("attached {} started, pid={}", tool, child.id());

    {
        let mut guard = lock_slot(slot);
        let child = guard.insert(child);
        if cancel_flag.load(Ordering::SeqCst) {
            let _ = child.kill();
        }
    }

    let read = forward_lines(reader, |line| {
        tx.send(line).is_ok() && !cancel_flag.load(Ordering::SeqCst)
    });
    if let Err(e) = read {
        tracing::warn!("reading {} output failed: {}", tool, e);
    }

    let Some(mut child) = lock_slot(slot).take() else {
        return Ok(job.completion_line(None));
    };
    if cancel_flag.load(Ordering::SeqCst) {
        tracing::info!("cancelling {} pid={}", tool, child.id());
        let _ = child.kill();
    }
    let status = child.wait().map_err(|source| TransferError::Wait {
        tool: tool.to_string(),
        source,
    })?;
    Ok(job.completion_line(status.code()))
}

/// Run `jobs` one after another, each to completion.
///
/// A job that cannot start is reported as one line and the next job is
/// still attempted. The run is over when `tx` is dropped.
fn run_attached_jobs(
    tool: &str,
    jobs: &[TransferJob],
    tx: &Sender<String>,
    slot: &ChildSlot,
    cancel_flag: &AtomicBool,
) {
    for job in jobs {
        if cancel_flag.load(Ordering::SeqCst) {
            break;
        }
        let line = match run_attached_job(tool, job, tx, slot, cancel_flag) {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!("{} {}: {}", job.operation.verb(), job.source.display(), e);
                e.to_string()
            }
        };
        if tx.send(stamp(&line)).is_err() {
            break;
        }
    }
}

/// Attached transfer executing on its own thread.
pub struct AttachedRun {
    pub operation: Operation,
    pub item_count: usize,
    receiver: Receiver<String>,
    child: Arc<ChildSlot>,
    cancel_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AttachedRun {
    fn start(tool: &str, jobs: Vec<TransferJob>) -> Self {
        let (tx, rx) = mpsc::channel();
        let child = Arc::new(Mutex::new(None));
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let operation = jobs.first().map(|j| j.operation).unwrap_or(Operation::Copy);
        let item_count = jobs.len();

        let tool = tool.to_string();
        let slot = child.clone();
        let flag = cancel_flag.clone();
        let handle = thread::Builder::new()
            .name("transfer".to_string())
            .spawn(move || run_attached_jobs(&tool, &jobs, &tx, &slot, &flag));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                // The sender moved into the failed closure is already dropped,
                // so the next poll sees a disconnected channel and finishes.
                tracing::warn!("failed to start transfer thread: {}", e);
                None
            }
        };

        Self {
            operation,
            item_count,
            receiver: rx,
            child,
            cancel_flag,
            handle,
        }
    }

    /// Hand whatever output arrived since the last call to `sink`.
    /// Returns true once the run is over.
    pub fn poll(&mut self, mut sink: impl FnMut(String)) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok(line) => sink(line),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    if let Some(handle) = self.handle.take() {
                        let _ = handle.join();
                    }
                    return true;
                }
            }
        }
    }

    /// Kill the running job and skip the remaining ones.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
        if let Some(child) = lock_slot(&self.child).as_mut() {
            tracing::info!("killing attached pid={}", child.id());
            let _ = child.kill();
        }
    }

    /// Cancel and wait for the transfer thread to exit.
    pub fn stop(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Result of a run request
pub enum RunOutcome {
    /// Everything already happened; these lines go to the output pane
    Done(Vec<String>),
    /// An attached run is now executing and must be polled
    Started(AttachedRun),
}

/// Turns run requests into tool invocations.
pub struct TransferRunner {
    tool: String,
    log_file: PathBuf,
    detached: Vec<Child>,
}

impl TransferRunner {
    pub fn new(tool: impl Into<String>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            log_file: log_file.into(),
            detached: Vec::new(),
        }
    }

    pub fn run(&mut self, config: RunConfig, sources: &[PathBuf], dest_dir: &Path) -> RunOutcome {
        if sources.is_empty() {
            return RunOutcome::Done(vec!["No items selected.".to_string()]);
        }

        let jobs = plan_jobs(&config, sources, dest_dir);
        tracing::info!(
            "run {} x{} -> {} ({}, {})",
            config.operation.verb(),
            jobs.len(),
            dest_dir.display(),
            config.output_type.label(),
            config.run_mode.label()
        );

        match config.run_mode {
            RunMode::Attached => RunOutcome::Started(AttachedRun::start(&self.tool, jobs)),
            RunMode::Detached => RunOutcome::Done(self.run_detached(&jobs)),
        }
    }

    fn run_detached(&mut self, jobs: &[TransferJob]) -> Vec<String> {
        let mut lines = Vec::with_capacity(jobs.len());
        for job in jobs {
            match self.spawn_detached(job) {
                Ok(child) => {
                    tracing::info!("detached {} started, pid={}", self.tool, child.id());
                    self.detached.push(child);
                    lines.push(stamp(&format!(
                        "Detached {} job started for {}. Logs: {}",
                        job.operation.verb(),
                        job.source.display(),
                        self.log_file.display()
                    )));
                }
                Err(e) => {
                    tracing::warn!("detached {} {}: {}", job.operation.verb(), job.source.display(), e);
                    lines.push(e.to_string());
                }
            }
        }
        lines
    }

    fn spawn_detached(&self, job: &TransferJob) -> Result<Child, TransferError> {
        let log_error = |source| TransferError::LogFile {
            path: self.log_file.display().to_string(),
            source,
        };
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(log_error)?;
        let stderr = stdout.try_clone().map_err(log_error)?;

        job.command(&self.tool)
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| TransferError::from_spawn(&self.tool, e))
    }

    /// Collect exit statuses of finished detached jobs so they do not linger.
    pub fn reap_detached(&mut self) {
        self.detached.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                tracing::info!("detached pid={} exited: {}", child.id(), status);
                false
            }
            Ok(None) => true,
            Err(_) => false,
        });
    }

    pub fn detached_running(&self) -> usize {
        self.detached.len()
    }
}
