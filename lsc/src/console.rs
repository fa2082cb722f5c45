//! Interactive console worker
//!
//! One named thread owns the [`LineEditor`], the [`Shell`] and the
//! [`InputSource`]. It polls key events, feeds them to the editor and runs
//! every committed line on the same thread. Other threads that want to write
//! to the terminal go through [`Pauser`], which asks the worker to pause the
//! editor, waits for the acknowledgement, and resumes it afterwards.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use tracing_subscriber::fmt::MakeWriter;

use crate::editor::{Key, KeyEvent, LineEditor, Screen};
use crate::error::ControlSignal;
use crate::shell::Shell;

/// How long one poll for input may block before the running flag is checked.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const WORKER_NAME: &str = "lsc-input";

/// Supplies key events to the console worker.
pub trait InputSource: Send {
    /// Wait up to `timeout` for the next key event.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

enum Control {
    Pause(oneshot::Sender<()>),
    Resume,
}

/// What the worker hands back when it stops.
pub struct ConsoleOutcome<S: Screen> {
    pub shell: Shell,
    pub editor: LineEditor<S>,
    /// Code passed to `exit`; `None` when stopped through [`ConsoleHandle::shutdown`].
    pub exit_code: Option<i32>,
    /// Terminal or input failure that stopped the worker.
    pub error: Option<io::Error>,
}

/// Pause/resume access to a running console, cloneable across threads.
#[derive(Clone)]
pub struct Pauser {
    control: mpsc::UnboundedSender<Control>,
    worker: ThreadId,
}

impl Pauser {
    /// Pause the editor and wait until the worker has done so. Returns false
    /// when nothing was paused: the caller is the worker itself, the caller
    /// runs on an async runtime (which must not block), or the worker is gone.
    pub fn pause(&self) -> bool {
        if thread::current().id() == self.worker || Handle::try_current().is_ok() {
            return false;
        }
        let (ack, acked) = oneshot::channel();
        if self.control.send(Control::Pause(ack)).is_err() {
            return false;
        }
        acked.blocking_recv().is_ok()
    }

    pub fn resume(&self) {
        // A closed channel means the worker has stopped; nothing to resume.
        let _ = self.control.send(Control::Resume);
    }

    pub fn with_paused<T>(&self, f: impl FnOnce() -> T) -> T {
        let paused = self.pause();
        let result = f();
        if paused {
            self.resume();
        }
        result
    }
}

pub struct Console;

impl Console {
    /// Start the worker thread. The editor prints its prompt right away.
    pub fn spawn<S, I>(shell: Shell, editor: LineEditor<S>, input: I) -> io::Result<ConsoleHandle<S>>
    where
        S: Screen + Send + 'static,
        I: InputSource + 'static,
    {
        install_panic_hook();
        let running = Arc::new(AtomicBool::new(true));
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            shell,
            editor,
            input,
            running: Arc::clone(&running),
            control: control_rx,
            pause_depth: 0,
        };
        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker.run())?;

        let pauser = Pauser {
            control: control_tx,
            worker: handle.thread().id(),
        };
        info!("Console started");
        Ok(ConsoleHandle {
            pauser,
            running,
            worker: handle,
        })
    }
}

pub struct ConsoleHandle<S: Screen> {
    pauser: Pauser,
    running: Arc<AtomicBool>,
    worker: JoinHandle<ConsoleOutcome<S>>,
}

impl<S: Screen> ConsoleHandle<S> {
    pub fn pauser(&self) -> Pauser {
        self.pauser.clone()
    }

    pub fn pause(&self) -> bool {
        self.pauser.pause()
    }

    pub fn resume(&self) {
        self.pauser.resume();
    }

    pub fn with_paused<T>(&self, f: impl FnOnce() -> T) -> T {
        self.pauser.with_paused(f)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.worker.is_finished()
    }

    /// Ask the worker to stop after the current key event and wait for it.
    pub fn shutdown(self) -> io::Result<ConsoleOutcome<S>> {
        self.running.store(false, Ordering::Release);
        self.join()
    }

    /// Wait for the worker to stop on its own (`exit` or an input failure).
    pub fn join(self) -> io::Result<ConsoleOutcome<S>> {
        let outcome = self
            .worker
            .join()
            .map_err(|_| io::Error::other("console worker panicked"))?;
        info!(exit_code = ?outcome.exit_code, "Console stopped");
        Ok(outcome)
    }
}

struct Worker<S: Screen, I: InputSource> {
    shell: Shell,
    editor: LineEditor<S>,
    input: I,
    running: Arc<AtomicBool>,
    control: mpsc::UnboundedReceiver<Control>,
    pause_depth: usize,
}

impl<S: Screen, I: InputSource> Worker<S, I> {
    fn run(mut self) -> ConsoleOutcome<S> {
        let (exit_code, error) = match self.event_loop() {
            Ok(code) => (code, None),
            Err(e) => {
                error!(error = %e, "Console input failed");
                (None, Some(e))
            }
        };
        self.running.store(false, Ordering::Release);
        ConsoleOutcome {
            shell: self.shell,
            editor: self.editor,
            exit_code,
            error,
        }
    }

    fn event_loop(&mut self) -> io::Result<Option<i32>> {
        self.editor.start()?;
        while self.running.load(Ordering::Acquire) {
            self.drain_control()?;

            if let Some(event) = self.input.poll_key(POLL_INTERVAL)? {
                self.editor.handle_key(event, self.shell.history_mut())?;
            }

            while let Some(line) = self.editor.take_line() {
                if let Err(ControlSignal::Exit(code)) = self.shell.run_line(&line) {
                    debug!(code, "Exit requested");
                    return Ok(Some(code));
                }
                if self.pause_depth == 0 {
                    self.editor.resume(self.shell.history_mut())?;
                }
            }
        }
        Ok(None)
    }

    fn drain_control(&mut self) -> io::Result<()> {
        while let Ok(message) = self.control.try_recv() {
            match message {
                Control::Pause(ack) => {
                    if self.pause_depth == 0 {
                        self.editor.pause()?;
                    }
                    self.pause_depth += 1;
                    // The requester may have given up waiting.
                    let _ = ack.send(());
                }
                Control::Resume => {
                    self.pause_depth = self.pause_depth.saturating_sub(1);
                    if self.pause_depth == 0 {
                        self.editor.resume(self.shell.history_mut())?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Panics in command handlers are caught and reported by the shell; keep the
/// default hook from printing them into the raw-mode terminal as well.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if thread::current().name() == Some(WORKER_NAME) {
                debug!(panic = %info, "Panic on console worker");
            } else {
                previous(info);
            }
        }));
    });
}

/// `MakeWriter` for tracing that routes each log record around the console:
/// pause input, write the record to stderr, resume. Without an attached
/// console it writes to stderr directly.
#[derive(Clone, Default)]
pub struct LogWriter {
    console: Arc<Mutex<Option<Pauser>>>,
}

impl LogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, pauser: Pauser) {
        if let Ok(mut console) = self.console.lock() {
            *console = Some(pauser);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut console) = self.console.lock() {
            *console = None;
        }
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogRecord;

    fn make_writer(&'a self) -> Self::Writer {
        LogRecord {
            buf: Vec::new(),
            console: self.console.lock().ok().and_then(|c| c.clone()),
        }
    }
}

/// One buffered log record, written out when dropped.
pub struct LogRecord {
    buf: Vec<u8>,
    console: Option<Pauser>,
}

impl LogRecord {
    fn emit(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        let write = |bytes: &[u8]| {
            let mut stderr = io::stderr().lock();
            let _ = stderr.write_all(bytes);
            let _ = stderr.flush();
        };
        match &self.console {
            // The terminal is in raw mode while a console runs.
            Some(pauser) => pauser.with_paused(|| write(&crlf(&buf))),
            None => write(&buf),
        }
    }
}

impl Write for LogRecord {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogRecord {
    fn drop(&mut self) {
        self.emit();
    }
}

fn crlf(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 8);
    let mut prev = 0u8;
    for &b in bytes {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}

/// Key events from a shared queue; used by hosts that produce input
/// themselves and by tests.
#[derive(Clone, Default)]
pub struct QueueInput {
    events: Arc<Mutex<VecDeque<KeyEvent>>>,
}

impl QueueInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: KeyEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push_back(event);
        }
    }

    /// Queue a character event per char, `\n` as Enter.
    pub fn push_text(&self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.push(KeyEvent::key(Key::Enter));
            } else {
                self.push(KeyEvent::char(ch));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl InputSource for QueueInput {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        let next = self
            .events
            .lock()
            .map_err(|_| io::Error::other("input queue poisoned"))?
            .pop_front();
        if next.is_none() {
            thread::sleep(timeout.min(Duration::from_millis(5)));
        }
        Ok(next)
    }
}
