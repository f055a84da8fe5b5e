use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use libc::{c_int, sighandler_t};
use signal_hook::consts::{SIGCHLD, SIGCONT, SIGTERM, SIGTSTP};

use super::{cerr, Pid, ProcessError};

// Only atomics are touched from the handler.
static SUSPEND_ARMED: AtomicBool = AtomicBool::new(false);
static SUSPEND_REQUESTED: AtomicBool = AtomicBool::new(false);

static WAKE: OnceLock<WakeStream> = OnceLock::new();
static WAKE_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Socket pair the handlers write a byte to, so a foreground wait can sleep
/// in `poll` without missing a signal that lands just before it.
struct WakeStream {
    rx: UnixStream,
    tx: UnixStream,
}

impl WakeStream {
    fn new() -> io::Result<Self> {
        let (rx, tx) = UnixStream::pair()?;
        rx.set_nonblocking(true)?;
        Ok(Self { rx, tx })
    }
}

fn nudge() {
    if let Some(tx) = WAKE.get().map(|stream| stream.tx.as_raw_fd()) {
        let byte = 1u8;
        unsafe {
            libc::send(tx, (&byte as *const u8).cast(), 1, libc::MSG_DONTWAIT);
        }
    }
}

pub extern "C" fn handle_sigtstp(_: c_int) {
    if SUSPEND_ARMED.load(Ordering::SeqCst) {
        SUSPEND_REQUESTED.store(true, Ordering::SeqCst);
        nudge();
    }
}

extern "C" fn handle_sigchld(_: c_int) {
    nudge();
}

fn install(signal: c_int, handler: sighandler_t, flags: c_int) -> Result<(), ProcessError> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler;
        action.sa_flags = flags;
        libc::sigemptyset(&mut action.sa_mask);
        cerr(libc::sigaction(signal, &action, std::ptr::null_mut()))
            .map_err(|e| ProcessError::SignalError(e.to_string()))?;
    }
    Ok(())
}

/// Installs the suspend handler without `SA_RESTART`, so a blocking
/// `waitpid` returns `EINTR` when the signal lands, and a child-state handler
/// that wakes [`wait_for_wakeup`] whenever a child exits or stops.
pub fn install_suspend_handler() -> Result<(), ProcessError> {
    if WAKE.get().is_none() {
        let stream = WakeStream::new().map_err(|e| ProcessError::SignalError(e.to_string()))?;
        // A concurrent first call may win; either stream works.
        let _ = WAKE.set(stream);
    }
    install(SIGTSTP, handle_sigtstp as *const () as sighandler_t, 0)?;
    install(SIGCHLD, handle_sigchld as *const () as sighandler_t, libc::SA_RESTART)?;
    WAKE_INSTALLED.store(true, Ordering::SeqCst);
    Ok(())
}

pub(crate) fn wakeups_installed() -> bool {
    WAKE_INSTALLED.load(Ordering::SeqCst)
}

/// Sleeps until a handler has written to the wake stream, then drains it.
/// Returns early on `EINTR`; callers re-check their condition either way.
pub(crate) fn wait_for_wakeup() -> io::Result<()> {
    let Some(stream) = WAKE.get() else {
        return Err(io::Error::other("wake stream not initialized"));
    };
    let mut fds = [libc::pollfd {
        fd: stream.rx.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    }];
    match cerr(unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as _, -1) }) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
        Err(e) => return Err(e),
    }

    let mut buf = [0u8; 64];
    loop {
        match (&stream.rx).read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// While alive, a suspend signal cancels the foreground wait. Outside of it
/// the signal is ignored.
#[derive(Debug)]
pub struct SuspendGuard {
    _private: (),
}

impl SuspendGuard {
    pub fn arm() -> Self {
        SUSPEND_REQUESTED.store(false, Ordering::SeqCst);
        SUSPEND_ARMED.store(true, Ordering::SeqCst);
        Self { _private: () }
    }
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        SUSPEND_ARMED.store(false, Ordering::SeqCst);
        SUSPEND_REQUESTED.store(false, Ordering::SeqCst);
    }
}

pub fn take_suspend_request() -> bool {
    SUSPEND_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Keeps Ctrl-C from killing the shell itself; the foreground child still
/// receives it from the terminal.
///
/// The suspend signal is blocked while the handler thread is spawned so the
/// thread inherits a mask that keeps it from stealing that signal.
pub fn setup_interrupt_handler(quiet: bool) -> Result<(), ProcessError> {
    let blocked = block_suspend()?;
    let result = ctrlc::set_handler(move || {
        if !quiet {
            println!();
        }
        log::debug!("interrupt received");
    });
    restore_mask(&blocked)?;
    result.map_err(|e| ProcessError::SignalError(e.to_string()))
}

fn block_suspend() -> Result<libc::sigset_t, ProcessError> {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        let mut previous: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, SIGTSTP);
        let rc = libc::pthread_sigmask(libc::SIG_BLOCK, &set, &mut previous);
        if rc != 0 {
            return Err(ProcessError::SignalError(
                io::Error::from_raw_os_error(rc).to_string(),
            ));
        }
        Ok(previous)
    }
}

fn restore_mask(previous: &libc::sigset_t) -> Result<(), ProcessError> {
    let rc = unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, previous, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(ProcessError::SignalError(
            io::Error::from_raw_os_error(rc).to_string(),
        ));
    }
    Ok(())
}

pub fn continue_process(pid: Pid) -> io::Result<()> {
    cerr(unsafe { libc::kill(pid, SIGCONT) }).map(|_| ())
}

/// Sends the termination signal to every process in the shell's process
/// group. The shell itself survives it.
pub fn broadcast_terminate() -> Result<(), ProcessError> {
    let shield = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&shield))
        .map_err(|e| ProcessError::SignalError(e.to_string()))?;

    log::info!("sending {} to process group", signal_label(SIGTERM));
    cerr(unsafe { libc::kill(0, SIGTERM) })
        .map_err(|e| ProcessError::SignalError(e.to_string()))?;
    Ok(())
}

pub fn signal_label(signal: c_int) -> String {
    signal_hook::low_level::signal_name(signal)
        .map(str::to_string)
        .unwrap_or_else(|| format!("signal {}", signal))
}
