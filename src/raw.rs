//! RAII raw-mode acquisition and the per-platform `RawSource` that supplies
//! `KeyReader` with unparsed bytes.
//!
//! Neither toggling raw mode nor reading bytes off the OS is part of the
//! editor's core state machine — this module is the seam where that
//! collaboration happens.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::terminal;

/// `true` while an `Editor`/`AsyncEditor` holds the terminal in raw mode.
///
/// A host application's own `SIGINT` handler can read this to decide whether
/// the interrupt was delivered to a raw-mode editor (which will see Ctrl-C as
/// a key event, not a signal) or to the rest of the program.
pub static EDITOR_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Enables raw mode on construction, restores it on drop — including on
/// panic unwind — so the terminal is never left in a broken state.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        EDITOR_ACTIVE.store(true, Ordering::Relaxed);
        log::trace!("raw mode entered");
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("failed to restore terminal mode: {e}");
        }
        EDITOR_ACTIVE.store(false, Ordering::Relaxed);
        log::trace!("raw mode exited");
    }
}

/// A non-blocking source of raw bytes. `KeyReader` parses what this yields;
/// it never interprets a byte itself.
pub trait RawSource: Send {
    /// Append any bytes currently available to `out`. Returns `true` if at
    /// least one byte was appended. Must not block.
    fn poll_bytes(&mut self, out: &mut Vec<u8>) -> io::Result<bool>;
}

#[cfg(unix)]
pub use posix::PosixRawSource as DefaultRawSource;
#[cfg(windows)]
pub use windows::WindowsRawSource as DefaultRawSource;
#[cfg(not(any(unix, windows)))]
pub use unsupported::UnsupportedRawSource as DefaultRawSource;

/// Construct the platform-default `RawSource`.
#[cfg(unix)]
pub fn default_source() -> io::Result<DefaultRawSource> {
    Ok(DefaultRawSource::new())
}

#[cfg(windows)]
pub fn default_source() -> io::Result<DefaultRawSource> {
    DefaultRawSource::new()
}

#[cfg(not(any(unix, windows)))]
pub fn default_source() -> io::Result<DefaultRawSource> {
    DefaultRawSource::new()
}

#[cfg(not(any(unix, windows)))]
mod unsupported {
    use super::RawSource;
    use std::io;

    /// Placeholder for platforms with no known raw byte source; every call
    /// fails with `PlatformNotSupported` once surfaced through `KeyReader`.
    pub struct UnsupportedRawSource;

    impl UnsupportedRawSource {
        pub fn new() -> io::Result<Self> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "no raw input source for this platform",
            ))
        }
    }

    impl RawSource for UnsupportedRawSource {
        fn poll_bytes(&mut self, _out: &mut Vec<u8>) -> io::Result<bool> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "unsupported platform"))
        }
    }
}

#[cfg(unix)]
mod posix {
    use super::RawSource;
    use std::io;

    /// Reads directly off `STDIN_FILENO` with `libc::poll` + `libc::read`,
    /// bypassing `std::io::Stdin`'s internal buffered reader so `poll` and
    /// `read` never disagree about what's pending.
    pub struct PosixRawSource {
        buf: [u8; 1024],
    }

    impl PosixRawSource {
        pub fn new() -> Self {
            PosixRawSource { buf: [0u8; 1024] }
        }
    }

    impl Default for PosixRawSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RawSource for PosixRawSource {
        fn poll_bytes(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
            let mut pollfd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };

            // 0ms timeout: purely a readiness check, never blocks.
            let ready = unsafe { libc::poll(&mut pollfd, 1, 0) };
            if ready < 0 {
                return Err(io::Error::last_os_error());
            }
            if ready == 0 || pollfd.revents & libc::POLLIN == 0 {
                if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"));
                }
                return Ok(false);
            }

            let n = unsafe {
                libc::read(
                    libc::STDIN_FILENO,
                    self.buf.as_mut_ptr() as *mut libc::c_void,
                    self.buf.len(),
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock || err.kind() == io::ErrorKind::Interrupted {
                    return Ok(false);
                }
                return Err(err);
            }
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin EOF"));
            }
            out.extend_from_slice(&self.buf[..n as usize]);
            Ok(true)
        }
    }
}

#[cfg(windows)]
mod windows {
    use super::RawSource;
    use std::io;
    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetNumberOfConsoleInputEvents, GetStdHandle, SetConsoleMode,
        ENABLE_ECHO_INPUT, ENABLE_LINE_INPUT, ENABLE_PROCESSED_INPUT, STD_INPUT_HANDLE,
    };
    use windows_sys::Win32::Storage::FileSystem::ReadFile;

    /// Reads raw bytes off the console input handle, with the console placed
    /// into a getch()-like mode (no line buffering, no local echo, Ctrl-C
    /// delivered as a key event instead of a signal).
    pub struct WindowsRawSource {
        handle: HANDLE,
        original_mode: u32,
    }

    impl WindowsRawSource {
        pub fn new() -> io::Result<Self> {
            unsafe {
                let handle = GetStdHandle(STD_INPUT_HANDLE);
                let mut original_mode = 0u32;
                if GetConsoleMode(handle, &mut original_mode) == 0 {
                    return Err(io::Error::last_os_error());
                }
                let raw_mode = original_mode
                    & !(ENABLE_LINE_INPUT | ENABLE_ECHO_INPUT | ENABLE_PROCESSED_INPUT);
                if SetConsoleMode(handle, raw_mode) == 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(WindowsRawSource { handle, original_mode })
            }
        }
    }

    impl Drop for WindowsRawSource {
        fn drop(&mut self) {
            unsafe {
                SetConsoleMode(self.handle, self.original_mode);
            }
        }
    }

    impl RawSource for WindowsRawSource {
        fn poll_bytes(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
            unsafe {
                let mut pending: u32 = 0;
                if GetNumberOfConsoleInputEvents(self.handle, &mut pending) == 0 {
                    return Err(io::Error::last_os_error());
                }
                if pending == 0 {
                    return Ok(false);
                }

                let mut buf = [0u8; 256];
                let mut read: u32 = 0;
                if ReadFile(
                    self.handle,
                    buf.as_mut_ptr(),
                    buf.len() as u32,
                    &mut read,
                    std::ptr::null_mut(),
                ) == 0
                {
                    return Err(io::Error::last_os_error());
                }
                if read == 0 {
                    return Ok(false);
                }
                out.extend_from_slice(&buf[..read as usize]);
                Ok(true)
            }
        }
    }
}
