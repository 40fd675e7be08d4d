//! Privilege escalation for link creation
//!
//! Creating symbolic links on Windows needs administrator rights (or
//! Developer Mode). When the current process is not elevated, the pending
//! batch is handed to a second copy of this binary started through the
//! `runas` verb, which runs `vend link <payload>`.

use crate::error::Result;

use super::LinkRequest;

/// Runs a batch of link requests with elevated rights
pub trait Escalator: Send + Sync {
    fn run_elevated(&self, batch: &[LinkRequest]) -> Result<()>;
}

/// Whether links need elevation on this platform for this process
pub fn needs_elevation() -> bool {
    #[cfg(windows)]
    {
        !windows::is_elevated()
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Escalator of the running platform, if it has one
pub fn platform_escalator() -> Option<Box<dyn Escalator>> {
    #[cfg(windows)]
    {
        Some(Box::new(windows::RunAs::default()))
    }
    #[cfg(not(windows))]
    {
        None
    }
}

#[cfg(windows)]
mod windows {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::time::Duration;

    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0};
    use windows_sys::Win32::Security::{
        GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation,
    };
    use windows_sys::Win32::System::Threading::{
        GetCurrentProcess, GetExitCodeProcess, OpenProcessToken, WaitForSingleObject,
    };
    use windows_sys::Win32::UI::Shell::{SEE_MASK_NOCLOSEPROCESS, SHELLEXECUTEINFOW, ShellExecuteExW};
    use windows_sys::Win32::UI::WindowsAndMessaging::SW_HIDE;

    use super::{Escalator, LinkRequest};
    use crate::error::{Result, VendError};
    use crate::link::payload;

    fn wide(value: &OsStr) -> Vec<u16> {
        value.encode_wide().chain(Some(0)).collect()
    }

    /// Whether the process token is elevated
    pub fn is_elevated() -> bool {
        let mut token: HANDLE = std::ptr::null_mut();
        // SAFETY: the pseudo handle of the current process is always valid and
        // `token` is a valid out pointer.
        if unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) } == 0 {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
        let mut returned = 0u32;
        #[allow(clippy::cast_possible_truncation)]
        let size = size_of::<TOKEN_ELEVATION>() as u32;
        // SAFETY: `elevation` is a TOKEN_ELEVATION of `size` bytes and `token`
        // was opened above with TOKEN_QUERY.
        let ok = unsafe {
            GetTokenInformation(
                token,
                TokenElevation,
                (&raw mut elevation).cast(),
                size,
                &mut returned,
            )
        };
        // SAFETY: `token` is owned by this function.
        unsafe { CloseHandle(token) };

        ok != 0 && elevation.TokenIsElevated != 0
    }

    /// Re-runs this binary through the `runas` verb
    pub struct RunAs {
        /// How long to wait for the helper before returning anyway
        pub grace: Duration,
    }

    impl Default for RunAs {
        fn default() -> Self {
            Self {
                grace: Duration::from_secs(10),
            }
        }
    }

    impl Escalator for RunAs {
        fn run_elevated(&self, batch: &[LinkRequest]) -> Result<()> {
            let exe = std::env::current_exe().map_err(|e| VendError::ElevationFailed {
                reason: format!("Cannot locate own executable: {e}"),
            })?;
            let arguments = format!("link {}", payload::encode(batch)?);

            let verb = wide(OsStr::new("runas"));
            let file = wide(exe.as_os_str());
            let parameters = wide(OsStr::new(&arguments));

            // SAFETY: SHELLEXECUTEINFOW is a plain C struct; all-zero is its
            // documented empty state.
            let mut info: SHELLEXECUTEINFOW = unsafe { std::mem::zeroed() };
            #[allow(clippy::cast_possible_truncation)]
            {
                info.cbSize = size_of::<SHELLEXECUTEINFOW>() as u32;
            }
            info.fMask = SEE_MASK_NOCLOSEPROCESS;
            info.lpVerb = verb.as_ptr();
            info.lpFile = file.as_ptr();
            info.lpParameters = parameters.as_ptr();
            info.nShow = SW_HIDE;

            log::debug!("Requesting elevation to create {} links", batch.len());
            // SAFETY: every string pointer in `info` outlives the call.
            if unsafe { ShellExecuteExW(&mut info) } == 0 {
                return Err(VendError::ElevationFailed {
                    reason: std::io::Error::last_os_error().to_string(),
                });
            }
            if info.hProcess.is_null() {
                return Ok(());
            }

            let grace_ms = u32::try_from(self.grace.as_millis()).unwrap_or(u32::MAX);
            // SAFETY: `hProcess` was returned by ShellExecuteExW because of
            // SEE_MASK_NOCLOSEPROCESS and is closed below.
            let waited = unsafe { WaitForSingleObject(info.hProcess, grace_ms) };
            let result = if waited == WAIT_OBJECT_0 {
                let mut code = 0u32;
                // SAFETY: see above.
                unsafe { GetExitCodeProcess(info.hProcess, &mut code) };
                if code == 0 {
                    Ok(())
                } else {
                    Err(VendError::ElevationFailed {
                        reason: format!("Link helper exited with code {code}"),
                    })
                }
            } else {
                log::debug!(
                    "Elevated link helper still running after {}s",
                    self.grace.as_secs()
                );
                Ok(())
            };
            // SAFETY: see above.
            unsafe { CloseHandle(info.hProcess) };
            result
        }
    }
}
