//! Launching applications and web pages
//!
//! Windows runs the classic shell commands, macOS goes through `open`, and other
//! Unix systems use `xdg-open` for URLs and the first installed candidate binary
//! for applications.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// How to start one desktop application on each platform
#[derive(Debug, PartialEq, Eq)]
pub struct AppSpec {
    /// Display name
    pub name: &'static str,
    /// Windows argv
    pub windows: &'static [&'static str],
    /// Windows install path relative to the roaming app data directory, preferred when present
    pub windows_install: Option<&'static str>,
    /// macOS application name for `open -a`
    pub macos: Option<&'static str>,
    /// Candidate binaries on Linux and other Unix systems, first found wins
    pub unix: &'static [&'static str],
}

/// What a command opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchTarget {
    /// Open a URL in the default browser
    Url(&'static str),
    /// Start a desktop application
    App(&'static AppSpec),
    /// Start an application, or open a URL when it is not installed
    AppOrUrl(&'static AppSpec, &'static str),
}

/// Process-launch collaborator
pub trait Launcher {
    /// Start `target` without waiting for it
    ///
    /// # Errors
    ///
    /// Returns error if nothing could be started
    fn launch(&self, target: &LaunchTarget) -> Result<()>;
}

/// Operating system family, decides the launch commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Unix,
}

impl Platform {
    /// Platform this binary was built for
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Unix
        }
    }
}

/// Launches through real OS processes
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    platform: Platform,
    app_data: Option<PathBuf>,
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLauncher {
    /// Launcher for the current platform
    #[must_use]
    pub fn new() -> Self {
        let app_data = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf());
        Self::with_platform(Platform::current(), app_data)
    }

    /// Launcher for an explicit platform and roaming app data directory
    #[must_use]
    pub const fn with_platform(platform: Platform, app_data: Option<PathBuf>) -> Self {
        Self { platform, app_data }
    }

    /// Build the command that opens `target`
    ///
    /// # Errors
    ///
    /// Returns error if the application is not available on this platform
    pub fn command_for(&self, target: &LaunchTarget) -> Result<Command> {
        match *target {
            LaunchTarget::Url(url) => Ok(self.url_command(url)),
            LaunchTarget::App(app) => self.app_command(app),
            LaunchTarget::AppOrUrl(app, url) => self.app_command(app).or_else(|e| {
                tracing::debug!(app = app.name, error = %e, url, "falling back to web");
                Ok(self.url_command(url))
            }),
        }
    }

    fn url_command(&self, url: &str) -> Command {
        match self.platform {
            Platform::Windows => {
                let mut cmd = Command::new("cmd");
                cmd.args(["/C", "start", "", url]);
                cmd
            }
            Platform::MacOs => {
                let mut cmd = Command::new("open");
                cmd.arg(url);
                cmd
            }
            Platform::Unix => {
                let mut cmd = Command::new("xdg-open");
                cmd.arg(url);
                cmd
            }
        }
    }

    fn app_command(&self, app: &AppSpec) -> Result<Command> {
        match self.platform {
            Platform::Windows => {
                let installed = app
                    .windows_install
                    .zip(self.app_data.as_ref())
                    .map(|(rel, base)| base.join(rel));

                if let Some(path) = installed {
                    if path.exists() {
                        return Ok(Command::new(path));
                    }
                    // Only an installed copy counts for these apps
                    return Err(Error::Action(format!("{} is not installed", app.name)));
                }

                let (program, args) = app
                    .windows
                    .split_first()
                    .ok_or_else(|| unavailable(app, "Windows"))?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
            Platform::MacOs => {
                let name = app.macos.ok_or_else(|| unavailable(app, "macOS"))?;
                let mut cmd = Command::new("open");
                cmd.args(["-a", name]);
                Ok(cmd)
            }
            Platform::Unix => app
                .unix
                .iter()
                .find_map(|candidate| which::which(candidate).ok())
                .map(Command::new)
                .ok_or_else(|| unavailable(app, "this system")),
        }
    }
}

impl Launcher for SystemLauncher {
    fn launch(&self, target: &LaunchTarget) -> Result<()> {
        let mut cmd = self.command_for(target)?;
        tracing::info!(
            program = ?cmd.get_program(),
            args = ?cmd.get_args().collect::<Vec<_>>(),
            "launching"
        );

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Action(format!("failed to launch {:?}: {e}", cmd.get_program())))?;

        // Reap in the background so exited children don't linger
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(())
    }
}

fn unavailable(app: &AppSpec, platform: &str) -> Error {
    Error::Action(format!("no {} application found on {platform}", app.name))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    static EDITOR: AppSpec = AppSpec {
        name: "Editor",
        windows: &["notepad"],
        windows_install: None,
        macos: Some("TextEdit"),
        unix: &["definitely-not-installed-editor"],
    };

    static MUSIC: AppSpec = AppSpec {
        name: "Music",
        windows: &[],
        windows_install: Some("Music/Music.exe"),
        macos: None,
        unix: &[],
    };

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_url_commands() {
        let target = LaunchTarget::Url("https://www.youtube.com");

        let win = SystemLauncher::with_platform(Platform::Windows, None);
        let cmd = win.command_for(&target).unwrap();
        assert_eq!(cmd.get_program(), "cmd");
        assert_eq!(args(&cmd), ["/C", "start", "", "https://www.youtube.com"]);

        let mac = SystemLauncher::with_platform(Platform::MacOs, None);
        let cmd = mac.command_for(&target).unwrap();
        assert_eq!(cmd.get_program(), "open");

        let unix = SystemLauncher::with_platform(Platform::Unix, None);
        let cmd = unix.command_for(&target).unwrap();
        assert_eq!(cmd.get_program(), "xdg-open");
        assert_eq!(args(&cmd), ["https://www.youtube.com"]);
    }

    #[test]
    fn test_windows_app_argv() {
        let win = SystemLauncher::with_platform(Platform::Windows, None);
        let cmd = win.command_for(&LaunchTarget::App(&EDITOR)).unwrap();
        assert_eq!(cmd.get_program(), "notepad");
        assert!(args(&cmd).is_empty());
    }

    #[test]
    fn test_macos_app_uses_open() {
        let mac = SystemLauncher::with_platform(Platform::MacOs, None);
        let cmd = mac.command_for(&LaunchTarget::App(&EDITOR)).unwrap();
        assert_eq!(cmd.get_program(), "open");
        assert_eq!(args(&cmd), ["-a", "TextEdit"]);

        assert!(mac.command_for(&LaunchTarget::App(&MUSIC)).is_err());
    }

    #[test]
    fn test_missing_unix_app_is_action_error() {
        let unix = SystemLauncher::with_platform(Platform::Unix, None);
        let result = unix.command_for(&LaunchTarget::App(&EDITOR));
        assert!(matches!(result, Err(Error::Action(_))));
    }

    #[test]
    fn test_installed_app_preferred_over_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Music")).unwrap();
        std::fs::write(dir.path().join("Music/Music.exe"), b"").unwrap();

        let win = SystemLauncher::with_platform(Platform::Windows, Some(dir.path().to_path_buf()));
        let cmd = win
            .command_for(&LaunchTarget::AppOrUrl(&MUSIC, "https://music.example"))
            .unwrap();
        assert_eq!(cmd.get_program(), dir.path().join("Music/Music.exe").as_os_str());
    }

    #[test]
    fn test_missing_app_falls_back_to_url() {
        let dir = tempfile::tempdir().unwrap();
        let win = SystemLauncher::with_platform(Platform::Windows, Some(dir.path().to_path_buf()));
        let cmd = win
            .command_for(&LaunchTarget::AppOrUrl(&MUSIC, "https://music.example"))
            .unwrap();
        assert_eq!(cmd.get_program(), "cmd");
        assert_eq!(args(&cmd), ["/C", "start", "", "https://music.example"]);
    }
}
