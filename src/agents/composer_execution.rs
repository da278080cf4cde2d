use crate::error::{ComposerMrError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// ComposerExecutionAgent runs composer inside the project directory
pub struct ComposerExecutionAgent {
    composer_path: PathBuf,
    project_path: PathBuf,
}

impl ComposerExecutionAgent {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(composer_path: P, project_path: Q) -> Self {
        Self {
            composer_path: composer_path.as_ref().to_path_buf(),
            project_path: project_path.as_ref().to_path_buf(),
        }
    }

    /// Run `composer update --no-progress` plus any extra flags
    pub fn update(&self, extra_flags: &[String]) -> Result<()> {
        let args = Self::update_args(extra_flags);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.execute_composer_command(&args)
    }

    fn update_args(extra_flags: &[String]) -> Vec<String> {
        let mut args = vec!["update".to_string(), "--no-progress".to_string()];
        args.extend(
            extra_flags
                .iter()
                .map(|flag| flag.trim())
                .filter(|flag| !flag.is_empty())
                .map(str::to_string),
        );
        args
    }

    /// Execute a composer command, echoing its output above a spinner
    fn execute_composer_command(&self, args: &[&str]) -> Result<()> {
        println!("Executing: {} {}", self.composer_path.display(), args.join(" "));

        let mut child = Command::new(&self.composer_path)
            .current_dir(&self.project_path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ComposerMrError::ComposerExecution(format!("Failed to spawn process: {e}"))
            })?;

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("composer update");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let stdout_echo = child.stdout.take().map(|stdout| {
            let spinner = spinner.clone();
            thread::spawn(move || echo_lines(stdout, &spinner))
        });

        // composer reports package operations on stderr
        if let Some(stderr) = child.stderr.take() {
            echo_lines(stderr, &spinner);
        }
        if let Some(handle) = stdout_echo {
            join_echo(handle);
        }

        let status = child.wait().map_err(|e| {
            ComposerMrError::ComposerExecution(format!("Failed to wait for process: {e}"))
        })?;
        spinner.finish_and_clear();

        if !status.success() {
            return Err(ComposerMrError::ComposerExecution(format!(
                "composer exited with code: {}",
                status.code().unwrap_or(-1)
            )));
        }

        Ok(())
    }
}

fn echo_lines<R: Read>(reader: R, spinner: &ProgressBar) {
    for line in BufReader::new(reader).lines().map_while(std::result::Result::ok) {
        log::debug!("composer: {line}");
        spinner.println(&line);
    }
}

/// Wait for an echo thread; returns false when it panicked.
fn join_echo(handle: thread::JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            log::warn!("composer stdout echo thread panicked, some output may be missing");
            false
        }
    }
}
