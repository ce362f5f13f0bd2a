//! PDF/PNG rendering through an external program.

use std::{
  io::Write as _,
  process::{Command, Stdio},
};

use dtaxi_report::{Error, RenderTarget, Renderer, Result};

/// Environment variable telling the program what to produce (`pdf`/`png`).
pub const FORMAT_VAR: &str = "DTAXI_RENDER_FORMAT";
/// `portrait` or `landscape`; empty for images.
pub const ORIENTATION_VAR: &str = "DTAXI_RENDER_ORIENTATION";

/// Runs `program args...` once per document: HTML goes to stdin, the
/// rendered bytes come back on stdout.
#[derive(Debug, Clone)]
pub struct ProcessRenderer {
  program: String,
  args:    Vec<String>,
}

impl ProcessRenderer {
  /// `None` for an empty command line.
  pub fn new(command: &[String]) -> Option<Self> {
    let (program, args) = command.split_first()?;
    Some(Self { program: program.clone(), args: args.to_vec() })
  }

  pub fn program(&self) -> &str { &self.program }
}

impl Renderer for ProcessRenderer {
  fn render(&self, html: &str, target: RenderTarget) -> Result<Vec<u8>> {
    let orientation = match target {
      RenderTarget::Pdf { orientation } => orientation.to_string(),
      RenderTarget::Png => String::new(),
    };

    let mut child = Command::new(&self.program)
      .args(&self.args)
      .env(FORMAT_VAR, target.extension())
      .env(ORIENTATION_VAR, orientation)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|e| Error::renderer(format!("cannot start {}: {e}", self.program)))?;

    // Feed stdin from another thread so a large document cannot deadlock
    // against a full stdout pipe.
    let mut stdin = child
      .stdin
      .take()
      .ok_or_else(|| Error::renderer("renderer stdin unavailable"))?;
    let input = html.to_owned();
    let feeder = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child
      .wait_with_output()
      .map_err(|e| Error::renderer(format!("{} did not finish: {e}", self.program)))?;
    let fed = feeder
      .join()
      .map_err(|_| Error::renderer("renderer input thread panicked"))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(Error::renderer(format!(
        "{} exited with {}: {}",
        self.program,
        output.status,
        stderr.trim()
      )));
    }
    fed.map_err(|e| Error::renderer(format!("cannot write to {}: {e}", self.program)))?;
    if output.stdout.is_empty() {
      return Err(Error::renderer(format!("{} produced no output", self.program)));
    }

    tracing::debug!(program = %self.program, bytes = output.stdout.len(), "document rendered");
    Ok(output.stdout)
  }
}
