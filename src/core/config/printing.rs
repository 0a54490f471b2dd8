use crate::core::config::data::{path_display, Config};
use std::io::{self, Write};

impl Config {
    pub fn print_all(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Current configuration:")?;
        match &self.state_file {
            Some(path) => writeln!(out, "  state-file: {}", path_display(path))?,
            None => writeln!(out, "  state-file: (default)")?,
        }
        match &self.default_model {
            Some(model) => writeln!(out, "  default-model: {model}")?,
            None => writeln!(out, "  default-model: (unset)")?,
        }
        match self.request_timeout_secs {
            Some(secs) => writeln!(out, "  request-timeout-secs: {secs}")?,
            None => writeln!(out, "  request-timeout-secs: (none)")?,
        }
        match &self.log_level {
            Some(level) => writeln!(out, "  log-level: {level}")?,
            None => writeln!(out, "  log-level: (unset)")?,
        }
        Ok(())
    }
}
