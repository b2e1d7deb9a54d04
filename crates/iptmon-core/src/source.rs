//! Listing sources.
//!
//! A [`ListingSource`] produces the raw rule listing text. The production
//! source shells out to `iptables`; tests substitute closures that return
//! canned text.

use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Produces the current rule listing, one synchronous round trip per call.
pub trait ListingSource {
    /// Fetches the listing text.
    ///
    /// # Errors
    /// Returns an error if the listing could not be produced.
    fn fetch(&self) -> Result<String>;
}

impl<F> ListingSource for F
where
    F: Fn() -> Result<String>,
{
    fn fetch(&self) -> Result<String> {
        self()
    }
}

/// Runs `<program> [-t <table>] -S <chain> -v` and returns its stdout.
#[derive(Debug, Clone)]
pub struct IptablesCommand {
    pub program: String,
    pub table: Option<String>,
    pub chain: String,
}

impl IptablesCommand {
    pub fn new(program: impl Into<String>, table: Option<String>, chain: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            table,
            chain: chain.into(),
        }
    }

    /// Arguments passed to the program, without the program itself.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if let Some(table) = &self.table {
            args.push("-t".to_string());
            args.push(table.clone());
        }
        args.push("-S".to_string());
        args.push(self.chain.clone());
        args.push("-v".to_string());
        args
    }

    /// Human-readable command line for diagnostics.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args());
        parts.join(" ")
    }
}

impl ListingSource for IptablesCommand {
    fn fetch(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.display(),
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
