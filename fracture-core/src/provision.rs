//! Provisioning steps run on every target before an attack.
//!
//! The sequence is fixed: find the working directory, make sure the
//! interpreter exists, then install the agent package into a virtualenv
//! under the working directory. A runner executes the steps in order and
//! stops at the first failure.

use serde::Serialize;
use std::fmt;

/// One provisioning step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProvisionStep {
    /// Print the remote working directory.
    CheckWorkingDirectory,
    /// Locate the interpreter; fails if it is not installed.
    CheckInterpreter {
        /// Interpreter binary, e.g. `python3`.
        interpreter: String,
    },
    /// Create a virtualenv and install the agent package into it.
    InstallPackage {
        /// Package specifier passed to pip.
        package: String,
        /// Virtualenv directory, relative to the working directory.
        virtualenv: String,
    },
}

impl ProvisionStep {
    /// The standard sequence for the given interpreter, package and virtualenv.
    pub fn sequence(interpreter: &str, package: &str, virtualenv: &str) -> Vec<ProvisionStep> {
        vec![
            ProvisionStep::CheckWorkingDirectory,
            ProvisionStep::CheckInterpreter {
                interpreter: interpreter.to_string(),
            },
            ProvisionStep::InstallPackage {
                package: package.to_string(),
                virtualenv: virtualenv.to_string(),
            },
        ]
    }

    /// Human-readable step name.
    pub fn name(&self) -> &'static str {
        match self {
            ProvisionStep::CheckWorkingDirectory => "check working directory",
            ProvisionStep::CheckInterpreter { .. } => "check interpreter",
            ProvisionStep::InstallPackage { .. } => "install package",
        }
    }

    /// Shell command for this step.
    ///
    /// `workdir` and `interpreter_path` are the outputs of the earlier steps;
    /// they are only consulted by [`ProvisionStep::InstallPackage`].
    pub fn command(&self, workdir: &str, interpreter_path: &str) -> String {
        match self {
            ProvisionStep::CheckWorkingDirectory => "pwd".to_string(),
            ProvisionStep::CheckInterpreter { interpreter } => {
                format!("which {}", shell_quote(interpreter))
            }
            ProvisionStep::InstallPackage {
                package,
                virtualenv,
            } => format!(
                "cd {dir} && {py} -m venv {venv} && {venv}/bin/pip install --quiet {pkg}",
                dir = shell_quote(workdir),
                py = shell_quote(interpreter_path),
                venv = shell_quote(virtualenv),
                pkg = shell_quote(package),
            ),
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-quote a word for a POSIX shell.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_./=:@%+,".contains(&b));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
