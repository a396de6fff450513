// src/exec/toolchain.rs

//! Command templates for every external collaborator.
//!
//! Templates use `${NAME}` placeholders and are rendered strictly against
//! the context bindings right before the command runs.

use std::time::Duration;

use regex::Regex;

use crate::config::model::ToolsSection;
use crate::errors::{PipelineError, Result};
use crate::templates::{render_strict, Bindings};

const DEFAULT_PYTHON: &str = "python";
const DEFAULT_LINTER: &str = "${PYTHON} -m flake8 ${SETUP_DIR}";
const DEFAULT_TOX: &str = "tox -e ${PY_TAG}";
const DEFAULT_IMPORT_TEST: &str =
    "${PYTHON} -c \"import ${MAIN} as m; print('version:', getattr(m, '__version__', '?'))\"";
const DEFAULT_TEST_RUNNER: &str = "${PYTHON} -m pytest -xv ${TESTS}";
const DEFAULT_CLI_TEST: &str = "${PYTHON} -m ${MAIN} -h";
const DEFAULT_BACKPORT: &str =
    "python3 -m pimpy backport -p ${PKG} -s ${SRC_FILES} -m ${MAIN}";
const DEFAULT_BUILDER: &str = "${PYTHON} setup.py bdist_wheel -q -d ${DIST_DIR}";
const DEFAULT_DEV_INSTALL: &str = "${PIP} install --user -e .";
const DEFAULT_SHOW: &str = "${PIP} show ${PKG}";
const DEFAULT_INSTALL: &str = "pip install ${ARTIFACT}";
const DEFAULT_UNINSTALL: &str = "pip uninstall -y ${PKG}";
const DEFAULT_ABSENT_PATTERN: &str = r"(?i)not installed|skipping";
const DEFAULT_SIGNER: &str = "gpg --detach-sign -a ${ARTIFACT}";
const DEFAULT_UPLOADER: &str = "twine upload --repository ${REPOSITORY} ${ARTIFACTS}";
const DEFAULT_DOCKER: &str = "docker run --rm python:${PY} bash -c \
     'set -o errexit; pip install ${PKG}; python -c \"import ${MAIN}\"; python -m ${MAIN} -h; ${TEST_SCRIPTS}'";
const DEFAULT_ARTIFACT_PATTERN: &str = "${PKG}*${PY_TAG}*.whl";
const DEFAULT_TEST_REPOSITORY: &str = "testpypi";
const DEFAULT_REPOSITORY: &str = "pypi";

/// Resolved collaborator command templates.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Interpreter used to probe the active runtime version.
    pub python: String,
    pub linter: String,
    pub tox: String,
    pub import_test: String,
    pub test_runner: String,
    pub cli_test: String,
    pub backport: String,
    pub builder: String,
    pub dev_install: String,
    pub show: String,
    pub install: String,
    pub uninstall: String,
    /// Matches uninstall output that means "package was not installed".
    pub absent_pattern: Regex,
    pub signer: String,
    pub uploader: String,
    pub docker: String,
    /// Glob for the artifact of one runtime tag inside the output directory.
    pub artifact_pattern: String,
    pub test_repository: String,
    pub repository: String,
    pub timeout: Option<Duration>,
}

impl Default for Toolchain {
    fn default() -> Self {
        // The built-in pattern is a constant known to compile.
        Self::from_config(&ToolsSection::default()).expect("default toolchain is valid")
    }
}

impl Toolchain {
    pub fn from_config(tools: &ToolsSection) -> Result<Self> {
        let pick = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };

        let absent = pick(&tools.absent_pattern, DEFAULT_ABSENT_PATTERN);
        let absent_pattern = Regex::new(&absent).map_err(|e| {
            PipelineError::ConfigError(format!("invalid absent_pattern '{absent}': {e}"))
        })?;

        Ok(Self {
            python: pick(&tools.python, DEFAULT_PYTHON),
            linter: pick(&tools.linter, DEFAULT_LINTER),
            tox: pick(&tools.tox, DEFAULT_TOX),
            import_test: pick(&tools.import_test, DEFAULT_IMPORT_TEST),
            test_runner: pick(&tools.test_runner, DEFAULT_TEST_RUNNER),
            cli_test: pick(&tools.cli_test, DEFAULT_CLI_TEST),
            backport: pick(&tools.backport, DEFAULT_BACKPORT),
            builder: pick(&tools.builder, DEFAULT_BUILDER),
            dev_install: pick(&tools.dev_install, DEFAULT_DEV_INSTALL),
            show: pick(&tools.show, DEFAULT_SHOW),
            install: pick(&tools.install, DEFAULT_INSTALL),
            uninstall: pick(&tools.uninstall, DEFAULT_UNINSTALL),
            absent_pattern,
            signer: pick(&tools.signer, DEFAULT_SIGNER),
            uploader: pick(&tools.uploader, DEFAULT_UPLOADER),
            docker: pick(&tools.docker, DEFAULT_DOCKER),
            artifact_pattern: pick(&tools.artifact_pattern, DEFAULT_ARTIFACT_PATTERN),
            test_repository: pick(&tools.test_repository, DEFAULT_TEST_REPOSITORY),
            repository: pick(&tools.repository, DEFAULT_REPOSITORY),
            timeout: tools.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Render a template field against the given bindings.
    pub fn render(&self, template: &str, bindings: &Bindings) -> Result<String> {
        render_strict(template, bindings)
    }

    /// Whether uninstall output reports that the package was not installed.
    pub fn reports_absence(&self, output: &str) -> bool {
        self.absent_pattern.is_match(output)
    }
}
