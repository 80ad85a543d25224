use crate::lifecycle::{EnvAction, Phase};
use crate::CoreError;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use towerup_iaas::{IaasEnvironment, ReleaseCatalog};
use towerup_runner::CommandRunner;
use towerup_store::{StateStore, STATE_KEY, VARS_KEY};
use towerup_template::{render, Variables};
use tracing::{debug, info, warn};

pub const DEFAULT_BOSH_PATH: &str = "bosh";
/// Name the director is deployed under.
pub const DIRECTOR_NAME: &str = "bosh";
/// Name of the Concourse deployment on the director.
pub const DEPLOYMENT_NAME: &str = "concourse";

const ADMIN_CLIENT: &str = "admin";
const MANIFEST_FILE: &str = "director.yml";
const DETACHABLE_ACTION: &str = "deploy";

/// Director identity embedded into the manifest on every lifecycle pass.
#[derive(Clone, Default)]
pub struct DirectorCredentials {
    pub admin_password: String,
    pub certificate: String,
    pub private_key: String,
    pub ca: String,
}

impl fmt::Debug for DirectorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectorCredentials")
            .field("admin_password", &"<redacted>")
            .field("certificate", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .field("ca", &self.ca.len())
            .finish()
    }
}

/// Connection parameters for a running director.
#[derive(Clone, Default)]
pub struct DirectorSession {
    pub ip: String,
    pub admin_password: String,
    /// PEM-encoded CA that signed the director certificate.
    pub ca_cert: String,
}

impl fmt::Debug for DirectorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectorSession")
            .field("ip", &self.ip)
            .field("admin_password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Drives the `bosh` binary through director lifecycle passes and
/// authenticated follow-on operations.
///
/// The engine holds no per-deployment state; every call is one independent
/// pass. Scratch files live in process-unique temporary locations and are
/// removed before the call returns, whatever the outcome.
pub struct Engine {
    runner: Box<dyn CommandRunner>,
    releases: ReleaseCatalog,
    bosh_path: String,
}

impl Engine {
    pub fn new(runner: Box<dyn CommandRunner>, releases: ReleaseCatalog) -> Self {
        Self {
            runner,
            releases,
            bosh_path: DEFAULT_BOSH_PATH.to_owned(),
        }
    }

    /// Use the `bosh` binary at `path` instead of the one on `PATH`.
    #[must_use]
    pub fn with_bosh_path(mut self, path: impl Into<String>) -> Self {
        self.bosh_path = path.into();
        self
    }

    pub fn bosh_path(&self) -> &str {
        &self.bosh_path
    }

    /// Create or update the director.
    pub fn create_env(
        &self,
        store: &dyn StateStore,
        env: &dyn IaasEnvironment,
        credentials: &DirectorCredentials,
        tags: &BTreeMap<String, String>,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        self.run_env(EnvAction::CreateEnv, store, env, credentials, tags, sink)
    }

    /// Tear the director down.
    pub fn delete_env(
        &self,
        store: &dyn StateStore,
        env: &dyn IaasEnvironment,
        credentials: &DirectorCredentials,
        tags: &BTreeMap<String, String>,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        self.run_env(EnvAction::DeleteEnv, store, env, credentials, tags, sink)
    }

    fn director_variables(
        &self,
        credentials: &DirectorCredentials,
        tags: &BTreeMap<String, String>,
    ) -> Variables {
        let mut vars = Variables::new()
            .with("director_name", DIRECTOR_NAME)
            .with("admin_password", credentials.admin_password.as_str())
            .with("director_ssl.certificate", credentials.certificate.as_str())
            .with("director_ssl.private_key", credentials.private_key.as_str())
            .with("director_ssl.ca", credentials.ca.as_str());
        for (name, release) in self.releases.entries() {
            vars.insert(format!("{name}_url"), release.url.as_str());
            vars.insert(format!("{name}_version"), release.version.as_str());
            vars.insert(format!("{name}_sha1"), release.sha1.as_str());
        }
        vars.insert_map("tags", tags);
        vars
    }

    fn run_env(
        &self,
        action: EnvAction,
        store: &dyn StateStore,
        env: &dyn IaasEnvironment,
        credentials: &DirectorCredentials,
        tags: &BTreeMap<String, String>,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        info!(%action, iaas = %env.iaas(), "starting director {action}");

        debug!(phase = %Phase::Render, "rendering director manifest");
        let manifest = env.configure_director_manifest_cpi()?;

        debug!(phase = %Phase::Interpolate, tags = tags.len(), "interpolating director variables");
        let manifest = render(&manifest, &[], &self.director_variables(credentials, tags))?;

        debug!(phase = %Phase::Hydrate, "fetching state artifacts");
        let state = store.get(STATE_KEY)?;
        let vars = store.get(VARS_KEY)?;
        if state.is_empty() {
            info!("no director state found; {action} starts from scratch");
        }

        debug!(phase = %Phase::Materialize, "writing scratch files");
        let scratch = Builder::new()
            .prefix("towerup-")
            .tempdir()
            .map_err(CoreError::io(Phase::Materialize))?;
        let state_path = scratch.path().join(STATE_KEY);
        let vars_path = scratch.path().join(VARS_KEY);
        let manifest_path = scratch.path().join(MANIFEST_FILE);
        write_scratch(&manifest_path, manifest.as_bytes())?;
        // An absent artifact is left absent so bosh treats it as new.
        if !state.is_empty() {
            write_scratch(&state_path, &state)?;
        }
        if !vars.is_empty() {
            write_scratch(&vars_path, &vars)?;
        }

        let args = vec![
            action.as_str().to_owned(),
            format!("--state={}", state_path.display()),
            format!("--vars-store={}", vars_path.display()),
            manifest_path.display().to_string(),
        ];
        debug!(phase = %Phase::Invoke, bin = %self.bosh_path, "running bosh {action}");
        let outcome = self.runner.run(&self.bosh_path, &args, sink);
        if let Err(e) = &outcome {
            warn!(%action, "bosh {action} failed: {e}");
        }

        debug!(phase = %Phase::Persist, "uploading state artifacts");
        let persisted = persist(store, &[(STATE_KEY, state_path), (VARS_KEY, vars_path)]);

        debug!(phase = %Phase::Cleanup, "removing scratch files");
        if let Err(e) = scratch.close() {
            warn!("failed to remove scratch directory: {e}");
        }

        outcome?;
        persisted?;
        info!(%action, "director {action} complete");
        Ok(())
    }

    fn authenticated_args(session: &DirectorSession, ca_path: &Path, deployment: bool) -> Vec<String> {
        let mut args = vec![
            "--non-interactive".to_owned(),
            "--environment".to_owned(),
            format!("https://{}", session.ip),
            "--ca-cert".to_owned(),
            ca_path.display().to_string(),
            "--client".to_owned(),
            ADMIN_CLIENT.to_owned(),
            "--client-secret".to_owned(),
            session.admin_password.clone(),
        ];
        if deployment {
            args.push("--deployment".to_owned());
            args.push(DEPLOYMENT_NAME.to_owned());
        }
        args
    }

    /// Render the cloud-config for `env` and apply it to the director.
    pub fn update_cloud_config(
        &self,
        env: &dyn IaasEnvironment,
        session: &DirectorSession,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        let cloud_config = env.configure_director_cloud_config()?;
        let cloud_config_file = scratch_file("towerup-cloud-config-", ".yml", cloud_config.as_bytes())?;
        let ca = scratch_file("towerup-ca-", ".pem", session.ca_cert.as_bytes())?;

        let mut args = Self::authenticated_args(session, ca.path(), false);
        args.push("update-cloud-config".to_owned());
        args.push(cloud_config_file.path().display().to_string());

        info!(iaas = %env.iaas(), ip = %session.ip, "updating cloud-config");
        self.runner.run(&self.bosh_path, &args, sink)?;
        Ok(())
    }

    /// Upload the light stemcell Concourse runs on.
    pub fn upload_concourse_stemcell(
        &self,
        env: &dyn IaasEnvironment,
        session: &DirectorSession,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        let stemcell = env.configure_concourse_stemcell()?;
        let ca = scratch_file("towerup-ca-", ".pem", session.ca_cert.as_bytes())?;

        let mut args = Self::authenticated_args(session, ca.path(), false);
        args.push("upload-stemcell".to_owned());
        args.push(stemcell.clone());

        info!(iaas = %env.iaas(), %stemcell, "uploading stemcell");
        self.runner.run(&self.bosh_path, &args, sink)?;
        Ok(())
    }

    /// Recreate every VM of the Concourse deployment.
    pub fn recreate(&self, session: &DirectorSession, sink: &mut dyn Write) -> Result<(), CoreError> {
        let ca = scratch_file("towerup-ca-", ".pem", session.ca_cert.as_bytes())?;
        let mut args = Self::authenticated_args(session, ca.path(), true);
        args.push("recreate".to_owned());

        info!(ip = %session.ip, deployment = DEPLOYMENT_NAME, "recreating deployment");
        self.runner.run(&self.bosh_path, &args, sink)?;
        Ok(())
    }

    /// Current director locks as the raw JSON `bosh locks --json` prints.
    pub fn locks(&self, session: &DirectorSession) -> Result<Vec<u8>, CoreError> {
        let ca = scratch_file("towerup-ca-", ".pem", session.ca_cert.as_bytes())?;
        let mut args = Self::authenticated_args(session, ca.path(), false);
        args.push("locks".to_owned());
        args.push("--json".to_owned());

        let mut out = Vec::new();
        self.runner.run(&self.bosh_path, &args, &mut out)?;
        debug!(bytes = out.len(), "fetched director locks");
        Ok(out)
    }

    /// Run an arbitrary bosh `action` against the Concourse deployment.
    ///
    /// `detach` only applies to `deploy`: the call returns as soon as bosh
    /// reports the deployment is underway. For any other action it is
    /// ignored and the command runs to completion.
    pub fn run_authenticated_command(
        &self,
        action: &str,
        session: &DirectorSession,
        detach: bool,
        sink: &mut dyn Write,
        flags: &[String],
    ) -> Result<(), CoreError> {
        let ca = scratch_file("towerup-ca-", ".pem", session.ca_cert.as_bytes())?;
        let mut args = Self::authenticated_args(session, ca.path(), true);
        args.push(action.to_owned());
        args.extend(flags.iter().cloned());

        if detach && action == DETACHABLE_ACTION {
            info!(action, "running detached");
            self.runner.run_detached(&self.bosh_path, &args, sink)?;
        } else {
            if detach {
                warn!(action, "detaching is only supported for {DETACHABLE_ACTION}; waiting for completion");
            }
            debug!(action, flags = flags.len(), "running authenticated command");
            self.runner.run(&self.bosh_path, &args, sink)?;
        }
        Ok(())
    }
}

fn write_scratch(path: &Path, data: &[u8]) -> Result<(), CoreError> {
    fs::write(path, data).map_err(CoreError::io(Phase::Materialize))
}

/// A temporary file holding `data`, removed when dropped.
fn scratch_file(prefix: &str, suffix: &str, data: &[u8]) -> Result<NamedTempFile, CoreError> {
    let mut file = Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()
        .map_err(CoreError::io(Phase::Materialize))?;
    file.write_all(data).map_err(CoreError::io(Phase::Materialize))?;
    file.flush().map_err(CoreError::io(Phase::Materialize))?;
    Ok(file)
}

/// Upload every artifact bosh left on disk. All uploads are attempted; the
/// first failure is returned.
fn persist(store: &dyn StateStore, artifacts: &[(&str, PathBuf)]) -> Result<(), CoreError> {
    let mut first_err = None;
    for (key, path) in artifacts {
        let result = match fs::read(path) {
            Ok(data) => {
                debug!(key, bytes = data.len(), "uploading state artifact");
                store.set(key, &data).map_err(CoreError::from)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key, "artifact was never written; nothing to upload");
                continue;
            }
            Err(e) => Err(CoreError::Io {
                phase: Phase::Persist,
                source: e,
            }),
        };
        if let Err(e) = result {
            warn!(key, "failed to upload state artifact: {e}");
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}
