use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{DocsetConfig, load_config};

pub const DEFAULT_DOCSET_ROOT: &str = "Seaborn.docset";
pub const CONFIG_FILENAME: &str = "docsetter.toml";

const DB_FILENAME: &str = "docSet.dsidx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub docset_root: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        Ok(Self { cwd })
    }
}

/// Concrete filesystem locations for one run. The two index documents and
/// the database all hang off the docset bundle root.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub docset_root: PathBuf,
    pub documents_dir: PathBuf,
    pub gallery_index_path: PathBuf,
    pub tutorial_path: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub root_source: ValueSource,
    pub db_source: ValueSource,
    pub config_source: ValueSource,
}

impl ResolvedPaths {
    pub fn diagnostics(&self) -> String {
        format!(
            "docset_root={} ({})\ndocuments_dir={}\ngallery_index={}\ntutorial={}\ndb_path={} ({})\nconfig_path={} ({})",
            normalize_for_display(&self.docset_root),
            self.root_source.as_str(),
            normalize_for_display(&self.documents_dir),
            normalize_for_display(&self.gallery_index_path),
            normalize_for_display(&self.tutorial_path),
            normalize_for_display(&self.db_path),
            self.db_source.as_str(),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeStatus {
    pub docset_root_exists: bool,
    pub documents_exist: bool,
    pub gallery_index_exists: bool,
    pub tutorial_exists: bool,
    pub db_exists: bool,
    pub db_size_bytes: Option<u64>,
    pub warnings: Vec<String>,
}

/// Resolve everything for one run: the config path (once), the config
/// loaded from it, and the concrete docset paths derived from both.
pub fn resolve_runtime(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> Result<(ResolvedPaths, DocsetConfig)> {
    resolve_runtime_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_runtime_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<(ResolvedPaths, DocsetConfig)>
where
    F: Fn(&str) -> Option<String>,
{
    let (config_path, config_source) =
        resolve_config_path_with_lookup(context, overrides, &lookup_env);
    let config = load_config(&config_path)?;
    let paths = resolve_paths_with_lookup(
        context,
        overrides,
        &config,
        config_path,
        config_source,
        lookup_env,
    )?;
    Ok((paths, config))
}

fn resolve_config_path_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> (PathBuf, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.config.as_deref() {
        return (absolutize(path, &context.cwd), ValueSource::Flag);
    }
    if let Some(value) = lookup_env("DOCSETTER_CONFIG") {
        return (
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        );
    }
    (context.cwd.join(CONFIG_FILENAME), ValueSource::Default)
}

fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    config: &DocsetConfig,
    config_path: PathBuf,
    config_source: ValueSource,
    lookup_env: F,
) -> Result<ResolvedPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let (docset_root, root_source) = if let Some(path) = overrides.docset_root.as_deref() {
        (absolutize(path, &context.cwd), ValueSource::Flag)
    } else if let Some(value) = lookup_env("DOCSETTER_DOCSET_ROOT") {
        (
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        )
    } else if let Some(root) = config.docset.root.as_deref() {
        (absolutize(root, &context.cwd), ValueSource::Config)
    } else {
        (context.cwd.join(DEFAULT_DOCSET_ROOT), ValueSource::Default)
    };

    let resources_dir = docset_root.join("Contents").join("Resources");
    let documents_dir = resources_dir.join("Documents");

    let (db_path, db_source) = if let Some(path) = overrides.db_path.as_deref() {
        (absolutize(path, &context.cwd), ValueSource::Flag)
    } else if let Some(value) = lookup_env("DOCSETTER_DB_PATH") {
        (
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        )
    } else if let Some(path) = config.docset.db_path.as_deref() {
        (absolutize(path, &context.cwd), ValueSource::Config)
    } else {
        (resources_dir.join(DB_FILENAME), ValueSource::Default)
    };

    Ok(ResolvedPaths {
        gallery_index_path: documents_dir.join("examples").join("index.html"),
        tutorial_path: documents_dir.join("tutorial.html"),
        docset_root,
        documents_dir,
        db_path,
        config_path,
        root_source,
        db_source,
        config_source,
    })
}

pub fn inspect_runtime(paths: &ResolvedPaths) -> Result<RuntimeStatus> {
    let docset_root_exists = paths.docset_root.exists();
    let documents_exist = paths.documents_dir.exists();
    let gallery_index_exists = paths.gallery_index_path.exists();
    let tutorial_exists = paths.tutorial_path.exists();
    let db_exists = paths.db_path.exists();
    let db_size_bytes = if db_exists {
        let metadata = fs::metadata(&paths.db_path)
            .with_context(|| format!("failed to inspect {}", paths.db_path.display()))?;
        Some(metadata.len())
    } else {
        None
    };

    let mut warnings = Vec::new();
    if !documents_exist {
        warnings.push(
            "Documents/ is missing; render the documentation tree before generating".to_string(),
        );
    }
    if !gallery_index_exists {
        warnings.push("examples/index.html is missing; no Sample entries can be read".to_string());
    }
    if !tutorial_exists {
        warnings.push("tutorial.html is missing; no Guide entries can be read".to_string());
    }
    if !db_exists {
        warnings.push(
            "docSet.dsidx is missing; create the docset database shell before generating"
                .to_string(),
        );
    }

    Ok(RuntimeStatus {
        docset_root_exists,
        documents_exist,
        gallery_index_exists,
        tutorial_exists,
        db_exists,
        db_size_bytes,
        warnings,
    })
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use tempfile::tempdir;

    use super::{
        CONFIG_FILENAME, PathOverrides, ResolutionContext, ValueSource, resolve_paths_with_lookup,
        resolve_runtime_with_lookup,
    };
    use crate::config::{DocsetConfig, DocsetSection};

    fn context(cwd: &str) -> ResolutionContext {
        ResolutionContext {
            cwd: PathBuf::from(cwd),
        }
    }

    fn resolve<F>(
        context: &ResolutionContext,
        overrides: &PathOverrides,
        config: &DocsetConfig,
        lookup_env: F,
    ) -> super::ResolvedPaths
    where
        F: Fn(&str) -> Option<String>,
    {
        resolve_paths_with_lookup(
            context,
            overrides,
            config,
            context.cwd.join(CONFIG_FILENAME),
            ValueSource::Default,
            lookup_env,
        )
        .expect("resolve paths")
    }

    #[test]
    fn resolve_paths_defaults_preserve_docset_layout() {
        let resolved = resolve(
            &context("/work"),
            &PathOverrides::default(),
            &DocsetConfig::default(),
            |_| None,
        );

        assert_eq!(resolved.docset_root, PathBuf::from("/work/Seaborn.docset"));
        assert_eq!(
            resolved.documents_dir,
            PathBuf::from("/work/Seaborn.docset/Contents/Resources/Documents"),
        );
        assert_eq!(
            resolved.gallery_index_path,
            PathBuf::from("/work/Seaborn.docset/Contents/Resources/Documents/examples/index.html"),
        );
        assert_eq!(
            resolved.tutorial_path,
            PathBuf::from("/work/Seaborn.docset/Contents/Resources/Documents/tutorial.html"),
        );
        assert_eq!(
            resolved.db_path,
            PathBuf::from("/work/Seaborn.docset/Contents/Resources/docSet.dsidx"),
        );
        assert_eq!(resolved.root_source, ValueSource::Default);
        assert_eq!(resolved.db_source, ValueSource::Default);
    }

    #[test]
    fn resolve_paths_prefers_flag_over_env_and_config() {
        let overrides = PathOverrides {
            docset_root: Some(PathBuf::from("/flag/Flag.docset")),
            ..PathOverrides::default()
        };
        let config = DocsetConfig {
            docset: DocsetSection {
                root: Some(PathBuf::from("/config/Config.docset")),
                ..DocsetSection::default()
            },
        };
        let env = HashMap::from([(
            "DOCSETTER_DOCSET_ROOT".to_string(),
            "/env/Env.docset".to_string(),
        )]);

        let resolved = resolve(&context("/work"), &overrides, &config, |key| {
            env.get(key).cloned()
        });

        assert_eq!(resolved.docset_root, PathBuf::from("/flag/Flag.docset"));
        assert_eq!(resolved.root_source, ValueSource::Flag);
    }

    #[test]
    fn resolve_paths_falls_back_from_env_to_config() {
        let config = DocsetConfig {
            docset: DocsetSection {
                root: Some(PathBuf::from("bundles/Config.docset")),
                db_path: Some(PathBuf::from("out/index.dsidx")),
                ..DocsetSection::default()
            },
        };

        let resolved = resolve(
            &context("/work"),
            &PathOverrides::default(),
            &config,
            |_| None,
        );

        assert_eq!(
            resolved.docset_root,
            PathBuf::from("/work/bundles/Config.docset"),
        );
        assert_eq!(resolved.root_source, ValueSource::Config);
        assert_eq!(resolved.db_path, PathBuf::from("/work/out/index.dsidx"));
        assert_eq!(resolved.db_source, ValueSource::Config);
    }

    #[test]
    fn resolve_paths_env_overrides_db_path() {
        let env = HashMap::from([(
            "DOCSETTER_DB_PATH".to_string(),
            "/elsewhere/docSet.dsidx".to_string(),
        )]);

        let resolved = resolve(
            &context("/work"),
            &PathOverrides::default(),
            &DocsetConfig::default(),
            |key| env.get(key).cloned(),
        );

        assert_eq!(resolved.db_path, PathBuf::from("/elsewhere/docSet.dsidx"));
        assert_eq!(resolved.db_source, ValueSource::Env);
        assert_eq!(resolved.root_source, ValueSource::Default);
    }

    #[test]
    fn resolve_runtime_loads_config_and_resolves_paths_once() {
        let temp = tempdir().expect("tempdir");
        let cwd = temp.path().to_path_buf();
        fs::write(
            cwd.join(CONFIG_FILENAME),
            "[docset]\nroot = \"bundles/Config.docset\"\n",
        )
        .expect("write config");

        let context = ResolutionContext { cwd: cwd.clone() };
        let (paths, config) =
            resolve_runtime_with_lookup(&context, &PathOverrides::default(), |_| None)
                .expect("resolve runtime");

        assert_eq!(
            config.docset.root,
            Some(PathBuf::from("bundles/Config.docset")),
        );
        assert_eq!(paths.docset_root, cwd.join("bundles/Config.docset"));
        assert_eq!(paths.root_source, ValueSource::Config);
        assert_eq!(paths.config_path, cwd.join(CONFIG_FILENAME));
        assert_eq!(paths.config_source, ValueSource::Default);
    }
}
