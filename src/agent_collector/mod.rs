//! Plugin Loader: finds code units and turns each into exactly one agent.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use tracing::{info, instrument, warn};

use crate::{
    agent::{Agent, AgentContext, Capability},
    errors::LoadError,
    registry::AgentRegistry,
};

mod manifest;

/// Lists the code units of `directory`: its `*.yaml` and `*.yml` files, sorted by path.
///
/// Other files and subdirectories are skipped.
#[instrument]
pub fn collect_units(directory: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        bail!("'{}' is not a valid directory", directory.display());
    }

    let mut units = Vec::new();
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("reading {}", directory.display()))?;
    for entry in entries {
        let Ok(entry) = entry else {
            warn!("one entry cannot be read in {}", directory.display());
            continue;
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_manifest(&path) {
            units.push(path);
        }
    }
    units.sort();
    info!(?units);
    Ok(units)
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Builds the single agent declared by the code unit at `path`.
///
/// Constructing the agent runs its code.
#[instrument(skip(ctx, registry))]
pub fn load_agent(
    path: &Path,
    ctx: AgentContext,
    registry: &AgentRegistry,
) -> Result<Box<dyn Agent>, LoadError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound(path.to_owned()),
        _ => LoadError::Unreadable {
            path: path.to_owned(),
            source,
        },
    })?;

    let mut qualifying = Vec::new();
    for declaration in manifest::parse_manifest(&yaml)? {
        if registry.contains(&declaration.key) {
            qualifying.push(declaration);
        } else {
            warn!(
                "{}:{}: '{}' is not a registered agent, ignored",
                path.display(),
                declaration.line,
                declaration.key
            );
        }
    }

    let declaration = match qualifying.len() {
        0 => return Err(LoadError::NoImplementation(path.to_owned())),
        1 => qualifying.remove(0),
        _ => {
            return Err(LoadError::MultipleImplementations {
                path: path.to_owned(),
                found: qualifying.into_iter().map(|d| d.key).collect(),
            })
        }
    };

    if let Some(missing) = Capability::REQUIRED
        .into_iter()
        .find(|cap| !declaration.capabilities.iter().any(|c| c == cap.as_str()))
    {
        return Err(LoadError::MissingCapability {
            implementation: declaration.key,
            capability: missing.to_string(),
        });
    }
    for unknown in declaration
        .capabilities
        .iter()
        .filter(|c| c.parse::<Capability>().is_err())
    {
        warn!("'{}' exports unknown capability '{unknown}'", declaration.key);
    }

    let agent = match registry.construct(&declaration.key, ctx) {
        Some(Ok(agent)) => agent,
        Some(Err(source)) => {
            return Err(LoadError::Construction {
                implementation: declaration.key,
                source,
            })
        }
        // checked by `contains` above
        None => return Err(LoadError::NoImplementation(path.to_owned())),
    };
    info!(key = %declaration.key, name = %agent.name(), "agent loaded");
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use anyhow::anyhow;

    use super::*;
    use crate::{
        agents::TemplateAgent,
        challenge::EmbeddingStore,
        llm::{Reply, ScriptedGenerator},
    };

    fn ctx() -> AgentContext {
        AgentContext {
            llm: Arc::new(ScriptedGenerator::new(|_| Reply::Text(String::new()))),
            hints_db: Arc::new(EmbeddingStore::default()),
        }
    }

    fn registry() -> AgentRegistry {
        let mut registry = AgentRegistry::with_builtins();
        registry.register("broken", |_| -> anyhow::Result<TemplateAgent> {
            Err(anyhow!("no api key"))
        });
        registry
    }

    fn load_error(path: &Path) -> LoadError {
        match load_agent(path, ctx(), &registry()) {
            Ok(agent) => panic!("unexpectedly loaded '{}'", agent.name()),
            Err(err) => err,
        }
    }

    fn unit(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn collects_sorted_manifests_only() {
        let dir = tempfile::tempdir().unwrap();
        unit(dir.path(), "b.yml", "");
        unit(dir.path(), "a.yaml", "");
        unit(dir.path(), "notes.txt", "");
        fs::create_dir(dir.path().join("c.yaml")).unwrap();
        let units = collect_units(dir.path()).unwrap();
        let names = units
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.yaml", "b.yml"]);
    }

    #[test]
    fn collecting_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = unit(dir.path(), "a.yaml", "");
        assert!(collect_units(&file).is_err());
    }

    #[test]
    fn loads_the_single_registered_implementation() {
        let dir = tempfile::tempdir().unwrap();
        let path = unit(
            dir.path(),
            "mine.yaml",
            "implementations:\n  - base_class: \"name\"\n  \
             - template: \"name hint similarity_search\"\n",
        );
        let agent = load_agent(&path, ctx(), &registry()).unwrap();
        assert_eq!(agent.name(), "template");
    }

    #[test]
    fn missing_unit() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_error(&dir.path().join("nope.yaml"));
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn zero_or_many_implementations() {
        let dir = tempfile::tempdir().unwrap();
        let none = unit(dir.path(), "none.yaml", "implementations:\n  - other: \"name\"\n");
        assert!(matches!(load_error(&none), LoadError::NoImplementation(_)));

        let many = unit(
            dir.path(),
            "many.yaml",
            "implementations:\n  - template: \"name hint similarity_search\"\n  \
             - llm_hinter: \"name hint similarity_search\"\n",
        );
        let LoadError::MultipleImplementations { found, .. } = load_error(&many) else {
            panic!("expected MultipleImplementations");
        };
        assert_eq!(found, vec!["template", "llm_hinter"]);
    }

    #[test]
    fn missing_capability() {
        let dir = tempfile::tempdir().unwrap();
        let path = unit(
            dir.path(),
            "a.yaml",
            "implementations:\n  - template: \"name similarity_search\"\n",
        );
        let err = load_error(&path);
        assert!(matches!(
            err,
            LoadError::MissingCapability { ref capability, .. } if capability == "hint"
        ));
    }

    #[test]
    fn constructor_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = unit(
            dir.path(),
            "a.yaml",
            "implementations:\n  - broken: \"name hint similarity_search\"\n",
        );
        let err = load_error(&path);
        assert!(err.to_string().contains("no api key"));
    }
}
